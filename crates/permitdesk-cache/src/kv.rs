//! Key-value adapters implementing the `LocalCache` port
//!
//! [`FileCache`] persists each key as a file under a cache directory,
//! writing through a temporary file and renaming so readers never observe
//! a partial value. [`MemoryCache`] backs tests.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::debug;

use permitdesk_core::ports::LocalCache;

/// File-backed durable key-value store
///
/// Keys map to file names inside the cache directory; characters outside
/// `[A-Za-z0-9._-]` are replaced so a key can never escape the directory.
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Open (and create if needed) a cache directory
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(safe)
    }

    fn write_atomic(path: &Path, value: &str) -> anyhow::Result<()> {
        // Append rather than replace the extension: keys contain dots, and
        // two keys must never share a temporary file.
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, value)
            .with_context(|| format!("Failed to write cache file {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace cache file {}", path.display()))?;
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to read cache file {}", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.key_path(key);
        Self::write_atomic(&path, value)?;
        debug!(key, bytes = value.len(), "Cache key written");
        Ok(())
    }
}

/// In-memory key-value store for tests
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    /// Create an empty in-memory cache
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().expect("cache lock").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .expect("cache lock")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_cache_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();

        assert!(cache.get("submissions").unwrap().is_none());
        cache.set("submissions", "[1,2,3]").unwrap();
        assert_eq!(cache.get("submissions").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_file_cache_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();

        cache.set("k", "old").unwrap();
        cache.set("k", "new").unwrap();
        assert_eq!(cache.get("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_file_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let cache = FileCache::open(dir.path()).unwrap();
            cache.set("persist", "value").unwrap();
        }
        let cache = FileCache::open(dir.path()).unwrap();
        assert_eq!(cache.get("persist").unwrap().as_deref(), Some("value"));
    }

    #[test]
    fn test_file_cache_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::open(dir.path()).unwrap();

        cache.set("../escape/attempt", "x").unwrap();
        assert_eq!(
            cache.get("../escape/attempt").unwrap().as_deref(),
            Some("x")
        );
        // Nothing was written outside the cache directory.
        assert!(dir.path().parent().unwrap().join("escape").metadata().is_err());
    }

    #[test]
    fn test_memory_cache_roundtrip() {
        let cache = MemoryCache::new();
        assert!(cache.get("a").unwrap().is_none());
        cache.set("a", "1").unwrap();
        assert_eq!(cache.get("a").unwrap().as_deref(), Some("1"));
    }
}
