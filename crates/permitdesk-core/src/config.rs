//! Configuration module for PermitDesk.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level configuration for PermitDesk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

/// Synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between remote polling cycles.
    pub poll_interval: u64,
    /// Whether to attempt a push subscription before falling back to
    /// polling. Disabled by default: polling is the default transport.
    pub realtime_enabled: bool,
}

/// Hosted document-store settings.
///
/// `request_timeout_secs` is low-level transport tuning passed through to
/// the remote client verbatim; the sync engine does not interpret it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the hosted document store.
    pub base_url: String,
    /// Name of the submission collection.
    pub collection: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout_secs: u64,
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory where cache keys are persisted.
    pub dir: PathBuf,
}

/// Administrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Shared static passphrase gating admin actions. `None` disables all
    /// admin actions.
    pub passphrase: Option<String>,
    /// Minimum seconds of the safety-training video that must be watched.
    pub min_training_watch_secs: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/permitdesk/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("permitdesk")
            .join("config.yaml")
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: 30,
            realtime_enabled: false,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.permitdesk.io".to_string(),
            collection: "submissions".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("permitdesk")
                .join("cache"),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            passphrase: None,
            min_training_watch_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.poll_interval, 30);
        assert!(!config.sync.realtime_enabled);
        assert_eq!(config.remote.collection, "submissions");
        assert!(config.admin.passphrase.is_none());
        assert_eq!(config.admin.min_training_watch_secs, 300);
    }

    #[test]
    fn test_load_partial_yaml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "sync:\n  poll_interval: 10\nremote:\n  base_url: http://localhost:9999"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sync.poll_interval, 10);
        assert_eq!(config.remote.base_url, "http://localhost:9999");
        // Untouched sections keep their defaults.
        assert!(!config.sync.realtime_enabled);
        assert_eq!(config.remote.collection, "submissions");
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.sync.poll_interval, 30);
    }

    #[test]
    fn test_default_path_ends_with_config_yaml() {
        let path = Config::default_path();
        assert!(path.ends_with("permitdesk/config.yaml"));
    }
}
