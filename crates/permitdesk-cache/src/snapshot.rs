//! Snapshot codec over the local cache
//!
//! Serializes the authoritative submission list to a single durable key,
//! plus a separate last-sync timestamp key, on every mutation. The decoder
//! reconstructs date-typed fields from their serialized form leniently:
//!
//! - a malformed training completion date becomes `None` (the schema allows
//!   its absence)
//! - a record whose submission timestamp cannot be parsed is dropped with a
//!   warning; the rest of the snapshot is kept
//! - a snapshot that is not a JSON array at all is treated as empty

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use permitdesk_core::domain::Submission;
use permitdesk_core::ports::LocalCache;

use crate::CacheError;

/// Cache key holding the serialized submission list
pub const SUBMISSIONS_KEY: &str = "permitdesk.submissions";

/// Cache key holding the last successful sync timestamp (RFC 3339)
pub const LAST_SYNC_KEY: &str = "permitdesk.last_sync";

/// Reads and writes the submission snapshot over any [`LocalCache`]
pub struct SnapshotStore {
    cache: Arc<dyn LocalCache>,
}

impl SnapshotStore {
    /// Create a snapshot store over the given cache
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self { cache }
    }

    /// Load the cached submission list
    ///
    /// Returns an empty list when no snapshot exists. Individual records
    /// that cannot be decoded are dropped, not fatal.
    pub fn load(&self) -> Result<Vec<Submission>, CacheError> {
        let Some(raw) = self
            .cache
            .get(SUBMISSIONS_KEY)
            .map_err(|e| CacheError::Serialization(format!("cache read failed: {e:#}")))?
        else {
            return Ok(Vec::new());
        };

        let values: Vec<Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(%err, "Cached snapshot is not a JSON array, treating as empty");
                return Ok(Vec::new());
            }
        };

        let total = values.len();
        let submissions: Vec<Submission> = values.into_iter().filter_map(decode_entry).collect();
        if submissions.len() < total {
            warn!(
                dropped = total - submissions.len(),
                kept = submissions.len(),
                "Dropped undecodable records from cached snapshot"
            );
        }
        debug!(count = submissions.len(), "Loaded submissions from cache");
        Ok(submissions)
    }

    /// Persist the submission list and stamp the last-sync timestamp
    pub fn store(&self, submissions: &[Submission]) -> Result<(), CacheError> {
        let raw = serde_json::to_string(submissions)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache
            .set(SUBMISSIONS_KEY, &raw)
            .map_err(|e| CacheError::Serialization(format!("cache write failed: {e:#}")))?;
        self.set_last_sync(Utc::now())?;
        Ok(())
    }

    /// Read the last successful sync timestamp, if any
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.cache.get(LAST_SYNC_KEY).ok().flatten()?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(err) => {
                warn!(%err, "Malformed last-sync timestamp in cache, ignoring");
                None
            }
        }
    }

    /// Stamp the last successful sync timestamp
    pub fn set_last_sync(&self, at: DateTime<Utc>) -> Result<(), CacheError> {
        self.cache
            .set(LAST_SYNC_KEY, &at.to_rfc3339())
            .map_err(|e| CacheError::Serialization(format!("cache write failed: {e:#}")))
    }
}

/// Decode one snapshot entry, applying the leniency rules.
fn decode_entry(mut value: Value) -> Option<Submission> {
    match serde_json::from_value::<Submission>(value.clone()) {
        Ok(submission) => Some(submission),
        Err(first_err) => {
            // A malformed training completion date is recoverable: null it
            // and retry. Anything else (including a bad submission
            // timestamp) drops the record.
            if let Some(completed) = value.pointer_mut("/training/completed_at") {
                *completed = Value::Null;
                if let Ok(submission) = serde_json::from_value::<Submission>(value) {
                    warn!("Cached record had malformed training completion date, cleared");
                    return Some(submission);
                }
            }
            warn!(%first_err, "Dropping undecodable cached record");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use permitdesk_core::domain::{SubmissionForm, SubmissionId};

    use crate::kv::MemoryCache;

    fn store() -> (Arc<MemoryCache>, SnapshotStore) {
        let cache = Arc::new(MemoryCache::new());
        let snapshot = SnapshotStore::new(cache.clone());
        (cache, snapshot)
    }

    fn sample(id: &str) -> Submission {
        Submission::from_form(SubmissionForm::default())
            .with_id(SubmissionId::new(id.to_string()).unwrap())
    }

    #[test]
    fn test_empty_cache_loads_empty_list() {
        let (_, snapshot) = store();
        assert!(snapshot.load().unwrap().is_empty());
        assert!(snapshot.last_sync().is_none());
    }

    #[test]
    fn test_store_then_load_roundtrip() {
        let (_, snapshot) = store();
        let list = vec![sample("r1"), sample("r2")];
        snapshot.store(&list).unwrap();

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id.as_str(), "r1");
        assert_eq!(loaded[1].id.as_str(), "r2");
        assert!(snapshot.last_sync().is_some());
    }

    #[test]
    fn test_malformed_training_date_becomes_none() {
        let (cache, snapshot) = store();
        let mut value = serde_json::to_value(sample("r1")).unwrap();
        *value.pointer_mut("/training/completed_at").unwrap() =
            Value::String("not-a-date".to_string());
        cache
            .set(SUBMISSIONS_KEY, &serde_json::to_string(&vec![value]).unwrap())
            .unwrap();

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].training.completed_at.is_none());
    }

    #[test]
    fn test_malformed_submission_timestamp_drops_record() {
        let (cache, snapshot) = store();
        let mut bad = serde_json::to_value(sample("bad")).unwrap();
        *bad.pointer_mut("/submitted_at").unwrap() = Value::String("garbage".to_string());
        let good = serde_json::to_value(sample("good")).unwrap();
        cache
            .set(
                SUBMISSIONS_KEY,
                &serde_json::to_string(&vec![bad, good]).unwrap(),
            )
            .unwrap();

        let loaded = snapshot.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id.as_str(), "good");
    }

    #[test]
    fn test_non_array_snapshot_treated_as_empty() {
        let (cache, snapshot) = store();
        cache.set(SUBMISSIONS_KEY, "{\"oops\": true}").unwrap();
        assert!(snapshot.load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_last_sync_is_none() {
        let (cache, snapshot) = store();
        cache.set(LAST_SYNC_KEY, "yesterday-ish").unwrap();
        assert!(snapshot.last_sync().is_none());
    }
}
