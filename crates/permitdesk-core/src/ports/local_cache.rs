//! Local cache port (driven/secondary port)
//!
//! A durable string key-value store on the client device, surviving
//! restarts. Reads and writes are synchronous from the caller's point of
//! view; the sync engine treats them as non-yielding steps between its
//! remote suspension points.

/// Port trait for durable key-value storage
///
/// ## Implementation Notes
///
/// - Implementations must persist across process restarts (the file-backed
///   adapter in `permitdesk-cache`); the in-memory adapter exists for tests.
/// - Errors are adapter-specific (`anyhow`); the engine treats cache
///   failures as non-fatal and logs them.
pub trait LocalCache: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Durably store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
