//! PermitDesk Cache - Durable local storage adapters
//!
//! Provides:
//! - [`kv::FileCache`] - file-backed implementation of the `LocalCache`
//!   port, one file per key, atomic replace on write
//! - [`kv::MemoryCache`] - in-memory implementation for tests
//! - [`snapshot::SnapshotStore`] - serialization of the authoritative
//!   submission list and last-sync timestamp over any `LocalCache`
//!
//! The snapshot decoder is deliberately lenient: a record with a malformed
//! training completion date loses only that date, and a record whose
//! submission timestamp cannot be parsed is dropped with a warning rather
//! than invalidating the whole snapshot.

pub mod kv;
pub mod snapshot;

use thiserror::Error;

/// Errors that can occur in cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// An I/O error occurred reading or writing a cache file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be serialized or deserialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}
