//! PermitDesk Sync - Client-side synchronization engine
//!
//! Provides:
//! - The [`engine::SyncEngine`] singleton reconciling the local cache, the
//!   hosted document store, and optimistic local edits
//! - Three-tier transport fallback: push subscription, interval polling,
//!   cache-only
//! - De-duplication of the authoritative submission list
//! - Synchronous listener dispatch with per-callback isolation
//!
//! ## Modules
//!
//! - [`engine`] - Sync engine, transport state machine, reconciliation
//! - [`events`] - Listener registry and isolated dispatch

pub mod engine;
pub mod events;

use permitdesk_core::domain::{DomainError, SubmissionId};

use thiserror::Error;

/// Errors surfaced by sync-engine operations
///
/// Only user-initiated operations (`manual_sync`, `force_sync`) and invalid
/// mutations return errors; remote-leg failures of optimistic mutations are
/// reported through the error event stream instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote store did not answer the connectivity probe
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    /// No synchronization recovery path succeeded
    #[error("Synchronization unavailable: {0}")]
    Unavailable(String),

    /// The referenced submission is not in the authoritative list
    #[error("Submission not found: {0}")]
    NotFound(SubmissionId),

    /// A domain invariant rejected the mutation
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}
