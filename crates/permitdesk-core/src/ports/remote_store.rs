//! Remote store port (driven/secondary port)
//!
//! Interface for the hosted document-store backend holding the submission
//! collection. The primary implementation is the REST adapter in
//! `permitdesk-remote`; tests use in-memory implementations.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are
//!   adapter-specific and don't need domain-level classification.
//! - `fetch_all` returns submissions ordered by submission time descending;
//!   the sync engine still de-duplicates the result, so implementations do
//!   not have to guarantee uniqueness.
//! - `subscribe` is optional: transports without a push primitive return an
//!   error and the engine falls back to interval polling.

use tokio::sync::mpsc;

use crate::domain::{Submission, SubmissionId, SubmissionPatch};

/// A change notification pushed by the remote store
#[derive(Debug)]
pub enum RemoteEvent {
    /// The full ordered collection after a remote change
    Changed(Vec<Submission>),
    /// The subscription broke; the engine demotes to polling
    Error(String),
}

/// Handle for an established push subscription
///
/// Dropping the handle releases the subscription; the sending side observes
/// the closed channel and stops delivering.
#[derive(Debug)]
pub struct RemoteSubscription {
    /// Stream of change notifications
    pub events: mpsc::Receiver<RemoteEvent>,
}

/// Port trait for the hosted submission collection
///
/// ## Implementation Notes
///
/// - `probe` must be a lightweight reachability check (a bounded list query
///   is sufficient) so the engine can call it on every poll cycle.
/// - Timeout behavior is the adapter's responsibility; the engine imposes
///   no timeouts of its own.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lightweight "can I reach this collection" check
    async fn probe(&self) -> anyhow::Result<()>;

    /// Fetch the full collection, ordered by submission time descending
    async fn fetch_all(&self) -> anyhow::Result<Vec<Submission>>;

    /// Create a submission remotely
    ///
    /// # Returns
    /// The server-assigned identifier for the new document.
    async fn create(&self, submission: &Submission) -> anyhow::Result<SubmissionId>;

    /// Apply a status mutation to a remote document
    async fn update(&self, id: &SubmissionId, patch: &SubmissionPatch) -> anyhow::Result<()>;

    /// Delete a remote document
    async fn delete(&self, id: &SubmissionId) -> anyhow::Result<()>;

    /// Establish a push subscription over the ordered collection
    ///
    /// # Errors
    /// Returns an error when the transport has no push primitive; callers
    /// fall back to polling.
    async fn subscribe(&self) -> anyhow::Result<RemoteSubscription>;
}
