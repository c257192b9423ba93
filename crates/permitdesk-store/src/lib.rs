//! PermitDesk Store - UI-facing state container
//!
//! Sits between the sync engine and the rendering layer:
//!
//! - [`reducer`] - immutable application state and the pure reducer that
//!   advances it one action at a time
//! - [`store`] - the [`store::StateStore`] that subscribes to engine
//!   events, gates administrator actions, and notifies UI subscribers
//!
//! The store never talks to the cache or the remote store directly; every
//! data motion goes through the sync engine.

pub mod reducer;
pub mod store;

use thiserror::Error;

use permitdesk_sync::SyncError;

/// Errors surfaced by store actions
#[derive(Debug, Error)]
pub enum StoreError {
    /// The administrator passphrase check failed
    #[error("Administrator authorization required")]
    Unauthorized,

    /// The safety-training requirement is not met for this submission
    #[error("Safety training incomplete: watched {watched_secs}s of {required_secs}s")]
    TrainingIncomplete {
        watched_secs: u32,
        required_secs: u32,
    },

    /// The underlying sync operation failed
    #[error(transparent)]
    Sync(#[from] SyncError),
}
