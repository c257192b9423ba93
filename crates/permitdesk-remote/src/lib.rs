//! PermitDesk Remote - hosted document-store adapter
//!
//! Implements the [`RemoteStore`] port over the document-store REST API.
//! The adapter is transport only: domain rules live in `permitdesk-core`
//! and reconciliation in `permitdesk-sync`.
//!
//! [`RemoteStore`]: permitdesk_core::ports::RemoteStore

pub mod client;

pub use client::DocStoreClient;
