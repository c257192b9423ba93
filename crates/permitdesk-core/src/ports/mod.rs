//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`RemoteStore`] - Hosted document-store collection operations
//! - [`LocalCache`] - Durable key-value storage on the client device

pub mod local_cache;
pub mod remote_store;

pub use local_cache::LocalCache;
pub use remote_store::{RemoteEvent, RemoteStore, RemoteSubscription};
