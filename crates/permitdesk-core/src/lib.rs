//! PermitDesk Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Submission`, `ApprovalInfo`, form-section records
//! - **Port definitions** - Traits for adapters: `RemoteStore`, `LocalCache`
//! - **Configuration** - Typed YAML configuration with defaults
//! - **Administrator gate** - Shared-passphrase check for admin actions
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external dependencies.
//! Ports define trait interfaces that adapter crates implement: the hosted
//! document-store client (`permitdesk-remote`) and the durable local cache
//! (`permitdesk-cache`). The sync engine (`permitdesk-sync`) orchestrates
//! domain entities through these ports.

pub mod admin;
pub mod config;
pub mod domain;
pub mod ports;
