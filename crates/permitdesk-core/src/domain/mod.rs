//! Domain entities and business logic
//!
//! This module contains the core domain types for PermitDesk:
//! - Newtypes for type-safe identifiers
//! - Form-section records produced by the submission wizard
//! - The `Submission` entity and its two-stage approval record
//! - Domain-specific error types

pub mod errors;
pub mod forms;
pub mod newtypes;
pub mod submission;

// Re-export commonly used types
pub use errors::DomainError;
pub use forms::{
    highest_grade, ProjectInfo, RiskGrade, RiskItem, SafetyPledge, SubmissionForm, TrainingRecord,
    WorkCategory, WorkPermitDetail, WorkTypeSelection,
};
pub use newtypes::SubmissionId;
pub use submission::{
    ApprovalInfo, ApprovalSlot, Submission, SubmissionPatch, SubmissionStatus,
};
