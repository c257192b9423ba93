//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, invalid status transitions, and
//! approval-ordering violations.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid submission identifier
    #[error("Invalid submission id: {0}")]
    InvalidId(String),

    /// Invalid status transition attempt
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status
        from: String,
        /// The attempted target status
        to: String,
    },

    /// Approval slots populated out of order
    ///
    /// The safety manager must approve before the department manager.
    #[error("Approval order violated: {0}")]
    ApprovalOrder(String),

    /// Invalid risk rating (likelihood/severity must be 1-5)
    #[error("Invalid risk rating: {0}")]
    InvalidRiskRating(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("".to_string());
        assert_eq!(err.to_string(), "Invalid submission id: ");

        let err = DomainError::InvalidTransition {
            from: "approved".to_string(),
            to: "pending".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition from approved to pending"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::ApprovalOrder("dept before safety".to_string());
        let err2 = DomainError::ApprovalOrder("dept before safety".to_string());
        assert_eq!(err1, err2);
    }
}
