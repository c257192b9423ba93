//! Submission domain entity
//!
//! A [`Submission`] is one complete work-permit safety evaluation moving
//! through `pending -> approved/rejected`.
//!
//! ## Lifecycle
//!
//! ```text
//!   wizard complete          admin action              admin action
//!  ┌───────────────┐   ┌──────────────────────┐   ┌─────────────────────┐
//!  │ temporary id, │──►│ safety manager slot  │──►│ department manager  │
//!  │   Pending     │   │ filled (still        │   │ slot filled         │
//!  └───────────────┘   │   Pending)           │   │   -> Approved       │
//!          │           └──────────────────────┘   └─────────────────────┘
//!          │ remote create confirms                        or
//!          ▼                                      ┌─────────────────────┐
//!   server-assigned id                            │ Rejected (+ reason) │
//!                                                 └─────────────────────┘
//! ```
//!
//! Approval order is a hard invariant: the department-manager slot cannot
//! be populated while the safety-manager slot is empty.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::forms::{
    ProjectInfo, RiskItem, SafetyPledge, SubmissionForm, TrainingRecord, WorkPermitDetail,
    WorkTypeSelection,
};
use super::newtypes::SubmissionId;

// ============================================================================
// SubmissionStatus
// ============================================================================

/// Lifecycle status of a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Awaiting administrator review
    #[default]
    Pending,
    /// Both approval slots populated
    Approved,
    /// Rejected by an administrator, with an optional reason
    Rejected,
}

impl SubmissionStatus {
    /// Returns true if no further status transitions are expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Approved | SubmissionStatus::Rejected)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Pending => write!(f, "pending"),
            SubmissionStatus::Approved => write!(f, "approved"),
            SubmissionStatus::Rejected => write!(f, "rejected"),
        }
    }
}

// ============================================================================
// ApprovalInfo
// ============================================================================

/// One populated approval slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalSlot {
    /// Name of the approving manager
    pub approver: String,
    /// When the approval was recorded
    pub approved_at: DateTime<Utc>,
}

/// Two-stage approval record
///
/// The safety manager approves first, then the department manager;
/// populating the second slot is what flips a submission to `Approved`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalInfo {
    /// First-stage slot: site safety manager
    pub safety_manager: Option<ApprovalSlot>,
    /// Second-stage slot: department manager
    pub department_manager: Option<ApprovalSlot>,
}

impl ApprovalInfo {
    /// Record the safety-manager approval (first stage)
    pub fn approve_safety_manager(&mut self, approver: String, at: DateTime<Utc>) {
        self.safety_manager = Some(ApprovalSlot {
            approver,
            approved_at: at,
        });
    }

    /// Record the department-manager approval (second stage)
    ///
    /// # Errors
    /// Returns `DomainError::ApprovalOrder` when the safety-manager slot is
    /// still empty.
    pub fn approve_department_manager(
        &mut self,
        approver: String,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.safety_manager.is_none() {
            return Err(DomainError::ApprovalOrder(
                "department manager cannot approve before the safety manager".to_string(),
            ));
        }
        self.department_manager = Some(ApprovalSlot {
            approver,
            approved_at: at,
        });
        Ok(())
    }

    /// Returns true when both slots are populated
    pub fn is_complete(&self) -> bool {
        self.safety_manager.is_some() && self.department_manager.is_some()
    }

    /// Validate the slot ordering invariant on an already-built record
    ///
    /// Used when an `ApprovalInfo` arrives fully formed (from the UI layer
    /// or the wire) rather than through the slot methods.
    pub fn validate_order(&self) -> Result<(), DomainError> {
        if self.department_manager.is_some() && self.safety_manager.is_none() {
            return Err(DomainError::ApprovalOrder(
                "department manager slot populated before the safety manager slot".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Submission
// ============================================================================

/// One complete work-permit safety-evaluation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Unique identifier (temporary until confirmed by the remote store)
    pub id: SubmissionId,
    /// Lifecycle status
    pub status: SubmissionStatus,
    /// When the wizard was submitted
    pub submitted_at: DateTime<Utc>,
    /// Step 1: project information
    pub project: ProjectInfo,
    /// Step 2: selected work types
    pub work_types: WorkTypeSelection,
    /// Step 3: safety-training record
    pub training: TrainingRecord,
    /// Step 4: ordered risk assessment
    pub risks: Vec<RiskItem>,
    /// Step 5: work-permit detail
    pub permit: WorkPermitDetail,
    /// Step 6: safety pledge
    pub pledge: SafetyPledge,
    /// Two-stage approval record, present once review has started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalInfo>,
    /// Reason given by the administrator on rejection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Submission {
    /// Create a new pending submission with a temporary id from a completed
    /// wizard form
    #[must_use]
    pub fn from_form(form: SubmissionForm) -> Self {
        Self {
            id: SubmissionId::temporary(),
            status: SubmissionStatus::Pending,
            submitted_at: Utc::now(),
            project: form.project,
            work_types: form.work_types,
            training: form.training,
            risks: form.risks,
            permit: form.permit,
            pledge: form.pledge,
            approval: None,
            rejection_reason: None,
        }
    }

    /// Clone this submission under a remote-assigned id
    ///
    /// Used after a successful remote create to replace the optimistic
    /// record bearing the temporary id.
    #[must_use]
    pub fn with_id(&self, id: SubmissionId) -> Self {
        let mut confirmed = self.clone();
        confirmed.id = id;
        confirmed
    }

    /// Apply a status mutation, enforcing domain invariants
    ///
    /// # Errors
    /// - `DomainError::ApprovalOrder` when the patch populates the
    ///   department-manager slot before the safety-manager slot.
    /// - `DomainError::InvalidTransition` when moving to `Approved` without
    ///   both approval slots populated, or away from a terminal status back
    ///   to `Pending`.
    pub fn apply(&mut self, patch: &SubmissionPatch) -> Result<(), DomainError> {
        if let Some(ref approval) = patch.approval {
            approval.validate_order()?;
        }

        if let Some(status) = patch.status {
            if self.status.is_terminal() && status == SubmissionStatus::Pending {
                return Err(DomainError::InvalidTransition {
                    from: self.status.to_string(),
                    to: status.to_string(),
                });
            }
            if status == SubmissionStatus::Approved {
                let complete = patch
                    .approval
                    .as_ref()
                    .or(self.approval.as_ref())
                    .is_some_and(ApprovalInfo::is_complete);
                if !complete {
                    return Err(DomainError::InvalidTransition {
                        from: self.status.to_string(),
                        to: "approved (approval slots incomplete)".to_string(),
                    });
                }
            }
            self.status = status;
        }
        if let Some(ref approval) = patch.approval {
            self.approval = Some(approval.clone());
        }
        if let Some(ref reason) = patch.rejection_reason {
            self.rejection_reason = Some(reason.clone());
        }
        Ok(())
    }
}

/// Partial mutation applied to a submission by administrator actions
///
/// Fields left as `None` are untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPatch {
    pub status: Option<SubmissionStatus>,
    pub approval: Option<ApprovalInfo>,
    pub rejection_reason: Option<String>,
}

impl SubmissionPatch {
    /// Patch setting only the status
    pub fn status(status: SubmissionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Patch recording a rejection with its reason
    pub fn rejection(reason: String) -> Self {
        Self {
            status: Some(SubmissionStatus::Rejected),
            rejection_reason: Some(reason),
            ..Self::default()
        }
    }
}
