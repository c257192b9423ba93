//! Form-section records collected by the submission wizard
//!
//! Each struct corresponds to one step of the seven-step wizard. These are
//! plain data records: the wizard UI that fills them is an external
//! collaborator, but the records travel through the sync engine, the cache
//! snapshot, and the remote store, so they live in the domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Step 1: Project information
// ============================================================================

/// Basic project and contractor information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Name of the construction project
    pub project_name: String,
    /// Contracting company performing the work
    pub contractor: String,
    /// On-site representative responsible for the work
    pub representative: String,
    /// Contact phone number for the representative
    pub contact_phone: String,
    /// Location of the work within the site
    pub work_location: String,
    /// Planned start of the work period
    pub period_start: Option<DateTime<Utc>>,
    /// Planned end of the work period
    pub period_end: Option<DateTime<Utc>>,
}

// ============================================================================
// Step 2: Work-type selection
// ============================================================================

/// Categories of hazardous work requiring a permit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    /// Hot work: welding, cutting, grinding
    FireWork,
    /// Entry into tanks, pits, or other confined spaces
    ConfinedSpace,
    /// Work at height (scaffolding, roofs, ladders above 2m)
    HeightWork,
    /// Electrical installation or live-line work
    Electrical,
    /// Excavation and trenching
    Excavation,
    /// Crane and lifting operations
    Lifting,
    /// Any other work type, described in `WorkTypeSelection::other_detail`
    Other,
}

/// Work types selected for this permit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkTypeSelection {
    /// Selected categories (at least one for a valid submission)
    pub categories: Vec<WorkCategory>,
    /// Free-text description when `Other` is selected
    pub other_detail: Option<String>,
}

impl WorkTypeSelection {
    /// Returns true if at least one category is selected
    pub fn is_complete(&self) -> bool {
        !self.categories.is_empty()
    }
}

// ============================================================================
// Step 3: Safety-training record
// ============================================================================

/// Record of the mandatory video-based safety training
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// Title of the training video that was watched
    pub video_title: String,
    /// Seconds of the video actually watched
    pub watched_secs: u32,
    /// Seconds the worker is required to watch
    pub required_secs: u32,
    /// When the training was completed
    ///
    /// `None` when the training has not been completed, or when the cached
    /// value could not be parsed (the snapshot decoder is lenient here).
    pub completed_at: Option<DateTime<Utc>>,
}

impl TrainingRecord {
    /// Returns true if a completion timestamp has been recorded
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns true if the watched time satisfies the minimum requirement
    ///
    /// Administrators may bypass this check via the admin gate; the record
    /// itself only reports whether the requirement was actually met.
    pub fn meets_requirement(&self, min_watch_secs: u32) -> bool {
        self.watched_secs >= self.required_secs.max(min_watch_secs)
    }
}

// ============================================================================
// Step 4: Risk assessment
// ============================================================================

/// Risk grade bands over the 5x5 likelihood/severity matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskGrade {
    /// Score 1-4
    Low,
    /// Score 5-9
    Moderate,
    /// Score 10-15
    High,
    /// Score 16-25
    Critical,
}

/// A single identified hazard with its rating and control measures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskItem {
    /// Description of the hazard
    pub hazard: String,
    /// Likelihood of occurrence, 1 (rare) to 5 (almost certain)
    pub likelihood: u8,
    /// Severity of consequence, 1 (negligible) to 5 (catastrophic)
    pub severity: u8,
    /// Planned control measures for this hazard
    pub controls: String,
}

impl RiskItem {
    /// Create a risk item, validating the 1-5 rating range
    ///
    /// # Errors
    /// Returns `DomainError::InvalidRiskRating` when likelihood or severity
    /// is outside 1-5.
    pub fn new(
        hazard: String,
        likelihood: u8,
        severity: u8,
        controls: String,
    ) -> Result<Self, DomainError> {
        if !(1..=5).contains(&likelihood) {
            return Err(DomainError::InvalidRiskRating(format!(
                "likelihood must be 1-5, got {likelihood}"
            )));
        }
        if !(1..=5).contains(&severity) {
            return Err(DomainError::InvalidRiskRating(format!(
                "severity must be 1-5, got {severity}"
            )));
        }
        Ok(Self {
            hazard,
            likelihood,
            severity,
            controls,
        })
    }

    /// Risk score: likelihood x severity (1-25)
    pub fn score(&self) -> u8 {
        self.likelihood * self.severity
    }

    /// Grade band for this item's score
    pub fn grade(&self) -> RiskGrade {
        match self.score() {
            1..=4 => RiskGrade::Low,
            5..=9 => RiskGrade::Moderate,
            10..=15 => RiskGrade::High,
            _ => RiskGrade::Critical,
        }
    }
}

/// Highest grade across an ordered list of risk items
///
/// Returns `None` for an empty assessment.
pub fn highest_grade(items: &[RiskItem]) -> Option<RiskGrade> {
    items.iter().map(RiskItem::grade).max()
}

// ============================================================================
// Step 5: Work permit detail
// ============================================================================

/// Detailed work-permit fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPermitDetail {
    /// Permit number assigned by site administration (if already issued)
    pub permit_number: Option<String>,
    /// Description of the work to be performed
    pub work_description: String,
    /// Equipment and tools to be used
    pub equipment: Vec<String>,
    /// Number of workers involved
    pub worker_count: u32,
    /// Site-specific precautions for this permit
    pub precautions: String,
}

// ============================================================================
// Step 6: Safety pledge
// ============================================================================

/// Worker's safety pledge with captured signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyPledge {
    /// Name of the person making the pledge
    pub pledged_by: String,
    /// Whether the pledge text was agreed to
    pub agreed: bool,
    /// Signature image data from the capture widget (base64, opaque here)
    pub signature_data: Option<String>,
    /// When the pledge was made
    pub pledged_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Completed wizard output
// ============================================================================

/// All form sections a completed wizard produces
///
/// This is the payload of `SyncEngine::add_submission`; the engine wraps it
/// into a [`Submission`](super::submission::Submission) with a temporary id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    pub project: ProjectInfo,
    pub work_types: WorkTypeSelection,
    pub training: TrainingRecord,
    pub risks: Vec<RiskItem>,
    pub permit: WorkPermitDetail,
    pub pledge: SafetyPledge,
}
