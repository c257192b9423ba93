//! Application state and the reducer advancing it
//!
//! State transitions are expressed as a pure function over (state, action)
//! so they can be tested without an engine or a runtime. The store owns the
//! single [`AppState`] value and funnels every change through [`reduce`].

use chrono::{DateTime, Utc};
use tracing::debug;

use permitdesk_core::domain::{Submission, SubmissionId, SubmissionPatch};
use permitdesk_sync::engine::ConnectionStatus;

/// Snapshot of everything the UI renders
#[derive(Debug, Clone)]
pub struct AppState {
    /// Authoritative submission list, newest first
    pub submissions: Vec<Submission>,
    /// True until the first full list arrives
    pub loading: bool,
    /// Last error message shown to the user, if any
    pub error: Option<String>,
    /// Current connectivity state
    pub connection: ConnectionStatus,
    /// When the list last changed, if it has
    pub last_sync: Option<DateTime<Utc>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            submissions: Vec::new(),
            loading: true,
            error: None,
            connection: ConnectionStatus::Connecting,
            last_sync: None,
        }
    }
}

/// One state transition
#[derive(Debug)]
pub enum Action {
    /// Replace the whole list (engine reconcile or fallback load)
    SetSubmissions(Vec<Submission>),
    /// Prepend one submission (optimistic add)
    AddSubmission(Submission),
    /// Merge a patch into the submission with the given id
    UpdateSubmission {
        id: SubmissionId,
        patch: SubmissionPatch,
    },
    /// Drop the submission with the given id
    RemoveSubmission(SubmissionId),
    /// Toggle the loading flag
    SetLoading(bool),
    /// Set or clear the visible error message
    SetError(Option<String>),
    /// Record a connectivity transition
    SetConnection(ConnectionStatus),
}

/// Advance the state by one action
///
/// `SetSubmissions` is the only action that clears the loading flag: the
/// UI stays in its loading state until a full list has arrived at least
/// once, regardless of how many incremental actions land before it.
pub fn reduce(state: &mut AppState, action: Action) {
    match action {
        Action::SetSubmissions(submissions) => {
            debug!(count = submissions.len(), "Reducer: set submissions");
            state.submissions = submissions;
            state.loading = false;
            state.last_sync = Some(Utc::now());
        }
        Action::AddSubmission(submission) => {
            state.submissions.insert(0, submission);
            state.last_sync = Some(Utc::now());
        }
        Action::UpdateSubmission { id, patch } => {
            match state.submissions.iter_mut().find(|s| s.id == id) {
                Some(slot) => {
                    if let Err(err) = slot.apply(&patch) {
                        debug!(%id, %err, "Reducer: patch rejected by domain rules");
                    } else {
                        state.last_sync = Some(Utc::now());
                    }
                }
                None => debug!(%id, "Reducer: update for unknown submission ignored"),
            }
        }
        Action::RemoveSubmission(id) => {
            state.submissions.retain(|s| s.id != id);
            state.last_sync = Some(Utc::now());
        }
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetError(error) => state.error = error,
        Action::SetConnection(connection) => state.connection = connection,
    }
}
