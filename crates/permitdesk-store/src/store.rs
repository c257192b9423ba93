//! State store bridging the sync engine and the UI
//!
//! The [`StateStore`] is the only component the rendering layer talks to.
//! It subscribes to the engine's three event streams, reduces them into a
//! single [`AppState`] value, gates administrator actions behind the
//! passphrase check, and notifies UI subscribers with fresh state
//! snapshots after every transition.

use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tracing::{debug, info, warn};

use permitdesk_core::admin::AdminGate;
use permitdesk_core::domain::{
    ApprovalInfo, Submission, SubmissionForm, SubmissionId, SubmissionStatus,
};
use permitdesk_sync::engine::SyncEngine;
use permitdesk_sync::SyncError;

use crate::reducer::{reduce, Action, AppState};
use crate::StoreError;

/// Callback receiving a state snapshot after each transition
pub type StateSubscriber = Box<dyn Fn(&AppState) + Send + Sync>;

/// UI-facing state container
pub struct StateStore {
    engine: Arc<SyncEngine>,
    gate: AdminGate,
    state: Mutex<AppState>,
    // Arc-wrapped so dispatch can snapshot the list and release the lock
    // before invoking; a subscriber may register further subscribers.
    subscribers: Mutex<Vec<Arc<dyn Fn(&AppState) + Send + Sync>>>,
}

impl StateStore {
    pub fn new(engine: Arc<SyncEngine>, gate: AdminGate) -> Arc<Self> {
        Arc::new(Self {
            engine,
            gate,
            state: Mutex::new(AppState::default()),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    /// Wire up engine listeners and run engine initialization
    ///
    /// The listeners hold a weak reference so a dropped store does not keep
    /// itself alive through the engine's listener registry.
    pub async fn start(self: &Arc<Self>) {
        info!("Starting state store");
        let weak: Weak<Self> = Arc::downgrade(self);

        let store = weak.clone();
        self.engine.on_data_change(Box::new(move |list: &[Submission]| {
            if let Some(store) = store.upgrade() {
                store.dispatch(Action::SetSubmissions(list.to_vec()));
            }
        }));

        let store = weak.clone();
        self.engine.on_connection_status_change(Box::new(move |status| {
            if let Some(store) = store.upgrade() {
                store.dispatch(Action::SetConnection(status));
            }
        }));

        let store = weak;
        self.engine.on_error(Box::new(move |message: &str| {
            if let Some(store) = store.upgrade() {
                store.dispatch(Action::SetError(Some(message.to_string())));
            }
        }));

        self.engine.initialize().await;
    }

    /// Tear down the engine session
    pub fn shutdown(&self) {
        self.engine.cleanup();
    }

    /// Current state snapshot
    pub fn state(&self) -> AppState {
        self.state.lock().expect("store state lock").clone()
    }

    /// Register a UI subscriber
    pub fn subscribe(&self, subscriber: StateSubscriber) {
        self.subscribers
            .lock()
            .expect("store subscriber lock")
            .push(Arc::from(subscriber));
    }

    /// Reduce one action and notify subscribers with the new snapshot
    pub fn dispatch(&self, action: Action) {
        debug!(?action, "Dispatching action");
        let snapshot = {
            let mut state = self.state.lock().expect("store state lock");
            reduce(&mut state, action);
            state.clone()
        };
        let subscribers = self.subscribers.lock().expect("store subscriber lock").clone();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }

    // ========================================================================
    // Worker actions
    // ========================================================================

    /// Submit a completed wizard form
    ///
    /// The training requirement is checked here, at the submission boundary,
    /// so an incomplete viewing never reaches the engine.
    ///
    /// # Errors
    /// [`StoreError::TrainingIncomplete`] when the safety video has not
    /// been watched for the configured minimum.
    pub async fn submit(&self, form: SubmissionForm) -> Result<Submission, StoreError> {
        let min = self.gate.min_training_watch_secs();
        if !form.training.meets_requirement(min) {
            return Err(StoreError::TrainingIncomplete {
                watched_secs: form.training.watched_secs,
                required_secs: form.training.required_secs.max(min),
            });
        }
        Ok(self.engine.add_submission(form).await)
    }

    /// Submit on behalf of an administrator, skipping the training check
    ///
    /// # Errors
    /// [`StoreError::Unauthorized`] when the passphrase does not permit
    /// the bypass.
    pub async fn submit_with_override(
        &self,
        passphrase: &str,
        form: SubmissionForm,
    ) -> Result<Submission, StoreError> {
        if !self.gate.may_bypass_training(passphrase) {
            return Err(StoreError::Unauthorized);
        }
        info!("Training requirement bypassed by administrator");
        Ok(self.engine.add_submission(form).await)
    }

    /// Re-run connectivity and reconcile on user request
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.run(self.engine.manual_sync()).await
    }

    /// Aggressive refresh that also retries the push subscription
    pub async fn force_refresh(&self) -> Result<(), StoreError> {
        self.run(self.engine.force_sync()).await
    }

    // ========================================================================
    // Administrator actions
    // ========================================================================

    /// Record the safety-manager approval (first stage, stays `Pending`)
    pub async fn approve_safety_manager(
        &self,
        passphrase: &str,
        id: &SubmissionId,
        approver: &str,
    ) -> Result<Submission, StoreError> {
        self.authorize(passphrase)?;
        let mut approval = self.current_approval(id)?;
        approval.approve_safety_manager(approver.to_string(), Utc::now());
        self.run(self.engine.update_submission_status(
            id,
            SubmissionStatus::Pending,
            Some(approval),
            None,
        ))
        .await
    }

    /// Record the department-manager approval, flipping to `Approved`
    pub async fn approve_department_manager(
        &self,
        passphrase: &str,
        id: &SubmissionId,
        approver: &str,
    ) -> Result<Submission, StoreError> {
        self.authorize(passphrase)?;
        let mut approval = self.current_approval(id)?;
        approval
            .approve_department_manager(approver.to_string(), Utc::now())
            .map_err(SyncError::from)?;
        self.run(self.engine.update_submission_status(
            id,
            SubmissionStatus::Approved,
            Some(approval),
            None,
        ))
        .await
    }

    /// Reject a submission with a reason
    pub async fn reject(
        &self,
        passphrase: &str,
        id: &SubmissionId,
        reason: &str,
    ) -> Result<Submission, StoreError> {
        self.authorize(passphrase)?;
        self.run(self.engine.update_submission_status(
            id,
            SubmissionStatus::Rejected,
            None,
            Some(reason.to_string()),
        ))
        .await
    }

    /// Remove a submission entirely
    pub async fn remove(&self, passphrase: &str, id: &SubmissionId) -> Result<(), StoreError> {
        self.authorize(passphrase)?;
        self.engine.delete_submission(id).await;
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn authorize(&self, passphrase: &str) -> Result<(), StoreError> {
        if self.gate.verify(passphrase) {
            Ok(())
        } else {
            warn!("Administrator passphrase check failed");
            Err(StoreError::Unauthorized)
        }
    }

    fn current_approval(&self, id: &SubmissionId) -> Result<ApprovalInfo, StoreError> {
        let submission = self
            .engine
            .submission(id)
            .ok_or_else(|| SyncError::NotFound(id.clone()))?;
        Ok(submission.approval.unwrap_or_default())
    }

    /// Run an engine future, surfacing failures in the visible state too
    async fn run<T>(
        &self,
        operation: impl std::future::Future<Output = Result<T, SyncError>>,
    ) -> Result<T, StoreError> {
        match operation.await {
            Ok(value) => Ok(value),
            Err(err) => {
                self.dispatch(Action::SetError(Some(err.to_string())));
                Err(err.into())
            }
        }
    }
}
