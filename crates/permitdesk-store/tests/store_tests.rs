//! Integration tests for the state store over a stub remote

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use permitdesk_cache::kv::MemoryCache;
use permitdesk_core::admin::AdminGate;
use permitdesk_core::config::AdminConfig;
use permitdesk_core::domain::{
    Submission, SubmissionForm, SubmissionId, SubmissionPatch, SubmissionStatus, TrainingRecord,
};
use permitdesk_core::ports::{LocalCache, RemoteStore, RemoteSubscription};
use permitdesk_store::reducer::Action;
use permitdesk_store::store::StateStore;
use permitdesk_store::StoreError;
use permitdesk_sync::engine::{ConnectionStatus, EngineOptions, SyncEngine};
use permitdesk_sync::SyncError;

const PASSPHRASE: &str = "site-safety-2024";

// ============================================================================
// Stub remote
// ============================================================================

struct StubRemote {
    documents: Mutex<Vec<Submission>>,
    next_id: AtomicU32,
}

impl StubRemote {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            documents: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(1),
        })
    }
}

#[async_trait]
impl RemoteStore for StubRemote {
    async fn probe(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn fetch_all(&self) -> anyhow::Result<Vec<Submission>> {
        Ok(self.documents.lock().unwrap().clone())
    }

    async fn create(&self, submission: &Submission) -> anyhow::Result<SubmissionId> {
        let id = SubmissionId::new(format!(
            "doc-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst)
        ))?;
        self.documents
            .lock()
            .unwrap()
            .push(submission.with_id(id.clone()));
        Ok(id)
    }

    async fn update(&self, id: &SubmissionId, patch: &SubmissionPatch) -> anyhow::Result<()> {
        let mut documents = self.documents.lock().unwrap();
        if let Some(slot) = documents.iter_mut().find(|s| &s.id == id) {
            slot.apply(patch)?;
        }
        Ok(())
    }

    async fn delete(&self, id: &SubmissionId) -> anyhow::Result<()> {
        self.documents.lock().unwrap().retain(|s| &s.id != id);
        Ok(())
    }

    async fn subscribe(&self) -> anyhow::Result<RemoteSubscription> {
        anyhow::bail!("no push channel in the stub")
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn gate() -> AdminGate {
    AdminGate::from_config(&AdminConfig {
        passphrase: Some(PASSPHRASE.to_string()),
        min_training_watch_secs: 300,
    })
}

async fn started_store() -> Arc<StateStore> {
    let remote = StubRemote::new();
    let cache: Arc<dyn LocalCache> = Arc::new(MemoryCache::new());
    let engine = SyncEngine::with_options(
        remote,
        cache,
        EngineOptions {
            poll_interval: Duration::from_secs(600),
            realtime_enabled: false,
        },
    );
    let store = StateStore::new(engine, gate());
    store.start().await;
    store
}

fn compliant_form() -> SubmissionForm {
    SubmissionForm {
        training: TrainingRecord {
            video_title: "Confined space entry".to_string(),
            watched_secs: 360,
            required_secs: 300,
            completed_at: Some(Utc::now()),
        },
        ..SubmissionForm::default()
    }
}

// ============================================================================
// Engine events into state
// ============================================================================

#[tokio::test]
async fn test_start_populates_state_and_clears_loading() {
    let store = started_store().await;
    let state = store.state();
    assert!(!state.loading);
    assert_eq!(state.connection, ConnectionStatus::Online);
    assert!(state.submissions.is_empty());
    assert!(state.last_sync.is_some());
}

#[tokio::test]
async fn test_submit_reaches_state_through_engine_events() {
    let store = started_store().await;

    let notifications = Arc::new(AtomicU32::new(0));
    let counter = notifications.clone();
    store.subscribe(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let submission = store.submit(compliant_form()).await.unwrap();
    assert!(!submission.id.is_temporary());

    let state = store.state();
    assert_eq!(state.submissions.len(), 1);
    assert_eq!(state.submissions[0].id, submission.id);
    // Optimistic insert plus the confirmed-id replacement.
    assert_eq!(notifications.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_subscriber_may_register_another_subscriber() {
    let store = started_store().await;

    let inner_calls = Arc::new(AtomicU32::new(0));
    let weak = Arc::downgrade(&store);
    let counter = inner_calls.clone();
    store.subscribe(Box::new(move |_| {
        if let Some(store) = weak.upgrade() {
            let counter = counter.clone();
            store.subscribe(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
    }));

    // First dispatch registers the inner subscriber; second dispatch runs it.
    store.dispatch(Action::SetLoading(true));
    assert_eq!(inner_calls.load(Ordering::SeqCst), 0);
    store.dispatch(Action::SetLoading(false));
    assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Training requirement
// ============================================================================

#[tokio::test]
async fn test_submit_rejects_incomplete_training() {
    let store = started_store().await;

    let mut form = compliant_form();
    form.training.watched_secs = 120;

    let err = store.submit(form).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::TrainingIncomplete {
            watched_secs: 120,
            required_secs: 300,
        }
    ));
    assert!(store.state().submissions.is_empty());
}

#[tokio::test]
async fn test_admin_override_skips_training_check() {
    let store = started_store().await;

    let mut form = compliant_form();
    form.training.watched_secs = 0;

    assert!(matches!(
        store.submit_with_override("wrong", form.clone()).await,
        Err(StoreError::Unauthorized)
    ));

    let submission = store.submit_with_override(PASSPHRASE, form).await.unwrap();
    assert_eq!(store.state().submissions[0].id, submission.id);
}

// ============================================================================
// Administrator gate
// ============================================================================

#[tokio::test]
async fn test_wrong_passphrase_is_unauthorized() {
    let store = started_store().await;
    let submission = store.submit(compliant_form()).await.unwrap();

    let err = store
        .reject("letmein", &submission.id, "nope")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Unauthorized));
    assert_eq!(store.state().submissions[0].status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn test_two_stage_approval_flow() {
    let store = started_store().await;
    let submission = store.submit(compliant_form()).await.unwrap();

    let after_safety = store
        .approve_safety_manager(PASSPHRASE, &submission.id, "Safety Kim")
        .await
        .unwrap();
    assert_eq!(after_safety.status, SubmissionStatus::Pending);
    assert!(after_safety.approval.as_ref().unwrap().safety_manager.is_some());

    let approved = store
        .approve_department_manager(PASSPHRASE, &submission.id, "Manager Lee")
        .await
        .unwrap();
    assert_eq!(approved.status, SubmissionStatus::Approved);
    assert!(approved.approval.as_ref().unwrap().is_complete());

    assert_eq!(
        store.state().submissions[0].status,
        SubmissionStatus::Approved
    );
}

#[tokio::test]
async fn test_department_manager_cannot_approve_first() {
    let store = started_store().await;
    let submission = store.submit(compliant_form()).await.unwrap();

    let err = store
        .approve_department_manager(PASSPHRASE, &submission.id, "Manager Lee")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Sync(SyncError::Domain(_))));
    assert_eq!(store.state().submissions[0].status, SubmissionStatus::Pending);
}

#[tokio::test]
async fn test_rejection_and_removal() {
    let store = started_store().await;
    let submission = store.submit(compliant_form()).await.unwrap();

    let rejected = store
        .reject(PASSPHRASE, &submission.id, "expired permit")
        .await
        .unwrap();
    assert_eq!(rejected.status, SubmissionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("expired permit"));

    store.remove(PASSPHRASE, &submission.id).await.unwrap();
    assert!(store.state().submissions.is_empty());
}

// ============================================================================
// Error surfacing
// ============================================================================

#[tokio::test]
async fn test_failed_action_lands_in_visible_state() {
    let store = started_store().await;

    let ghost = SubmissionId::new("doc-404".to_string()).unwrap();
    let err = store
        .reject(PASSPHRASE, &ghost, "no such record")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Sync(SyncError::NotFound(_))));

    let state = store.state();
    assert!(state.error.as_deref().unwrap().contains("doc-404"));
}
