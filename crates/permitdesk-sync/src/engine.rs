//! Client-side synchronization engine
//!
//! The [`SyncEngine`] is the single authoritative source of truth for the
//! submission list during a client session. It reconciles the durable local
//! cache, the hosted document store, and optimistic local edits, and it is
//! the only component permitted to mutate the cache or initiate remote
//! calls.
//!
//! ## Transport tiers
//!
//! Three fallback tiers in order of preference:
//!
//! 1. **Subscribed** - push-based remote change subscription
//! 2. **Polling** - fixed-interval pull (the default transport)
//! 3. **CacheOnly** - local cache reads only
//!
//! A subscription error demotes to polling; an initialization probe failure
//! goes straight to cache-only. Once cache-only, only [`manual_sync`]
//! or [`force_sync`] (explicit user action) promote the engine back.
//!
//! ## Optimistic writes
//!
//! Every mutating operation applies its local change, writes the cache, and
//! emits the data-change event before any remote suspension point. A remote
//! failure never rolls back the local change; it is reported only on the
//! error event stream.
//!
//! [`manual_sync`]: SyncEngine::manual_sync
//! [`force_sync`]: SyncEngine::force_sync

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use permitdesk_cache::snapshot::SnapshotStore;
use permitdesk_core::config::Config;
use permitdesk_core::domain::{
    ApprovalInfo, Submission, SubmissionForm, SubmissionId, SubmissionPatch, SubmissionStatus,
};
use permitdesk_core::ports::{LocalCache, RemoteEvent, RemoteStore, RemoteSubscription};

use crate::events::{DataListener, ErrorListener, ListenerSet, StatusListener};
use crate::SyncError;

// ============================================================================
// Connectivity and transport state
// ============================================================================

/// Connectivity state, owned exclusively by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Initial probe in progress
    #[default]
    Connecting,
    /// Remote store reachable; writes are attempted remotely
    Online,
    /// Remote store unreachable; writes are local-only
    Offline,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Online => write!(f, "online"),
            ConnectionStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Active synchronization transport
///
/// An explicit state machine instead of scattered boolean flags: each
/// variant names which channel, if any, currently delivers remote changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncTransport {
    /// `initialize` has not run (or `cleanup` tore the engine down)
    #[default]
    Uninitialized,
    /// Initial connectivity probe in progress
    Probing,
    /// Push subscription established
    Subscribed,
    /// Fixed-interval pull polling
    Polling,
    /// Local cache only; no remote channel
    CacheOnly,
}

/// Engine construction options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Interval between poll cycles
    pub poll_interval: Duration,
    /// Whether to attempt a push subscription before polling
    pub realtime_enabled: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            realtime_enabled: false,
        }
    }
}

// ============================================================================
// De-duplication
// ============================================================================

/// Collapse records sharing an identifier, keeping the first occurrence
///
/// Governs the authoritative list after every remote read, guarding against
/// duplicate emission from the subscription mechanism and overlapping
/// temporary/confirmed records.
pub fn dedup_submissions(submissions: Vec<Submission>) -> Vec<Submission> {
    let mut seen: HashSet<SubmissionId> = HashSet::with_capacity(submissions.len());
    submissions
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

// ============================================================================
// SyncEngine
// ============================================================================

struct EngineState {
    submissions: Vec<Submission>,
    status: ConnectionStatus,
    transport: SyncTransport,
}

#[derive(Default)]
struct TaskSet {
    poll: Option<JoinHandle<()>>,
    subscription: Option<JoinHandle<()>>,
}

/// Process-wide synchronization singleton
///
/// Constructed once at application start and shared via `Arc`; tests
/// construct fresh instances. The explicit `initialize`/`cleanup` lifecycle
/// replaces construction-time side effects.
pub struct SyncEngine {
    remote: Arc<dyn RemoteStore>,
    snapshot: SnapshotStore,
    options: EngineOptions,
    initialized: AtomicBool,
    state: Mutex<EngineState>,
    listeners: ListenerSet,
    tasks: Mutex<TaskSet>,
}

impl SyncEngine {
    /// Create an engine from the application configuration
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        config: &Config,
    ) -> Arc<Self> {
        Self::with_options(
            remote,
            cache,
            EngineOptions {
                poll_interval: Duration::from_secs(config.sync.poll_interval),
                realtime_enabled: config.sync.realtime_enabled,
            },
        )
    }

    /// Create an engine with explicit options
    pub fn with_options(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        options: EngineOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            remote,
            snapshot: SnapshotStore::new(cache),
            options,
            initialized: AtomicBool::new(false),
            state: Mutex::new(EngineState {
                submissions: Vec::new(),
                status: ConnectionStatus::Connecting,
                transport: SyncTransport::Uninitialized,
            }),
            listeners: ListenerSet::new(),
            tasks: Mutex::new(TaskSet::default()),
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initialize the engine: probe, reconcile, establish a sync channel
    ///
    /// Idempotent: subsequent calls are no-ops once already initialized.
    /// Never returns an error; any failure is reported on the error event
    /// stream, connectivity is forced offline, and a best-effort cache load
    /// is performed so the UI always has something to show.
    pub async fn initialize(self: &Arc<Self>) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("Sync engine already initialized, skipping");
            return;
        }

        info!(
            poll_interval_secs = self.options.poll_interval.as_secs(),
            realtime = self.options.realtime_enabled,
            "Initializing sync engine"
        );
        self.set_status(ConnectionStatus::Connecting);
        self.set_transport(SyncTransport::Probing);

        if let Err(err) = self.try_initialize().await {
            let msg = format!("Initialization failed: {err:#}");
            warn!(%msg);
            self.listeners.emit_error(&msg);
            self.set_status(ConnectionStatus::Offline);
            self.set_transport(SyncTransport::CacheOnly);
            let cached = self.cached_submissions();
            info!(count = cached.len(), "Falling back to cached submissions");
            self.listeners.emit_data(&cached);
        }
    }

    async fn try_initialize(self: &Arc<Self>) -> anyhow::Result<()> {
        self.remote
            .probe()
            .await
            .context("Connectivity probe failed")?;
        self.set_status(ConnectionStatus::Online);

        self.fetch_and_reconcile()
            .await
            .context("Initial fetch failed")?;

        if self.options.realtime_enabled {
            match self.remote.subscribe().await {
                Ok(subscription) => {
                    info!("Push subscription established");
                    self.attach_subscription(subscription);
                    return Ok(());
                }
                Err(err) => {
                    warn!(error = %err, "Subscription unavailable, falling back to polling");
                }
            }
        }
        self.spawn_poll();
        Ok(())
    }

    /// Release the sync channel, cancel the poll timer, clear all listeners
    ///
    /// Safe to call multiple times and from a torn-down UI tree. After
    /// cleanup, no previously-registered callback is ever invoked again.
    pub fn cleanup(&self) {
        info!("Cleaning up sync engine");
        {
            let mut tasks = self.tasks.lock().expect("task lock");
            if let Some(handle) = tasks.poll.take() {
                handle.abort();
            }
            if let Some(handle) = tasks.subscription.take() {
                handle.abort();
            }
        }
        self.listeners.clear();
        self.set_transport(SyncTransport::Uninitialized);
        self.initialized.store(false, Ordering::SeqCst);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Current authoritative list; falls back to a cache load when empty
    ///
    /// Never blocks on a remote call, guaranteeing synchronous access to
    /// last-known-good data.
    pub fn cached_submissions(&self) -> Vec<Submission> {
        let mut state = self.state.lock().expect("engine state lock");
        if state.submissions.is_empty() {
            match self.snapshot.load() {
                Ok(cached) => state.submissions = cached,
                Err(err) => warn!(%err, "Cache load failed, returning empty list"),
            }
        }
        state.submissions.clone()
    }

    /// Look up one submission by id in the authoritative list
    pub fn submission(&self, id: &SubmissionId) -> Option<Submission> {
        let state = self.state.lock().expect("engine state lock");
        state.submissions.iter().find(|s| &s.id == id).cloned()
    }

    /// Current connectivity state
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().expect("engine state lock").status
    }

    /// Current transport tier
    pub fn transport(&self) -> SyncTransport {
        self.state.lock().expect("engine state lock").transport
    }

    /// Timestamp of the last successful cache write, if any
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.snapshot.last_sync()
    }

    // ========================================================================
    // Mutations (optimistic-write guarantee)
    // ========================================================================

    /// Add a submission from a completed wizard form
    ///
    /// The optimistic record (temporary id, `Pending`, current timestamp)
    /// is inserted at the head of the list, cached, and emitted before any
    /// remote call. When online, a remote create is attempted; on success
    /// the temporary record is replaced by one bearing the remote id and
    /// de-duplication is re-run. A remote failure keeps the local record
    /// and is reported only on the error event stream.
    ///
    /// # Returns
    /// The current-best submission: confirmed when the remote create
    /// succeeded, the temporary record otherwise.
    pub async fn add_submission(&self, form: SubmissionForm) -> Submission {
        let submission = Submission::from_form(form);
        info!(id = %submission.id, "Adding submission (optimistic)");

        let mut list = {
            self.state
                .lock()
                .expect("engine state lock")
                .submissions
                .clone()
        };
        list.insert(0, submission.clone());
        self.commit(dedup_submissions(list));

        if self.status() != ConnectionStatus::Online {
            debug!(id = %submission.id, "Offline, deferring remote create");
            return submission;
        }

        match self.remote.create(&submission).await {
            Ok(remote_id) => {
                info!(temp = %submission.id, id = %remote_id, "Remote create confirmed");
                let confirmed = submission.with_id(remote_id);
                let mut list = {
                    self.state
                        .lock()
                        .expect("engine state lock")
                        .submissions
                        .clone()
                };
                match list.iter_mut().find(|s| s.id == submission.id) {
                    Some(slot) => *slot = confirmed.clone(),
                    None => list.insert(0, confirmed.clone()),
                }
                self.commit(dedup_submissions(list));
                confirmed
            }
            Err(err) => {
                let msg = format!("Remote create failed, keeping local record: {err:#}");
                warn!(%msg);
                self.listeners.emit_error(&msg);
                submission
            }
        }
    }

    /// Apply a status mutation to a submission
    ///
    /// The local mutation, cache write, and data-change event all happen
    /// before the remote leg; a remote failure does not roll back the
    /// local change.
    ///
    /// # Errors
    /// - [`SyncError::NotFound`] when the id is not in the authoritative list
    /// - [`SyncError::Domain`] when the patch violates a domain invariant
    ///   (approval ordering, status transition rules)
    pub async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
        approval: Option<ApprovalInfo>,
        rejection_reason: Option<String>,
    ) -> Result<Submission, SyncError> {
        let patch = SubmissionPatch {
            status: Some(status),
            approval,
            rejection_reason,
        };

        let (list, updated) = {
            let mut state = self.state.lock().expect("engine state lock");
            let Some(slot) = state.submissions.iter_mut().find(|s| &s.id == id) else {
                return Err(SyncError::NotFound(id.clone()));
            };
            slot.apply(&patch)?;
            let updated = slot.clone();
            (state.submissions.clone(), updated)
        };
        info!(%id, %status, "Submission status updated locally");
        self.commit(list);

        if self.status() == ConnectionStatus::Online {
            if let Err(err) = self.remote.update(id, &patch).await {
                let msg = format!("Remote update failed for {id}: {err:#}");
                warn!(%msg);
                self.listeners.emit_error(&msg);
            }
        }
        Ok(updated)
    }

    /// Delete a submission everywhere it is cached
    ///
    /// The record is removed from the authoritative list and the cache
    /// immediately; a remote failure does not restore it.
    pub async fn delete_submission(&self, id: &SubmissionId) {
        let (list, removed) = {
            let mut state = self.state.lock().expect("engine state lock");
            let before = state.submissions.len();
            state.submissions.retain(|s| &s.id != id);
            let removed = state.submissions.len() != before;
            (state.submissions.clone(), removed)
        };
        if !removed {
            debug!(%id, "Delete for unknown submission, nothing to remove locally");
        } else {
            info!(%id, "Submission removed locally");
        }
        self.commit(list);

        if self.status() == ConnectionStatus::Online {
            if let Err(err) = self.remote.delete(id).await {
                let msg = format!("Remote delete failed for {id}: {err:#}");
                warn!(%msg);
                self.listeners.emit_error(&msg);
            }
        }
    }

    // ========================================================================
    // User-initiated syncs
    // ========================================================================

    /// Force an immediate connectivity probe and reconcile
    ///
    /// Unlike the mutating operations, this is a user-initiated action
    /// expecting explicit feedback, so failures are returned to the caller.
    ///
    /// # Errors
    /// [`SyncError::Unreachable`] when the probe fails;
    /// [`SyncError::Unavailable`] when the subsequent fetch fails.
    pub async fn manual_sync(self: &Arc<Self>) -> Result<(), SyncError> {
        info!("Manual sync requested");
        if let Err(err) = self.remote.probe().await {
            let msg = format!("{err:#}");
            self.listeners.emit_error(&msg);
            self.set_status(ConnectionStatus::Offline);
            return Err(SyncError::Unreachable(msg));
        }

        self.set_status(ConnectionStatus::Online);
        match self.fetch_and_reconcile().await {
            Ok(count) => {
                info!(count, "Manual sync reconciled");
                // Promote out of cache-only: restart the poll channel.
                if matches!(
                    self.transport(),
                    SyncTransport::CacheOnly
                        | SyncTransport::Uninitialized
                        | SyncTransport::Probing
                ) {
                    self.spawn_poll();
                }
                Ok(())
            }
            Err(err) => {
                let msg = format!("{err:#}");
                self.listeners.emit_error(&msg);
                Err(SyncError::Unavailable(msg))
            }
        }
    }

    /// Manual sync that also tries to re-establish a broken subscription
    ///
    /// # Errors
    /// [`SyncError::Unavailable`] only when neither the resubscription nor
    /// the reconcile succeeded and no subscription is active.
    pub async fn force_sync(self: &Arc<Self>) -> Result<(), SyncError> {
        info!("Force sync requested");
        let mut resubscribed = false;
        if self.options.realtime_enabled && self.transport() != SyncTransport::Subscribed {
            match self.remote.subscribe().await {
                Ok(subscription) => {
                    info!("Push subscription re-established");
                    self.attach_subscription(subscription);
                    resubscribed = true;
                }
                Err(err) => debug!(error = %err, "Resubscription attempt failed"),
            }
        }

        match self.manual_sync().await {
            Ok(()) => Ok(()),
            Err(err) if resubscribed || self.transport() == SyncTransport::Subscribed => {
                warn!(%err, "Reconcile failed but a subscription is active");
                Ok(())
            }
            Err(err) => Err(SyncError::Unavailable(err.to_string())),
        }
    }

    // ========================================================================
    // Event registration
    // ========================================================================

    /// Register a data-change listener
    pub fn on_data_change(&self, listener: DataListener) {
        self.listeners.on_data_change(listener);
    }

    /// Register a connection-status listener
    pub fn on_connection_status_change(&self, listener: StatusListener) {
        self.listeners.on_connection_status_change(listener);
    }

    /// Register an error listener
    pub fn on_error(&self, listener: ErrorListener) {
        self.listeners.on_error(listener);
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Replace the authoritative list, write the cache, emit the change
    ///
    /// The in-memory update and cache write are synchronous; listeners run
    /// after the lock is released so a callback may re-enter the engine.
    fn commit(&self, submissions: Vec<Submission>) {
        {
            let mut state = self.state.lock().expect("engine state lock");
            state.submissions = submissions.clone();
        }
        if let Err(err) = self.snapshot.store(&submissions) {
            warn!(%err, "Failed to write cache snapshot");
        }
        self.listeners.emit_data(&submissions);
    }

    async fn fetch_and_reconcile(&self) -> anyhow::Result<usize> {
        let fetched = self
            .remote
            .fetch_all()
            .await
            .context("Failed to fetch submissions")?;
        let list = dedup_submissions(fetched);
        let count = list.len();
        self.commit(list);
        debug!(count, "Reconciled remote submissions");
        Ok(count)
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = {
            let mut state = self.state.lock().expect("engine state lock");
            let changed = state.status != status;
            state.status = status;
            changed
        };
        if changed {
            info!(%status, "Connection status changed");
            self.listeners.emit_status(status);
        }
    }

    fn set_transport(&self, transport: SyncTransport) {
        let mut state = self.state.lock().expect("engine state lock");
        if state.transport != transport {
            debug!(?transport, "Sync transport changed");
            state.transport = transport;
        }
    }

    /// Start (or restart) the fixed-interval poll channel
    fn spawn_poll(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let poll_interval = self.options.poll_interval.max(Duration::from_millis(1));
        {
            let mut tasks = self.tasks.lock().expect("task lock");
            if let Some(old) = tasks.poll.take() {
                old.abort();
            }
            tasks.poll = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(poll_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick fires immediately; the caller just reconciled.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let Some(engine) = weak.upgrade() else { break };
                    engine.poll_cycle().await;
                }
            }));
        }
        self.set_transport(SyncTransport::Polling);
    }

    /// One poll cycle: fetch when online, otherwise retry the probe
    async fn poll_cycle(&self) {
        if self.status() != ConnectionStatus::Online {
            if self.remote.probe().await.is_ok() {
                info!("Connectivity restored by poll cycle");
                self.set_status(ConnectionStatus::Online);
                if let Err(err) = self.fetch_and_reconcile().await {
                    let msg = format!("Reconcile after reconnect failed: {err:#}");
                    warn!(%msg);
                    self.listeners.emit_error(&msg);
                }
            }
            return;
        }

        if let Err(err) = self.fetch_and_reconcile().await {
            let msg = format!("Periodic fetch failed: {err:#}");
            warn!(%msg);
            self.listeners.emit_error(&msg);
            if self.remote.probe().await.is_err() {
                self.set_status(ConnectionStatus::Offline);
            }
        }
    }

    /// Attach a push subscription, replacing any poll channel
    fn attach_subscription(self: &Arc<Self>, subscription: RemoteSubscription) {
        let weak = Arc::downgrade(self);
        let mut events = subscription.events;
        {
            let mut tasks = self.tasks.lock().expect("task lock");
            if let Some(old) = tasks.poll.take() {
                old.abort();
            }
            if let Some(old) = tasks.subscription.take() {
                old.abort();
            }
            tasks.subscription = Some(tokio::spawn(async move {
                loop {
                    let Some(event) = events.recv().await else {
                        // Sender dropped without an error event. The channel
                        // is just as dead as after an explicit error, so the
                        // same demotion applies.
                        if let Some(engine) = weak.upgrade() {
                            warn!("Subscription channel closed, demoting to polling");
                            engine.spawn_poll();
                        }
                        break;
                    };
                    let Some(engine) = weak.upgrade() else { break };
                    match event {
                        RemoteEvent::Changed(list) => {
                            debug!(count = list.len(), "Subscription pushed a change");
                            engine.commit(dedup_submissions(list));
                        }
                        RemoteEvent::Error(msg) => {
                            warn!(%msg, "Subscription reported an error, demoting to polling");
                            engine.listeners.emit_error(&msg);
                            engine.spawn_poll();
                            break;
                        }
                    }
                }
            }));
        }
        self.set_transport(SyncTransport::Subscribed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Submission {
        Submission::from_form(SubmissionForm::default())
            .with_id(SubmissionId::new(id.to_string()).unwrap())
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let list = vec![sample("a"), sample("b"), sample("a"), sample("c"), sample("b")];
        let first_a = list[0].submitted_at;

        let deduped = dedup_submissions(list);
        let ids: Vec<&str> = deduped.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(deduped[0].submitted_at, first_a);
    }

    #[test]
    fn test_dedup_length_equals_distinct_ids() {
        let list = vec![sample("x"), sample("x"), sample("x")];
        assert_eq!(dedup_submissions(list).len(), 1);

        let list = vec![sample("x"), sample("y")];
        assert_eq!(dedup_submissions(list).len(), 2);

        assert!(dedup_submissions(Vec::new()).is_empty());
    }

    #[test]
    fn test_connection_status_display() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "connecting");
        assert_eq!(ConnectionStatus::Online.to_string(), "online");
        assert_eq!(ConnectionStatus::Offline.to_string(), "offline");
    }

    #[test]
    fn test_default_options() {
        let options = EngineOptions::default();
        assert_eq!(options.poll_interval, Duration::from_secs(30));
        assert!(!options.realtime_enabled);
    }
}
