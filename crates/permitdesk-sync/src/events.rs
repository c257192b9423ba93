//! Listener registry and event dispatch
//!
//! The engine emits three event streams: data changes, connection-status
//! changes, and errors. Callbacks are invoked synchronously, in
//! registration order, from the engine method that produced the change.
//! Each invocation is isolated: a panicking callback is caught and logged
//! so subsequent callbacks still run. The registry lock is released before
//! dispatch, so a callback may register further listeners.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tracing::warn;

use permitdesk_core::domain::Submission;

use crate::engine::ConnectionStatus;

/// Callback observing changes to the authoritative submission list
pub type DataListener = Box<dyn Fn(&[Submission]) + Send + Sync>;

/// Callback observing connectivity transitions
pub type StatusListener = Box<dyn Fn(ConnectionStatus) + Send + Sync>;

/// Callback observing errors from any engine operation
pub type ErrorListener = Box<dyn Fn(&str) + Send + Sync>;

/// Registry for the engine's three event streams
///
/// Listeners are stored behind `Arc` so each emit can snapshot the list
/// and release the registry lock before invoking anything; a callback
/// that re-enters the registry never deadlocks.
#[derive(Default)]
pub struct ListenerSet {
    data: Mutex<Vec<Arc<dyn Fn(&[Submission]) + Send + Sync>>>,
    status: Mutex<Vec<Arc<dyn Fn(ConnectionStatus) + Send + Sync>>>,
    error: Mutex<Vec<Arc<dyn Fn(&str) + Send + Sync>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a data-change listener
    pub fn on_data_change(&self, listener: DataListener) {
        self.data
            .lock()
            .expect("listener lock")
            .push(Arc::from(listener));
    }

    /// Append a connection-status listener
    pub fn on_connection_status_change(&self, listener: StatusListener) {
        self.status
            .lock()
            .expect("listener lock")
            .push(Arc::from(listener));
    }

    /// Append an error listener
    pub fn on_error(&self, listener: ErrorListener) {
        self.error
            .lock()
            .expect("listener lock")
            .push(Arc::from(listener));
    }

    /// Invoke all data listeners with the current list
    pub fn emit_data(&self, submissions: &[Submission]) {
        let listeners = self.data.lock().expect("listener lock").clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(submissions))).is_err() {
                warn!("Data-change listener panicked, continuing with remaining listeners");
            }
        }
    }

    /// Invoke all status listeners with the new status
    pub fn emit_status(&self, status: ConnectionStatus) {
        let listeners = self.status.lock().expect("listener lock").clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(status))).is_err() {
                warn!("Status listener panicked, continuing with remaining listeners");
            }
        }
    }

    /// Invoke all error listeners with the error message
    pub fn emit_error(&self, message: &str) {
        let listeners = self.error.lock().expect("listener lock").clone();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(message))).is_err() {
                warn!("Error listener panicked, continuing with remaining listeners");
            }
        }
    }

    /// Drop every registered listener
    pub fn clear(&self) {
        self.data.lock().expect("listener lock").clear();
        self.status.lock().expect("listener lock").clear();
        self.error.lock().expect("listener lock").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_run_in_registration_order() {
        let set = ListenerSet::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = order.clone();
            set.on_error(Box::new(move |_| {
                order.lock().unwrap().push(tag);
            }));
        }

        set.emit_error("boom");
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_later_ones() {
        let set = ListenerSet::new();
        let calls = Arc::new(AtomicU32::new(0));

        set.on_data_change(Box::new(|_| panic!("bad listener")));
        let counter = calls.clone();
        set.on_data_change(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        set.emit_data(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_register_another_listener() {
        let set = Arc::new(ListenerSet::new());
        let inner_calls = Arc::new(AtomicU32::new(0));

        let registry = set.clone();
        let counter = inner_calls.clone();
        set.on_error(Box::new(move |_| {
            let counter = counter.clone();
            registry.on_error(Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        // First emit registers the inner listener; second emit runs it.
        set.emit_error("first");
        assert_eq!(inner_calls.load(Ordering::SeqCst), 0);
        set.emit_error("second");
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clear_removes_all_listeners() {
        let set = ListenerSet::new();
        let calls = Arc::new(AtomicU32::new(0));

        let counter = calls.clone();
        set.on_error(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let counter = calls.clone();
        set.on_connection_status_change(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        set.clear();
        set.emit_error("boom");
        set.emit_status(ConnectionStatus::Offline);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
