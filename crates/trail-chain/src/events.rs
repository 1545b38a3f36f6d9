//! Best-effort notification of corrupted histories.
//!
//! A [`CorruptionNotifier`] is handed to merge through
//! [`MergeOptions`](crate::MergeOptions). Listener panics are caught and
//! logged; they never reach the merge caller.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

use crate::merge::MergeFailure;

/// What a listener is told about a rejected history.
#[derive(Debug, Clone, PartialEq)]
pub struct CorruptionReport {
    pub failure: MergeFailure,
    /// Number of entries in the candidate union that was rejected.
    pub candidate_len: usize,
}

/// Handle returned by [`CorruptionNotifier::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&CorruptionReport) + Send + Sync>;

struct Registration {
    id: ListenerId,
    once: bool,
    listener: Listener,
}

#[derive(Default)]
pub struct CorruptionNotifier {
    listeners: Mutex<Vec<Registration>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for CorruptionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorruptionNotifier")
            .field("listeners", &self.len())
            .finish()
    }
}

impl CorruptionNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CorruptionReport) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener), false)
    }

    /// Register a listener that is removed after its first delivery.
    pub fn subscribe_once<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CorruptionReport) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener), true)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `report` to every listener. Returns how many returned normally.
    pub fn notify(&self, report: &CorruptionReport) -> usize {
        // Call outside the lock so listeners may (un)subscribe.
        let targets: Vec<Listener> = {
            let mut listeners = self.lock();
            let targets = listeners.iter().map(|r| Arc::clone(&r.listener)).collect();
            listeners.retain(|r| !r.once);
            targets
        };

        let mut delivered = 0;
        for listener in targets {
            match catch_unwind(AssertUnwindSafe(|| listener(report))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(failure = %report.failure, "corruption listener panicked"),
            }
        }
        delivered
    }

    fn register(&self, listener: Listener, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Registration { id, once, listener });
        id
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
