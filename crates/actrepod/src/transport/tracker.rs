//! Accounting for in-flight connection workers.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Shared count of running connection workers.
///
/// The accept loop calls [`register`](Self::register) before spawning a
/// worker and moves the returned guard into it; dropping the guard on any
/// exit path, a panic included, releases the slot. Shutdown uses
/// [`wait_idle`](Self::wait_idle) to let in-flight connections finish.
#[derive(Debug, Clone, Default)]
pub struct WorkerTracker {
    inner: Arc<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    active: Mutex<usize>,
    idle: Condvar,
}

/// Keeps one worker registered until dropped.
#[derive(Debug)]
pub struct WorkerGuard {
    inner: Arc<TrackerState>,
}

impl WorkerTracker {
    /// Creates a tracker with no registered workers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a worker.
    #[must_use]
    pub fn register(&self) -> WorkerGuard {
        *self.inner.lock() += 1;
        WorkerGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Number of registered workers.
    #[must_use]
    pub fn active(&self) -> usize {
        *self.inner.lock()
    }

    /// Blocks until no worker is registered or `timeout` elapses.
    ///
    /// Returns the number of workers still running.
    pub fn wait_idle(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut active = self.inner.lock();
        while *active > 0 {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            let (guard, _) = self
                .inner
                .idle
                .wait_timeout(active, left)
                .unwrap_or_else(PoisonError::into_inner);
            active = guard;
        }
        *active
    }
}

impl TrackerState {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WorkerGuard {
    fn drop(&mut self) {
        let mut active = self.inner.lock();
        *active = active.saturating_sub(1);
        if *active == 0 {
            self.inner.idle.notify_all();
        }
    }
}
