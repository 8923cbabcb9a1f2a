//! Cancellation signal for background tasks.
//!
//! [`StopSignal`] is a latch: once requested, a stop stays requested. It
//! doubles as an interruptible sleep, so a task waiting out an interval
//! wakes immediately when stop is requested instead of finishing the wait.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A one-way stop latch with an interruptible wait.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    /// Create a signal with no stop requested.
    pub const fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    /// Request a stop and wake every waiter.
    pub fn request_stop(&self) {
        let mut stopped = self.lock();
        *stopped = true;
        self.changed.notify_all();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        *self.lock()
    }

    /// Sleep until `deadline` or until a stop is requested.
    ///
    /// Returns `true` if the wait ended because of a stop request.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.lock();
        loop {
            if *stopped {
                return true;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            if remaining.is_zero() {
                return false;
            }
            let (guard, _) = self
                .changed
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
