//! Blocking handoff queue for phase notifications.
//!
//! [`BlockingQueue`] pairs one [`Mutex`] with one [`Condvar`]. Producers
//! never block; consumers sleep on the condition until a value is present.
//!
//! # Removal order
//!
//! Values are appended at the back. [`RemovalOrder::Lifo`] (the default)
//! removes from the back as well, so a backlog drains most-recent first.
//! [`RemovalOrder::Fifo`] removes from the front. With one producer and a
//! consumer that keeps up, the two orders are indistinguishable.
//!
//! # Delivery
//!
//! Each value is handed to exactly one receiver. Concurrent receivers
//! split the stream between them; nobody sees every value.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Deserialize;

/// Which end of the queue [`BlockingQueue::receive`] takes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalOrder {
    /// Most recently sent value first.
    #[default]
    Lifo,
    /// Oldest value first.
    Fifo,
}

/// A mutex/condition protected container for single-item handoffs.
///
/// Every [`send`](Self::send) wakes at most one blocked receiver. Every
/// wait re-checks the "non-empty" predicate after waking, so spurious
/// wakeups and values sent before the receiver started waiting are both
/// handled without surfacing to the caller.
#[derive(Debug)]
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
    order: RemovalOrder,
}

impl<T> BlockingQueue<T> {
    /// Create an empty queue with [`RemovalOrder::Lifo`].
    pub fn new() -> Self {
        Self::with_order(RemovalOrder::Lifo)
    }

    /// Create an empty queue with the given removal order.
    pub fn with_order(order: RemovalOrder) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            order,
        }
    }

    /// The removal order this queue was built with.
    pub const fn order(&self) -> RemovalOrder {
        self.order
    }

    /// Append a value and wake one waiting receiver. Never blocks.
    pub fn send(&self, value: T) {
        let mut items = self.lock();
        items.push_back(value);
        self.available.notify_one();
    }

    /// Block until a value is present, then remove and return it.
    pub fn receive(&self) -> T {
        let mut items = self.lock();
        loop {
            if let Some(value) = self.take(&mut items) {
                return value;
            }
            items = self
                .available
                .wait(items)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`receive`](Self::receive) but gives up once `timeout` has
    /// elapsed. Returns `None` on timeout.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.lock();
        loop {
            if let Some(value) = self.take(&mut items) {
                return Some(value);
            }
            let remaining = match deadline {
                Some(deadline) => deadline.checked_duration_since(Instant::now())?,
                // Deadline overflowed `Instant`; treat as unbounded.
                None => Duration::MAX,
            };
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(items, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            items = guard;
        }
    }

    /// Remove a value if one is present, without blocking.
    pub fn try_receive(&self) -> Option<T> {
        let mut items = self.lock();
        self.take(&mut items)
    }

    /// Number of values waiting to be received.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no values are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn take(&self, items: &mut VecDeque<T>) -> Option<T> {
        match self.order {
            RemovalOrder::Lifo => items.pop_back(),
            RemovalOrder::Fifo => items.pop_front(),
        }
    }

    // A panic while holding the lock cannot leave the deque half-updated,
    // so a poisoned guard is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
