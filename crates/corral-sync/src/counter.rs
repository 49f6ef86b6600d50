//! Linearizable integer counter.

use std::sync::atomic::{AtomicI64, Ordering};

/// A cross-task, cross-thread integer cell with linearizable operations.
///
/// Used by the pool for live-connection accounting, where the
/// reserve-then-act discipline depends on `add` returning the exact
/// post-increment value. All operations use sequentially consistent
/// ordering; arithmetic wrap-around is not a concern at realistic pool
/// sizes.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    value: AtomicI64,
}

impl AtomicCounter {
    /// Create a counter with the given initial value.
    #[must_use]
    pub fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    /// Get the current value.
    #[must_use]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Set the value.
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Atomically add `delta` and return the value after the add.
    pub fn add(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst) + delta
    }

    /// Atomically subtract `delta` and return the value after the subtract.
    pub fn sub(&self, delta: i64) -> i64 {
        self.value.fetch_sub(delta, Ordering::SeqCst) - delta
    }

    /// Atomically increment by one and return the new value.
    pub fn increment(&self) -> i64 {
        self.add(1)
    }

    /// Atomically decrement by one and return the new value.
    pub fn decrement(&self) -> i64 {
        self.sub(1)
    }
}
