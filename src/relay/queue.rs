//! Bounded, time-expiring buffer of deliveries awaiting a poll.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use crate::config::defaults;
use crate::delivery::Delivery;
use crate::time::{Clock, SystemClock};

/// In-memory retention queue, oldest entry first.
///
/// Invariants, checked on every access:
/// - at most `capacity` entries; appending to a full queue evicts the
///   oldest entry first instead of rejecting the new one
/// - no entry whose age (relative to its `received_at`) is at least `ttl`
///
/// Expiry is lazy: every operation sweeps before doing anything else, so
/// no background timer is needed. All operations take the same lock, which
/// makes [`RetentionQueue::drain_all`] an atomic observe-and-clear.
pub struct RetentionQueue {
    entries: Mutex<VecDeque<Delivery>>,
    capacity: usize,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl RetentionQueue {
    /// Creates an empty queue with the default limits (100 entries, 5 minutes)
    /// using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty queue with the default limits and the given clock.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(defaults::QUEUE_CAPACITY)),
            capacity: defaults::QUEUE_CAPACITY,
            ttl: defaults::queue_ttl(),
            clock,
        }
    }

    /// Overrides the capacity and time-to-live.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_limits(mut self, capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        self.capacity = capacity;
        self.ttl = ttl;
        self
    }

    /// Maximum number of retained deliveries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Age at which a delivery expires.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Removes every expired entry, returning how many were removed.
    pub fn expire_sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now)
    }

    /// Appends a delivery at the newest end.
    ///
    /// Sweeps first; if the queue is still full, the oldest entry is evicted
    /// and returned.
    pub fn append(&self, delivery: Delivery) -> Option<Delivery> {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now);

        let evicted = if entries.len() >= self.capacity {
            entries.pop_front()
        } else {
            None
        };

        if let Some(ref old) = evicted {
            tracing::warn!(
                delivery_id = %old.id,
                capacity = self.capacity,
                "Retention queue full, evicted oldest delivery"
            );
        }

        entries.push_back(delivery);
        evicted
    }

    /// Returns every retained delivery, oldest first, and empties the queue.
    pub fn drain_all(&self) -> Vec<Delivery> {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now);
        entries.drain(..).collect()
    }

    /// Returns the number of retained deliveries after sweeping.
    pub fn size(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        self.sweep(&mut entries, now);
        entries.len()
    }

    fn sweep(&self, entries: &mut VecDeque<Delivery>, now: SystemTime) -> usize {
        let before = entries.len();
        // Append order is not arrival order when primary forwarding latency
        // differs between deliveries, so every entry is checked.
        entries.retain(|d| !self.is_expired(d, now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(removed, "Expired deliveries removed from retention queue");
        }
        removed
    }

    fn is_expired(&self, delivery: &Delivery, now: SystemTime) -> bool {
        // Arrival stamps in the future (clock stepped back) count as fresh
        now.duration_since(delivery.received_at)
            .is_ok_and(|age| age >= self.ttl)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Delivery>> {
        // No operation leaves the deque half-modified, so a poisoned lock
        // still guards consistent data.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RetentionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RetentionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetentionQueue")
            .field("len", &self.lock().len())
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
