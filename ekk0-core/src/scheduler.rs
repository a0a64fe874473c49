//! Virtual-time task queue for deferred emissions.
//!
//! Delayed memory events (patterns ~0.8 s after an action, directives
//! ~1.5 s after) are not timers: they are payloads parked in this queue with
//! a due time and released by the tick that first observes `now >= due_at`.
//! Tests drive the queue with an injected clock instead of sleeping.
//!
//! Ordering: earliest due time first; ties release in scheduling order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::types::Timestamp;

/// A payload waiting for its due time.
#[derive(Debug, Clone)]
pub struct Scheduled<T> {
    /// Monotonic sequence number (tie-breaker).
    pub seq: u64,
    /// When the payload becomes due.
    pub due_at: Timestamp,
    /// The captured payload.
    pub payload: T,
}

// BinaryHeap is a max-heap, so the comparison is reversed: the earliest due
// time (then the smallest sequence number) compares greatest.
impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_at
            .cmp(&self.due_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Statistics about the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Payloads currently waiting.
    pub pending: usize,
    /// Total payloads ever scheduled.
    pub total_scheduled: u64,
    /// Total payloads released.
    pub total_released: u64,
    /// Total payloads dropped by [`DeferredQueue::cancel_all`].
    pub total_cancelled: u64,
}

/// Min-ordered queue of deferred payloads.
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    heap: BinaryHeap<Scheduled<T>>,
    next_seq: u64,
    total_released: u64,
    total_cancelled: u64,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
            total_released: 0,
            total_cancelled: 0,
        }
    }

    /// Park `payload` until `due_at`. Returns its sequence number.
    pub fn schedule(&mut self, due_at: Timestamp, payload: T) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { seq, due_at, payload });
        seq
    }

    /// Remove and return every payload due at or before `now`, in order.
    pub fn drain_due(&mut self, now: Timestamp) -> Vec<Scheduled<T>> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|next| next.due_at <= now) {
            if let Some(item) = self.heap.pop() {
                due.push(item);
            }
        }
        self.total_released += due.len() as u64;
        due
    }

    /// Remove and return every payload regardless of due time, in order.
    pub fn drain_all(&mut self) -> Vec<Scheduled<T>> {
        let mut all = Vec::with_capacity(self.heap.len());
        while let Some(item) = self.heap.pop() {
            all.push(item);
        }
        self.total_released += all.len() as u64;
        all
    }

    /// Drop every pending payload. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.heap.len();
        self.heap.clear();
        self.total_cancelled += dropped as u64;
        dropped
    }

    /// Due time of the next payload, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<Timestamp> {
        self.heap.peek().map(|s| s.due_at)
    }

    /// Number of pending payloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queue statistics.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            pending: self.heap.len(),
            total_scheduled: self.next_seq,
            total_released: self.total_released,
            total_cancelled: self.total_cancelled,
        }
    }
}
