//! Bounded, newest-first event history plus unbounded running totals.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::event::{EventKind, MemoryEvent};

/// Running totals of emitted events.
///
/// Never truncated by the history cap and never decremented; only reset
/// clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Pattern events.
    pub patterns: u64,
    /// Capture events.
    pub episodes: u64,
    /// Directive events.
    pub directives: u64,
    /// Decay warnings.
    pub decayed: u64,
}

impl MemoryStats {
    /// Count one event of `kind`. Recall events are not counted.
    pub fn record(&mut self, kind: EventKind) {
        let slot = match kind {
            EventKind::Capture => &mut self.episodes,
            EventKind::Pattern => &mut self.patterns,
            EventKind::Directive => &mut self.directives,
            EventKind::Decay => &mut self.decayed,
            EventKind::Recall => return,
        };
        *slot = slot.saturating_add(1);
    }

    /// Whether every total is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The visible memory feed.
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    events: VecDeque<MemoryEvent>,
    stats: MemoryStats,
    capacity: usize,
}

impl MemoryFeed {
    /// Empty feed keeping at most `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            stats: MemoryStats::default(),
            capacity,
        }
    }

    /// Prepend `event`, drop the oldest beyond capacity, update stats.
    pub fn push(&mut self, event: MemoryEvent) {
        self.stats.record(event.kind);
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// Events, newest first.
    pub fn events(&self) -> impl Iterator<Item = &MemoryEvent> {
        self.events.iter()
    }

    /// The newest `n` events.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &MemoryEvent> {
        self.events.iter().take(n)
    }

    /// Summaries of the newest `n` events.
    #[must_use]
    pub fn recent_summaries(&self, n: usize) -> Vec<String> {
        self.recent(n).map(MemoryEvent::summary).collect()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Running totals.
    #[must_use]
    pub fn stats(&self) -> MemoryStats {
        self.stats
    }

    /// Replace the running totals (used when restoring a snapshot).
    pub fn restore_stats(&mut self, stats: MemoryStats) {
        self.stats = stats;
    }

    /// Replace the retained history (oldest-last order preserved).
    pub fn restore_events(&mut self, events: Vec<MemoryEvent>) {
        self.events = events.into_iter().take(self.capacity).collect();
    }

    /// Drop every event and zero the stats.
    pub fn clear(&mut self) {
        self.events.clear();
        self.stats = MemoryStats::default();
    }
}
