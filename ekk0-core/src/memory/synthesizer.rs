//! Memory Event Synthesizer.
//!
//! Turns accepted actions and the passage of time into feed events. It reads
//! the creature but never mutates it.
//!
//! Cadence:
//! - every accepted action → one `capture`, immediately;
//! - `total_actions % pattern_every == 0` → one `pattern`, `pattern_delay_ms` later;
//! - `total_actions % directive_every == 0` → one `directive`, `directive_delay_ms` later;
//! - every `decay_warning_interval_secs` of elapsed time, while memory is low
//!   → one `decay` warning.
//!
//! Delayed content is drawn from the RNG at action time and travels with the
//! scheduled draft, so a later state change cannot alter what is emitted.

use rand::Rng;
use rand::seq::SliceRandom;

use super::content::{
    self, CannedLine, DECAY_ICON, DIRECTIVE_ICON, DIRECTIVES, PATTERN_ICON, RECALL_ICON,
};
use super::event::{EventKind, MemoryEvent};
use crate::config::FeedConfig;
use crate::creature::CreatureState;
use crate::types::{ActionKind, Timestamp};

/// Event content captured now and emitted later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDraft {
    /// Event kind.
    pub kind: EventKind,
    /// Icon.
    pub icon: &'static str,
    /// Headline.
    pub title: String,
    /// Detail.
    pub detail: String,
}

impl MemoryDraft {
    /// Stamp the draft into an event at `at`.
    #[must_use]
    pub fn into_event(self, at: Timestamp) -> MemoryEvent {
        MemoryEvent::new(self.kind, self.icon, self.title, self.detail, at)
    }
}

/// Everything one accepted action produces for the feed.
#[derive(Debug, Clone)]
pub struct ActionMemories {
    /// The immediate capture event.
    pub capture: MemoryEvent,
    /// Drafts to release at their due times, in emission order.
    pub deferred: Vec<(Timestamp, MemoryDraft)>,
}

/// The capture event for an action the creature has just performed.
#[must_use]
pub fn capture_event(kind: ActionKind, creature: &CreatureState, now: Timestamp) -> MemoryEvent {
    MemoryEvent::new(
        EventKind::Capture,
        content::capture_icon(kind),
        format!("capture: {kind}"),
        format!("Action logged. {}", creature.summary()),
        now,
    )
}

fn pattern_draft(line: CannedLine) -> MemoryDraft {
    MemoryDraft {
        kind: EventKind::Pattern,
        icon: PATTERN_ICON,
        title: format!("forge: {}", line.title),
        detail: line.detail.to_string(),
    }
}

fn directive_draft(line: CannedLine) -> MemoryDraft {
    MemoryDraft {
        kind: EventKind::Directive,
        icon: DIRECTIVE_ICON,
        title: format!("directive: {}", line.title),
        detail: line.detail.to_string(),
    }
}

fn is_multiple(total: u64, every: u64) -> bool {
    total > 0 && every > 0 && total % every == 0
}

/// Synthesize the feed output of an accepted action.
///
/// `creature` must already reflect the action (effects and counter applied).
pub fn synthesize_action<R: Rng + ?Sized>(
    kind: ActionKind,
    creature: &CreatureState,
    now: Timestamp,
    config: &FeedConfig,
    rng: &mut R,
) -> ActionMemories {
    let capture = capture_event(kind, creature, now);
    let total = creature.total_actions();
    let mut deferred = Vec::new();

    if is_multiple(total, config.pattern_every) {
        if let Some(line) = content::patterns_for(kind).choose(rng) {
            deferred.push((now.plus_millis(config.pattern_delay_ms), pattern_draft(*line)));
        }
    }
    if is_multiple(total, config.directive_every) {
        if let Some(line) = DIRECTIVES.choose(rng) {
            deferred.push((now.plus_millis(config.directive_delay_ms), directive_draft(*line)));
        }
    }

    ActionMemories { capture, deferred }
}

/// The low-memory warning event.
#[must_use]
pub fn decay_event(creature: &CreatureState, now: Timestamp) -> MemoryEvent {
    MemoryEvent::new(
        EventKind::Decay,
        DECAY_ICON,
        "decay: pattern confidence fading",
        format!(
            "Memory at {}%. Unused patterns losing strength.",
            creature.memory_level.round()
        ),
        now,
    )
}

/// The event recorded when a stored snapshot is restored.
#[must_use]
pub fn recall_event(creature: &CreatureState, source: &str, now: Timestamp) -> MemoryEvent {
    MemoryEvent::new(
        EventKind::Recall,
        RECALL_ICON,
        format!("recall: {source} state restored"),
        format!(
            "{} interactions recalled. Stage {} ({}).",
            creature.total_actions(),
            creature.evolution_stage().number(),
            creature.evolution_stage()
        ),
        now,
    )
}

/// Wall-clock cadence for decay warnings.
///
/// Elapsed seconds accumulate across ticks; once the interval is reached the
/// accumulator restarts at zero and memory is checked exactly once, so at most
/// one warning is produced per tick even after a long gap.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayWarningTimer {
    accumulated_secs: f64,
}

impl DecayWarningTimer {
    /// Fresh timer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds accumulated toward the next check.
    #[must_use]
    pub fn accumulated_secs(&self) -> f64 {
        self.accumulated_secs
    }

    /// Account for `elapsed_secs` and return a warning if one is due.
    pub fn advance(
        &mut self,
        elapsed_secs: f64,
        creature: &CreatureState,
        config: &FeedConfig,
        now: Timestamp,
    ) -> Option<MemoryEvent> {
        if !creature.alive {
            return None;
        }
        self.accumulated_secs += elapsed_secs.max(0.0);
        if self.accumulated_secs < config.decay_warning_interval_secs {
            return None;
        }
        self.accumulated_secs = 0.0;
        (creature.memory_level < config.decay_warning_threshold)
            .then(|| decay_event(creature, now))
    }

    /// Restart the cadence.
    pub fn reset(&mut self) {
        self.accumulated_secs = 0.0;
    }
}
