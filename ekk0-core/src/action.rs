//! Action Processor — the four player commands and their lockout window.
//!
//! | action | hunger | happiness | energy | memory | mood     |
//! |--------|--------|-----------|--------|--------|----------|
//! | feed   | +25    |           | +5     |        | eating   |
//! | play   | −5     | +20       | −10    |        | happy    |
//! | sleep  |        | +5        | +35    |        | sleeping |
//! | learn  | −3     |           | −8     | +15    | learning |
//!
//! Requests while dead or while another action is in progress are dropped
//! without an error; the UI is expected to disable its controls, but the
//! core re-checks anyway.

use serde::{Deserialize, Serialize};

use crate::creature::{CreatureState, Gauge};
use crate::types::ActionKind;

/// Gauge deltas for one action kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionEffect {
    /// Fuel delta.
    pub hunger: f64,
    /// Happiness delta.
    pub happiness: f64,
    /// Energy delta.
    pub energy: f64,
    /// Memory delta.
    pub memory: f64,
}

impl ActionEffect {
    /// The fixed effect table.
    #[must_use]
    pub fn for_kind(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Feed => Self { hunger: 25.0, happiness: 0.0, energy: 5.0, memory: 0.0 },
            ActionKind::Play => Self { hunger: -5.0, happiness: 20.0, energy: -10.0, memory: 0.0 },
            ActionKind::Sleep => Self { hunger: 0.0, happiness: 5.0, energy: 35.0, memory: 0.0 },
            ActionKind::Learn => Self { hunger: -3.0, happiness: 0.0, energy: -8.0, memory: 15.0 },
        }
    }

    /// Apply every delta with saturation.
    pub fn apply(&self, creature: &mut CreatureState) {
        creature.adjust(Gauge::Hunger, self.hunger);
        creature.adjust(Gauge::Happiness, self.happiness);
        creature.adjust(Gauge::Energy, self.energy);
        creature.adjust(Gauge::Memory, self.memory);
    }
}

/// The action currently in progress and its remaining lockout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAction {
    /// Which action is running.
    pub kind: ActionKind,
    /// Ticks until another action may be accepted.
    pub remaining_ticks: u32,
}

impl ActiveAction {
    /// Start a lockout window.
    #[must_use]
    pub fn new(kind: ActionKind, lockout_ticks: u32) -> Self {
        Self {
            kind,
            remaining_ticks: lockout_ticks,
        }
    }

    /// Count down one tick. Returns `true` when the window has just closed.
    pub fn countdown(&mut self) -> bool {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks == 0
    }
}

/// Decorative particle family spawned by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticleKind {
    /// Orange crumbs.
    Food,
    /// Yellow sparkles.
    Star,
    /// Floating Z glyphs.
    Zzz,
    /// Purple thought specks.
    Brain,
}

/// Renderer hint: what to spawn around the creature. Not behaviourally
/// significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticleBurst {
    /// Particle family.
    pub kind: ParticleKind,
    /// How many to spawn.
    pub count: u8,
}

impl ParticleBurst {
    /// The burst for an action kind.
    #[must_use]
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Feed => Self { kind: ParticleKind::Food, count: 5 },
            ActionKind::Play => Self { kind: ParticleKind::Star, count: 8 },
            ActionKind::Sleep => Self { kind: ParticleKind::Zzz, count: 3 },
            ActionKind::Learn => Self { kind: ParticleKind::Brain, count: 6 },
        }
    }
}

/// Why an action request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The creature is dead; only reset is accepted.
    Dead,
    /// Another action's lockout window is still open.
    Busy(ActionKind),
}

/// Validate and apply `kind`.
///
/// On success the gauges and counter are updated, the mood is pinned to the
/// action's mood, and a fresh lockout window is installed in `active`.
///
/// # Errors
/// Returns the [`Rejection`] reason when the request must be ignored. The
/// session treats this as a silent no-op.
pub fn apply_action(
    creature: &mut CreatureState,
    active: &mut Option<ActiveAction>,
    kind: ActionKind,
    lockout_ticks: u32,
) -> Result<(), Rejection> {
    if !creature.alive {
        return Err(Rejection::Dead);
    }
    if let Some(current) = active {
        return Err(Rejection::Busy(current.kind));
    }

    ActionEffect::for_kind(kind).apply(creature);
    creature.increment_counter(kind);
    creature.mood = kind.mood();
    *active = Some(ActiveAction::new(kind, lockout_ticks));
    Ok(())
}
