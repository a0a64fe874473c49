//! The creature's vitals and lifetime counters.
//!
//! [`CreatureState`] is the single mutable record the simulation owns. Its
//! serialized form uses the same field names as the widget's stored JSON
//! (`memory`, `born`, `lastTick`, `totalFeeds`, ...), so existing snapshots
//! load unchanged.

use serde::{Deserialize, Serialize};

use crate::types::{ActionKind, EvolutionStage, Mood, Timestamp};

/// Lower bound of every gauge.
pub const GAUGE_MIN: f64 = 0.0;
/// Upper bound of every gauge.
pub const GAUGE_MAX: f64 = 100.0;

/// Fresh-creature fuel.
pub const DEFAULT_HUNGER: f64 = 80.0;
/// Fresh-creature happiness.
pub const DEFAULT_HAPPINESS: f64 = 70.0;
/// Fresh-creature energy.
pub const DEFAULT_ENERGY: f64 = 90.0;
/// Fresh-creature memory.
pub const DEFAULT_MEMORY: f64 = 50.0;

/// Clamp a gauge value into `[0, 100]`.
#[must_use]
pub fn saturate(value: f64) -> f64 {
    value.clamp(GAUGE_MIN, GAUGE_MAX)
}

/// One of the four bounded needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gauge {
    /// Fuel. Higher is better fed.
    Hunger,
    /// Happiness.
    Happiness,
    /// Energy.
    Energy,
    /// Memory level.
    Memory,
}

impl Gauge {
    /// All gauges.
    pub const ALL: [Self; 4] = [Self::Hunger, Self::Happiness, Self::Energy, Self::Memory];
}

/// Complete state of one creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureState {
    /// Fuel, 0–100.
    pub hunger: f64,
    /// Happiness, 0–100.
    pub happiness: f64,
    /// Energy, 0–100.
    pub energy: f64,
    /// Memory level, 0–100.
    #[serde(rename = "memory")]
    pub memory_level: f64,
    /// Whole minutes since `born_at`; frozen at death.
    pub age: u64,
    /// When this creature was created.
    #[serde(rename = "born")]
    pub born_at: Timestamp,
    /// Basis for the next decay computation.
    #[serde(rename = "lastTick")]
    pub last_tick_at: Timestamp,
    /// False once the mortality gate fires, until reset.
    pub alive: bool,
    /// Derived mood.
    pub mood: Mood,
    /// Successful feeds.
    pub total_feeds: u64,
    /// Successful plays.
    pub total_plays: u64,
    /// Successful sleeps.
    pub total_sleeps: u64,
    /// Successful learns.
    pub total_learns: u64,
}

impl CreatureState {
    /// A freshly hatched creature born at `now`.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            hunger: DEFAULT_HUNGER,
            happiness: DEFAULT_HAPPINESS,
            energy: DEFAULT_ENERGY,
            memory_level: DEFAULT_MEMORY,
            age: 0,
            born_at: now,
            last_tick_at: now,
            alive: true,
            mood: Mood::Idle,
            total_feeds: 0,
            total_plays: 0,
            total_sleeps: 0,
            total_learns: 0,
        }
    }

    /// Read a gauge.
    #[must_use]
    pub fn gauge(&self, gauge: Gauge) -> f64 {
        match gauge {
            Gauge::Hunger => self.hunger,
            Gauge::Happiness => self.happiness,
            Gauge::Energy => self.energy,
            Gauge::Memory => self.memory_level,
        }
    }

    /// Add `delta` to a gauge, saturating at both bounds.
    pub fn adjust(&mut self, gauge: Gauge, delta: f64) {
        let slot = match gauge {
            Gauge::Hunger => &mut self.hunger,
            Gauge::Happiness => &mut self.happiness,
            Gauge::Energy => &mut self.energy,
            Gauge::Memory => &mut self.memory_level,
        };
        *slot = saturate(*slot + delta);
    }

    /// Sum of all action counters.
    #[must_use]
    pub fn total_actions(&self) -> u64 {
        self.total_feeds + self.total_plays + self.total_sleeps + self.total_learns
    }

    /// Counter for one action kind.
    #[must_use]
    pub fn action_count(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Feed => self.total_feeds,
            ActionKind::Play => self.total_plays,
            ActionKind::Sleep => self.total_sleeps,
            ActionKind::Learn => self.total_learns,
        }
    }

    pub(crate) fn increment_counter(&mut self, kind: ActionKind) {
        let counter = match kind {
            ActionKind::Feed => &mut self.total_feeds,
            ActionKind::Play => &mut self.total_plays,
            ActionKind::Sleep => &mut self.total_sleeps,
            ActionKind::Learn => &mut self.total_learns,
        };
        *counter = counter.saturating_add(1);
    }

    /// Evolution stage from the cumulative action count.
    #[must_use]
    pub fn evolution_stage(&self) -> EvolutionStage {
        EvolutionStage::from_total_actions(self.total_actions())
    }

    /// Whether every gauge is a finite number.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        Gauge::ALL.iter().all(|g| self.gauge(*g).is_finite())
    }

    /// Force every gauge back into range (used on loaded snapshots).
    pub fn saturate_all(&mut self) {
        for gauge in Gauge::ALL {
            self.adjust(gauge, 0.0);
        }
    }

    /// One-line summary used in logs and commentary prompts.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Fuel:{}% Happy:{}% Energy:{}%",
            self.hunger.round(),
            self.happiness.round(),
            self.energy.round()
        )
    }
}
