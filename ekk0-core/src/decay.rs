//! Clock/Decay Engine — proportional need decay.
//!
//! Each tick converts the real time elapsed since the previous tick into
//! decay units and drains every gauge by a fixed factor per unit:
//!
//!   unit = elapsed_secs / divisor        (divisor = 10 s by default)
//!   hunger    -= unit × 1.2
//!   happiness -= unit × 0.8
//!   energy    -= unit × 0.6
//!   memory    -= unit × 0.4
//!
//! Decay depends only on elapsed wall-clock time, never on tick count, so a
//! single tick after an hour in the background charges a full hour of decay,
//! and splitting the same interval across many ticks yields the same gauges.

use crate::config::SimulationConfig;
use crate::creature::{CreatureState, Gauge};
use crate::types::Timestamp;

/// What one decay pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayReport {
    /// Seconds since the previous tick.
    pub elapsed_secs: f64,
    /// Decay units applied.
    pub decay_unit: f64,
    /// Age in whole minutes after the pass.
    pub age_minutes: u64,
}

/// Decay units for an elapsed interval.
#[must_use]
pub fn decay_unit(elapsed_secs: f64, divisor_secs: f64) -> f64 {
    if divisor_secs <= 0.0 {
        return 0.0;
    }
    elapsed_secs.max(0.0) / divisor_secs
}

/// Advance the creature's clock to `now` and drain its gauges.
///
/// Dead creatures are left untouched (their clock is halted) and `None` is
/// returned. Gauges are floored at zero; decay never raises a gauge, so no
/// upper clamp is needed.
pub fn apply_decay(
    creature: &mut CreatureState,
    now: Timestamp,
    config: &SimulationConfig,
) -> Option<DecayReport> {
    if !creature.alive {
        return None;
    }

    let elapsed_secs = now.secs_since(creature.last_tick_at);
    creature.last_tick_at = now;
    creature.age = now.whole_minutes_since(creature.born_at);

    let unit = decay_unit(elapsed_secs, config.decay_divisor_secs);
    let factors = config.decay_factors;
    creature.adjust(Gauge::Hunger, -unit * factors.hunger);
    creature.adjust(Gauge::Happiness, -unit * factors.happiness);
    creature.adjust(Gauge::Energy, -unit * factors.energy);
    creature.adjust(Gauge::Memory, -unit * factors.memory);

    Some(DecayReport {
        elapsed_secs,
        decay_unit: unit,
        age_minutes: creature.age,
    })
}
