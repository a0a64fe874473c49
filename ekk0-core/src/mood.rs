//! Mood/State Classifier.
//!
//! Mood is never authoritative on its own: it is recomputed from the vitals,
//! the in-progress action and liveness whenever any of them change.

use crate::action::ActiveAction;
use crate::creature::CreatureState;
use crate::types::Mood;

/// Fuel below this makes the creature sad.
pub const SAD_HUNGER_BELOW: f64 = 20.0;
/// Happiness below this makes the creature sad.
pub const SAD_HAPPINESS_BELOW: f64 = 20.0;
/// Energy below this makes the creature sad.
pub const SAD_ENERGY_BELOW: f64 = 15.0;

/// Classify the creature's mood.
///
/// Dead creatures are always sad. An in-progress action pins the mood to the
/// action's own mood. Otherwise any unmet need yields sad, else idle.
#[must_use]
pub fn classify(creature: &CreatureState, active: Option<&ActiveAction>) -> Mood {
    if !creature.alive {
        return Mood::Sad;
    }
    if let Some(active) = active {
        return active.kind.mood();
    }
    if is_neglected(creature) {
        Mood::Sad
    } else {
        Mood::Idle
    }
}

/// Whether any need is below its sadness threshold.
#[must_use]
pub fn is_neglected(creature: &CreatureState) -> bool {
    creature.hunger < SAD_HUNGER_BELOW
        || creature.happiness < SAD_HAPPINESS_BELOW
        || creature.energy < SAD_ENERGY_BELOW
}
