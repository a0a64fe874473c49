//! Lifecycle/Mortality Gate.
//!
//! A creature dies at a tick boundary when fuel and energy are both
//! exhausted. Death is a normal state: the clock halts, every action is
//! refused, and only [`reset`] brings the creature back.

use serde::{Deserialize, Serialize};

use crate::creature::CreatureState;
use crate::types::{Mood, Timestamp};

/// Notice surfaced when the creature dies.
pub const DEATH_NOTICE: &str = "memory fading... systems failing...";
/// Greeting surfaced after a reset.
pub const RESET_GREETING: &str = "systems online... hello again";

/// A one-off message for the UI speech bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleNotice {
    /// The creature just died.
    Died,
    /// The creature was just reset.
    Reborn,
}

impl LifecycleNotice {
    /// Text of the notice.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Died => DEATH_NOTICE,
            Self::Reborn => RESET_GREETING,
        }
    }
}

/// Whether the terminal condition holds.
#[must_use]
pub fn is_terminal(creature: &CreatureState) -> bool {
    creature.hunger <= 0.0 && creature.energy <= 0.0
}

/// Run the mortality gate. Returns [`LifecycleNotice::Died`] on the tick the
/// creature transitions to dead, `None` otherwise (including when it was
/// already dead).
pub fn check_mortality(creature: &mut CreatureState) -> Option<LifecycleNotice> {
    if !creature.alive || !is_terminal(creature) {
        return None;
    }
    creature.alive = false;
    creature.mood = Mood::Sad;
    Some(LifecycleNotice::Died)
}

/// Reinitialise the creature to a fresh one born at `now`.
///
/// Allowed whether the creature is alive or dead.
pub fn reset(creature: &mut CreatureState, now: Timestamp) -> LifecycleNotice {
    *creature = CreatureState::new(now);
    LifecycleNotice::Reborn
}
