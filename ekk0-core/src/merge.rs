//! Conflict resolution for remote saves.
//!
//! Two devices can play the same visitor's creature. When a save arrives and
//! the stored record was written after the saver last synced, the two states
//! are merged field by field, taking the larger value: a creature is never
//! made hungrier, sadder or younger by a sync. Mood, liveness and timestamps
//! stay with the incoming (local) state.

use crate::creature::CreatureState;
use crate::types::Timestamp;

/// Whether a stored record written at `stored_updated_at` conflicts with a
/// client that last synced at `last_sync`.
///
/// A client that never synced always overwrites.
#[must_use]
pub fn needs_merge(stored_updated_at: Timestamp, last_sync: Option<Timestamp>) -> bool {
    last_sync.is_some_and(|synced| stored_updated_at > synced)
}

/// Field-wise maximum of `local` and `stored`.
#[must_use]
pub fn merge_states(local: &CreatureState, stored: &CreatureState) -> CreatureState {
    CreatureState {
        hunger: local.hunger.max(stored.hunger),
        happiness: local.happiness.max(stored.happiness),
        energy: local.energy.max(stored.energy),
        memory_level: local.memory_level.max(stored.memory_level),
        age: local.age.max(stored.age),
        total_feeds: local.total_feeds.max(stored.total_feeds),
        total_plays: local.total_plays.max(stored.total_plays),
        total_sleeps: local.total_sleeps.max(stored.total_sleeps),
        total_learns: local.total_learns.max(stored.total_learns),
        ..local.clone()
    }
}

/// Apply the conflict policy to an incoming state.
///
/// Returns the state to store and whether a merge happened.
#[must_use]
pub fn resolve(
    incoming: &CreatureState,
    stored: Option<(&CreatureState, Timestamp)>,
    last_sync: Option<Timestamp>,
) -> (CreatureState, bool) {
    match stored {
        Some((stored, updated_at)) if needs_merge(updated_at, last_sync) => {
            (merge_states(incoming, stored), true)
        }
        _ => (incoming.clone(), false),
    }
}
