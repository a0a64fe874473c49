//! The game session: one creature, its feed and everything pending.
//!
//! A [`Session`] is owned by a single driver and mutated only through
//! [`Session::tick`], [`Session::perform_action`], [`Session::reset`] and
//! [`Session::restore`]. Every call takes the current time explicitly and all
//! randomness comes from the session's own seedable RNG, so a test can replay
//! a session exactly with a virtual clock and a fixed seed.
//!
//! Tick order:
//!
//! 1. decay (skipped while dead)
//! 2. mood recompute, unless an action is in progress
//! 3. mortality gate
//! 4. lockout countdown; on expiry the mood is recomputed
//! 5. release deferred pattern/directive events that are due
//! 6. decay-warning cadence

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::action::{self, ActiveAction, ParticleBurst, Rejection};
use crate::commentary::ReactionRequest;
use crate::config::Ekk0Config;
use crate::creature::CreatureState;
use crate::decay::{self, DecayReport};
use crate::lifecycle::{self, LifecycleNotice};
use crate::memory::synthesizer;
use crate::memory::{DecayWarningTimer, MemoryDraft, MemoryEvent, MemoryFeed, MemoryStats};
use crate::merge;
use crate::mood;
use crate::persistence::{Snapshot, SnapshotOrigin};
use crate::scheduler::DeferredQueue;
use crate::types::{ActionKind, EvolutionStage, Timestamp, VisitorId};

/// Number of recent events handed to the commentary generator.
pub const COMMENTARY_CONTEXT_EVENTS: usize = 5;

/// What one tick did.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Decay pass, `None` while dead.
    pub decay: Option<DecayReport>,
    /// Events that entered the feed this tick, in emission order.
    pub emitted: Vec<MemoryEvent>,
    /// Set on the tick the creature died.
    pub notice: Option<LifecycleNotice>,
    /// The in-progress action's lockout closed this tick.
    pub lockout_expired: bool,
}

/// What an accepted action did.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// The action.
    pub kind: ActionKind,
    /// Renderer hint.
    pub burst: ParticleBurst,
    /// The capture event already in the feed.
    pub capture: MemoryEvent,
    /// Deferred events scheduled by this action.
    pub scheduled: usize,
    /// Stage after the action.
    pub stage: EvolutionStage,
    /// Whether the action moved the creature into a new stage.
    pub evolved: bool,
}

/// One visitor's live game.
#[derive(Debug)]
pub struct Session {
    visitor: VisitorId,
    config: Ekk0Config,
    creature: CreatureState,
    active: Option<ActiveAction>,
    feed: MemoryFeed,
    deferred: DeferredQueue<MemoryDraft>,
    decay_timer: DecayWarningTimer,
    rng: StdRng,
    last_sync: Option<Timestamp>,
}

impl Session {
    /// Fresh session with a creature born at `now`.
    #[must_use]
    pub fn new(visitor: VisitorId, config: Ekk0Config, now: Timestamp, rng: StdRng) -> Self {
        let feed = MemoryFeed::new(config.feed.max_events);
        Self {
            visitor,
            config,
            creature: CreatureState::new(now),
            active: None,
            feed,
            deferred: DeferredQueue::new(),
            decay_timer: DecayWarningTimer::new(),
            rng,
            last_sync: None,
        }
    }

    /// Fresh session with a deterministic RNG.
    #[must_use]
    pub fn seeded(visitor: VisitorId, config: Ekk0Config, now: Timestamp, seed: u64) -> Self {
        Self::new(visitor, config, now, StdRng::seed_from_u64(seed))
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Advance the simulation to `now`.
    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.creature.alive {
            outcome.decay = decay::apply_decay(&mut self.creature, now, &self.config.simulation);

            if self.active.is_none() {
                self.creature.mood = mood::classify(&self.creature, None);
            }

            outcome.notice = lifecycle::check_mortality(&mut self.creature);
            if outcome.notice.is_some() {
                info!(
                    visitor = %self.visitor,
                    age = self.creature.age,
                    total_actions = self.creature.total_actions(),
                    "Creature died"
                );
            }

            if self.creature.alive {
                if let Some(active) = self.active.as_mut() {
                    if active.countdown() {
                        self.active = None;
                        self.creature.mood = mood::classify(&self.creature, None);
                        outcome.lockout_expired = true;
                    }
                }
            }
        }

        for due in self.deferred.drain_due(now) {
            let event = due.payload.into_event(due.due_at);
            self.feed.push(event.clone());
            outcome.emitted.push(event);
        }

        let elapsed = outcome.decay.map_or(0.0, |d| d.elapsed_secs);
        if let Some(warning) =
            self.decay_timer
                .advance(elapsed, &self.creature, &self.config.feed, now)
        {
            debug!(visitor = %self.visitor, memory = self.creature.memory_level, "Decay warning");
            self.feed.push(warning.clone());
            outcome.emitted.push(warning);
        }

        outcome
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Apply an action. Returns `None` (and changes nothing) when the
    /// creature is dead or another action is still in progress.
    pub fn perform_action(&mut self, kind: ActionKind, now: Timestamp) -> Option<ActionOutcome> {
        let stage_before = self.creature.evolution_stage();
        if let Err(rejection) = action::apply_action(
            &mut self.creature,
            &mut self.active,
            kind,
            self.config.simulation.action_lockout_ticks,
        ) {
            match rejection {
                Rejection::Dead => debug!(visitor = %self.visitor, action = %kind, "Ignored action: dead"),
                Rejection::Busy(current) => debug!(
                    visitor = %self.visitor,
                    action = %kind,
                    busy_with = %current,
                    "Ignored action: lockout"
                ),
            }
            return None;
        }

        let memories =
            synthesizer::synthesize_action(kind, &self.creature, now, &self.config.feed, &mut self.rng);
        self.feed.push(memories.capture.clone());
        let scheduled = memories.deferred.len();
        for (due_at, draft) in memories.deferred {
            self.deferred.schedule(due_at, draft);
        }

        let stage = self.creature.evolution_stage();
        if stage != stage_before {
            info!(visitor = %self.visitor, stage = %stage, "Creature evolved");
        }

        Some(ActionOutcome {
            kind,
            burst: ParticleBurst::for_action(kind),
            capture: memories.capture,
            scheduled,
            stage,
            evolved: stage != stage_before,
        })
    }

    /// Reinitialise the creature and clear the feed, stats, lockout and any
    /// pending deferred events. Allowed whether alive or dead.
    pub fn reset(&mut self, now: Timestamp) -> LifecycleNotice {
        let dropped = self.deferred.cancel_all();
        self.active = None;
        self.feed.clear();
        self.decay_timer.reset();
        info!(visitor = %self.visitor, dropped_deferred = dropped, "Creature reset");
        lifecycle::reset(&mut self.creature, now)
    }

    /// Release every pending deferred event now, stamped with its due time.
    pub fn flush_deferred(&mut self) -> Vec<MemoryEvent> {
        let mut emitted = Vec::new();
        for due in self.deferred.drain_all() {
            let event = due.payload.into_event(due.due_at);
            self.feed.push(event.clone());
            emitted.push(event);
        }
        emitted
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Copy of the session for saving. `with_events` includes the feed.
    #[must_use]
    pub fn snapshot(&self, now: Timestamp, with_events: bool) -> Snapshot {
        Snapshot {
            creature: self.creature.clone(),
            stats: self.feed.stats(),
            events: if with_events {
                self.feed.events().cloned().collect()
            } else {
                Vec::new()
            },
            saved_at: now,
        }
    }

    /// Replace the session's state with a stored snapshot.
    ///
    /// Remote snapshots restart the decay clock at `now` when
    /// `persistence.resume_clock_on_remote_load` is set, so the offline gap
    /// is not charged. Local snapshots keep their clock and catch up on the
    /// next tick. Empty stored stats are seeded with one pattern per three
    /// recorded actions. The remote record carries no feed, so a remote
    /// restore keeps the events already in the session. Mood is reclassified
    /// (no action is in progress after a restore). A `recall` event marks the
    /// restore.
    ///
    /// Returns `false` and leaves the session untouched if the snapshot's
    /// gauges are not finite.
    pub fn restore(&mut self, snapshot: Snapshot, origin: SnapshotOrigin, now: Timestamp) -> bool {
        let Ok(snapshot) = snapshot.sanitized(&self.visitor) else {
            return false;
        };
        let Snapshot {
            mut creature,
            mut stats,
            events,
            saved_at,
        } = snapshot;

        if origin == SnapshotOrigin::Remote && self.config.persistence.resume_clock_on_remote_load {
            creature.last_tick_at = now;
        }
        if stats.is_empty() {
            stats = MemoryStats {
                patterns: creature.total_actions() / 3,
                ..MemoryStats::default()
            };
        }

        self.deferred.cancel_all();
        self.active = None;
        self.decay_timer.reset();
        let events = if events.is_empty() && origin == SnapshotOrigin::Remote {
            self.feed.events().cloned().collect()
        } else {
            events
        };

        self.creature = creature;
        self.creature.mood = mood::classify(&self.creature, None);
        self.feed.clear();
        self.feed.restore_events(events);
        self.feed.restore_stats(stats);
        self.feed
            .push(synthesizer::recall_event(&self.creature, origin.as_str(), now));

        if origin == SnapshotOrigin::Remote {
            self.last_sync = Some(saved_at);
        }
        info!(
            visitor = %self.visitor,
            origin = origin.as_str(),
            total_actions = self.creature.total_actions(),
            alive = self.creature.alive,
            "Restored snapshot"
        );
        true
    }

    /// When this session last saw the remote record.
    #[must_use]
    pub fn last_sync(&self) -> Option<Timestamp> {
        self.last_sync
    }

    /// Record a successful remote save or load.
    pub fn mark_synced(&mut self, at: Timestamp) {
        self.last_sync = Some(at);
    }

    /// Take in the state a remote save merged with a newer record.
    ///
    /// Gauges, age and counters become the field-wise max of the live
    /// creature and `stored`; mood, liveness and clock stay local. Call
    /// before [`Session::mark_synced`], otherwise the next save would
    /// overwrite the merged record with the stale local one.
    pub fn absorb_merged(&mut self, stored: &CreatureState) {
        let before = self.creature.total_actions();
        self.creature = merge::merge_states(&self.creature, stored);
        if self.active.is_none() {
            self.creature.mood = mood::classify(&self.creature, None);
        }
        debug!(
            visitor = %self.visitor,
            gained_actions = self.creature.total_actions().saturating_sub(before),
            "Absorbed merged remote state"
        );
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// Input for the commentary generator after `action`.
    #[must_use]
    pub fn reaction_request(&self, action: ActionKind) -> ReactionRequest {
        ReactionRequest {
            visitor: self.visitor.clone(),
            action,
            creature: self.creature.clone(),
            recent_events: self.feed.recent_summaries(COMMENTARY_CONTEXT_EVENTS),
        }
    }

    /// The visitor playing this session.
    #[must_use]
    pub fn visitor(&self) -> &VisitorId {
        &self.visitor
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &Ekk0Config {
        &self.config
    }

    /// Current creature state.
    #[must_use]
    pub fn creature(&self) -> &CreatureState {
        &self.creature
    }

    /// The action in progress, if any.
    #[must_use]
    pub fn active_action(&self) -> Option<&ActiveAction> {
        self.active.as_ref()
    }

    /// Whether a new action would be accepted right now.
    #[must_use]
    pub fn accepts_actions(&self) -> bool {
        self.creature.alive && self.active.is_none()
    }

    /// The memory feed.
    #[must_use]
    pub fn feed(&self) -> &MemoryFeed {
        &self.feed
    }

    /// Running memory totals.
    #[must_use]
    pub fn stats(&self) -> MemoryStats {
        self.feed.stats()
    }

    /// Deferred events not yet released.
    #[must_use]
    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Due time of the next deferred event.
    #[must_use]
    pub fn next_deferred_due(&self) -> Option<Timestamp> {
        self.deferred.next_due()
    }
}
