//! Commands into the driver and events out of it.
//!
//! The front end only ever talks to the driver through these two types:
//! [`HostCommand`]s are serialised into the driver's channel, and the driver
//! reports everything observable as [`HostEvent`]s.

use std::fmt;
use std::str::FromStr;

use ekk0_core::action::ParticleBurst;
use ekk0_core::commentary::Reaction;
use ekk0_core::creature::CreatureState;
use ekk0_core::lifecycle::LifecycleNotice;
use ekk0_core::memory::{MemoryEvent, MemoryStats};
use ekk0_core::persistence::{SaveReceipt, SnapshotOrigin};
use ekk0_core::types::{ActionKind, EvolutionStage, Timestamp};

/// A request for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Perform an action.
    Action(ActionKind),
    /// Reinitialise the creature.
    Reset,
    /// Report the current state.
    Status,
    /// Save and stop.
    Shutdown,
}

impl FromStr for HostCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" | "r" => Ok(Self::Reset),
            "status" | "s" | "" => Ok(Self::Status),
            "quit" | "exit" | "q" => Ok(Self::Shutdown),
            "f" => Ok(Self::Action(ActionKind::Feed)),
            "p" => Ok(Self::Action(ActionKind::Play)),
            "z" => Ok(Self::Action(ActionKind::Sleep)),
            "l" => Ok(Self::Action(ActionKind::Learn)),
            other => other.parse().map(Self::Action),
        }
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// The creature.
    pub creature: CreatureState,
    /// Running feed totals.
    pub stats: MemoryStats,
    /// Evolution stage.
    pub stage: EvolutionStage,
    /// Whether an action would be accepted now.
    pub accepts_actions: bool,
    /// Pattern/directive events still waiting.
    pub pending_deferred: usize,
    /// Last remote sync.
    pub last_sync: Option<Timestamp>,
}

/// Something the front end may want to show.
#[derive(Debug)]
pub enum HostEvent {
    /// An action was applied.
    ActionAccepted {
        /// The action.
        kind: ActionKind,
        /// Particles to draw.
        burst: ParticleBurst,
        /// Stage after the action.
        stage: EvolutionStage,
        /// The action crossed a stage boundary.
        evolved: bool,
    },
    /// An action was refused (dead, or another action in progress).
    ActionIgnored(ActionKind),
    /// A new entry in the memory feed.
    Memory(MemoryEvent),
    /// The creature said something.
    Reaction(Reaction),
    /// Death or rebirth.
    Notice(LifecycleNotice),
    /// A stored snapshot replaced the session.
    Restored(SnapshotOrigin),
    /// The remote store accepted a save.
    Saved(SaveReceipt),
    /// The remote store could not be reached.
    Offline(String),
    /// Reply to [`HostCommand::Status`].
    Status(Box<StatusReport>),
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.creature;
        write!(
            f,
            "{} | mood {} | age {}m | stage {} ({}) | actions {} | memory {:.0}% | {}",
            c.summary(),
            c.mood,
            c.age,
            self.stage.number(),
            self.stage.label(),
            c.total_actions(),
            c.memory_level,
            if c.alive { "alive" } else { "dead" },
        )?;
        write!(
            f,
            "\n  patterns {} episodes {} directives {} decayed {}",
            self.stats.patterns, self.stats.episodes, self.stats.directives, self.stats.decayed
        )
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionAccepted { kind, stage, evolved, .. } => {
                write!(f, "> {kind}")?;
                if *evolved {
                    write!(f, ", evolved to stage {} ({})", stage.number(), stage.label())?;
                }
                Ok(())
            }
            Self::ActionIgnored(kind) => write!(f, "  ({kind} ignored)"),
            Self::Memory(event) => write!(
                f,
                "  {} [{}] {}: {}",
                event.icon,
                event.layer.label(),
                event.title,
                event.detail
            ),
            Self::Reaction(reaction) => write!(f, "ekk0: \"{}\"", reaction.text),
            Self::Notice(notice) => write!(f, "** {} **", notice.text()),
            Self::Restored(origin) => write!(f, "  restored from {} snapshot", origin.as_str()),
            Self::Saved(receipt) => write!(
                f,
                "  synced ({} actions{})",
                receipt.total_actions,
                if receipt.merged { ", merged" } else { "" }
            ),
            Self::Offline(reason) => write!(f, "  offline: {reason}"),
            Self::Status(report) => write!(f, "{report}"),
        }
    }
}
