//! Core type definitions for the ekk0 simulation.
//!
//! All types are serializable so a whole session can be snapshotted.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Opaque, stable identifier for a visitor (device or browser profile).
///
/// The core never interprets the contents; it is only a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisitorId(pub String);

impl VisitorId {
    /// Generate a fresh random visitor ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the raw key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VisitorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Unique identifier for a memory event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Create a new random event ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Wall-clock instant in milliseconds since the Unix epoch.
///
/// Every time-dependent operation takes a `Timestamp` argument instead of
/// reading the clock, so tests can drive the simulation with a virtual clock.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Raw milliseconds.
    #[must_use]
    pub fn millis(self) -> i64 {
        self.0
    }

    /// A timestamp `ms` milliseconds later.
    #[must_use]
    pub fn plus_millis(self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Seconds elapsed since `earlier`, never negative.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_since(self, earlier: Self) -> f64 {
        (self.0.saturating_sub(earlier.0)).max(0) as f64 / 1000.0
    }

    /// Whole minutes elapsed since `earlier`, never negative.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn whole_minutes_since(self, earlier: Self) -> u64 {
        (self.0.saturating_sub(earlier.0)).max(0) as u64 / 60_000
    }

    /// Convert to a chrono UTC datetime (for logs and storage metadata).
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%H:%M:%S")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Actions & Mood
// ---------------------------------------------------------------------------

/// A discrete player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Restore fuel.
    Feed,
    /// Raise happiness at the cost of energy.
    Play,
    /// Recharge energy.
    Sleep,
    /// Raise memory at the cost of energy and fuel.
    Learn,
}

impl ActionKind {
    /// All action kinds, in display order.
    pub const ALL: [Self; 4] = [Self::Feed, Self::Play, Self::Sleep, Self::Learn];

    /// Lowercase name used in titles, prompts and storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Play => "play",
            Self::Sleep => "sleep",
            Self::Learn => "learn",
        }
    }

    /// The mood the creature shows while this action is in progress.
    #[must_use]
    pub fn mood(self) -> Mood {
        match self {
            Self::Feed => Mood::Eating,
            Self::Play => Mood::Happy,
            Self::Sleep => Mood::Sleeping,
            Self::Learn => Mood::Learning,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feed" => Ok(Self::Feed),
            "play" => Ok(Self::Play),
            "sleep" => Ok(Self::Sleep),
            "learn" => Ok(Self::Learn),
            other => Err(format!("unknown action: '{other}'")),
        }
    }
}

/// Derived display/behaviour state of the creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Nothing going on, needs are met.
    #[default]
    Idle,
    /// Playing.
    Happy,
    /// Sleeping.
    Sleeping,
    /// Eating.
    Eating,
    /// Learning.
    Learning,
    /// Neglected or dead.
    Sad,
}

impl Mood {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Happy => "happy",
            Self::Sleeping => "sleeping",
            Self::Eating => "eating",
            Self::Learning => "learning",
            Self::Sad => "sad",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Evolution
// ---------------------------------------------------------------------------

/// Display label derived purely from the cumulative action count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EvolutionStage {
    /// Fewer than 20 actions.
    Spark,
    /// 20 or more actions.
    Learner,
    /// 50 or more actions.
    Thinker,
    /// 100 or more actions.
    Oracle,
}

impl EvolutionStage {
    /// Classify a cumulative action count.
    #[must_use]
    pub fn from_total_actions(total: u64) -> Self {
        if total >= 100 {
            Self::Oracle
        } else if total >= 50 {
            Self::Thinker
        } else if total >= 20 {
            Self::Learner
        } else {
            Self::Spark
        }
    }

    /// Numeric stage, 1-based, as stored alongside remote snapshots.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::Spark => 1,
            Self::Learner => 2,
            Self::Thinker => 3,
            Self::Oracle => 4,
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Spark => "Spark",
            Self::Learner => "Learner",
            Self::Thinker => "Thinker",
            Self::Oracle => "Oracle",
        }
    }
}

impl fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
