//! # ekk0 Core Library
//!
//! Simulation engine for ekk0, a tiny digital creature that lives on a
//! 60 Hz tick. The creature has four bounded needs that drain with real
//! elapsed time, reacts to four player actions, derives a mood, and keeps a
//! "memory feed" of synthetic events:
//!
//! - **Capture** — one per accepted action
//! - **Pattern** — forged every third action, shortly after it
//! - **Directive** — issued every tenth action
//! - **Decay** — warnings while memory runs low
//! - **Recall** — marks a restored snapshot
//!
//! The engine is deterministic: time is always passed in as a
//! [`Timestamp`] and randomness comes from a seedable RNG owned by the
//! [`Session`]. Nothing here spawns threads or touches the clock; the
//! `ekk0-host` crate drives a session in real time.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod commentary;
pub mod config;
pub mod creature;
pub mod decay;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod merge;
pub mod mood;
pub mod persistence;
pub mod scheduler;
pub mod session;
pub mod types;

pub use commentary::{Commentator, LocalCommentator, Reaction, ReactionRequest, ReactionSource};
pub use config::Ekk0Config;
pub use creature::CreatureState;
pub use error::{Ekk0Error, Result};
pub use lifecycle::LifecycleNotice;
pub use memory::{EventKind, MemoryEvent, MemoryFeed, MemoryStats};
pub use persistence::{
    JsonFileStore, MemorySnapshotStore, SaveReceipt, Snapshot, SnapshotOrigin, SnapshotStore,
    SqliteSnapshotStore,
};
pub use session::{ActionOutcome, Session, TickOutcome};
pub use types::*;
