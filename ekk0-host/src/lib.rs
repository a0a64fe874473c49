//! # ekk0-host — Real-Time Host for ekk0
//!
//! Runs an `ekk0-core` [`Session`](ekk0_core::session::Session) in real time
//! on a tokio runtime and wires it to its collaborators.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  HostCommand   ┌──────────────────────────────┐
//! │  front end   │ ─────────────▶ │           Driver             │
//! │  (terminal)  │ ◀───────────── │  60 Hz interval · Session    │
//! └──────────────┘   HostEvent    └──────┬─────────────┬─────────┘
//!                                        │ spawn       │ spawn_blocking
//!                                        ▼             ▼
//!                               ┌──────────────┐ ┌───────────────────┐
//!                               │ Commentator  │ │ SnapshotStore     │
//!                               │ (ekk0-llm)   │ │ (SQLite / JSON)   │
//!                               └──────────────┘ └───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config` — host configuration file and frame budget tracking
//! - `identity` — persisted visitor ID
//! - `events` — commands in, events out
//! - `driver` — the tick loop, debounced sync and autosave

pub mod config;
pub mod driver;
pub mod events;
pub mod identity;

pub use config::HostConfig;
pub use driver::{Driver, DriverHandle, HostClock};
pub use events::{HostCommand, HostEvent, StatusReport};
