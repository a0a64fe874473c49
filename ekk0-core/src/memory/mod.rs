//! The memory feed: events, their running totals, and the synthesizer that
//! produces them.

pub mod content;
pub mod event;
pub mod feed;
pub mod synthesizer;

pub use event::{EventKind, Layer, MemoryEvent};
pub use feed::{MemoryFeed, MemoryStats};
pub use synthesizer::{ActionMemories, DecayWarningTimer, MemoryDraft};
