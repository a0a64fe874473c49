//! Persistence Bridge.
//!
//! A [`Snapshot`] is everything needed to resume play: the creature, the
//! running memory stats and (for local copies) the recent feed. Three stores
//! implement [`SnapshotStore`]:
//!
//! - [`MemorySnapshotStore`] — in-process map, for tests and embedding.
//! - [`JsonFileStore`] — one JSON file per visitor; the device-local copy
//!   written after every action.
//! - [`SqliteSnapshotStore`] — the durable record other devices sync
//!   against. Saves apply the conflict policy in [`crate::merge`].
//!
//! Loads never fail on bad data: a record that cannot be parsed, or whose
//! gauges are not finite numbers, is reported as missing.

mod file;
mod sqlite;

pub use file::JsonFileStore;
pub use sqlite::SqliteSnapshotStore;

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::creature::CreatureState;
use crate::error::{Ekk0Error, Result};
use crate::memory::{MemoryEvent, MemoryStats};
use crate::merge;
use crate::types::{EvolutionStage, Timestamp, VisitorId};

/// Where a snapshot was restored from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotOrigin {
    /// This device's own copy.
    Local,
    /// The shared durable record.
    Remote,
}

impl SnapshotOrigin {
    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

/// A resumable copy of one visitor's session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Creature vitals and counters.
    #[serde(rename = "state")]
    pub creature: CreatureState,
    /// Running memory totals.
    #[serde(default, rename = "memoryStats")]
    pub stats: MemoryStats,
    /// Recent feed, newest first. Only local copies carry it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<MemoryEvent>,
    /// When the snapshot was taken.
    #[serde(default, rename = "savedAt")]
    pub saved_at: Timestamp,
}

impl Snapshot {
    /// Snapshot without the feed history.
    #[must_use]
    pub fn without_events(&self) -> Self {
        Self {
            events: Vec::new(),
            ..self.clone()
        }
    }

    /// Reject non-finite gauges and saturate out-of-range ones.
    ///
    /// # Errors
    /// Returns [`Ekk0Error::Snapshot`] when a gauge is NaN or infinite.
    pub fn sanitized(mut self, visitor: &VisitorId) -> Result<Self> {
        if !self.creature.is_well_formed() {
            return Err(Ekk0Error::Snapshot {
                visitor: visitor.to_string(),
                reason: "non-finite gauge".to_string(),
            });
        }
        self.creature.saturate_all();
        Ok(self)
    }

    /// Parse and sanitize stored bytes; anything unusable becomes `None`.
    pub(crate) fn decode(visitor: &VisitorId, bytes: &[u8]) -> Option<Self> {
        let parsed = serde_json::from_slice::<Self>(bytes)
            .map_err(Ekk0Error::from)
            .and_then(|snapshot| snapshot.sanitized(visitor));
        match parsed {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                warn!(visitor = %visitor, error = %err, "Discarding malformed snapshot");
                None
            }
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveReceipt {
    /// Stage of the stored creature.
    pub evolution_stage: EvolutionStage,
    /// Cumulative actions of the stored creature.
    pub total_actions: u64,
    /// When the record was written; use as the next `last_sync`.
    pub updated_at: Timestamp,
    /// Whether the conflict policy merged with a newer stored record.
    pub merged: bool,
    /// The state actually stored, when it differs from the one sent.
    ///
    /// The saver must absorb it (see [`crate::session::Session::absorb_merged`])
    /// before its next save, or that save overwrites the merged fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_state: Option<CreatureState>,
}

impl SaveReceipt {
    fn for_state(creature: &CreatureState, updated_at: Timestamp, merged: bool) -> Self {
        Self {
            evolution_stage: creature.evolution_stage(),
            total_actions: creature.total_actions(),
            updated_at,
            merged,
            merged_state: merged.then(|| creature.clone()),
        }
    }
}

/// A place snapshots can be loaded from and saved to.
///
/// Implementations are synchronous; async callers run them on a blocking
/// thread.
pub trait SnapshotStore: Send + Sync {
    /// Load the visitor's snapshot, `None` if absent or unusable.
    ///
    /// # Errors
    /// Returns an error only when the store itself is unreachable.
    fn load_snapshot(&self, visitor: &VisitorId) -> Result<Option<Snapshot>>;

    /// Save the visitor's snapshot.
    ///
    /// `last_sync` is when this client last saw the stored record; a stored
    /// record newer than that is merged rather than overwritten.
    ///
    /// # Errors
    /// Returns an error when the snapshot cannot be encoded or written.
    fn save_snapshot(
        &self,
        visitor: &VisitorId,
        snapshot: &Snapshot,
        last_sync: Option<Timestamp>,
    ) -> Result<SaveReceipt>;
}

// ---------------------------------------------------------------------------
// MemorySnapshotStore
// ---------------------------------------------------------------------------

/// In-process store with the same merge semantics as the durable one.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    records: Mutex<HashMap<VisitorId, Snapshot>>,
}

impl MemorySnapshotStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored visitors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load_snapshot(&self, visitor: &VisitorId) -> Result<Option<Snapshot>> {
        Ok(self.records.lock().get(visitor).cloned())
    }

    fn save_snapshot(
        &self,
        visitor: &VisitorId,
        snapshot: &Snapshot,
        last_sync: Option<Timestamp>,
    ) -> Result<SaveReceipt> {
        let mut records = self.records.lock();
        let stored = records
            .get(visitor)
            .map(|existing| (&existing.creature, existing.saved_at));
        let (creature, merged) = merge::resolve(&snapshot.creature, stored, last_sync);
        if merged {
            debug!(visitor = %visitor, "Merged with newer stored snapshot");
        }

        let receipt = SaveReceipt::for_state(&creature, snapshot.saved_at, merged);
        records.insert(
            visitor.clone(),
            Snapshot {
                creature,
                ..snapshot.without_events()
            },
        );
        Ok(receipt)
    }
}
