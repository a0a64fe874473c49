//! SQLite snapshot store.
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS snapshots (
//!     visitor_id      TEXT PRIMARY KEY,
//!     data            BLOB NOT NULL,
//!     evolution_stage INTEGER NOT NULL,
//!     total_actions   INTEGER NOT NULL,
//!     updated_at      INTEGER NOT NULL,
//!     last_visit      TEXT NOT NULL,
//!     checksum        TEXT
//! );
//! ```
//!
//! - WAL mode for concurrent reads while the driver keeps saving.
//! - JSON inside a BLOB keeps the schema stable when the state gains fields.
//! - Optional CRC-32 checksum; a mismatching record is treated as missing.
//! - `updated_at` is the snapshot's own timestamp in ms, compared against the
//!   saver's `last_sync` to decide whether to merge.

use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use tracing::{debug, info, warn};

use super::{SaveReceipt, Snapshot, SnapshotStore};
use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::merge;
use crate::types::{Timestamp, VisitorId};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS snapshots (
    visitor_id      TEXT PRIMARY KEY,
    data            BLOB NOT NULL,
    evolution_stage INTEGER NOT NULL,
    total_actions   INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    last_visit      TEXT NOT NULL,
    checksum        TEXT
);";

fn checksum_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32fast::hash(data))
}

/// Handle to an SQLite database of snapshots.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
    config: PersistenceConfig,
    db_path: PathBuf,
}

impl std::fmt::Debug for SqliteSnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteSnapshotStore")
            .field("db_path", &self.db_path)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqliteSnapshotStore {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P, config: &PersistenceConfig) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;

        if config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;

        info!(
            path = %db_path.display(),
            wal = config.wal_mode,
            "Snapshot store opened"
        );

        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path,
        })
    }

    /// Open an in-memory database (tests).
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn open_in_memory(config: &PersistenceConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            config: config.clone(),
            db_path: PathBuf::from(":memory:"),
        })
    }

    /// `updated_at` of the visitor's record, if any.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn updated_at(&self, visitor: &VisitorId) -> Result<Option<Timestamp>> {
        let conn = self.conn.lock();
        let millis: Option<i64> = conn
            .query_row(
                "SELECT updated_at FROM snapshots WHERE visitor_id = ?1",
                params![visitor.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(millis.map(Timestamp))
    }

    /// Delete the visitor's record. Returns `true` if a row was removed.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn delete(&self, visitor: &VisitorId) -> Result<bool> {
        let deleted = self
            .conn
            .lock()
            .execute("DELETE FROM snapshots WHERE visitor_id = ?1", params![visitor.as_str()])?;
        Ok(deleted > 0)
    }

    /// Every stored visitor.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn list_visitors(&self) -> Result<Vec<VisitorId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached("SELECT visitor_id FROM snapshots ORDER BY visitor_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut visitors = Vec::new();
        for row in rows {
            visitors.push(VisitorId(row?));
        }
        Ok(visitors)
    }

    /// Number of stored visitors.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn visitor_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .lock()
            .query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Copy the database to `dest_path` with SQLite's online-backup API.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] on SQLite failures.
    pub fn backup<P: AsRef<Path>>(&self, dest_path: P) -> Result<()> {
        let start = Instant::now();
        let conn = self.conn.lock();
        let mut dest = Connection::open(dest_path.as_ref())?;
        let backup = rusqlite::backup::Backup::new(&*conn, &mut dest)?;
        backup.run_to_completion(256, std::time::Duration::from_millis(50), None)?;

        info!(
            dest = %dest_path.as_ref().display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Snapshot store backup completed"
        );
        Ok(())
    }

    /// Run SQLite's integrity check.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Database`] if the check itself fails.
    pub fn integrity_check(&self) -> Result<bool> {
        let result: String = self
            .conn
            .lock()
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Path of the database file (`:memory:` for in-memory stores).
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn verify(&self, visitor: &VisitorId, data: &[u8], stored_checksum: Option<&str>) -> bool {
        if !self.config.checksum_enabled {
            return true;
        }
        let Some(expected) = stored_checksum else {
            return true;
        };
        let actual = checksum_hex(data);
        if expected == actual {
            return true;
        }
        warn!(
            visitor = %visitor,
            expected = %expected,
            actual = %actual,
            "Checksum mismatch, ignoring stored snapshot"
        );
        false
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn load_snapshot(&self, visitor: &VisitorId) -> Result<Option<Snapshot>> {
        let start = Instant::now();
        let row: Option<(Vec<u8>, Option<String>)> = {
            let conn = self.conn.lock();
            let mut stmt =
                conn.prepare_cached("SELECT data, checksum FROM snapshots WHERE visitor_id = ?1")?;
            stmt.query_row(params![visitor.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()?
        };

        let Some((data, checksum)) = row else {
            return Ok(None);
        };
        if !self.verify(visitor, &data, checksum.as_deref()) {
            return Ok(None);
        }

        let snapshot = Snapshot::decode(visitor, &data);
        debug!(
            visitor = %visitor,
            found = snapshot.is_some(),
            elapsed_us = start.elapsed().as_micros(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    fn save_snapshot(
        &self,
        visitor: &VisitorId,
        snapshot: &Snapshot,
        last_sync: Option<Timestamp>,
    ) -> Result<SaveReceipt> {
        let start = Instant::now();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing: Option<(Vec<u8>, i64)> = tx
            .query_row(
                "SELECT data, updated_at FROM snapshots WHERE visitor_id = ?1",
                params![visitor.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let stored = existing.and_then(|(data, updated_at)| {
            Snapshot::decode(visitor, &data).map(|s| (s, Timestamp(updated_at)))
        });

        let (creature, merged) = merge::resolve(
            &snapshot.creature,
            stored.as_ref().map(|(s, at)| (&s.creature, *at)),
            last_sync,
        );
        if merged {
            info!(visitor = %visitor, "Stored snapshot was newer than last sync, merged");
        }

        let record = Snapshot {
            creature,
            ..snapshot.without_events()
        };
        let json = serde_json::to_vec(&record)?;
        let checksum = self.config.checksum_enabled.then(|| checksum_hex(&json));
        let receipt = SaveReceipt::for_state(&record.creature, snapshot.saved_at, merged);
        let last_visit = snapshot
            .saved_at
            .to_datetime()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();

        tx.execute(
            "INSERT INTO snapshots
                (visitor_id, data, evolution_stage, total_actions, updated_at, last_visit, checksum)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(visitor_id) DO UPDATE SET
                data = excluded.data,
                evolution_stage = excluded.evolution_stage,
                total_actions = excluded.total_actions,
                updated_at = excluded.updated_at,
                last_visit = excluded.last_visit,
                checksum = excluded.checksum",
            params![
                visitor.as_str(),
                json,
                receipt.evolution_stage.number(),
                i64::try_from(receipt.total_actions).unwrap_or(i64::MAX),
                receipt.updated_at.millis(),
                last_visit,
                checksum,
            ],
        )?;
        tx.commit()?;

        debug!(
            visitor = %visitor,
            stage = receipt.evolution_stage.number(),
            bytes = json.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved snapshot"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureState;
    use crate::memory::MemoryStats;
    use crate::types::EvolutionStage;

    fn config() -> PersistenceConfig {
        PersistenceConfig {
            checksum_enabled: true,
            ..PersistenceConfig::default()
        }
    }

    fn snapshot(at: i64, feeds: u64) -> Snapshot {
        let mut creature = CreatureState::new(Timestamp(0));
        creature.total_feeds = feeds;
        Snapshot {
            creature,
            stats: MemoryStats {
                patterns: feeds / 3,
                episodes: feeds,
                directives: feeds / 10,
                decayed: 0,
            },
            events: Vec::new(),
            saved_at: Timestamp(at),
        }
    }

    #[test]
    fn round_trip_save_load() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        let visitor = VisitorId::from("alpha");
        let receipt = store.save_snapshot(&visitor, &snapshot(1_000, 21), None).expect("save");

        assert_eq!(receipt.evolution_stage, EvolutionStage::Learner);
        assert_eq!(receipt.total_actions, 21);
        assert_eq!(receipt.updated_at, Timestamp(1_000));
        assert!(!receipt.merged);

        let loaded = store.load_snapshot(&visitor).expect("load").expect("some");
        assert_eq!(loaded, snapshot(1_000, 21));
        assert_eq!(store.updated_at(&visitor).expect("query"), Some(Timestamp(1_000)));
    }

    #[test]
    fn load_nonexistent_returns_none() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        assert!(store.load_snapshot(&VisitorId::from("nobody")).expect("load").is_none());
    }

    #[test]
    fn stale_client_is_merged() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        let visitor = VisitorId::from("alpha");
        store.save_snapshot(&visitor, &snapshot(5_000, 30), None).expect("save");

        let mut other = snapshot(6_000, 2);
        other.creature.total_plays = 4;
        other.creature.hunger = 10.0;
        let receipt = store
            .save_snapshot(&visitor, &other, Some(Timestamp(1_000)))
            .expect("save");
        assert!(receipt.merged);
        assert_eq!(receipt.total_actions, 34);
        let stored = receipt.merged_state.expect("merged state returned");
        assert_eq!(stored.total_feeds, 30);

        let loaded = store.load_snapshot(&visitor).expect("load").expect("some");
        assert_eq!(loaded.creature.total_feeds, 30);
        assert_eq!(loaded.creature.total_plays, 4);
        assert!((loaded.creature.hunger - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn up_to_date_client_overwrites() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        let visitor = VisitorId::from("alpha");
        let receipt = store.save_snapshot(&visitor, &snapshot(5_000, 30), None).expect("save");

        let receipt = store
            .save_snapshot(&visitor, &snapshot(6_000, 2), Some(receipt.updated_at))
            .expect("save");
        assert!(!receipt.merged);
        assert!(receipt.merged_state.is_none());
        let loaded = store.load_snapshot(&visitor).expect("load").expect("some");
        assert_eq!(loaded.creature.total_feeds, 2);
    }

    #[test]
    fn checksum_mismatch_is_treated_as_missing() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        let visitor = VisitorId::from("alpha");
        store.save_snapshot(&visitor, &snapshot(1, 1), None).expect("save");
        store
            .conn
            .lock()
            .execute(
                "UPDATE snapshots SET checksum = 'deadbeef' WHERE visitor_id = ?1",
                params![visitor.as_str()],
            )
            .expect("corrupt");
        assert!(store.load_snapshot(&visitor).expect("load").is_none());
    }

    #[test]
    fn events_are_not_stored_remotely() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        let visitor = VisitorId::from("alpha");
        let mut with_events = snapshot(1, 1);
        with_events.events.push(crate::memory::MemoryEvent::new(
            crate::memory::EventKind::Capture,
            "🍕",
            "capture: feed",
            "",
            Timestamp(1),
        ));
        store.save_snapshot(&visitor, &with_events, None).expect("save");
        let loaded = store.load_snapshot(&visitor).expect("load").expect("some");
        assert!(loaded.events.is_empty());
    }

    #[test]
    fn list_delete_count() {
        let store = SqliteSnapshotStore::open_in_memory(&config()).expect("open");
        for name in ["b", "a", "c"] {
            store
                .save_snapshot(&VisitorId::from(name), &snapshot(1, 0), None)
                .expect("save");
        }
        assert_eq!(store.visitor_count().expect("count"), 3);
        let names: Vec<_> = store.list_visitors().expect("list").into_iter().map(|v| v.0).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(store.delete(&VisitorId::from("a")).expect("delete"));
        assert!(!store.delete(&VisitorId::from("a")).expect("delete again"));
        assert!(store.integrity_check().expect("check"));
    }

    #[test]
    fn file_based_open_and_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SqliteSnapshotStore::open(dir.path().join("ekk0.db"), &config()).expect("open");
        let visitor = VisitorId::from("alpha");
        store.save_snapshot(&visitor, &snapshot(9, 3), None).expect("save");

        let backup_path = dir.path().join("ekk0_backup.db");
        store.backup(&backup_path).expect("backup");

        let restored = SqliteSnapshotStore::open(&backup_path, &config()).expect("open backup");
        let loaded = restored.load_snapshot(&visitor).expect("load").expect("some");
        assert_eq!(loaded.creature.total_feeds, 3);
    }
}
