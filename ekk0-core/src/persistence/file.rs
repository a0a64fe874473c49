//! Device-local snapshot files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{SaveReceipt, Snapshot, SnapshotStore};
use crate::error::Result;
use crate::types::{Timestamp, VisitorId};

/// One `<visitor>.json` file per visitor under a directory.
///
/// This is the device's own copy, so saves always overwrite and
/// `last_sync` is ignored. Writes go through a temporary file and a rename
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Store rooted at `dir`, created if missing.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Io`] if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the snapshot files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the visitor's snapshot file.
    #[must_use]
    pub fn path_for(&self, visitor: &VisitorId) -> PathBuf {
        let name: String = visitor
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    /// Remove the visitor's snapshot. Returns `true` if a file was removed.
    ///
    /// # Errors
    /// Returns [`crate::Ekk0Error::Io`] on filesystem failures.
    pub fn delete(&self, visitor: &VisitorId) -> Result<bool> {
        match fs::remove_file(self.path_for(visitor)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn load_snapshot(&self, visitor: &VisitorId) -> Result<Option<Snapshot>> {
        let path = self.path_for(visitor);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Snapshot::decode(visitor, &bytes))
    }

    fn save_snapshot(
        &self,
        visitor: &VisitorId,
        snapshot: &Snapshot,
        _last_sync: Option<Timestamp>,
    ) -> Result<SaveReceipt> {
        let path = self.path_for(visitor);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(snapshot)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;

        debug!(
            visitor = %visitor,
            bytes = json.len(),
            path = %path.display(),
            "Wrote local snapshot"
        );
        Ok(SaveReceipt::for_state(&snapshot.creature, snapshot.saved_at, false))
    }
}
