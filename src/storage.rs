//! Local snapshot persistence.
//!
//! The whole snapshot document is written under one key in an embedded sled
//! database — the local-storage analog — and can additionally be exported to
//! and imported from standalone JSON files. Saves are full-document
//! overwrites; a failed encode leaves the stored snapshot untouched.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::snapshot::Snapshot;

/// Key the snapshot document is stored under.
const SNAPSHOT_KEY: &str = "clientManagementDatabase";

/// Sled-backed local store holding the persisted snapshot.
pub struct LocalStore {
    db: sled::Db,
}

impl LocalStore {
    /// Open (or create) the local store at the given directory.
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        let db = sled::open(path).map_err(crate::error::LedgerError::from)?;
        Ok(Self { db })
    }

    /// Persist a snapshot, overwriting whatever was stored before.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let encoded = snapshot.to_json()?;
        self.db.insert(SNAPSHOT_KEY, encoded.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    /// Load the persisted snapshot, if any.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        match self.db.get(SNAPSHOT_KEY)? {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .context("Stored snapshot is not valid UTF-8")?;
                Ok(Some(Snapshot::from_json(&text)?))
            }
            None => Ok(None),
        }
    }

    /// Remove the persisted snapshot (new-database reset).
    pub fn clear(&self) -> Result<()> {
        self.db.remove(SNAPSHOT_KEY)?;
        self.db.flush()?;
        Ok(())
    }
}

/// Default export file name, `database_YYYY-MM-DD.json`.
#[must_use]
pub fn default_export_name(now: DateTime<Utc>) -> String {
    format!("database_{}.json", now.format("%Y-%m-%d"))
}

/// Write a snapshot to a standalone JSON file.
pub fn export_to_file(snapshot: &Snapshot, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, snapshot.to_json()?)?;
    info!(path = %path.display(), "snapshot exported");
    Ok(path.to_path_buf())
}

/// Read a snapshot from a standalone JSON file.
///
/// Parsing happens before anything is replaced, so a malformed file never
/// touches the live store.
pub fn import_from_file(path: &Path) -> Result<Snapshot> {
    let text = fs::read_to_string(path)?;
    let snapshot = Snapshot::from_json(&text)?;
    info!(path = %path.display(), "snapshot imported");
    Ok(snapshot)
}
