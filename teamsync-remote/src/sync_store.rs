//! Per-folder store of sync entries.
//!
//! Persists a `SyncEntriesFile` JSON document at
//! `<folder>/.teamsync/entries.json`. Writes go to a `.tmp` sibling first and
//! are then renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teamsync_core::error::io_err;
use teamsync_core::TeamError;

use crate::sync_info::ResourceSyncInfo;

/// On-disk entries of one folder, keyed by file name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncEntriesFile {
    pub synced_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: BTreeMap<String, ResourceSyncInfo>,
}

impl SyncEntriesFile {
    pub fn empty() -> Self {
        Self {
            synced_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ResourceSyncInfo> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, info: ResourceSyncInfo) {
        self.entries.insert(info.name.clone(), info);
    }

    pub fn remove(&mut self, name: &str) -> Option<ResourceSyncInfo> {
        self.entries.remove(name)
    }
}

/// `<folder>/.teamsync/entries.json`
pub fn entries_path_at(folder: &Path) -> PathBuf {
    folder.join(".teamsync").join("entries.json")
}

/// Load the entries of `folder`; empty when none were saved yet.
pub fn load_at(folder: &Path) -> Result<SyncEntriesFile, TeamError> {
    let path = entries_path_at(folder);
    if !path.exists() {
        return Ok(SyncEntriesFile::empty());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the entries of `folder` atomically.
pub fn save_at(folder: &Path, file: &SyncEntriesFile) -> Result<(), TeamError> {
    let path = entries_path_at(folder);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid entries path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(file)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    tracing::debug!(folder = %folder.display(), entries = file.entries.len(), "saved sync entries");
    Ok(())
}
