//! Durable, single-host, atomic file store for the coordinator's JSON
//! documents and the per-cell item directories.
//!
//! Every document has a single writer role (takt, the owning cell, or
//! wake/night). Writes stage to a temp sibling and rename over the target,
//! so a reader sees the old document or the new one, never a torn write.
//! Directory moves are plain renames: an item is in exactly one of
//! inputs/wip/archive at any instant.

use crate::error::Result;
use crate::io;
use crate::paths::{self, Area};
use crate::types::CellName;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the state/cells/logs skeleton. Idempotent; called at the top
    /// of every pulse so a cold start needs no separate init step.
    pub fn ensure_layout(&self) -> Result<()> {
        io::ensure_dir(&paths::state_dir(&self.root))?;
        io::ensure_dir(&paths::logs_dir(&self.root))?;
        for cell in CellName::all() {
            for area in [Area::Inputs, Area::Wip, Area::Outputs, Area::Archive] {
                io::ensure_dir(&paths::area_dir(&self.root, *cell, area))?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Documents
    // -----------------------------------------------------------------------

    /// Read the last committed value of a document. Absent files and
    /// unparseable content both read as `None` — a half-migrated or
    /// corrupted document must never wedge a pulse.
    pub fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&data) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable document treated as absent");
                Ok(None)
            }
        }
    }

    pub fn write<T: Serialize>(&self, path: &Path, doc: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(doc)?;
        io::atomic_write(path, &data)
    }

    // -----------------------------------------------------------------------
    // Cell directories
    // -----------------------------------------------------------------------

    pub fn area_dir(&self, cell: CellName, area: Area) -> PathBuf {
        paths::area_dir(&self.root, cell, area)
    }

    /// Enumerate the `*.json` items in a cell area, sorted by filename.
    /// An absent directory lists as empty.
    pub fn list_items(&self, cell: CellName, area: Area) -> Result<Vec<PathBuf>> {
        let dir = self.area_dir(cell, area);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut items: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        items.sort();
        Ok(items)
    }

    /// Move an item file into another area of the same cell, preserving its
    /// filename. Returns the destination path.
    pub fn move_item(&self, src: &Path, cell: CellName, dst: Area) -> Result<PathBuf> {
        let dir = self.area_dir(cell, dst);
        io::ensure_dir(&dir)?;
        let name = src
            .file_name()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"))?;
        let target = dir.join(name);
        std::fs::rename(src, &target)?;
        Ok(target)
    }

    // -----------------------------------------------------------------------
    // Logs
    // -----------------------------------------------------------------------

    pub fn append_log(&self, name: &str, line: &str) -> Result<()> {
        io::append_line(&paths::log_path(&self.root, name), line)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
