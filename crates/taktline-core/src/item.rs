use crate::error::{Result, TaktError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Priority;

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ItemStatus {
    #[default]
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

/// A unit of work dropped into a cell's inputs directory by a producer.
/// The payload is opaque to the coordinator; everything else is metadata
/// the cells route on. Unknown fields are ignored, missing optional fields
/// fall back to defaults so producer and coordinator can evolve apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub actionable: bool,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl WorkItem {
    pub fn from_path(path: &Path) -> Result<WorkItem> {
        let data = std::fs::read_to_string(path)?;
        let item: WorkItem =
            serde_json::from_str(&data).map_err(|e| TaktError::MalformedItem {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        if item.id.trim().is_empty() {
            return Err(TaktError::MalformedItem {
                path: path.display().to_string(),
                reason: "empty id".to_string(),
            });
        }
        Ok(item)
    }

    pub fn is_complete(&self) -> bool {
        self.status == ItemStatus::Completed
    }

    /// Stable admission key: priority rank first, then creation time
    /// (missing treated as epoch), then filename-independent id.
    fn sort_key(&self) -> (u8, DateTime<Utc>, String) {
        (
            self.priority.rank(),
            self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            self.id.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Queue scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct QueuedItem {
    pub path: PathBuf,
    pub item: WorkItem,
}

/// Result of enumerating an inputs or WIP directory: parseable items in
/// admission order, and malformed files quarantined in place.
#[derive(Debug, Default)]
pub struct Scan {
    pub items: Vec<QueuedItem>,
    pub malformed: Vec<(PathBuf, String)>,
}

/// Enumerate `*.json` files in a directory. An absent directory scans as
/// empty. Items come back sorted by (priority, created_at); malformed files
/// are reported, not removed — the producer owns them until they parse.
pub fn scan_dir(dir: &Path) -> Result<Scan> {
    let mut scan = Scan::default();
    if !dir.exists() {
        return Ok(scan);
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        match WorkItem::from_path(&path) {
            Ok(item) => scan.items.push(QueuedItem { path, item }),
            Err(e) => scan.malformed.push((path, e.to_string())),
        }
    }
    scan.items.sort_by(|a, b| a.item.sort_key().cmp(&b.item.sort_key()));
    Ok(scan)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn write_item(dir: &Path, name: &str, json: &str) {
        std::fs::write(dir.join(name), json).unwrap();
    }

    #[test]
    fn parses_full_item() {
        let dir = TempDir::new().unwrap();
        write_item(
            dir.path(),
            "a.json",
            r#"{"id":"a","priority":"high","source":"arxiv:1234","actionable":true,
                "status":"queued","created_at":"2026-03-01T00:00:00Z","payload":{"k":1}}"#,
        );
        let item = WorkItem::from_path(&dir.path().join("a.json")).unwrap();
        assert_eq!(item.id, "a");
        assert_eq!(item.priority, Priority::High);
        assert!(item.actionable);
        assert_eq!(item.status, ItemStatus::Queued);
    }

    #[test]
    fn missing_fields_fall_back() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "min.json", r#"{"id":"min"}"#);
        let item = WorkItem::from_path(&dir.path().join("min.json")).unwrap();
        assert_eq!(item.priority, Priority::Medium);
        assert!(!item.actionable);
        assert!(item.source.is_none());
        assert!(item.created_at.is_none());
    }

    #[test]
    fn unknown_fields_ignored() {
        let dir = TempDir::new().unwrap();
        write_item(
            dir.path(),
            "x.json",
            r#"{"id":"x","future_field":"whatever"}"#,
        );
        assert!(WorkItem::from_path(&dir.path().join("x.json")).is_ok());
    }

    #[test]
    fn empty_id_is_malformed() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "bad.json", r#"{"id":"  "}"#);
        assert!(matches!(
            WorkItem::from_path(&dir.path().join("bad.json")),
            Err(TaktError::MalformedItem { .. })
        ));
    }

    #[test]
    fn in_progress_status_hyphenated() {
        let dir = TempDir::new().unwrap();
        write_item(
            dir.path(),
            "w.json",
            r#"{"id":"w","status":"in-progress"}"#,
        );
        let item = WorkItem::from_path(&dir.path().join("w.json")).unwrap();
        assert_eq!(item.status, ItemStatus::InProgress);
    }

    #[test]
    fn scan_sorts_by_priority_then_age() {
        let dir = TempDir::new().unwrap();
        let t = |s| {
            chrono::Utc
                .with_ymd_and_hms(2026, 3, 1, 0, 0, s)
                .unwrap()
                .to_rfc3339()
        };
        write_item(
            dir.path(),
            "1.json",
            &format!(r#"{{"id":"low-old","priority":"low","created_at":"{}"}}"#, t(1)),
        );
        write_item(
            dir.path(),
            "2.json",
            &format!(r#"{{"id":"high-young","priority":"high","created_at":"{}"}}"#, t(6)),
        );
        write_item(
            dir.path(),
            "3.json",
            &format!(r#"{{"id":"high-old","priority":"high","created_at":"{}"}}"#, t(5)),
        );
        write_item(
            dir.path(),
            "4.json",
            &format!(r#"{{"id":"crit","priority":"critical","created_at":"{}"}}"#, t(10)),
        );

        let scan = scan_dir(dir.path()).unwrap();
        let order: Vec<&str> = scan.items.iter().map(|q| q.item.id.as_str()).collect();
        assert_eq!(order, ["crit", "high-old", "high-young", "low-old"]);
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn scan_quarantines_malformed() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "ok.json", r#"{"id":"ok"}"#);
        write_item(dir.path(), "broken.json", "{not json");
        let scan = scan_dir(dir.path()).unwrap();
        assert_eq!(scan.items.len(), 1);
        assert_eq!(scan.malformed.len(), 1);
        // The malformed file stays where the producer put it.
        assert!(dir.path().join("broken.json").exists());
    }

    #[test]
    fn scan_absent_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        let scan = scan_dir(&dir.path().join("nope")).unwrap();
        assert!(scan.items.is_empty());
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn scan_ignores_non_json() {
        let dir = TempDir::new().unwrap();
        write_item(dir.path(), "item.json", r#"{"id":"a"}"#);
        std::fs::write(dir.path().join("notes.md"), "# notes").unwrap();
        let scan = scan_dir(dir.path()).unwrap();
        assert_eq!(scan.items.len(), 1);
        assert!(scan.malformed.is_empty());
    }
}
