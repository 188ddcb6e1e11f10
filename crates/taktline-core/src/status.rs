use crate::check::CheckRound;
use crate::error::Result;
use crate::paths;
use crate::types::{CellName, GateVerdict, Mode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Ship metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippedProduct {
    pub id: String,
    pub name: String,
    pub shipped_at: DateTime<Utc>,
}

/// Advisory revenue summary derived from shipped count vs fixed targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenuePipeline {
    pub shipped_count: usize,
    pub target_week_1: f64,
    pub target_month_1: f64,
    pub target_month_6: f64,
    pub progress_week_1: f64,
}

// ---------------------------------------------------------------------------
// CellStatus
// ---------------------------------------------------------------------------

/// Per-cell status document, mutated only by the owning cell's pulse.
/// Cell-specific metrics live in defaulted optional fields so one shape
/// serves all four cells and older documents keep deserializing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellStatus {
    pub cell: CellName,
    pub mode_affinity: Mode,
    #[serde(default)]
    pub wip: usize,
    #[serde(default)]
    pub wip_cap: usize,
    #[serde(default)]
    pub last_output: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_pulse: Option<DateTime<Utc>>,
    #[serde(default)]
    pub quality_gate: GateVerdict,
    #[serde(default)]
    pub gate_reason: Option<String>,
    #[serde(default)]
    pub quality_gate_passes: u64,
    #[serde(default)]
    pub quality_gate_fails: u64,
    #[serde(default)]
    pub completed_total: u64,
    #[serde(default)]
    pub queue_depth: usize,
    #[serde(default)]
    pub failure_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure_duration_secs: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_round: Option<CheckRound>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bootstraps_shipped: Vec<ShippedProduct>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_pipeline: Option<RevenuePipeline>,
}

impl CellStatus {
    pub fn new(cell: CellName) -> Self {
        Self {
            cell,
            mode_affinity: cell.mode_affinity(),
            wip: 0,
            wip_cap: cell.wip_cap(),
            last_output: None,
            last_pulse: None,
            quality_gate: GateVerdict::Unknown,
            gate_reason: None,
            quality_gate_passes: 0,
            quality_gate_fails: 0,
            completed_total: 0,
            queue_depth: 0,
            failure_start: None,
            failure_duration_secs: 0,
            last_check_round: None,
            bootstraps_shipped: Vec::new(),
            revenue_pipeline: None,
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Load the cell's status, defaulting when the file is absent or does
    /// not parse (readers treat parse errors as absent). The name, affinity,
    /// and cap are always re-pinned — the document never overrides them.
    pub fn load(root: &Path, cell: CellName) -> CellStatus {
        let path = paths::cell_status_path(root, cell);
        let mut status = std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str::<CellStatus>(&data).ok())
            .unwrap_or_else(|| CellStatus::new(cell));
        status.cell = cell;
        status.mode_affinity = cell.mode_affinity();
        status.wip_cap = cell.wip_cap();
        status
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::cell_status_path(root, self.cell);
        let data = serde_json::to_vec_pretty(self)?;
        crate::io::atomic_write(&path, &data)
    }

    // -----------------------------------------------------------------------
    // Gate bookkeeping
    // -----------------------------------------------------------------------

    /// Record the aggregate gate verdict for this pulse. Starts the failure
    /// timer on the first failed pulse, extends it on each subsequent one,
    /// and resets both timer fields the moment the gate recovers.
    pub fn apply_gate(
        &mut self,
        verdict: GateVerdict,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.quality_gate = verdict;
        self.gate_reason = reason;
        if verdict == GateVerdict::Failed {
            let start = *self.failure_start.get_or_insert(now);
            self.failure_duration_secs = (now - start).num_seconds().max(0);
        } else {
            self.failure_start = None;
            self.failure_duration_secs = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// CellSnapshot
// ---------------------------------------------------------------------------

/// The compact per-cell summary embedded in tick state, cascade signals,
/// and the unified state document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub wip: usize,
    pub wip_cap: usize,
    pub last_output: Option<DateTime<Utc>>,
    pub quality_gate: GateVerdict,
}

impl From<&CellStatus> for CellSnapshot {
    fn from(status: &CellStatus) -> Self {
        Self {
            wip: status.wip,
            wip_cap: status.wip_cap,
            last_output: status.last_output,
            quality_gate: status.quality_gate,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_900_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn load_defaults_when_absent() {
        let dir = TempDir::new().unwrap();
        let status = CellStatus::load(dir.path(), CellName::Research);
        assert_eq!(status.cell, CellName::Research);
        assert_eq!(status.wip_cap, 3);
        assert_eq!(status.quality_gate, GateVerdict::Unknown);
    }

    #[test]
    fn load_defaults_when_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = paths::cell_status_path(dir.path(), CellName::Ship);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{half a docum").unwrap();
        let status = CellStatus::load(dir.path(), CellName::Ship);
        assert_eq!(status.wip, 0);
        assert_eq!(status.wip_cap, 2);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut status = CellStatus::new(CellName::Build);
        status.wip = 2;
        status.quality_gate_passes = 7;
        status.save(dir.path()).unwrap();

        let loaded = CellStatus::load(dir.path(), CellName::Build);
        assert_eq!(loaded.wip, 2);
        assert_eq!(loaded.quality_gate_passes, 7);
    }

    #[test]
    fn cap_is_pinned_over_document_value() {
        let dir = TempDir::new().unwrap();
        let mut status = CellStatus::new(CellName::Ship);
        status.wip_cap = 99;
        status.save(dir.path()).unwrap();
        let loaded = CellStatus::load(dir.path(), CellName::Ship);
        assert_eq!(loaded.wip_cap, 2);
    }

    #[test]
    fn failure_timer_starts_extends_resets() {
        let mut status = CellStatus::new(CellName::Build);

        status.apply_gate(GateVerdict::Failed, Some("tests failed".into()), at(0));
        assert_eq!(status.failure_duration_secs, 0);
        assert!(status.failure_start.is_some());

        status.apply_gate(GateVerdict::Failed, Some("tests failed".into()), at(60));
        assert_eq!(status.failure_duration_secs, 60);

        status.apply_gate(GateVerdict::Failed, Some("tests failed".into()), at(125));
        assert_eq!(status.failure_duration_secs, 125);

        status.apply_gate(GateVerdict::Passed, None, at(180));
        assert_eq!(status.failure_duration_secs, 0);
        assert!(status.failure_start.is_none());
    }

    #[test]
    fn duration_zero_iff_not_failed() {
        let mut status = CellStatus::new(CellName::Build);
        for verdict in [
            GateVerdict::Passed,
            GateVerdict::Warning,
            GateVerdict::Unknown,
        ] {
            status.apply_gate(GateVerdict::Failed, None, at(0));
            status.apply_gate(GateVerdict::Failed, None, at(90));
            assert!(status.failure_duration_secs > 0);
            status.apply_gate(verdict, None, at(100));
            assert_eq!(status.failure_duration_secs, 0);
        }
    }

    #[test]
    fn snapshot_reflects_status() {
        let mut status = CellStatus::new(CellName::Research);
        status.wip = 1;
        status.quality_gate = GateVerdict::Passed;
        let snap = CellSnapshot::from(&status);
        assert_eq!(snap.wip, 1);
        assert_eq!(snap.wip_cap, 3);
        assert_eq!(snap.quality_gate, GateVerdict::Passed);
    }

    #[test]
    fn old_documents_without_new_fields_deserialize() {
        let json = r#"{"cell":"research","mode_affinity":"VISION"}"#;
        let status: CellStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.cell, CellName::Research);
        assert_eq!(status.failure_duration_secs, 0);
        assert!(status.bootstraps_shipped.is_empty());
    }
}
