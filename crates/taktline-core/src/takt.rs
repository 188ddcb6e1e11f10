use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::status::{CellSnapshot, CellStatus};
use crate::store::StateStore;
use crate::types::{CellName, Mode};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// TickState
// ---------------------------------------------------------------------------

/// The global heartbeat document. Created on the first takt, mutated only
/// by the takt master, never deleted. `tick_count` is the one monotonic
/// clock shared by every process on the floor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tick_count: u64,
    #[serde(default)]
    pub last_beat: Option<DateTime<Utc>>,
    #[serde(default = "default_mode")]
    pub current_mode: Mode,
    #[serde(default)]
    pub cell_snapshot: BTreeMap<String, CellSnapshot>,
}

fn default_version() -> u32 {
    1
}

fn default_mode() -> Mode {
    Mode::Rest
}

impl Default for TickState {
    fn default() -> Self {
        Self {
            version: 1,
            tick_count: 0,
            last_beat: None,
            current_mode: Mode::Rest,
            cell_snapshot: BTreeMap::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CascadeSignal
// ---------------------------------------------------------------------------

/// The per-tick artifact cells read. Overwritten on every beat;
/// `tick_id` always equals `TickState.tick_count` after a successful takt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeSignal {
    pub tick_id: u64,
    pub emitted_at: DateTime<Utc>,
    pub mode: Mode,
    /// Per-cell response-SLA targets, seconds.
    pub response_sla: BTreeMap<String, u64>,
    pub cell_snapshot: BTreeMap<String, CellSnapshot>,
}

// ---------------------------------------------------------------------------
// TaktMaster
// ---------------------------------------------------------------------------

pub struct TaktMaster<'a> {
    store: &'a StateStore,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> TaktMaster<'a> {
    pub fn new(store: &'a StateStore, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    /// Execute one takt beat: bump the tick, sample the cells, select the
    /// mode from the local clock, emit the cascade, persist, log one line.
    pub fn beat(&self) -> Result<CascadeSignal> {
        self.store.ensure_layout()?;

        let state_path = paths::takt_state_path(self.store.root());
        let mut state: TickState = self.store.read(&state_path)?.unwrap_or_default();

        let now = self.clock.now();
        let local = now.with_timezone(&self.config.local_offset()?);
        state.tick_count += 1;
        state.last_beat = Some(now);
        state.current_mode = Mode::for_hour(local.hour());
        state.cell_snapshot = self.sample_cells()?;

        let cascade = CascadeSignal {
            tick_id: state.tick_count,
            emitted_at: now,
            mode: state.current_mode,
            response_sla: CellName::all()
                .iter()
                .map(|c| (c.as_str().to_string(), self.config.sla_for(*c)))
                .collect(),
            cell_snapshot: state.cell_snapshot.clone(),
        };

        self.store
            .write(&paths::cascade_path(self.store.root()), &cascade)?;
        self.store.write(&state_path, &state)?;
        self.store.append_log(
            "takt",
            &format!(
                "[{}] TAKT #{} | {} | cascade emitted",
                now.to_rfc3339(),
                cascade.tick_id,
                cascade.mode
            ),
        )?;

        clear_failure_marker(self.store);
        Ok(cascade)
    }

    /// Snapshot every cell that has a readable status document. Cells that
    /// have never pulsed are simply absent from the snapshot.
    fn sample_cells(&self) -> Result<BTreeMap<String, CellSnapshot>> {
        let mut snapshot = BTreeMap::new();
        for cell in CellName::all() {
            let path = paths::cell_status_path(self.store.root(), *cell);
            if let Some(status) = self.store.read::<CellStatus>(&path)? {
                snapshot.insert(cell.as_str().to_string(), CellSnapshot::from(&status));
            }
        }
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// Failure marker
// ---------------------------------------------------------------------------

/// Drop a visible marker when a takt beat dies. Best-effort by design: the
/// caller is already on its way to a non-zero exit.
pub fn write_failure_marker(store: &StateStore, now: DateTime<Utc>, error: &str) {
    let path = paths::takt_failure_path(store.root());
    let line = format!("takt failure at {}: {error}\n", now.to_rfc3339());
    let _ = crate::io::atomic_write(&path, line.as_bytes());
}

fn clear_failure_marker(store: &StateStore) {
    let path = paths::takt_failure_path(store.root());
    if let Err(e) = std::fs::remove_file(&path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(error = %e, "could not clear takt failure marker");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
