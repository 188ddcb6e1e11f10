//! The four work cells. Each pulse is a run-to-completion function over
//! the filesystem: recount WIP from the directory listing, admit queued
//! items through the cell's quality gate, archive completions, recompute
//! the aggregate gate, persist status. The shared mechanics live here;
//! the per-cell gates and metrics live in the submodules.

pub mod build;
pub mod monitor;
pub mod research;
pub mod ship;

use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::item::{self, WorkItem};
use crate::paths::Area;
use crate::status::CellStatus;
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

// ---------------------------------------------------------------------------
// PulseSummary
// ---------------------------------------------------------------------------

/// What a pulse reports back to the CLI: a compact view of the status it
/// just persisted plus what moved during this invocation.
#[derive(Debug, Clone, Serialize)]
pub struct PulseSummary {
    pub cell: CellName,
    pub wip: usize,
    pub wip_cap: usize,
    pub queue_depth: usize,
    pub admitted: usize,
    pub completed: usize,
    pub quality_gate: GateVerdict,
    pub failure_duration_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PulseSummary {
    fn from_status(status: &CellStatus, admitted: usize, completed: usize) -> Self {
        Self {
            cell: status.cell,
            wip: status.wip,
            wip_cap: status.wip_cap,
            queue_depth: status.queue_depth,
            admitted,
            completed,
            quality_gate: status.quality_gate,
            failure_duration_secs: status.failure_duration_secs,
            detail: None,
        }
    }
}

/// Run one pulse of the named cell.
pub fn pulse(
    cell: CellName,
    store: &StateStore,
    config: &Config,
    clock: &dyn Clock,
) -> Result<PulseSummary> {
    match cell {
        CellName::Research => research::pulse(store, config, clock),
        CellName::Build => build::pulse(store, config, clock),
        CellName::Ship => ship::pulse(store, config, clock),
        CellName::Monitor => monitor::pulse(store, config, clock),
    }
}

// ---------------------------------------------------------------------------
// Shared pulse mechanics
// ---------------------------------------------------------------------------

/// Per-item gate decision.
pub enum ItemGate {
    Pass,
    Fail(String),
}

pub(crate) struct Admission {
    pub admitted: usize,
    pub rejected: usize,
    pub quarantined: usize,
}

/// Walk the inputs queue in (priority, created_at) order, admitting items
/// through `gate` until the WIP cap is hit. Rejected items stay queued and
/// count as gate fails; malformed files are quarantined in place.
pub(crate) fn admit_from_inputs(
    store: &StateStore,
    status: &mut CellStatus,
    now: DateTime<Utc>,
    gate: impl Fn(&WorkItem) -> Result<ItemGate>,
) -> Result<Admission> {
    let cell = status.cell;
    let scan = item::scan_dir(&store.area_dir(cell, Area::Inputs))?;

    let mut outcome = Admission {
        admitted: 0,
        rejected: 0,
        quarantined: 0,
    };

    for (path, reason) in &scan.malformed {
        warn!(cell = %cell, path = %path.display(), %reason, "quarantined malformed item");
        log_pulse(store, cell, now, &format!("quarantined {}: {reason}", file_name(path)))?;
        status.quality_gate_fails += 1;
        outcome.quarantined += 1;
    }

    for queued in &scan.items {
        if status.wip >= status.wip_cap {
            break;
        }
        match gate(&queued.item)? {
            ItemGate::Pass => {
                store.move_item(&queued.path, cell, Area::Wip)?;
                status.wip += 1;
                status.quality_gate_passes += 1;
                outcome.admitted += 1;
                log_pulse(store, cell, now, &format!("admitted {}", queued.item.id))?;
            }
            ItemGate::Fail(reason) => {
                status.quality_gate_fails += 1;
                outcome.rejected += 1;
                log_pulse(
                    store,
                    cell,
                    now,
                    &format!("gate failed for {}: {reason}", queued.item.id),
                )?;
            }
        }
    }

    Ok(outcome)
}

/// Move WIP items whose sidecar says `completed` into the archive. When
/// `with_paired_md` is set, a same-stem `.md` document travels with the
/// item. Returns how many items were archived.
pub(crate) fn archive_completed(
    store: &StateStore,
    status: &mut CellStatus,
    now: DateTime<Utc>,
    with_paired_md: bool,
) -> Result<usize> {
    let cell = status.cell;
    let scan = item::scan_dir(&store.area_dir(cell, Area::Wip))?;

    let mut archived = 0;
    for queued in &scan.items {
        if !queued.item.is_complete() {
            continue;
        }
        if with_paired_md {
            let md = queued.path.with_extension("md");
            if md.exists() {
                store.move_item(&md, cell, Area::Archive)?;
            }
        }
        store.move_item(&queued.path, cell, Area::Archive)?;
        status.wip = status.wip.saturating_sub(1);
        status.completed_total += 1;
        archived += 1;
        log_pulse(store, cell, now, &format!("archived {}", queued.item.id))?;
    }

    if archived > 0 {
        status.last_output = Some(now);
    }
    Ok(archived)
}

/// WIP recount from the directory listing — the directory is ground truth,
/// whatever the last persisted status said.
pub(crate) fn recount(store: &StateStore, status: &mut CellStatus) -> Result<()> {
    status.wip = store.list_items(status.cell, Area::Wip)?.len();
    status.queue_depth = store.list_items(status.cell, Area::Inputs)?.len();
    Ok(())
}

pub(crate) fn log_pulse(
    store: &StateStore,
    cell: CellName,
    now: DateTime<Utc>,
    msg: &str,
) -> Result<()> {
    store.append_log(
        cell.as_str(),
        &format!("[{}] {} | {msg}", now.to_rfc3339(), cell.as_str()),
    )
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
