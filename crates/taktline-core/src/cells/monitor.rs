//! Monitor cell: the observer. Aggregates the other cells into the unified
//! state document, maintains the andon board and alert queue, and records
//! red-level escalations. Holds no work of its own.

use crate::andon::{self, Alert, AndonLevel};
use crate::cells::{log_pulse, PulseSummary};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::status::{CellSnapshot, CellStatus};
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// UnifiedState
// ---------------------------------------------------------------------------

/// Top-level health view consumed by wake sync and night brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedState {
    pub generated_at: DateTime<Utc>,
    pub overall_health: GateVerdict,
    pub total_wip: usize,
    pub cells: BTreeMap<String, CellSnapshot>,
}

// ---------------------------------------------------------------------------
// Pulse
// ---------------------------------------------------------------------------

pub fn pulse(store: &StateStore, _config: &Config, clock: &dyn Clock) -> Result<PulseSummary> {
    store.ensure_layout()?;
    let now = clock.now();
    let mut status = CellStatus::load(store.root(), CellName::Monitor);

    // Every cell that has ever pulsed, this one's previous status included.
    let mut statuses: Vec<CellStatus> = Vec::new();
    for cell in CellName::all() {
        let path = paths::cell_status_path(store.root(), *cell);
        if let Some(s) = store.read::<CellStatus>(&path)? {
            statuses.push(s);
        }
    }

    let overall_health = if statuses.is_empty() {
        GateVerdict::Unknown
    } else {
        GateVerdict::worst(statuses.iter().map(|s| s.quality_gate))
    };
    let unified = UnifiedState {
        generated_at: now,
        overall_health,
        total_wip: statuses.iter().map(|s| s.wip).sum(),
        cells: statuses
            .iter()
            .map(|s| (s.cell.as_str().to_string(), CellSnapshot::from(s)))
            .collect(),
    };
    store.write(&paths::unified_state_path(store.root()), &unified)?;

    let board = andon::evaluate(&statuses, now);
    crate::io::atomic_write(
        &paths::andon_board_path(store.root()),
        andon::render_markdown(&board).as_bytes(),
    )?;

    let alerts = andon::active_alerts(&board);
    record_escalations(store, &alerts, now)?;
    store.write(&paths::alert_queue_path(store.root()), &alerts)?;

    status.wip = 0;
    status.queue_depth = 0;
    status.apply_gate(GateVerdict::Passed, None, now);
    status.last_output = Some(now);
    status.last_pulse = Some(now);
    status.save(store.root())?;

    log_pulse(
        store,
        CellName::Monitor,
        now,
        &format!(
            "pulse complete | overall {} cells {} alerts {}",
            overall_health,
            statuses.len(),
            alerts.len()
        ),
    )?;

    let mut summary = PulseSummary::from_status(&status, 0, 0);
    summary.detail = Some(format!(
        "overall {overall_health}, {} cell(s) reporting, {} alert(s)",
        statuses.len(),
        alerts.len()
    ));
    Ok(summary)
}

/// Append a line to the escalation log for each cell that just turned red.
/// Cells already red in the previous alert queue are not re-logged.
fn record_escalations(store: &StateStore, alerts: &[Alert], now: DateTime<Utc>) -> Result<()> {
    let previous: Vec<Alert> = store
        .read(&paths::alert_queue_path(store.root()))?
        .unwrap_or_default();
    for alert in alerts.iter().filter(|a| a.level == AndonLevel::Red) {
        let already_red = previous
            .iter()
            .any(|p| p.cell == alert.cell && p.level == AndonLevel::Red);
        if !already_red {
            store.append_log(
                "escalation",
                &format!(
                    "[{}] RED {} | {}",
                    now.to_rfc3339(),
                    alert.cell,
                    alert.reasons.join("; ")
                ),
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
