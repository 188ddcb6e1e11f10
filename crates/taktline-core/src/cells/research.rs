//! Research cell: ingests captured insights and papers. Admission requires
//! a cited source, an actionable flag, and novelty against the archive.

use crate::cells::{admit_from_inputs, archive_completed, log_pulse, recount, ItemGate, PulseSummary};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::item::WorkItem;
use crate::paths::Area;
use crate::status::CellStatus;
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict};

/// How much of the item text participates in the duplicate check.
const DUPLICATE_PREFIX: usize = 100;

pub fn pulse(store: &StateStore, _config: &Config, clock: &dyn Clock) -> Result<PulseSummary> {
    store.ensure_layout()?;
    let now = clock.now();
    let mut status = CellStatus::load(store.root(), CellName::Research);
    recount(store, &mut status)?;

    let admission = admit_from_inputs(store, &mut status, now, |item| item_gate(store, item))?;
    let archived = archive_completed(store, &mut status, now, true)?;
    recount(store, &mut status)?;

    if admission.admitted > 0 {
        status.last_output = Some(now);
    }

    let advanced = admission.admitted + archived;
    let (verdict, reason) = if advanced > 0 || status.wip > 0 {
        (GateVerdict::Passed, None)
    } else {
        (GateVerdict::Unknown, Some("no work advanced".to_string()))
    };
    status.apply_gate(verdict, reason, now);
    status.last_pulse = Some(now);
    status.save(store.root())?;

    log_pulse(
        store,
        CellName::Research,
        now,
        &format!(
            "pulse complete | wip {}/{} admitted {} archived {}",
            status.wip, status.wip_cap, admission.admitted, archived
        ),
    )?;

    let mut summary = PulseSummary::from_status(&status, admission.admitted, archived);
    if admission.rejected + admission.quarantined > 0 {
        summary.detail = Some(format!(
            "{} item(s) held at the gate",
            admission.rejected + admission.quarantined
        ));
    }
    Ok(summary)
}

/// Three conjunctive checks: cited, actionable, not a duplicate.
fn item_gate(store: &StateStore, item: &WorkItem) -> Result<ItemGate> {
    let cited = item
        .source
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());
    if !cited {
        return Ok(ItemGate::Fail("missing source".to_string()));
    }
    if !item.actionable {
        return Ok(ItemGate::Fail("not actionable".to_string()));
    }
    if let Some(text) = item.text.as_deref() {
        let prefix: String = text.chars().take(DUPLICATE_PREFIX).collect();
        if !prefix.trim().is_empty() && archive_contains(store, &prefix)? {
            return Ok(ItemGate::Fail("duplicate of archived item".to_string()));
        }
    }
    Ok(ItemGate::Pass)
}

/// Textual containment scan over everything already archived.
fn archive_contains(store: &StateStore, needle: &str) -> Result<bool> {
    let dir = store.area_dir(CellName::Research, Area::Archive);
    if !dir.exists() {
        return Ok(false);
    }
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Ok(content) = std::fs::read_to_string(&path) {
            if content.contains(needle) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
