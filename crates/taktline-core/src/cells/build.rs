//! Build cell: watches a project directory and runs the external check
//! battery (tests, types, security). Tests drive the gate; the other two
//! checks are advisory.

use crate::cells::{admit_from_inputs, archive_completed, log_pulse, recount, ItemGate, PulseSummary};
use crate::check::{run_check, CheckRound};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::status::CellStatus;
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict};

pub fn pulse(store: &StateStore, config: &Config, clock: &dyn Clock) -> Result<PulseSummary> {
    store.ensure_layout()?;
    let now = clock.now();
    let mut status = CellStatus::load(store.root(), CellName::Build);
    recount(store, &mut status)?;

    // Malformedness is the only admission criterion for build tasks; the
    // scan has already quarantined anything unparseable.
    let admission = admit_from_inputs(store, &mut status, now, |_| Ok(ItemGate::Pass))?;
    let archived = archive_completed(store, &mut status, now, false)?;
    recount(store, &mut status)?;

    let (verdict, reason) = match &config.build.project_dir {
        None => (
            GateVerdict::Unknown,
            Some("no project configured".to_string()),
        ),
        Some(dir) if !dir.is_dir() => (
            GateVerdict::Unknown,
            Some(format!("project dir {} missing", dir.display())),
        ),
        Some(dir) => {
            let round = CheckRound {
                ran_at: now,
                tests: run_check(&config.build.test, dir),
                types: run_check(&config.build.types, dir),
                security: run_check(&config.build.security, dir),
            };
            let decision = if round.tests.passed {
                let advisory = !round.types.passed || !round.security.passed;
                (
                    GateVerdict::Passed,
                    advisory.then(|| "advisory: type/security checks reported issues".to_string()),
                )
            } else if round.tests.timed_out {
                (GateVerdict::Failed, Some("tests timed out".to_string()))
            } else {
                (GateVerdict::Failed, Some("tests failed".to_string()))
            };
            status.last_check_round = Some(round);
            decision
        }
    };

    status.apply_gate(verdict, reason.clone(), now);
    if verdict == GateVerdict::Passed {
        status.last_output = Some(now);
    }
    status.last_pulse = Some(now);
    status.save(store.root())?;

    log_pulse(
        store,
        CellName::Build,
        now,
        &format!(
            "pulse complete | wip {}/{} gate {} failure_duration {}s",
            status.wip, status.wip_cap, status.quality_gate, status.failure_duration_secs
        ),
    )?;

    let mut summary = PulseSummary::from_status(&status, admission.admitted, archived);
    summary.detail = reason;
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
