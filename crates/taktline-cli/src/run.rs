use crate::kind::PulseKind;
use crate::{lock, output, root};
use anyhow::Context;
use std::path::Path;
use taktline_core::clock::{Clock, SystemClock};
use taktline_core::config::Config;
use taktline_core::store::StateStore;
use taktline_core::takt::TaktMaster;
use taktline_core::types::CellName;
use taktline_core::{cells, night, takt, wake};

/// Run one invocation of a pulse kind: resolve the root, take the per-kind
/// lock (or skip cleanly), load config, dispatch, and report.
pub fn run(kind: PulseKind, explicit_root: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let root = root::resolve_root(explicit_root);
    let store = StateStore::new(&root);

    let Some(_lock) = lock::try_acquire(&root, kind.as_str())? else {
        let _ = store.append_log(
            kind.log_name(),
            &format!(
                "[{}] {kind} | skipped: already running",
                chrono::Utc::now().to_rfc3339()
            ),
        );
        println!("skipped: {kind} already running");
        return Ok(());
    };

    let config = Config::load(&root).context("failed to load configuration")?;
    let clock = SystemClock;

    let result = dispatch(kind, &store, &config, &clock, json);
    if let Err(e) = &result {
        // Terminal error transition: one line to the pulse's own log,
        // persisted state untouched; the next invocation retries.
        let now = chrono::Utc::now();
        let _ = store.append_log(
            kind.log_name(),
            &format!("[{}] {kind} | pulse error: {e:#}", now.to_rfc3339()),
        );
        if kind == PulseKind::Takt {
            takt::write_failure_marker(&store, now, &format!("{e:#}"));
        }
    }
    result
}

fn dispatch(
    kind: PulseKind,
    store: &StateStore,
    config: &Config,
    clock: &dyn Clock,
    json: bool,
) -> anyhow::Result<()> {
    match kind {
        PulseKind::Takt => {
            let cascade = TaktMaster::new(store, config, clock).beat()?;
            if json {
                output::print_json(&cascade)?;
            } else {
                println!(
                    "TAKT #{} emitted at {}",
                    cascade.tick_id,
                    cascade.emitted_at.to_rfc3339()
                );
                println!("  mode: {}", cascade.mode);
                println!("  cells: {} reporting", cascade.cell_snapshot.len());
            }
        }
        PulseKind::Research => cell_pulse(CellName::Research, store, config, clock, json)?,
        PulseKind::Build => cell_pulse(CellName::Build, store, config, clock, json)?,
        PulseKind::Ship => cell_pulse(CellName::Ship, store, config, clock, json)?,
        PulseKind::Monitor => cell_pulse(CellName::Monitor, store, config, clock, json)?,
        PulseKind::WakeSync => {
            let report = wake::WakeSync::new(store, config, clock).execute()?;
            if json {
                output::print_json(&serde_json::json!({
                    "brief": report.brief_path,
                    "tasks_queued": report.tasks_queued,
                    "mode": report.mode,
                    "overall_health": report.overall_health,
                }))?;
            } else {
                println!("wake sync complete");
                println!("  brief: {}", report.brief_path.display());
                println!("  tasks queued: {}", report.tasks_queued);
                println!("  mode: {}", report.mode);
            }
        }
        PulseKind::NightBrief => {
            let report = night::NightBrief::new(store, config, clock).execute()?;
            if json {
                output::print_json(&serde_json::json!({
                    "brief": report.brief_path,
                    "logs_rotated": report.logs_rotated,
                    "metrics": report.metrics,
                }))?;
            } else {
                println!("night brief complete");
                println!("  brief: {}", report.brief_path.display());
                println!("  logs rotated: {}", report.logs_rotated);
                println!("  total wip: {}", report.metrics.total_wip);
                println!("  gate pass rate: {:.1}%", report.metrics.pass_rate);
            }
        }
    }
    Ok(())
}

fn cell_pulse(
    cell: CellName,
    store: &StateStore,
    config: &Config,
    clock: &dyn Clock,
    json: bool,
) -> anyhow::Result<()> {
    let summary = cells::pulse(cell, store, config, clock)?;
    if json {
        output::print_json(&summary)?;
    } else {
        println!(
            "{} pulse: wip {}/{}, queue {}, admitted {}, completed {}, gate {}",
            summary.cell,
            summary.wip,
            summary.wip_cap,
            summary.queue_depth,
            summary.admitted,
            summary.completed,
            summary.quality_gate
        );
        if let Some(detail) = &summary.detail {
            println!("  {detail}");
        }
    }
    Ok(())
}
