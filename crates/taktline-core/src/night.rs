//! Night brief: the evening routine. Computes the day's aggregate metrics,
//! rotates oversized logs, and writes the evening report.

use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::io;
use crate::paths;
use crate::queue::WorkQueue;
use crate::status::CellStatus;
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict};
use serde::Serialize;
use std::path::PathBuf;

/// Logs longer than this are truncated to their tail at rotation.
const MAX_LOG_LINES: usize = 5_000;

/// How many of tomorrow's tasks the evening brief previews.
const QUEUE_PREVIEW: usize = 5;

// ---------------------------------------------------------------------------
// DailyMetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DailyMetrics {
    pub total_wip: usize,
    pub total_shipped: usize,
    pub gate_passes: u64,
    pub gate_fails: u64,
    /// Percent; 100 when no gate events occurred.
    pub pass_rate: f64,
}

impl DailyMetrics {
    fn compute(statuses: &[CellStatus]) -> Self {
        let gate_passes: u64 = statuses.iter().map(|s| s.quality_gate_passes).sum();
        let gate_fails: u64 = statuses.iter().map(|s| s.quality_gate_fails).sum();
        let total = gate_passes + gate_fails;
        let pass_rate = if total == 0 {
            100.0
        } else {
            gate_passes as f64 / total as f64 * 100.0
        };
        Self {
            total_wip: statuses.iter().map(|s| s.wip).sum(),
            total_shipped: statuses
                .iter()
                .find(|s| s.cell == CellName::Ship)
                .map(|s| s.bootstraps_shipped.len())
                .unwrap_or(0),
            gate_passes,
            gate_fails,
            pass_rate,
        }
    }
}

pub struct NightReport {
    pub brief_path: PathBuf,
    pub logs_rotated: usize,
    pub metrics: DailyMetrics,
}

// ---------------------------------------------------------------------------
// NightBrief
// ---------------------------------------------------------------------------

pub struct NightBrief<'a> {
    store: &'a StateStore,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> NightBrief<'a> {
    pub fn new(store: &'a StateStore, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn execute(&self) -> Result<NightReport> {
        self.store.ensure_layout()?;
        let now = self.clock.now();
        let local = now.with_timezone(&self.config.local_offset()?);

        let statuses: Vec<CellStatus> = CellName::all()
            .iter()
            .map(|c| CellStatus::load(self.store.root(), *c))
            .collect();
        let metrics = DailyMetrics::compute(&statuses);
        let logs_rotated = self.rotate_logs()?;
        let tomorrow = WorkQueue::load(self.store)?;

        let brief = self.render_brief(&statuses, &metrics, tomorrow.as_ref(), &local.to_rfc3339());
        let brief_path = paths::evening_brief_path(self.store.root());
        io::atomic_write(&brief_path, brief.as_bytes())?;

        self.store.append_log(
            "night",
            &format!(
                "[{}] night brief | wip {} shipped {} pass rate {:.1}% | {logs_rotated} log(s) rotated",
                now.to_rfc3339(),
                metrics.total_wip,
                metrics.total_shipped,
                metrics.pass_rate
            ),
        )?;

        Ok(NightReport {
            brief_path,
            logs_rotated,
            metrics,
        })
    }

    /// Truncate every oversized `*.log` under the logs dir to its tail.
    fn rotate_logs(&self) -> Result<usize> {
        let dir = paths::logs_dir(self.store.root());
        if !dir.exists() {
            return Ok(0);
        }
        let mut rotated = 0;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "log")
                && io::truncate_to_last_lines(&path, MAX_LOG_LINES)?
            {
                rotated += 1;
            }
        }
        Ok(rotated)
    }

    fn render_brief(
        &self,
        statuses: &[CellStatus],
        metrics: &DailyMetrics,
        tomorrow: Option<&WorkQueue>,
        local_time: &str,
    ) -> String {
        let (date, time) = local_time.split_at(10);
        let mut lines = vec![
            "# Evening Brief".to_string(),
            String::new(),
            format!("**Date:** {date}"),
            format!("**Time (local):** {}", &time[1..6]),
            String::new(),
            "---".to_string(),
            String::new(),
            "## Day's Summary".to_string(),
            String::new(),
        ];

        for status in statuses {
            match status.last_output {
                Some(t) => lines.push(format!(
                    "- **{}**: {} WIP, last output at {}",
                    status.cell,
                    status.wip,
                    t.to_rfc3339()
                )),
                None => lines.push(format!("- **{}**: {} WIP, no output today", status.cell, status.wip)),
            }
        }

        let failed: Vec<&CellStatus> = statuses
            .iter()
            .filter(|s| s.quality_gate == GateVerdict::Failed)
            .collect();
        if !failed.is_empty() {
            lines.push(String::new());
            lines.push("### Persistent Failures".to_string());
            lines.push(String::new());
            for status in failed {
                lines.push(format!(
                    "- **{}**: gate failed for {}s ({})",
                    status.cell,
                    status.failure_duration_secs,
                    status.gate_reason.as_deref().unwrap_or("no reason recorded")
                ));
            }
        }

        lines.extend([
            String::new(),
            "### Key Metrics".to_string(),
            String::new(),
            format!("- Total WIP: {}", metrics.total_wip),
            format!(
                "- Bootstraps shipped: {}/{}",
                metrics.total_shipped,
                self.config.ship.catalog.len()
            ),
            format!(
                "- Quality gate: {} passed, {} failed ({:.1}% pass rate)",
                metrics.gate_passes, metrics.gate_fails, metrics.pass_rate
            ),
            String::new(),
            "---".to_string(),
            String::new(),
            "## Tomorrow's Queue".to_string(),
            String::new(),
        ]);

        match tomorrow {
            Some(queue) if !queue.tasks.is_empty() => {
                for task in queue.tasks.iter().take(QUEUE_PREVIEW) {
                    lines.push(format!(
                        "- [{}] {}: {} ({})",
                        task.priority, task.cell, task.action, task.est_time
                    ));
                }
            }
            _ => lines.push("(work queue will be generated by wake sync)".to_string()),
        }

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "## Maintenance".to_string(),
            String::new(),
            format!("- Next wake sync: {} local", self.config.wake_time),
            String::new(),
            "*Generated by night-brief*".to_string(),
        ]);

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
