//! Wake sync: the morning routine. Reads the state store, writes the
//! morning brief, and materializes the day's advisory work queue.

use crate::cells::monitor::UnifiedState;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::Result;
use crate::paths;
use crate::queue::{TaskDescriptor, WorkQueue};
use crate::status::CellStatus;
use crate::store::StateStore;
use crate::types::{CellName, GateVerdict, Mode, Priority};
use chrono::{DateTime, Timelike, Utc};
use std::path::PathBuf;
use uuid::Uuid;

pub struct WakeReport {
    pub brief_path: PathBuf,
    pub tasks_queued: usize,
    pub mode: Mode,
    pub overall_health: GateVerdict,
}

pub struct WakeSync<'a> {
    store: &'a StateStore,
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> WakeSync<'a> {
    pub fn new(store: &'a StateStore, config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            config,
            clock,
        }
    }

    pub fn execute(&self) -> Result<WakeReport> {
        self.store.ensure_layout()?;
        let now = self.clock.now();
        let local = now.with_timezone(&self.config.local_offset()?);
        let mode = Mode::for_hour(local.hour());

        // Cells that never pulsed read as defaults; that is enough for the
        // queue rules (empty research still wants its feed processed).
        let statuses: Vec<CellStatus> = CellName::all()
            .iter()
            .map(|c| CellStatus::load(self.store.root(), *c))
            .collect();
        let unified: Option<UnifiedState> = self
            .store
            .read(&paths::unified_state_path(self.store.root()))?;
        let overall_health = unified
            .as_ref()
            .map(|u| u.overall_health)
            .unwrap_or(GateVerdict::Unknown);

        let queue = build_work_queue(&statuses, &local.format("%Y-%m-%d").to_string(), now);
        let brief = self.render_brief(&statuses, overall_health, mode, &local.to_rfc3339());

        let brief_path = paths::morning_brief_path(self.store.root());
        crate::io::atomic_write(&brief_path, brief.as_bytes())?;
        queue.save(self.store)?;

        self.store.append_log(
            "wake",
            &format!(
                "[{}] wake sync | mode {mode} | {} task(s) queued",
                now.to_rfc3339(),
                queue.tasks.len()
            ),
        )?;

        Ok(WakeReport {
            brief_path,
            tasks_queued: queue.tasks.len(),
            mode,
            overall_health,
        })
    }

    fn render_brief(
        &self,
        statuses: &[CellStatus],
        overall_health: GateVerdict,
        mode: Mode,
        local_time: &str,
    ) -> String {
        let (date, time) = local_time.split_at(10);
        let mut lines = vec![
            "# Morning Brief".to_string(),
            String::new(),
            format!("**Date:** {date}"),
            format!("**Time (local):** {}", &time[1..6]),
            format!("**Mode:** {} — {}", mode, mode.label()),
            format!("**Overall Health:** {}", overall_health),
            String::new(),
            "---".to_string(),
            String::new(),
            "## Cell Status Overnight".to_string(),
            String::new(),
        ];

        for status in statuses {
            let last = status
                .last_output
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "never".to_string());
            lines.push(format!(
                "- **{}**: {}/{} WIP, gate {}, last output {}",
                status.cell, status.wip, status.wip_cap, status.quality_gate, last
            ));
        }

        lines.extend(
            [
                "",
                "---",
                "",
                "## Today's Priorities",
                "",
                "### Research",
                "- [ ] Process the overnight feed",
                "- [ ] Advance active research items",
                "- [ ] Capture new insights",
                "",
                "### Build",
                "- [ ] Resolve any failing tests",
                "- [ ] Advance active build tasks",
                "",
                "### Ship",
                "- [ ] Queue the next bootstrap release",
                "- [ ] Review the revenue pipeline",
                "",
                "### Monitor",
                "- [ ] Review overnight alerts",
                "- [ ] Check the andon board",
                "",
                "---",
                "",
                "## Key Metrics",
                "",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let ship = statuses.iter().find(|s| s.cell == CellName::Ship);
        let shipped = ship.map(|s| s.bootstraps_shipped.len()).unwrap_or(0);
        let progress = ship
            .and_then(|s| s.revenue_pipeline.as_ref())
            .map(|p| p.progress_week_1)
            .unwrap_or(0.0);
        let total_wip: usize = statuses.iter().map(|s| s.wip).sum();
        lines.push(format!(
            "- Bootstraps shipped: {shipped}/{}",
            self.config.ship.catalog.len()
        ));
        lines.push(format!(
            "- Week 1 progress: ${progress:.2} / ${:.0}",
            self.config.ship.week_1_target
        ));
        lines.push(format!("- Active tasks: {total_wip}"));

        lines.extend(
            [
                "",
                "---",
                "",
                "## Takt Schedule",
                "",
                "| Time | Mode | Focus |",
                "|------|------|-------|",
                "| 06:00-09:00 | VISION | Planning, research |",
                "| 09:00-12:00 | CUT | Deep work, coding |",
                "| 12:00-14:00 | TRANSITION | Break |",
                "| 14:00-17:00 | HARMONY | Integration, reviews |",
                "| 17:00-19:00 | TRANSITION | Wind down |",
                "| 19:00-22:00 | COMPLETE | Documentation, prep |",
                "",
                "---",
                "",
                "*Generated by wake-sync*",
            ]
            .iter()
            .map(|s| s.to_string()),
        );

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// The day's advisory tasks, derived from current cell state:
/// research has headroom → process the feed; build is failing → fix tests
/// first; ship has a backlog → work the queue.
fn build_work_queue(statuses: &[CellStatus], date: &str, now: DateTime<Utc>) -> WorkQueue {
    let mut tasks = Vec::new();
    for status in statuses {
        match status.cell {
            CellName::Research => {
                if status.wip < status.wip_cap {
                    tasks.push(task(CellName::Research, Priority::High, "process_arxiv_feed", "30 min"));
                }
            }
            CellName::Build => {
                if status.quality_gate == GateVerdict::Failed {
                    tasks.push(task(CellName::Build, Priority::Critical, "fix_test_failures", "2 hours"));
                }
            }
            CellName::Ship => {
                if status.queue_depth > 0 {
                    tasks.push(task(CellName::Ship, Priority::Medium, "process_ship_queue", "1 hour"));
                }
            }
            CellName::Monitor => {}
        }
    }
    tasks.sort_by_key(|t| t.priority.rank());
    WorkQueue {
        date: date.to_string(),
        generated_at: now,
        tasks,
    }
}

fn task(cell: CellName, priority: Priority, action: &str, est_time: &str) -> TaskDescriptor {
    TaskDescriptor {
        id: format!("{}_{}", cell, Uuid::new_v4().simple()),
        cell,
        priority,
        action: action.to_string(),
        est_time: est_time.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn clock() -> FixedClock {
        // 06:30 local at the default UTC+8 offset.
        FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap())
    }

    #[test]
    fn cold_floor_still_produces_brief_and_feed_task() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let config = Config::default();
        let report = WakeSync::new(&store, &config, &clock()).execute().unwrap();

        assert_eq!(report.mode, Mode::Vision);
        assert_eq!(report.tasks_queued, 1);
        let brief = std::fs::read_to_string(&report.brief_path).unwrap();
        assert!(brief.contains("# Morning Brief"));
        assert!(brief.contains("**Mode:** VISION"));
        assert!(brief.contains("**Overall Health:** unknown"));

        let queue = WorkQueue::load(&store).unwrap().unwrap();
        assert_eq!(queue.tasks[0].action, "process_arxiv_feed");
        assert_eq!(queue.tasks[0].priority, Priority::High);
    }

    #[test]
    fn failing_build_puts_critical_fix_task_first() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut build = CellStatus::new(CellName::Build);
        build.quality_gate = GateVerdict::Failed;
        build.save(dir.path()).unwrap();

        WakeSync::new(&store, &Config::default(), &clock())
            .execute()
            .unwrap();

        let queue = WorkQueue::load(&store).unwrap().unwrap();
        let fix = queue.task_for(CellName::Build).unwrap();
        assert_eq!(fix.action, "fix_test_failures");
        assert_eq!(fix.priority, Priority::Critical);
        // Critical sorts ahead of the research feed task.
        assert_eq!(queue.tasks[0].cell, CellName::Build);
    }

    #[test]
    fn healthy_build_gets_no_fix_task() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut build = CellStatus::new(CellName::Build);
        build.quality_gate = GateVerdict::Passed;
        build.save(dir.path()).unwrap();

        WakeSync::new(&store, &Config::default(), &clock())
            .execute()
            .unwrap();
        let queue = WorkQueue::load(&store).unwrap().unwrap();
        assert!(queue.task_for(CellName::Build).is_none());
    }

    #[test]
    fn full_research_cell_skips_feed_task() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut research = CellStatus::new(CellName::Research);
        research.wip = 3;
        research.save(dir.path()).unwrap();

        WakeSync::new(&store, &Config::default(), &clock())
            .execute()
            .unwrap();
        let queue = WorkQueue::load(&store).unwrap().unwrap();
        assert!(queue.task_for(CellName::Research).is_none());
    }

    #[test]
    fn ship_backlog_adds_queue_task() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut ship = CellStatus::new(CellName::Ship);
        ship.queue_depth = 4;
        ship.save(dir.path()).unwrap();

        WakeSync::new(&store, &Config::default(), &clock())
            .execute()
            .unwrap();
        let queue = WorkQueue::load(&store).unwrap().unwrap();
        let t = queue.task_for(CellName::Ship).unwrap();
        assert_eq!(t.action, "process_ship_queue");
        assert_eq!(t.priority, Priority::Medium);
    }

    #[test]
    fn brief_reflects_cell_wip() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let mut research = CellStatus::new(CellName::Research);
        research.wip = 1;
        research.save(dir.path()).unwrap();

        let report = WakeSync::new(&store, &Config::default(), &clock())
            .execute()
            .unwrap();
        let brief = std::fs::read_to_string(&report.brief_path).unwrap();
        assert!(brief.contains("**research**: 1/3 WIP"));
        assert!(brief.contains("## Takt Schedule"));
    }

    #[test]
    fn brief_overwrites_previous_day() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let sync_config = Config::default();
        let sync_clock = clock();
        let sync = WakeSync::new(&store, &sync_config, &sync_clock);
        sync.execute().unwrap();
        sync.execute().unwrap();
        // Still exactly one brief, freshly written.
        let brief = std::fs::read_to_string(paths::morning_brief_path(store.root())).unwrap();
        assert_eq!(brief.matches("# Morning Brief").count(), 1);
    }
}
