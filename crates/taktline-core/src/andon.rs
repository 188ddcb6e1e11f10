//! Andon escalation: evaluates cell statuses against fixed thresholds and
//! renders the visual board. Green means normal, yellow needs attention,
//! red is stop-the-line.

use crate::status::CellStatus;
use crate::types::CellName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Escalation thresholds, seconds.
const RESEARCH_STALE_YELLOW: i64 = 3_600;
const RESEARCH_STALE_RED: i64 = 14_400;
const BUILD_STALE_YELLOW: i64 = 1_800;
const BUILD_STALE_RED: i64 = 7_200;
const BUILD_FAILURE_YELLOW: i64 = 3_600;
const BUILD_FAILURE_RED: i64 = 7_200;
const SHIP_STALE_YELLOW: i64 = 3_600;
const SHIP_STALE_RED: i64 = 86_400;

// ---------------------------------------------------------------------------
// AndonLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AndonLevel {
    Green,
    Yellow,
    Red,
}

impl AndonLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AndonLevel::Green => "green",
            AndonLevel::Yellow => "yellow",
            AndonLevel::Red => "red",
        }
    }
}

impl fmt::Display for AndonLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellEvaluation {
    pub cell: CellName,
    pub level: AndonLevel,
    pub staleness_secs: Option<i64>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndonBoard {
    pub generated_at: DateTime<Utc>,
    pub overall: AndonLevel,
    pub cells: Vec<CellEvaluation>,
}

/// An active yellow/red entry persisted to the alert queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub cell: CellName,
    pub level: AndonLevel,
    pub reasons: Vec<String>,
    pub raised_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

pub fn evaluate(statuses: &[CellStatus], now: DateTime<Utc>) -> AndonBoard {
    let cells: Vec<CellEvaluation> = statuses.iter().map(|s| evaluate_cell(s, now)).collect();
    let overall = cells
        .iter()
        .map(|c| c.level)
        .max()
        .unwrap_or(AndonLevel::Green);
    AndonBoard {
        generated_at: now,
        overall,
        cells,
    }
}

/// A cell with no recorded output yet never trips staleness alerts —
/// silence before first output is startup, not breakage.
fn evaluate_cell(status: &CellStatus, now: DateTime<Utc>) -> CellEvaluation {
    let staleness = status.last_output.map(|t| (now - t).num_seconds().max(0));
    let mut level = AndonLevel::Green;
    let mut reasons = Vec::new();

    let mut raise = |l: AndonLevel, reason: String| {
        if l > level {
            level = l;
        }
        reasons.push(reason);
    };

    match status.cell {
        CellName::Research => {
            if let Some(stale) = staleness {
                if stale > RESEARCH_STALE_RED {
                    raise(AndonLevel::Red, format!("no output for {}h", stale / 3600));
                } else if stale > RESEARCH_STALE_YELLOW {
                    raise(AndonLevel::Yellow, format!("no output for {}m", stale / 60));
                }
            }
        }
        CellName::Build => {
            let failing = status.failure_duration_secs;
            if failing > BUILD_FAILURE_RED {
                raise(AndonLevel::Red, format!("tests failing for {}h", failing / 3600));
            } else if failing > BUILD_FAILURE_YELLOW {
                raise(AndonLevel::Yellow, format!("tests failing for {}m", failing / 60));
            }
            if let Some(stale) = staleness {
                if stale > BUILD_STALE_RED {
                    raise(AndonLevel::Red, format!("no output for {}h", stale / 3600));
                } else if stale > BUILD_STALE_YELLOW {
                    raise(AndonLevel::Yellow, format!("no output for {}m", stale / 60));
                }
            }
        }
        CellName::Ship => {
            if status.wip_cap > 0 && status.wip >= status.wip_cap {
                raise(AndonLevel::Yellow, "WIP at cap".to_string());
            }
            if let Some(stale) = staleness {
                if stale > SHIP_STALE_RED {
                    raise(AndonLevel::Red, format!("no output for {}h", stale / 3600));
                } else if stale > SHIP_STALE_YELLOW {
                    raise(AndonLevel::Yellow, format!("no output for {}m", stale / 60));
                }
            }
        }
        CellName::Monitor => {}
    }

    CellEvaluation {
        cell: status.cell,
        level,
        staleness_secs: staleness,
        reasons,
    }
}

/// The yellow/red subset of a board, as alert-queue entries.
pub fn active_alerts(board: &AndonBoard) -> Vec<Alert> {
    board
        .cells
        .iter()
        .filter(|c| c.level > AndonLevel::Green)
        .map(|c| Alert {
            cell: c.cell,
            level: c.level,
            reasons: c.reasons.clone(),
            raised_at: board.generated_at,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn render_markdown(board: &AndonBoard) -> String {
    let mut lines = vec![
        "# Andon Board".to_string(),
        String::new(),
        format!("**Generated:** {}", board.generated_at.to_rfc3339()),
        format!("**Overall:** {}", board.overall),
        String::new(),
        "| Cell | Level | Notes |".to_string(),
        "|------|-------|-------|".to_string(),
    ];
    for cell in &board.cells {
        let notes = if cell.reasons.is_empty() {
            "ok".to_string()
        } else {
            cell.reasons.join("; ")
        };
        lines.push(format!("| {} | {} | {} |", cell.cell, cell.level, notes));
    }
    lines.push(String::new());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn status_with_output(cell: CellName, age_secs: i64) -> CellStatus {
        let mut status = CellStatus::new(cell);
        status.last_output = Some(now() - Duration::seconds(age_secs));
        status
    }

    #[test]
    fn fresh_cells_are_green() {
        let statuses = vec![
            status_with_output(CellName::Research, 60),
            status_with_output(CellName::Build, 60),
        ];
        let board = evaluate(&statuses, now());
        assert_eq!(board.overall, AndonLevel::Green);
        assert!(active_alerts(&board).is_empty());
    }

    #[test]
    fn no_output_yet_is_not_stale() {
        let statuses = vec![CellStatus::new(CellName::Research)];
        let board = evaluate(&statuses, now());
        assert_eq!(board.overall, AndonLevel::Green);
        assert_eq!(board.cells[0].staleness_secs, None);
    }

    #[test]
    fn research_staleness_escalates() {
        let yellow = evaluate(&[status_with_output(CellName::Research, 2 * 3600)], now());
        assert_eq!(yellow.cells[0].level, AndonLevel::Yellow);

        let red = evaluate(&[status_with_output(CellName::Research, 5 * 3600)], now());
        assert_eq!(red.cells[0].level, AndonLevel::Red);
        assert!(red.cells[0].reasons[0].contains("no output"));
    }

    #[test]
    fn build_failure_duration_escalates() {
        let mut status = status_with_output(CellName::Build, 60);
        status.failure_duration_secs = 2 * 3600;
        let board = evaluate(&[status.clone()], now());
        assert_eq!(board.cells[0].level, AndonLevel::Yellow);

        status.failure_duration_secs = 3 * 3600;
        let board = evaluate(&[status], now());
        assert_eq!(board.cells[0].level, AndonLevel::Red);
        assert!(board.cells[0].reasons[0].contains("tests failing"));
    }

    #[test]
    fn ship_wip_at_cap_is_yellow() {
        let mut status = status_with_output(CellName::Ship, 60);
        status.wip = 2;
        let board = evaluate(&[status], now());
        assert_eq!(board.cells[0].level, AndonLevel::Yellow);
        assert!(board.cells[0].reasons.iter().any(|r| r.contains("WIP at cap")));
    }

    #[test]
    fn monitor_has_no_thresholds() {
        let mut status = CellStatus::new(CellName::Monitor);
        status.last_output = Some(now() - Duration::days(30));
        let board = evaluate(&[status], now());
        assert_eq!(board.cells[0].level, AndonLevel::Green);
    }

    #[test]
    fn overall_is_worst_cell() {
        let statuses = vec![
            status_with_output(CellName::Build, 60),
            status_with_output(CellName::Research, 5 * 3600),
        ];
        let board = evaluate(&statuses, now());
        assert_eq!(board.overall, AndonLevel::Red);
        let alerts = active_alerts(&board);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].cell, CellName::Research);
    }

    #[test]
    fn markdown_lists_every_cell() {
        let statuses = vec![
            status_with_output(CellName::Research, 60),
            status_with_output(CellName::Ship, 2 * 3600),
        ];
        let board = evaluate(&statuses, now());
        let md = render_markdown(&board);
        assert!(md.contains("# Andon Board"));
        assert!(md.contains("| research | green | ok |"));
        assert!(md.contains("| ship | yellow |"));
    }
}
