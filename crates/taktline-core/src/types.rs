use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Time-of-day regime tag. Advisory only — modes never gate execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Vision,
    Cut,
    Harmony,
    Complete,
    Rest,
    Transition,
}

impl Mode {
    /// Map a local-clock hour to the mode for that block.
    /// Half-open intervals: 06–09 vision, 09–12 cut, 12–14 transition,
    /// 14–17 harmony, 17–19 transition, 19–22 complete, otherwise rest.
    pub fn for_hour(hour: u32) -> Mode {
        match hour {
            6..=8 => Mode::Vision,
            9..=11 => Mode::Cut,
            12..=13 => Mode::Transition,
            14..=16 => Mode::Harmony,
            17..=18 => Mode::Transition,
            19..=21 => Mode::Complete,
            _ => Mode::Rest,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Vision => "VISION",
            Mode::Cut => "CUT",
            Mode::Harmony => "HARMONY",
            Mode::Complete => "COMPLETE",
            Mode::Rest => "REST",
            Mode::Transition => "TRANSITION",
        }
    }

    /// Human label used in briefs.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Vision => "Vision (planning, research)",
            Mode::Cut => "Cut (deep work, coding)",
            Mode::Harmony => "Harmony (integration, reviews)",
            Mode::Complete => "Complete (documentation, wrap-up)",
            Mode::Rest => "Rest",
            Mode::Transition => "Transition",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GateVerdict
// ---------------------------------------------------------------------------

/// Aggregate quality-gate health for a cell. Four-valued on purpose:
/// `warning` and `unknown` carry information a boolean would lose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GateVerdict {
    Passed,
    Warning,
    Failed,
    #[default]
    Unknown,
}

impl GateVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            GateVerdict::Passed => "passed",
            GateVerdict::Warning => "warning",
            GateVerdict::Failed => "failed",
            GateVerdict::Unknown => "unknown",
        }
    }

    /// Severity rank for worst-of aggregation (higher is worse).
    pub fn severity(self) -> u8 {
        match self {
            GateVerdict::Passed => 0,
            GateVerdict::Unknown => 1,
            GateVerdict::Warning => 2,
            GateVerdict::Failed => 3,
        }
    }

    /// Worst verdict across an iterator; `Passed` when empty.
    pub fn worst(verdicts: impl IntoIterator<Item = GateVerdict>) -> GateVerdict {
        verdicts
            .into_iter()
            .max_by_key(|v| v.severity())
            .unwrap_or(GateVerdict::Passed)
    }
}

impl fmt::Display for GateVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Admission rank: lower admits first. Ties break on `created_at`.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::TaktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Priority::Critical),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(crate::error::TaktError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// CellName
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellName {
    Research,
    Build,
    Ship,
    Monitor,
}

impl CellName {
    pub fn all() -> &'static [CellName] {
        &[
            CellName::Research,
            CellName::Build,
            CellName::Ship,
            CellName::Monitor,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CellName::Research => "research",
            CellName::Build => "build",
            CellName::Ship => "ship",
            CellName::Monitor => "monitor",
        }
    }

    /// Concurrent-work cap enforced on admission. Monitor is an observer.
    pub fn wip_cap(self) -> usize {
        match self {
            CellName::Research => 3,
            CellName::Build => 5,
            CellName::Ship => 2,
            CellName::Monitor => 0,
        }
    }

    /// The time-of-day block this cell is most at home in. Advisory.
    pub fn mode_affinity(self) -> Mode {
        match self {
            CellName::Research => Mode::Vision,
            CellName::Build => Mode::Cut,
            CellName::Ship => Mode::Harmony,
            CellName::Monitor => Mode::Complete,
        }
    }
}

impl fmt::Display for CellName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CellName {
    type Err = crate::error::TaktError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "research" => Ok(CellName::Research),
            "build" => Ok(CellName::Build),
            "ship" => Ok(CellName::Ship),
            "monitor" => Ok(CellName::Monitor),
            _ => Err(crate::error::TaktError::InvalidCell(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
