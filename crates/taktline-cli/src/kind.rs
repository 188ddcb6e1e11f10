use std::fmt;
use taktline_core::types::CellName;

/// One invocable pulse process. The name doubles as the binary name and
/// the lock-file name; the log name matches the file the pulse appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseKind {
    Takt,
    Research,
    Build,
    Ship,
    Monitor,
    WakeSync,
    NightBrief,
}

impl PulseKind {
    pub fn all() -> &'static [PulseKind] {
        &[
            PulseKind::Takt,
            PulseKind::Research,
            PulseKind::Build,
            PulseKind::Ship,
            PulseKind::Monitor,
            PulseKind::WakeSync,
            PulseKind::NightBrief,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PulseKind::Takt => "takt",
            PulseKind::Research => "cell-research",
            PulseKind::Build => "cell-build",
            PulseKind::Ship => "cell-ship",
            PulseKind::Monitor => "cell-monitor",
            PulseKind::WakeSync => "wake-sync",
            PulseKind::NightBrief => "night-brief",
        }
    }

    pub fn log_name(self) -> &'static str {
        match self {
            PulseKind::Takt => "takt",
            PulseKind::Research => "research",
            PulseKind::Build => "build",
            PulseKind::Ship => "ship",
            PulseKind::Monitor => "monitor",
            PulseKind::WakeSync => "wake",
            PulseKind::NightBrief => "night",
        }
    }

    pub fn cell(self) -> Option<CellName> {
        match self {
            PulseKind::Research => Some(CellName::Research),
            PulseKind::Build => Some(CellName::Build),
            PulseKind::Ship => Some(CellName::Ship),
            PulseKind::Monitor => Some(CellName::Monitor),
            _ => None,
        }
    }
}

impl fmt::Display for PulseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
