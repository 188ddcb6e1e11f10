use crate::types::CellName;
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const STATE_DIR: &str = "state";
pub const CELLS_DIR: &str = "cells";
pub const LOGS_DIR: &str = "logs";
pub const LOCKS_DIR: &str = "locks";
pub const PRODUCTS_DIR: &str = "products";
pub const DELIVERABLES_DIR: &str = "deliverables";

pub const CONFIG_FILE: &str = "config.yaml";
pub const MORNING_BRIEF: &str = "MORNING_BRIEF.md";
pub const EVENING_BRIEF: &str = "EVENING_BRIEF.md";
pub const ANDON_BOARD: &str = "ANDON_BOARD.md";

pub const TAKT_STATE_FILE: &str = "takt_state.json";
pub const CASCADE_FILE: &str = "cascade_signal.json";
pub const UNIFIED_STATE_FILE: &str = "unified_state.json";
pub const WORK_QUEUE_FILE: &str = "work_queue.json";
pub const ALERT_QUEUE_FILE: &str = "alert_queue.json";
pub const TAKT_FAILURE_FILE: &str = "takt_failure.alert";

// ---------------------------------------------------------------------------
// Cell areas
// ---------------------------------------------------------------------------

/// The three lifecycle directories of a cell, plus a free-form outputs dir.
/// An item lives in exactly one of inputs/wip/archive at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Inputs,
    Wip,
    Outputs,
    Archive,
}

impl Area {
    pub fn as_str(self) -> &'static str {
        match self {
            Area::Inputs => "inputs",
            Area::Wip => "wip",
            Area::Outputs => "outputs",
            Area::Archive => "archive",
        }
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

pub fn takt_state_path(root: &Path) -> PathBuf {
    state_dir(root).join(TAKT_STATE_FILE)
}

pub fn cascade_path(root: &Path) -> PathBuf {
    state_dir(root).join(CASCADE_FILE)
}

pub fn cell_status_path(root: &Path, cell: CellName) -> PathBuf {
    state_dir(root).join(format!("{cell}_status.json"))
}

pub fn unified_state_path(root: &Path) -> PathBuf {
    state_dir(root).join(UNIFIED_STATE_FILE)
}

pub fn work_queue_path(root: &Path) -> PathBuf {
    state_dir(root).join(WORK_QUEUE_FILE)
}

pub fn alert_queue_path(root: &Path) -> PathBuf {
    state_dir(root).join(ALERT_QUEUE_FILE)
}

pub fn takt_failure_path(root: &Path) -> PathBuf {
    state_dir(root).join(TAKT_FAILURE_FILE)
}

pub fn cell_dir(root: &Path, cell: CellName) -> PathBuf {
    root.join(CELLS_DIR).join(cell.as_str())
}

pub fn area_dir(root: &Path, cell: CellName, area: Area) -> PathBuf {
    cell_dir(root, cell).join(area.as_str())
}

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}

pub fn log_path(root: &Path, name: &str) -> PathBuf {
    logs_dir(root).join(format!("{name}.log"))
}

pub fn lock_path(root: &Path, kind: &str) -> PathBuf {
    root.join(LOCKS_DIR).join(format!("{kind}.lock"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn morning_brief_path(root: &Path) -> PathBuf {
    root.join(MORNING_BRIEF)
}

pub fn evening_brief_path(root: &Path) -> PathBuf {
    root.join(EVENING_BRIEF)
}

pub fn andon_board_path(root: &Path) -> PathBuf {
    root.join(ANDON_BOARD)
}

pub fn product_dir(root: &Path, product_id: &str) -> PathBuf {
    root.join(PRODUCTS_DIR).join(product_id)
}

pub fn deliverable_path(root: &Path, product_id: &str) -> PathBuf {
    root.join(DELIVERABLES_DIR).join(format!("{product_id}.md"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/floor");
        assert_eq!(
            takt_state_path(root),
            PathBuf::from("/tmp/floor/state/takt_state.json")
        );
        assert_eq!(
            cell_status_path(root, CellName::Build),
            PathBuf::from("/tmp/floor/state/build_status.json")
        );
        assert_eq!(
            area_dir(root, CellName::Research, Area::Wip),
            PathBuf::from("/tmp/floor/cells/research/wip")
        );
        assert_eq!(
            log_path(root, "takt"),
            PathBuf::from("/tmp/floor/logs/takt.log")
        );
        assert_eq!(
            deliverable_path(root, "starter-toolkit"),
            PathBuf::from("/tmp/floor/deliverables/starter-toolkit.md")
        );
    }

    #[test]
    fn area_names() {
        assert_eq!(Area::Inputs.as_str(), "inputs");
        assert_eq!(Area::Archive.as_str(), "archive");
    }
}
