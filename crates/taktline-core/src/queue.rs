use crate::error::Result;
use crate::paths;
use crate::store::StateStore;
use crate::types::{CellName, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// WorkQueue
// ---------------------------------------------------------------------------

/// One advisory task in the day's queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub id: String,
    pub cell: CellName,
    pub priority: Priority,
    pub action: String,
    pub est_time: String,
}

/// The prioritized day plan regenerated by wake sync every morning.
/// Consumed advisorially — nothing enforces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkQueue {
    pub date: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<TaskDescriptor>,
}

impl WorkQueue {
    pub fn load(store: &StateStore) -> Result<Option<WorkQueue>> {
        store.read(&paths::work_queue_path(store.root()))
    }

    pub fn save(&self, store: &StateStore) -> Result<()> {
        store.write(&paths::work_queue_path(store.root()), self)
    }

    pub fn task_for(&self, cell: CellName) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.cell == cell)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        let queue = WorkQueue {
            date: "2026-03-02".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap(),
            tasks: vec![TaskDescriptor {
                id: "build_1".to_string(),
                cell: CellName::Build,
                priority: Priority::Critical,
                action: "fix_test_failures".to_string(),
                est_time: "2 hours".to_string(),
            }],
        };
        queue.save(&store).unwrap();

        let loaded = WorkQueue::load(&store).unwrap().unwrap();
        assert_eq!(loaded.date, "2026-03-02");
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.task_for(CellName::Build).unwrap().priority, Priority::Critical);
        assert!(loaded.task_for(CellName::Ship).is_none());
    }

    #[test]
    fn absent_queue_loads_as_none() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path());
        assert!(WorkQueue::load(&store).unwrap().is_none());
    }
}
