//! Per-kind pulse locks. An advisory `flock` on `locks/<kind>.lock` keeps
//! at most one instance of each pulse kind in flight; a contended lock
//! means another invocation is running and this one should skip cleanly.

use anyhow::Context;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use taktline_core::paths;

/// Held for the duration of a pulse; the flock releases on drop.
#[derive(Debug)]
pub struct PulseLock {
    _file: File,
}

/// Try to take the exclusive lock for a pulse kind. `None` means another
/// instance holds it right now.
pub fn try_acquire(root: &Path, kind: &str) -> anyhow::Result<Option<PulseLock>> {
    let path = paths::lock_path(root, kind);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating lock dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("opening lock file {}", path.display()))?;

    match file.try_lock_exclusive() {
        Ok(()) => Ok(Some(PulseLock { _file: file })),
        Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
        Err(e) => Err(e).with_context(|| format!("locking {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_is_exclusive_per_kind() {
        let dir = TempDir::new().unwrap();
        let held = try_acquire(dir.path(), "takt").unwrap();
        assert!(held.is_some());

        // A second acquisition of the same kind is refused...
        let contended = try_acquire(dir.path(), "takt").unwrap();
        assert!(contended.is_none());

        // ...while a different kind is unaffected.
        let other = try_acquire(dir.path(), "cell-build").unwrap();
        assert!(other.is_some());
    }

    #[test]
    fn lock_releases_on_drop() {
        let dir = TempDir::new().unwrap();
        {
            let _held = try_acquire(dir.path(), "wake-sync").unwrap().unwrap();
        }
        let reacquired = try_acquire(dir.path(), "wake-sync").unwrap();
        assert!(reacquired.is_some());
    }
}
