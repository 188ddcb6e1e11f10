use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Readers see either the old document or the new one, never a torn write.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Append a single line to a log file, creating it (and parents) on demand.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{line}")?;
    Ok(())
}

/// Truncate a text file to its last `keep` lines. Returns true if the file
/// was rewritten, false if it was already within bounds.
pub fn truncate_to_last_lines(path: &Path, keep: usize) -> Result<bool> {
    let content = std::fs::read_to_string(path)?;
    let total = content.lines().count();
    if total <= keep {
        return Ok(false);
    }
    let tail: Vec<&str> = content.lines().skip(total - keep).collect();
    let mut out = tail.join("\n");
    out.push('\n');
    atomic_write(path, out.as_bytes())?;
    Ok(true)
}
