//! External check execution for the build cell.
//!
//! Checks are shell commands (test runner, type checker, security scanner)
//! run against the configured project directory. Every check carries a hard
//! timeout; a timed-out or unspawnable command is a failed check, never a
//! pulse error.

use crate::config::CheckDefinition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Stored output is capped so status files stay small.
const OUTPUT_LIMIT: usize = 500;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// CheckResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub passed: bool,
    #[serde(default)]
    pub timed_out: bool,
    pub output: String,
    pub duration_ms: u64,
}

/// One round of build checks, folded into the build cell's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRound {
    pub ran_at: DateTime<Utc>,
    pub tests: CheckResult,
    pub types: CheckResult,
    pub security: CheckResult,
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Run one check via `sh -c` in `dir`, killing it at the timeout.
/// Stdout and stderr are interleaved into the captured output.
pub fn run_check(def: &CheckDefinition, dir: &Path) -> CheckResult {
    let started = Instant::now();

    let mut capture = match tempfile::tempfile() {
        Ok(f) => f,
        Err(e) => return failed_to_start(&format!("capture file: {e}"), started),
    };
    let (stdout, stderr) = match (capture.try_clone(), capture.try_clone()) {
        (Ok(a), Ok(b)) => (a, b),
        _ => return failed_to_start("capture file clone failed", started),
    };

    let mut child = match Command::new("sh")
        .args(["-c", &def.command])
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .spawn()
    {
        Ok(c) => c,
        Err(e) => return failed_to_start(&format!("spawn: {e}"), started),
    };

    let deadline = started + Duration::from_secs(def.timeout_seconds);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    break None;
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return failed_to_start(&format!("wait: {e}"), started);
            }
        }
    };

    let mut output = String::new();
    if capture.seek(SeekFrom::Start(0)).is_ok() {
        let _ = capture.read_to_string(&mut output);
    }
    let output: String = output.chars().take(OUTPUT_LIMIT).collect();

    match status {
        Some(status) => CheckResult {
            passed: status.success(),
            timed_out: false,
            output,
            duration_ms: elapsed_ms(started),
        },
        None => CheckResult {
            passed: false,
            timed_out: true,
            output: format!("check timed out after {}s", def.timeout_seconds),
            duration_ms: elapsed_ms(started),
        },
    }
}

fn failed_to_start(reason: &str, started: Instant) -> CheckResult {
    CheckResult {
        passed: false,
        timed_out: false,
        output: reason.to_string(),
        duration_ms: elapsed_ms(started),
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
