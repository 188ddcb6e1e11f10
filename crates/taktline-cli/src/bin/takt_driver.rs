//! The driver: a cron-equivalent loop that spawns the pulse binaries on
//! their cadences and fires wake sync / night brief at the configured
//! local times. Overlap suppression itself lives in the pulse binaries
//! (per-kind lock files); the driver only provides the timing.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use taktline_cli::kind::PulseKind;
use taktline_cli::{root, schedule};
use taktline_core::config::Config;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "takt-driver",
    about = "Periodic driver for the taktline coordinator",
    version
)]
struct Cli {
    /// Coordinator root (default: walk up from cwd)
    #[arg(long, env = "TAKT_ROOT")]
    root: Option<PathBuf>,

    /// Number of scheduler ticks to run before exiting (0 = run forever)
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Seconds between scheduler ticks
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,
}

fn main() {
    let cli = Cli::parse();
    taktline_cli::init_tracing(tracing::Level::INFO);

    if let Err(e) = run(&cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let root = root::resolve_root(cli.root.as_deref());
    let config = Config::load(&root).context("failed to load configuration")?;
    let offset = config.local_offset()?;
    let wake_at = config.wake_time()?;
    let night_at = config.night_time()?;

    let exe_dir = std::env::current_exe()
        .context("cannot locate driver executable")?
        .parent()
        .map(PathBuf::from)
        .context("driver executable has no parent directory")?;

    info!(root = %root.display(), "driver starting");

    let mut children: Vec<(PulseKind, Child)> = Vec::new();
    let mut prev_local = chrono::Utc::now().with_timezone(&offset).naive_local();
    let mut minute_index: u64 = 0;

    loop {
        reap(&mut children);

        let now_local = chrono::Utc::now().with_timezone(&offset).naive_local();
        let mut due = schedule::cadence_due(minute_index);
        if schedule::daily_due(prev_local, now_local, wake_at) {
            due.push(PulseKind::WakeSync);
        }
        if schedule::daily_due(prev_local, now_local, night_at) {
            due.push(PulseKind::NightBrief);
        }
        prev_local = now_local;

        for kind in due {
            match spawn_pulse(&exe_dir, &root, kind) {
                Ok(child) => {
                    info!(%kind, "spawned");
                    children.push((kind, child));
                }
                Err(e) => warn!(%kind, error = %e, "failed to spawn"),
            }
        }

        minute_index += 1;
        if cli.ticks > 0 && minute_index >= cli.ticks {
            break;
        }
        std::thread::sleep(Duration::from_secs(cli.interval_secs));
    }

    // Bounded run: let in-flight pulses finish before exiting.
    for (kind, mut child) in children {
        match child.wait() {
            Ok(status) if !status.success() => warn!(%kind, %status, "pulse exited non-zero"),
            Ok(_) => {}
            Err(e) => warn!(%kind, error = %e, "wait failed"),
        }
    }
    Ok(())
}

fn spawn_pulse(exe_dir: &std::path::Path, root: &std::path::Path, kind: PulseKind) -> std::io::Result<Child> {
    Command::new(exe_dir.join(kind.as_str()))
        .env("TAKT_ROOT", root)
        .spawn()
}

/// Drop children that have already exited, logging failures.
fn reap(children: &mut Vec<(PulseKind, Child)>) {
    children.retain_mut(|(kind, child)| match child.try_wait() {
        Ok(Some(status)) => {
            if !status.success() {
                warn!(kind = %kind, %status, "pulse exited non-zero");
            }
            false
        }
        Ok(None) => true,
        Err(e) => {
            warn!(kind = %kind, error = %e, "try_wait failed");
            false
        }
    });
}
