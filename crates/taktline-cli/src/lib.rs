pub mod kind;
pub mod lock;
pub mod output;
pub mod root;
pub mod run;
pub mod schedule;

use clap::Parser;
use kind::PulseKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version)]
struct PulseCli {
    /// Coordinator root (default: walk up from cwd)
    #[arg(long, env = "TAKT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, short = 'j')]
    json: bool,
}

pub fn init_tracing(default_level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();
}

/// Shared entry point for the one-shot pulse binaries: parse the common
/// flags, run the pulse, print the error chain and exit non-zero on failure.
pub fn pulse_main(kind: PulseKind) {
    let cli = PulseCli::parse();
    init_tracing(tracing::Level::WARN);

    if let Err(e) = run::run(kind, cli.root.as_deref(), cli.json) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
