//! kbmirror converges a directory tree to an authoritative state.
//!
//! # Usage
//!
//! ```text
//! kbmirror sync       [--manifest F] [--staging D] [--dest D] [--dry-run|--execute] [--config F]
//! kbmirror mirror     [--source D] [--dest D] [--dry-run|--execute] [--config F]
//! kbmirror fetch-list [--manifest F] [--dest D] [--output F] [--json] [--config F]
//! kbmirror scan       [--dest D] [--output F] [--config F]
//! kbmirror status     [--manifest F] [--staging D] [--dest D] [--json] [--config F]
//! kbmirror diff       [--source D] [--dest D] [--config F]
//! ```
//!
//! Settings not given on the command line come from `--config` or
//! `~/.kbmirror/config.yaml`. Logs go to stderr (`RUST_LOG` overrides the
//! default `info` level); results go to stdout.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    diff::DiffArgs, fetch::FetchListArgs, mirror::MirrorArgs, scan::ScanArgs, status::StatusArgs,
    sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "kbmirror",
    version,
    about = "Mirror a knowledge-base export or a live directory onto a destination tree",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Converge the destination to a manifest, moving new content in from staging.
    Sync(SyncArgs),

    /// Converge the destination to a live source directory.
    Mirror(MirrorArgs),

    /// List manifest entries that are missing or outdated in the destination.
    FetchList(FetchListArgs),

    /// Write a manifest-shaped snapshot of the destination.
    Scan(ScanArgs),

    /// Summarise what a manifest sync would do, without doing it.
    Status(StatusArgs),

    /// Show unified diffs of the files a mirror run would overwrite.
    Diff(DiffArgs),
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Mirror(args) => args.run(),
        Commands::FetchList(args) => args.run(),
        Commands::Scan(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Diff(args) => args.run(),
    }
}
