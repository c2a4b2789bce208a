//! `kbmirror sync`: converge the destination to the manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kbmirror_core::MirrorConfig;
use kbmirror_sync::pipeline;

use super::{print_report, ConfigArgs, ModeArgs};

/// Arguments for `kbmirror sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Authoritative manifest (JSON).
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory holding already-fetched content, laid out by key.
    #[arg(long, value_name = "DIR")]
    pub staging: Option<PathBuf>,

    /// Destination tree to converge.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve(MirrorConfig {
            manifest: self.manifest,
            staging: self.staging,
            destination: self.destination,
            dry_run: self.mode.dry_run(),
            ..Default::default()
        })?;
        let config = self.mode.apply(config);

        let report = pipeline::run_manifest(&config).context("manifest sync failed")?;
        print_report(&report)
    }
}
