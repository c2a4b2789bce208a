//! `kbmirror mirror`: converge the destination to a live source tree.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kbmirror_core::MirrorConfig;
use kbmirror_sync::pipeline;

use super::{print_report, ConfigArgs, ModeArgs};

/// Arguments for `kbmirror mirror`.
#[derive(Args, Debug)]
pub struct MirrorArgs {
    /// Authoritative directory.
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Destination tree to converge.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    #[command(flatten)]
    pub mode: ModeArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl MirrorArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve(MirrorConfig {
            source: self.source,
            destination: self.destination,
            dry_run: self.mode.dry_run(),
            ..Default::default()
        })?;
        let config = self.mode.apply(config);

        let report = pipeline::run_tree(&config).context("tree mirror failed")?;
        print_report(&report)
    }
}
