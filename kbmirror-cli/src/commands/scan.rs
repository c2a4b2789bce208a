//! `kbmirror scan`: snapshot the destination in manifest form.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kbmirror_core::{manifest, MirrorConfig};
use kbmirror_sync::scan::snapshot_destination;

use super::ConfigArgs;

/// Arguments for `kbmirror scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Destination tree to scan.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Write the snapshot here instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ScanArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve(MirrorConfig {
            destination: self.destination,
            ..Default::default()
        })?;
        let root = config.destination_path()?;

        let snapshot = snapshot_destination(root)
            .with_context(|| format!("failed to scan {}", root.display()))?;

        match self.output {
            Some(path) => {
                manifest::save_at(&path, &snapshot)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!(
                    "✓ {} files under {} → {}",
                    snapshot.len(),
                    root.display(),
                    path.display()
                );
            }
            None => println!(
                "{}",
                manifest::to_json(&snapshot).context("failed to serialize snapshot")?
            ),
        }
        Ok(())
    }
}
