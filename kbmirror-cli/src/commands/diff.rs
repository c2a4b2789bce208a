//! `kbmirror diff`: unified diffs for what `mirror` would overwrite.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kbmirror_core::MirrorConfig;
use kbmirror_sync::pipeline;

use super::ConfigArgs;

/// Arguments for `kbmirror diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Authoritative directory.
    #[arg(long, value_name = "DIR")]
    pub source: Option<PathBuf>,

    /// Destination tree.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.resolve(MirrorConfig {
            source: self.source,
            destination: self.destination,
            ..Default::default()
        })?;

        let previews = pipeline::preview_tree(&config).context("diff failed")?;
        if previews.is_empty() {
            println!("No differences in shared files.");
            return Ok(());
        }

        for preview in previews {
            match preview.unified_diff {
                Some(text) => {
                    print!("{text}");
                    if !text.ends_with('\n') {
                        println!();
                    }
                }
                None => println!(
                    "Binary files a/{0} and b/{0} differ",
                    preview.path
                ),
            }
        }
        Ok(())
    }
}
