//! `kbmirror fetch-list`: what must be acquired before the next sync.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use kbmirror_core::MirrorConfig;
use kbmirror_sync::{fetch::write_fetch_list, pipeline, FetchItem, FetchReason};

use super::ConfigArgs;

/// Arguments for `kbmirror fetch-list`.
#[derive(Args, Debug)]
pub struct FetchListArgs {
    /// Authoritative manifest (JSON).
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Destination tree to compare against.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Write one locator per line here instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Emit machine-readable JSON on stdout.
    #[arg(long, conflicts_with = "output")]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl FetchListArgs {
    pub fn run(self) -> Result<()> {
        let json = self.json;
        let config = self.config.resolve(MirrorConfig {
            manifest: self.manifest,
            destination: self.destination,
            fetch_list: self.output,
            ..Default::default()
        })?;

        let items = pipeline::fetch_list(&config).context("failed to build fetch list")?;

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&items).context("failed to serialize fetch list")?
            );
            return Ok(());
        }

        match config.fetch_list.as_deref() {
            Some(path) => {
                write_fetch_list(path, &items)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                print_summary(&items);
                println!("✓ wrote {} locators to {}", items.len(), path.display());
            }
            None => {
                for item in &items {
                    println!("{}", item.locator.as_display_string());
                }
            }
        }
        Ok(())
    }
}

fn print_summary(items: &[FetchItem]) {
    let missing = items
        .iter()
        .filter(|i| matches!(i.reason, FetchReason::Missing))
        .count();
    let outdated = items
        .iter()
        .filter(|i| matches!(i.reason, FetchReason::Outdated { .. }))
        .count();
    let unknown = items.len() - missing - outdated;
    println!("{missing} new, {outdated} updated, {unknown} with unknown time");
}
