pub mod diff;
pub mod fetch;
pub mod mirror;
pub mod scan;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use kbmirror_core::{config, MirrorConfig};
use kbmirror_sync::{ActionOutcome, ExecutionReport};

/// `--config` flag shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// YAML settings file (default: ~/.kbmirror/config.yaml when present).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    /// File settings overlaid with the flags in `overrides`.
    pub fn resolve(&self, overrides: MirrorConfig) -> Result<MirrorConfig> {
        let base = match self.config.as_deref() {
            Some(path) => config::load_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => config::load().context("failed to load ~/.kbmirror/config.yaml")?,
        };
        let merged = base.merge(overrides);
        tracing::debug!("effective config: {merged:?}");
        Ok(merged)
    }
}

/// `--dry-run` / `--execute` for the mutating subcommands.
#[derive(Args, Debug, Default)]
pub struct ModeArgs {
    /// Log the plan without touching the filesystem.
    #[arg(long, conflicts_with = "execute")]
    pub dry_run: bool,

    /// Apply the plan even when the config file enables dry-run.
    #[arg(long)]
    pub execute: bool,
}

impl ModeArgs {
    /// Value for [`MirrorConfig::dry_run`] in the flag overrides.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Force execute mode on the merged settings when `--execute` was given.
    pub fn apply(&self, mut config: MirrorConfig) -> MirrorConfig {
        if self.execute {
            config.dry_run = false;
        }
        config
    }
}

/// Print every outcome and the run summary.
///
/// Returns an error when any action failed, so the process exits non-zero.
pub fn print_report(report: &ExecutionReport) -> Result<()> {
    let prefix = if report.mode.is_dry_run() {
        "[dry-run] "
    } else {
        ""
    };

    if report.outcomes.is_empty() {
        println!(
            "{prefix}✓ {} is already in sync",
            report.destination.display()
        );
        return Ok(());
    }

    for outcome in &report.outcomes {
        match outcome {
            ActionOutcome::Applied { action } => println!("{prefix}  ✎  {action}"),
            ActionOutcome::Simulated { action } => println!("{prefix}  ~  {action}"),
            ActionOutcome::Failed { action, error } => {
                println!("{prefix}  {}  {action}: {error}", "✗".red().bold())
            }
        }
    }

    let failed = report.failed_count();
    if report.mode.is_dry_run() {
        println!(
            "{prefix}{} applied, {failed} failed ({} simulated)",
            report.applied_count(),
            report.simulated_count()
        );
    } else {
        println!("{} applied, {failed} failed", report.applied_count());
    }

    if failed > 0 {
        bail!(
            "{failed} of {} actions failed under {}",
            report.outcomes.len(),
            report.destination.display()
        );
    }
    Ok(())
}
