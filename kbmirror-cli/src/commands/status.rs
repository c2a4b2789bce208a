//! `kbmirror status`: pending work for a manifest sync, without mutation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use kbmirror_core::{manifest, MirrorConfig};
use kbmirror_sync::{
    fetch::plan_fetch,
    plan_manifest,
    scan::{scan_destination, scan_staging, snapshot_from_entries},
    FetchItem, RunMode,
};

use super::ConfigArgs;

/// Arguments for `kbmirror status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Authoritative manifest (JSON).
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Directory holding already-fetched content.
    #[arg(long, value_name = "DIR")]
    pub staging: Option<PathBuf>,

    /// Destination tree.
    #[arg(long = "dest", value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let json = self.json;
        let config = self.config.resolve(MirrorConfig {
            manifest: self.manifest,
            staging: self.staging,
            destination: self.destination,
            dry_run: true,
            ..Default::default()
        })?;

        let report = build_report(&config)?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    destination: PathBuf,
    in_sync: bool,
    summary: StatusSummary,
    fetch: Vec<FetchItem>,
}

#[derive(Debug, Serialize)]
struct StatusSummary {
    manifest_entries: usize,
    destination_files: usize,
    staged_files: usize,
    pending_deletions: usize,
    pending_transfers: usize,
    to_fetch: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "item")]
    item: &'static str,
    #[tabled(rename = "count")]
    count: usize,
}

/// Load the manifest and scan each tree once; the plan and the fetch list
/// are both derived from those results.
fn build_report(config: &MirrorConfig) -> Result<StatusReport> {
    let destination = config.destination_path()?.to_path_buf();
    let manifest = manifest::load_at(config.manifest_path()?).context("failed to load manifest")?;
    let existing = scan_destination(&destination).context("failed to scan destination")?;
    let staged = scan_staging(config.staging_path()?).context("failed to scan staging")?;

    let plan = plan_manifest(&manifest, &existing, &staged, &destination, RunMode::DryRun);
    let snapshot = snapshot_from_entries(existing);
    let fetch = plan_fetch(&manifest, &snapshot);

    Ok(StatusReport {
        in_sync: plan.is_empty() && fetch.is_empty(),
        summary: StatusSummary {
            manifest_entries: manifest.len(),
            destination_files: snapshot.len(),
            staged_files: staged.len(),
            pending_deletions: plan.deletion_count(),
            pending_transfers: plan.transfer_count(),
            to_fetch: fetch.len(),
        },
        destination,
        fetch,
    })
}

fn print_table(report: &StatusReport) {
    let indicator = if report.in_sync {
        "■ IN SYNC".green().bold()
    } else {
        "■ PENDING".yellow().bold()
    };
    println!(
        "kbmirror v{} | {} | {}",
        env!("CARGO_PKG_VERSION"),
        report.destination.display(),
        indicator
    );

    let s = &report.summary;
    let rows = vec![
        StatusTableRow {
            item: "manifest entries",
            count: s.manifest_entries,
        },
        StatusTableRow {
            item: "destination files",
            count: s.destination_files,
        },
        StatusTableRow {
            item: "staged files",
            count: s.staged_files,
        },
        StatusTableRow {
            item: "pending deletions",
            count: s.pending_deletions,
        },
        StatusTableRow {
            item: "pending transfers",
            count: s.pending_transfers,
        },
        StatusTableRow {
            item: "to fetch",
            count: s.to_fetch,
        },
    ];
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if s.to_fetch > 0 {
        println!("Run 'kbmirror fetch-list' to see what must be downloaded into staging.");
    }
    if s.pending_deletions + s.pending_transfers > 0 {
        println!("Run 'kbmirror sync' to apply pending changes.");
    }
}
