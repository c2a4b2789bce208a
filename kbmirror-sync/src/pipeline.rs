//! Entry points shared by every CLI subcommand.
//!
//! Each function takes the explicit [`MirrorConfig`] for the invocation;
//! nothing is read from process-wide state. Fatal errors are returned before
//! any mutation; per-action failures come back inside the
//! [`ExecutionReport`].

use kbmirror_core::{manifest, MirrorConfig};

use crate::error::{io_err, SyncError};
use crate::executor::{execute, ExecutionReport};
use crate::fetch::{plan_fetch, FetchItem};
use crate::plan::{Plan, RunMode};
use crate::planner::{plan_manifest, plan_tree};
use crate::preview::{preview_changes, FileDiff};
use crate::scan::{scan_destination, scan_staging, snapshot_destination};
use crate::treediff::diff_trees;

// ---------------------------------------------------------------------------
// Manifest-driven
// ---------------------------------------------------------------------------

/// Build the manifest-driven plan without executing it.
///
/// Requires `manifest`, `staging` and `destination` in `config`. A missing
/// destination is treated as empty; a missing staging area contributes no
/// transfers.
pub fn plan_manifest_run(config: &MirrorConfig) -> Result<Plan, SyncError> {
    let manifest_path = config.manifest_path()?;
    let staging = config.staging_path()?;
    let destination = config.destination_path()?;

    let manifest = manifest::load_at(manifest_path)?;
    let existing = scan_destination(destination)?;
    let staged = scan_staging(staging)?;

    Ok(plan_manifest(
        &manifest,
        &existing,
        &staged,
        destination,
        RunMode::from_dry_run(config.dry_run),
    ))
}

/// Plan and execute a manifest-driven reconciliation.
pub fn run_manifest(config: &MirrorConfig) -> Result<ExecutionReport, SyncError> {
    let mode = RunMode::from_dry_run(config.dry_run);
    tracing::info!(
        "manifest sync: {} -> {} (mode: {mode})",
        config.manifest_path()?.display(),
        config.destination_path()?.display()
    );
    let plan = plan_manifest_run(config)?;
    Ok(finish(&plan))
}

// ---------------------------------------------------------------------------
// Tree-driven
// ---------------------------------------------------------------------------

/// Plan and execute a tree-driven reconciliation.
///
/// A missing destination root is handled asymmetrically: execute mode
/// creates it and proceeds; dry-run mode aborts with
/// [`SyncError::DestinationMissing`] because there is nothing to compare.
pub fn run_tree(config: &MirrorConfig) -> Result<ExecutionReport, SyncError> {
    let mode = RunMode::from_dry_run(config.dry_run);
    let source = config.source_path()?;
    let destination = config.destination_path()?;

    if !source.is_dir() {
        return Err(SyncError::SourceTreeMissing {
            path: source.to_path_buf(),
        });
    }
    if !destination.is_dir() {
        if mode.is_dry_run() {
            return Err(SyncError::DestinationMissing {
                path: destination.to_path_buf(),
            });
        }
        tracing::info!("creating destination {}", destination.display());
        std::fs::create_dir_all(destination).map_err(|e| io_err(destination, e))?;
    }
    tracing::info!(
        "tree mirror: {} -> {} (mode: {mode})",
        source.display(),
        destination.display()
    );

    let diff = diff_trees(source, destination)?;
    let plan = plan_tree(&diff, mode)?;
    Ok(finish(&plan))
}

/// Unified diffs for files a tree-driven run would overwrite.
pub fn preview_tree(config: &MirrorConfig) -> Result<Vec<FileDiff>, SyncError> {
    let source = config.source_path()?;
    let destination = config.destination_path()?;
    if !source.is_dir() {
        return Err(SyncError::SourceTreeMissing {
            path: source.to_path_buf(),
        });
    }
    if !destination.is_dir() {
        return Err(SyncError::DestinationMissing {
            path: destination.to_path_buf(),
        });
    }
    preview_changes(&diff_trees(source, destination)?)
}

// ---------------------------------------------------------------------------
// Fetch list
// ---------------------------------------------------------------------------

/// Manifest entries that must be acquired before the next manifest sync.
pub fn fetch_list(config: &MirrorConfig) -> Result<Vec<FetchItem>, SyncError> {
    let manifest = manifest::load_at(config.manifest_path()?)?;
    let snapshot = snapshot_destination(config.destination_path()?)?;
    Ok(plan_fetch(&manifest, &snapshot))
}

fn finish(plan: &Plan) -> ExecutionReport {
    if plan.is_empty() {
        tracing::info!("{} is already in sync", plan.destination().display());
    }
    let report = execute(plan);
    tracing::info!(
        "done: {} applied, {} simulated, {} failed",
        report.applied_count(),
        report.simulated_count(),
        report.failed_count()
    );
    report
}
