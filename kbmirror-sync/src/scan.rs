//! Filesystem scanning for the manifest-driven strategy.
//!
//! - [`scan_destination`]: post-order walk of the destination tree
//! - [`scan_staging`]: files waiting in the staging area
//! - [`snapshot_destination`]: the destination as a manifest-shaped mapping
//! - [`snapshot_from_entries`]: the same, from an earlier scan
//!
//! A missing root is not an error for any of these: the destination is
//! treated as empty and an absent staging area simply has nothing to offer.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use kbmirror_core::{
    types::timestamp_from_system_time, ContentLocator, DestinationEntry, Manifest, ManifestEntry,
    PathKey,
};

use crate::error::{io_err, SyncError};

/// A file in the staging area, keyed by its path relative to the staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: PathKey,
    pub location: PathBuf,
}

/// Walk the destination bottom-up.
///
/// Within a directory, entries come before the directory itself, and child
/// directories before their parents. Siblings are sorted by name. The root
/// itself is never listed. Symlinks are not followed and count as files.
pub fn scan_destination(root: &Path) -> Result<Vec<DestinationEntry>, SyncError> {
    if !root.is_dir() {
        tracing::info!(
            "destination {} does not exist; treating it as empty",
            root.display()
        );
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .contents_first(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let modified = metadata.modified().map_err(|e| io_err(entry.path(), e))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        entries.push(DestinationEntry {
            path: PathKey::from_relative(relative),
            is_dir: entry.file_type().is_dir(),
            modified_time: timestamp_from_system_time(modified),
            location: entry.path().to_path_buf(),
        });
    }
    Ok(entries)
}

/// List every file under the staging root, in sorted pre-order.
pub fn scan_staging(root: &Path) -> Result<Vec<StagedFile>, SyncError> {
    if !root.is_dir() {
        tracing::info!(
            "staging area {} does not exist; no new files to transfer",
            root.display()
        );
        return Ok(Vec::new());
    }

    let mut staged = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        staged.push(StagedFile {
            path: PathKey::from_relative(relative),
            location: entry.path().to_path_buf(),
        });
    }
    Ok(staged)
}

/// Describe the destination's files the way a manifest would.
///
/// Each entry carries the file's mtime and its absolute local path.
pub fn snapshot_destination(root: &Path) -> Result<Manifest, SyncError> {
    let snapshot = snapshot_from_entries(scan_destination(root)?);
    tracing::debug!(
        "scanned {} files under {}",
        snapshot.len(),
        root.display()
    );
    Ok(snapshot)
}

/// [`snapshot_destination`] for entries already returned by
/// [`scan_destination`]. Directories are dropped.
pub fn snapshot_from_entries(entries: impl IntoIterator<Item = DestinationEntry>) -> Manifest {
    entries
        .into_iter()
        .filter(|entry| !entry.is_dir)
        .map(|entry| ManifestEntry {
            path: entry.path,
            modified_time: Some(entry.modified_time),
            locator: ContentLocator::Local {
                path: entry.location,
            },
        })
        .collect()
}
