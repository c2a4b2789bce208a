//! Reconciliation planning.
//!
//! Two strategies produce the same kind of [`Plan`]:
//!
//! - [`plan_manifest`]: authoritative state is a [`Manifest`]; new content
//!   arrives through a staging area and is moved in unconditionally.
//! - [`plan_tree`]: authoritative state is a second live directory, already
//!   compared level by level into a [`TreeDiff`].
//!
//! Both are pure with respect to the destination: nothing is mutated here.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use walkdir::WalkDir;

use kbmirror_core::{DestinationEntry, Manifest, PathKey};

use crate::error::SyncError;
use crate::plan::{Action, Plan, RunMode, TransferKind};
use crate::scan::StagedFile;
use crate::treediff::{EntryKind, TreeDiff};

// ---------------------------------------------------------------------------
// Manifest-driven
// ---------------------------------------------------------------------------

/// Plan the convergence of `destination` to `manifest`.
///
/// `destination` must be in post-order (as produced by
/// [`scan_destination`](crate::scan::scan_destination)). Deletions come
/// first, deepest first; a directory is removed only once every child has
/// been scheduled for deletion and no manifest key lies below it. Then every
/// staged file is moved in with `overwrite = true`.
///
/// Staged keys are never deleted and their ancestors count as needed, so no
/// key is both deleted and recreated within one plan.
pub fn plan_manifest(
    manifest: &Manifest,
    destination: &[DestinationEntry],
    staged: &[StagedFile],
    dest_root: &Path,
    mode: RunMode,
) -> Plan {
    let mut plan = Plan::new(dest_root, mode);

    let staged_keys: HashSet<&PathKey> = staged.iter().map(|s| &s.path).collect();
    let staged_dirs: HashSet<PathKey> = staged.iter().flat_map(|s| s.path.ancestors()).collect();

    // Children still alive per directory; a directory is empty at execution
    // time exactly when this reaches zero.
    let mut remaining: HashMap<PathKey, usize> = HashMap::new();
    for entry in destination {
        if let Some(parent) = entry.path.parent() {
            *remaining.entry(parent).or_default() += 1;
        }
    }

    for entry in destination {
        let delete = if entry.is_dir {
            remaining.get(&entry.path).copied().unwrap_or(0) == 0
                && !manifest.needs_dir(&entry.path)
                && !staged_dirs.contains(&entry.path)
        } else {
            !manifest.contains(&entry.path) && !staged_keys.contains(&entry.path)
        };
        if !delete {
            continue;
        }

        if let Some(count) = entry.path.parent().and_then(|p| remaining.get_mut(&p)) {
            *count = count.saturating_sub(1);
        }
        plan.push(if entry.is_dir {
            Action::DeleteEmptyDir {
                path: entry.path.clone(),
            }
        } else {
            Action::DeleteFile {
                path: entry.path.clone(),
            }
        });
    }

    // Content-blind: the staging area is trusted to hold only what must be
    // transferred, so timestamps are not re-checked before overwriting.
    for file in staged {
        if !manifest.contains(&file.path) {
            tracing::warn!(
                "staged file {} has no manifest entry; it will be removed again on the next run",
                file.path
            );
        }
        plan.push(Action::CopyOrMove {
            source: file.location.clone(),
            dest: file.path.clone(),
            kind: TransferKind::Move,
            overwrite: true,
        });
    }

    plan
}

// ---------------------------------------------------------------------------
// Tree-driven
// ---------------------------------------------------------------------------

/// Plan the convergence of `diff.dest_root` to `diff.source_root`.
///
/// Per directory level, in arena order:
/// - source-only file → copy (no overwrite);
/// - source-only directory → create it, then its subtree in pre-order;
/// - changed file → copy with overwrite;
/// - destination-only file → delete;
/// - destination-only directory → its subtree deleted in post-order, then itself.
///
/// File/directory mismatches are reported and left alone.
pub fn plan_tree(diff: &TreeDiff, mode: RunMode) -> Result<Plan, SyncError> {
    let mut plan = Plan::new(&diff.dest_root, mode);

    for level in &diff.dirs {
        for (name, kind) in &level.source_only {
            let key = level.dir.join(name);
            match kind {
                EntryKind::File => plan.push(copy(&diff.source_root, key, false)),
                EntryKind::Dir => plan_subtree_copy(&mut plan, &diff.source_root, key)?,
            }
        }

        for name in &level.changed {
            plan.push(copy(&diff.source_root, level.dir.join(name), true));
        }

        for (name, kind) in &level.dest_only {
            let key = level.dir.join(name);
            match kind {
                EntryKind::File => plan.push(Action::DeleteFile { path: key }),
                EntryKind::Dir => plan_subtree_delete(&mut plan, &diff.dest_root, key)?,
            }
        }

        for name in &level.mismatched {
            tracing::warn!(
                "{} is a file on one side and a directory on the other; skipping",
                level.dir.join(name)
            );
        }
    }

    Ok(plan)
}

fn copy(source_root: &Path, key: PathKey, overwrite: bool) -> Action {
    Action::CopyOrMove {
        source: key.to_path(source_root),
        dest: key,
        kind: TransferKind::Copy,
        overwrite,
    }
}

fn plan_subtree_copy(plan: &mut Plan, source_root: &Path, dir: PathKey) -> Result<(), SyncError> {
    let dir_path = dir.to_path(source_root);
    plan.push(Action::CreateDir { path: dir.clone() });
    for entry in WalkDir::new(&dir_path)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(&dir_path)
            .unwrap_or_else(|_| entry.path());
        let key = dir.join(PathKey::from_relative(relative).as_str());
        if entry.file_type().is_dir() {
            plan.push(Action::CreateDir { path: key });
        } else {
            plan.push(copy(source_root, key, false));
        }
    }
    Ok(())
}

fn plan_subtree_delete(plan: &mut Plan, dest_root: &Path, dir: PathKey) -> Result<(), SyncError> {
    let dir_path = dir.to_path(dest_root);
    // A link is removed as itself, never through its target.
    for entry in WalkDir::new(&dir_path)
        .follow_links(false)
        .follow_root_links(false)
        .contents_first(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(&dir_path)
            .unwrap_or_else(|_| entry.path());
        let key = dir.join(PathKey::from_relative(relative).as_str());
        if entry.file_type().is_dir() {
            plan.push(Action::DeleteEmptyDir { path: key });
        } else {
            plan.push(Action::DeleteFile { path: key });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kbmirror_core::{ContentLocator, ManifestEntry};
    use std::path::PathBuf;

    fn manifest(keys: &[&str]) -> Manifest {
        keys.iter()
            .map(|k| ManifestEntry {
                path: PathKey::from(*k),
                modified_time: None,
                locator: ContentLocator::Url {
                    url: format!("https://kb/{k}"),
                },
            })
            .collect()
    }

    fn file(key: &str) -> DestinationEntry {
        DestinationEntry {
            path: PathKey::from(key),
            is_dir: false,
            modified_time: Utc::now(),
            location: PathBuf::from("/dest").join(key),
        }
    }

    fn dir(key: &str) -> DestinationEntry {
        DestinationEntry {
            is_dir: true,
            ..file(key)
        }
    }

    fn staged(key: &str) -> StagedFile {
        StagedFile {
            path: PathKey::from(key),
            location: PathBuf::from("/staging").join(key),
        }
    }

    #[test]
    fn empty_destination_only_moves_staged_files() {
        let plan = plan_manifest(
            &manifest(&["a/b.txt"]),
            &[],
            &[staged("a/b.txt")],
            Path::new("/dest"),
            RunMode::Execute,
        );
        assert_eq!(
            plan.actions(),
            &[Action::CopyOrMove {
                source: PathBuf::from("/staging/a/b.txt"),
                dest: PathKey::from("a/b.txt"),
                kind: TransferKind::Move,
                overwrite: true,
            }]
        );
    }

    #[test]
    fn orphan_file_and_emptied_dir_are_deleted_deepest_first() {
        let destination = [file("old/x.txt"), dir("old"), file("keep.txt")];
        let plan = plan_manifest(
            &manifest(&["keep.txt"]),
            &destination,
            &[],
            Path::new("/dest"),
            RunMode::DryRun,
        );
        assert_eq!(
            plan.actions(),
            &[
                Action::DeleteFile {
                    path: PathKey::from("old/x.txt")
                },
                Action::DeleteEmptyDir {
                    path: PathKey::from("old")
                },
            ]
        );
    }

    #[test]
    fn needed_empty_dir_survives() {
        let destination = [file("docs/stale.txt"), dir("docs")];
        let plan = plan_manifest(
            &manifest(&["docs/fresh.txt"]),
            &destination,
            &[],
            Path::new("/dest"),
            RunMode::Execute,
        );
        assert_eq!(
            plan.actions(),
            &[Action::DeleteFile {
                path: PathKey::from("docs/stale.txt")
            }]
        );
    }

    #[test]
    fn dir_with_surviving_child_is_kept() {
        let destination = [
            file("mixed/keep.txt"),
            file("mixed/drop.txt"),
            dir("mixed"),
        ];
        let plan = plan_manifest(
            &manifest(&["mixed/keep.txt"]),
            &destination,
            &[],
            Path::new("/dest"),
            RunMode::Execute,
        );
        assert_eq!(plan.len(), 1);
        assert!(!plan
            .actions()
            .iter()
            .any(|a| matches!(a, Action::DeleteEmptyDir { .. })));
    }

    #[test]
    fn nested_orphan_dirs_cascade() {
        let destination = [file("a/b/c/x.txt"), dir("a/b/c"), dir("a/b"), dir("a")];
        let plan = plan_manifest(&manifest(&[]), &destination, &[], Path::new("/d"), RunMode::Execute);
        let targets: Vec<_> = plan.actions().iter().map(|a| a.target().to_string()).collect();
        assert_eq!(targets, vec!["a/b/c/x.txt", "a/b/c", "a/b", "a"]);
    }

    #[test]
    fn staged_key_is_never_deleted() {
        let destination = [file("extra/new.txt"), dir("extra")];
        let plan = plan_manifest(
            &manifest(&[]),
            &destination,
            &[staged("extra/new.txt")],
            Path::new("/dest"),
            RunMode::Execute,
        );
        assert_eq!(plan.deletion_count(), 0);
        assert_eq!(plan.transfer_count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn linked_directory_is_deleted_as_one_entry() {
        let tmp = tempfile::TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        let dest = tmp.path().join("dest");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(outside.join("precious.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("link")).unwrap();

        let mut plan = Plan::new(&dest, RunMode::Execute);
        plan_subtree_delete(&mut plan, &dest, PathKey::from("link")).unwrap();
        assert_eq!(
            plan.actions(),
            &[Action::DeleteFile {
                path: PathKey::from("link")
            }]
        );
    }
}
