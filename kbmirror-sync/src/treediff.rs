//! Level-by-level comparison of two live directory trees.
//!
//! [`diff_trees`] walks both trees with an explicit stack and records one
//! [`DirDiff`] per directory present on both sides. The result is an arena
//! in pre-order: a directory's diff always precedes its subdirectories'.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use kbmirror_core::PathKey;

use crate::compare::files_differ;
use crate::error::{io_err, SyncError};

/// File or directory, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// Comparison of one directory level. Names are relative to [`DirDiff::dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirDiff {
    pub dir: PathKey,
    pub source_only: Vec<(String, EntryKind)>,
    pub dest_only: Vec<(String, EntryKind)>,
    pub changed: Vec<String>,
    pub unchanged: Vec<String>,
    /// Directories on both sides; each has its own entry later in the arena.
    pub common_dirs: Vec<String>,
    /// File on one side, directory on the other.
    pub mismatched: Vec<String>,
}

impl DirDiff {
    pub fn is_clean(&self) -> bool {
        self.source_only.is_empty()
            && self.dest_only.is_empty()
            && self.changed.is_empty()
            && self.mismatched.is_empty()
    }
}

/// All per-directory diffs between `source_root` and `dest_root`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDiff {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub dirs: Vec<DirDiff>,
}

impl TreeDiff {
    pub fn is_clean(&self) -> bool {
        self.dirs.iter().all(DirDiff::is_clean)
    }

    /// Keys of every changed file, in walk order.
    pub fn changed_files(&self) -> impl Iterator<Item = PathKey> + '_ {
        self.dirs
            .iter()
            .flat_map(|d| d.changed.iter().map(move |name| d.dir.join(name)))
    }
}

/// Compare two existing directories recursively.
pub fn diff_trees(source_root: &Path, dest_root: &Path) -> Result<TreeDiff, SyncError> {
    let mut dirs = Vec::new();
    let mut stack = vec![PathKey::root()];

    while let Some(dir) = stack.pop() {
        let source_dir = dir.to_path(source_root);
        let dest_dir = dir.to_path(dest_root);
        let source_listing = list_dir(&source_dir, true)?;
        let dest_listing = list_dir(&dest_dir, false)?;

        let mut diff = DirDiff {
            dir: dir.clone(),
            ..Default::default()
        };

        for (name, source_kind) in &source_listing {
            match (source_kind, dest_listing.get(name)) {
                (kind, None) => diff.source_only.push((name.clone(), *kind)),
                (EntryKind::Dir, Some(EntryKind::Dir)) => diff.common_dirs.push(name.clone()),
                (EntryKind::File, Some(EntryKind::File)) => {
                    if files_differ(&source_dir.join(name), &dest_dir.join(name))? {
                        diff.changed.push(name.clone());
                    } else {
                        diff.unchanged.push(name.clone());
                    }
                }
                _ => diff.mismatched.push(name.clone()),
            }
        }
        for (name, kind) in &dest_listing {
            if !source_listing.contains_key(name) {
                diff.dest_only.push((name.clone(), *kind));
            }
        }

        // Reverse so the stack pops subdirectories in name order.
        for name in diff.common_dirs.iter().rev() {
            stack.push(dir.join(name));
        }
        dirs.push(diff);
    }

    Ok(TreeDiff {
        source_root: source_root.to_path_buf(),
        dest_root: dest_root.to_path_buf(),
        dirs,
    })
}

/// List one directory level.
///
/// With `follow_links` a symlink takes the kind of its target (a dangling
/// link counts as a file). Without it every symlink is a file, so a link to
/// a directory is never descended into or emptied.
fn list_dir(dir: &Path, follow_links: bool) -> Result<BTreeMap<String, EntryKind>, SyncError> {
    let mut listing = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = if follow_links {
            std::fs::metadata(&path)
        } else {
            std::fs::symlink_metadata(&path)
        };
        let is_dir = meta.map(|m| m.is_dir()).unwrap_or(false);
        let kind = if is_dir { EntryKind::Dir } else { EntryKind::File };
        listing.insert(entry.file_name().to_string_lossy().into_owned(), kind);
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source");
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        (tmp, source, dest)
    }

    #[test]
    fn identical_trees_are_clean() {
        let (_tmp, source, dest) = setup();
        for root in [&source, &dest] {
            fs::create_dir_all(root.join("sub")).unwrap();
            fs::write(root.join("sub/a.txt"), "same").unwrap();
        }
        let diff = diff_trees(&source, &dest).unwrap();
        assert!(diff.is_clean());
        assert_eq!(diff.dirs.len(), 2);
        assert_eq!(diff.dirs[1].dir, PathKey::from("sub"));
        assert_eq!(diff.dirs[1].unchanged, vec!["a.txt".to_string()]);
    }

    #[test]
    fn classifies_each_name_once() {
        let (_tmp, source, dest) = setup();
        fs::write(source.join("new.txt"), "n").unwrap();
        fs::create_dir_all(source.join("newdir")).unwrap();
        fs::write(dest.join("gone.txt"), "g").unwrap();
        fs::write(source.join("f.txt"), "source version").unwrap();
        fs::write(dest.join("f.txt"), "dest").unwrap();
        fs::create_dir_all(source.join("clash")).unwrap();
        fs::write(dest.join("clash"), "file").unwrap();

        let diff = diff_trees(&source, &dest).unwrap();
        let top = &diff.dirs[0];
        assert_eq!(
            top.source_only,
            vec![
                ("new.txt".to_string(), EntryKind::File),
                ("newdir".to_string(), EntryKind::Dir)
            ]
        );
        assert_eq!(top.dest_only, vec![("gone.txt".to_string(), EntryKind::File)]);
        assert_eq!(top.changed, vec!["f.txt".to_string()]);
        assert_eq!(top.mismatched, vec!["clash".to_string()]);
        assert_eq!(diff.changed_files().collect::<Vec<_>>(), vec![PathKey::from("f.txt")]);
    }

    #[test]
    fn arena_is_pre_order() {
        let (_tmp, source, dest) = setup();
        for root in [&source, &dest] {
            fs::create_dir_all(root.join("a/x")).unwrap();
            fs::create_dir_all(root.join("b")).unwrap();
        }
        let diff = diff_trees(&source, &dest).unwrap();
        let order: Vec<_> = diff.dirs.iter().map(|d| d.dir.to_string()).collect();
        assert_eq!(order, vec![".", "a", "a/x", "b"]);
    }

    #[cfg(unix)]
    #[test]
    fn destination_link_to_directory_is_not_descended() {
        let (tmp, source, dest) = setup();
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("unrelated.txt"), "keep").unwrap();
        fs::create_dir_all(source.join("docs")).unwrap();
        fs::write(source.join("docs/new.txt"), "new").unwrap();
        std::os::unix::fs::symlink(&outside, dest.join("docs")).unwrap();

        let diff = diff_trees(&source, &dest).unwrap();
        assert_eq!(diff.dirs.len(), 1);
        assert_eq!(diff.dirs[0].mismatched, vec!["docs".to_string()]);
    }
}
