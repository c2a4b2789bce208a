//! Reconciliation plans.
//!
//! A [`Plan`] is an ordered list of [`Action`]s against one destination root
//! plus the [`RunMode`] it will be executed in. Plans are built fresh per
//! invocation and never persisted.
//!
//! Ordering contract: every deletion inside a subtree precedes the deletion
//! of the directory that contains it, so a `DeleteEmptyDir` only ever runs
//! after all of its descendants have been resolved.

use std::fmt;
use std::path::{Path, PathBuf};

use kbmirror_core::PathKey;

/// Whether a plan mutates the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Announce every action, perform none.
    DryRun,
    #[default]
    Execute,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::DryRun
        } else {
            RunMode::Execute
        }
    }

    pub fn is_dry_run(self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::DryRun => f.write_str("dry-run"),
            RunMode::Execute => f.write_str("execute"),
        }
    }
}

/// How a file reaches the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Source stays where it is (tree-driven mode).
    Copy,
    /// Source is consumed (staging area in manifest-driven mode).
    Move,
}

/// One filesystem mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DeleteFile {
        path: PathKey,
    },
    DeleteEmptyDir {
        path: PathKey,
    },
    CreateDir {
        path: PathKey,
    },
    CopyOrMove {
        source: PathBuf,
        dest: PathKey,
        kind: TransferKind,
        overwrite: bool,
    },
}

impl Action {
    /// The destination key this action touches.
    pub fn target(&self) -> &PathKey {
        match self {
            Action::DeleteFile { path }
            | Action::DeleteEmptyDir { path }
            | Action::CreateDir { path } => path,
            Action::CopyOrMove { dest, .. } => dest,
        }
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Action::DeleteFile { .. } | Action::DeleteEmptyDir { .. }
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::DeleteFile { path } => write!(f, "[delete file] {path}"),
            Action::DeleteEmptyDir { path } => write!(f, "[delete empty dir] {path}"),
            Action::CreateDir { path } => write!(f, "[create dir] {path}"),
            Action::CopyOrMove {
                dest,
                kind,
                overwrite,
                ..
            } => {
                let verb = match kind {
                    TransferKind::Copy => "copy",
                    TransferKind::Move => "move",
                };
                if *overwrite {
                    write!(f, "[{verb}, overwrite] {dest}")
                } else {
                    write!(f, "[{verb}] {dest}")
                }
            }
        }
    }
}

/// Ordered actions for one destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub mode: RunMode,
    destination: PathBuf,
    actions: Vec<Action>,
}

impl Plan {
    pub fn new(destination: impl Into<PathBuf>, mode: RunMode) -> Self {
        Self {
            mode,
            destination: destination.into(),
            actions: Vec::new(),
        }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn deletion_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_deletion()).count()
    }

    pub fn transfer_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::CopyOrMove { .. }))
            .count()
    }

    /// Absolute location of `key` under this plan's destination root.
    pub fn resolve(&self, key: &PathKey) -> PathBuf {
        key.to_path(&self.destination)
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_mode_independent() {
        let action = Action::CopyOrMove {
            source: PathBuf::from("/staging/a/b.txt"),
            dest: PathKey::from("a/b.txt"),
            kind: TransferKind::Move,
            overwrite: true,
        };
        assert_eq!(action.to_string(), "[move, overwrite] a/b.txt");
        assert_eq!(
            Action::DeleteEmptyDir {
                path: PathKey::from("old")
            }
            .to_string(),
            "[delete empty dir] old"
        );
    }

    #[test]
    fn counts_split_by_kind() {
        let mut plan = Plan::new("/dest", RunMode::DryRun);
        plan.push(Action::DeleteFile {
            path: PathKey::from("old/x.txt"),
        });
        plan.push(Action::DeleteEmptyDir {
            path: PathKey::from("old"),
        });
        plan.push(Action::CopyOrMove {
            source: PathBuf::from("/s/n.txt"),
            dest: PathKey::from("n.txt"),
            kind: TransferKind::Copy,
            overwrite: false,
        });
        assert_eq!(plan.deletion_count(), 2);
        assert_eq!(plan.transfer_count(), 1);
        assert_eq!(plan.resolve(&PathKey::from("a/b")), Path::new("/dest/a/b"));
    }
}
