//! Plan execution.
//!
//! Every action is announced before it is attempted, with the same text in
//! both modes. In dry-run mode nothing else happens. In execute mode each
//! action runs independently: a failure is logged with its path and cause,
//! recorded, and execution continues with the next action.
//!
//! ## Copy protocol
//!
//! 1. Create missing parent directories.
//! 2. Refuse to clobber an existing target unless `overwrite` is set.
//! 3. Copy to `<target>.kbmirror.tmp`.
//! 4. Rename onto the target; on failure remove the `.tmp`.
//!
//! A move is a plain rename when possible, otherwise the copy protocol
//! followed by removal of the source. A failed move leaves the source in
//! place so a later run can retry it.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use crate::error::{action_err, SyncError};
use crate::plan::{Action, Plan, RunMode, TransferKind};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one planned action.
#[derive(Debug)]
pub enum ActionOutcome {
    /// The filesystem operation succeeded.
    Applied { action: Action },
    /// `--dry-run`: the action *would* have been attempted.
    Simulated { action: Action },
    /// The operation failed; the rest of the plan still ran.
    Failed { action: Action, error: SyncError },
}

impl ActionOutcome {
    pub fn action(&self) -> &Action {
        match self {
            ActionOutcome::Applied { action }
            | ActionOutcome::Simulated { action }
            | ActionOutcome::Failed { action, .. } => action,
        }
    }
}

/// Per-action results of one plan, in plan order.
#[derive(Debug)]
pub struct ExecutionReport {
    pub mode: RunMode,
    pub destination: PathBuf,
    pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ActionOutcome::Applied { .. }))
            .count()
    }

    pub fn simulated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, ActionOutcome::Simulated { .. }))
            .count()
    }

    /// Failed actions with their errors, in plan order.
    pub fn failures(&self) -> impl Iterator<Item = (&Action, &SyncError)> {
        self.outcomes.iter().filter_map(|o| match o {
            ActionOutcome::Failed { action, error } => Some((action, error)),
            _ => None,
        })
    }

    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

// ---------------------------------------------------------------------------
// execute
// ---------------------------------------------------------------------------

/// Apply `plan` in order. Never returns early; see [`ExecutionReport`].
pub fn execute(plan: &Plan) -> ExecutionReport {
    let mut outcomes = Vec::with_capacity(plan.len());

    for action in plan.actions() {
        tracing::info!("{action}");

        if plan.mode.is_dry_run() {
            outcomes.push(ActionOutcome::Simulated {
                action: action.clone(),
            });
            continue;
        }

        match apply(action, plan.destination()) {
            Ok(()) => outcomes.push(ActionOutcome::Applied {
                action: action.clone(),
            }),
            Err(error) => {
                tracing::warn!("  failed: {error}");
                outcomes.push(ActionOutcome::Failed {
                    action: action.clone(),
                    error,
                });
            }
        }
    }

    ExecutionReport {
        mode: plan.mode,
        destination: plan.destination().to_path_buf(),
        outcomes,
    }
}

fn apply(action: &Action, root: &Path) -> Result<(), SyncError> {
    match action {
        Action::DeleteFile { path } => {
            let target = path.to_path(root);
            std::fs::remove_file(&target).map_err(|e| action_err(&target, e))
        }
        Action::DeleteEmptyDir { path } => {
            let target = path.to_path(root);
            // remove_dir refuses non-empty directories.
            std::fs::remove_dir(&target).map_err(|e| action_err(&target, e))
        }
        Action::CreateDir { path } => {
            let target = path.to_path(root);
            std::fs::create_dir_all(&target).map_err(|e| action_err(&target, e))
        }
        Action::CopyOrMove {
            source,
            dest,
            kind,
            overwrite,
        } => {
            let target = dest.to_path(root);
            match kind {
                TransferKind::Copy => copy_file(source, &target, *overwrite),
                TransferKind::Move => move_file(source, &target, *overwrite),
            }
        }
    }
}

fn prepare_target(target: &Path, overwrite: bool) -> Result<(), SyncError> {
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent).map_err(|e| action_err(parent, e))?;
    }
    if !overwrite && target.exists() {
        return Err(action_err(
            target,
            io::Error::new(ErrorKind::AlreadyExists, "target exists and overwrite is off"),
        ));
    }
    Ok(())
}

fn copy_file(source: &Path, target: &Path, overwrite: bool) -> Result<(), SyncError> {
    prepare_target(target, overwrite)?;
    let tmp = PathBuf::from(format!("{}.kbmirror.tmp", target.display()));
    copy_via_tmp(source, target, &tmp)
}

fn copy_via_tmp(source: &Path, target: &Path, tmp: &Path) -> Result<(), SyncError> {
    if let Err(e) = std::fs::copy(source, tmp) {
        let _ = std::fs::remove_file(tmp);
        return Err(action_err(source, e));
    }
    if let Err(e) = std::fs::rename(tmp, target) {
        let _ = std::fs::remove_file(tmp);
        return Err(action_err(target, e));
    }
    Ok(())
}

fn move_file(source: &Path, target: &Path, overwrite: bool) -> Result<(), SyncError> {
    prepare_target(target, overwrite)?;
    match std::fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // Typically a cross-device move: fall back to copy + remove.
            tracing::debug!(
                "rename {} -> {} failed ({rename_err}); copying instead",
                source.display(),
                target.display()
            );
            copy_file(source, target, true)?;
            std::fs::remove_file(source).map_err(|e| action_err(source, e))
        }
    }
}
