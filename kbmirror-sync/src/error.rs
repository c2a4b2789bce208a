//! Error types for kbmirror-sync.

use std::path::PathBuf;

use thiserror::Error;

use kbmirror_core::{ConfigError, ManifestError};

/// All errors that can arise from planning and executing a reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The authoritative manifest could not be loaded. Fatal.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// The run configuration is incomplete or unreadable. Fatal.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The authoritative directory of a tree-driven run does not exist.
    #[error("source tree {path} does not exist")]
    SourceTreeMissing { path: PathBuf },

    /// Tree-driven dry run against a destination that does not exist yet.
    #[error("destination {path} does not exist; cannot simulate")]
    DestinationMissing { path: PathBuf },

    /// A single planned action failed. Never aborts the rest of the plan.
    #[error("action failed at {path}: {source}")]
    ActionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failure.
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Whether this error aborts the whole run.
    ///
    /// Only per-action failures are recoverable; they are collected in the
    /// execution report instead of being propagated.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SyncError::ActionFailed { .. })
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::ActionFailed`].
pub(crate) fn action_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::ActionFailed {
        path: path.into(),
        source,
    }
}
