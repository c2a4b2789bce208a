//! Error types for kbmirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving the authoritative manifest.
///
/// Every variant is fatal for a reconciliation run: an incomplete
/// authoritative view would schedule incorrect deletions.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file did not exist at the given path.
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    /// The manifest exists but is not a valid mapping of path → entry.
    #[error("manifest at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Two raw keys normalise to the same path key.
    #[error("manifest at {path} is corrupt: duplicate key '{key}' after normalisation")]
    DuplicateKey { path: PathBuf, key: String },

    /// Underlying I/O failure other than a missing file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while resolving the run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error, with the file path for context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A location required by the selected mode was not configured.
    #[error("missing setting '{0}'; pass it on the command line or set it in the config file")]
    MissingSetting(&'static str),

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn manifest_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ManifestError {
    ManifestError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn config_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
