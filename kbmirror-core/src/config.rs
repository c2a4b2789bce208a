//! Run configuration.
//!
//! A [`MirrorConfig`] is built once per invocation (config file merged with
//! command-line flags) and passed by reference into every entry point.
//!
//! # Storage layout
//!
//! ```text
//! ~/.kbmirror/
//!   config.yaml      (optional defaults)
//! ```
//!
//! As in the rest of the workspace, every loader has an `_at(home)` form for
//! tests and a convenience form that derives home from `dirs::home_dir()`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{config_io_err, ConfigError};

/// Locations and mode for a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Tree being brought into convergence.
    pub destination: Option<PathBuf>,
    /// Authoritative manifest (manifest-driven mode).
    pub manifest: Option<PathBuf>,
    /// Staging area of already-fetched files (manifest-driven mode).
    pub staging: Option<PathBuf>,
    /// Authoritative directory (tree-driven mode).
    pub source: Option<PathBuf>,
    /// Where `fetch-list` writes the locators to acquire.
    pub fetch_list: Option<PathBuf>,
    /// Plan and report without mutating anything.
    pub dry_run: bool,
}

impl MirrorConfig {
    /// Overlay `overrides` on top of `self`: any location set in `overrides`
    /// wins, and dry-run is enabled if either side enables it.
    ///
    /// A `dry_run: true` from the file therefore survives the merge; callers
    /// that need to force execute mode reset the field afterwards.
    pub fn merge(self, overrides: MirrorConfig) -> MirrorConfig {
        MirrorConfig {
            destination: overrides.destination.or(self.destination),
            manifest: overrides.manifest.or(self.manifest),
            staging: overrides.staging.or(self.staging),
            source: overrides.source.or(self.source),
            fetch_list: overrides.fetch_list.or(self.fetch_list),
            dry_run: overrides.dry_run || self.dry_run,
        }
    }

    pub fn destination_path(&self) -> Result<&Path, ConfigError> {
        required(&self.destination, "destination")
    }

    pub fn manifest_path(&self) -> Result<&Path, ConfigError> {
        required(&self.manifest, "manifest")
    }

    pub fn staging_path(&self) -> Result<&Path, ConfigError> {
        required(&self.staging, "staging")
    }

    pub fn source_path(&self) -> Result<&Path, ConfigError> {
        required(&self.source, "source")
    }

    pub fn fetch_list_path(&self) -> Result<&Path, ConfigError> {
        required(&self.fetch_list, "fetch_list")
    }
}

fn required<'a>(
    value: &'a Option<PathBuf>,
    name: &'static str,
) -> Result<&'a Path, ConfigError> {
    value.as_deref().ok_or(ConfigError::MissingSetting(name))
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<home>/.kbmirror/config.yaml`. Pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".kbmirror").join("config.yaml")
}

/// Load the default config file under `home`, or an empty config if absent.
pub fn load_at(home: &Path) -> Result<MirrorConfig, ConfigError> {
    match load_file(&config_path_at(home)) {
        Err(ConfigError::NotFound { .. }) => Ok(MirrorConfig::default()),
        other => other,
    }
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<MirrorConfig, ConfigError> {
    load_at(&home()?)
}

/// Load an explicitly named config file; a missing file is an error.
pub fn load_file(path: &Path) -> Result<MirrorConfig, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(config_io_err(path, err)),
    };
    if contents.trim().is_empty() {
        return Ok(MirrorConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
