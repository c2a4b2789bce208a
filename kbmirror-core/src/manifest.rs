//! Authoritative manifest: a flat JSON mapping of logical path → entry.
//!
//! # File format
//!
//! ```json
//! {
//!   "folder1/file1.txt": { "modifiedTime": "2024-05-01T08:30:00Z", "url": "https://..." },
//!   "file_at_root.txt":  { "modifiedTime": "2024-05-01T08:30:00Z", "path": "/mnt/nas/file_at_root.txt" }
//! }
//! ```
//!
//! The manifest carries no directory entries. Which directories must keep
//! existing is derived from the file keys and held in a prefix index built
//! at insert time, so [`Manifest::needs_dir`] is a set lookup instead of a
//! scan over every key.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{manifest_io_err, ManifestError};
use crate::pathkey::{normalize, PathKey};
use crate::types::{format_timestamp, parse_timestamp, ContentLocator, ManifestEntry};

/// On-disk shape of one manifest value.
#[derive(Debug, Serialize, Deserialize)]
struct RawEntry {
    #[serde(rename = "modifiedTime")]
    modified_time: String,
    #[serde(flatten)]
    locator: ContentLocator,
}

/// The authoritative state in manifest-driven mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<PathKey, ManifestEntry>,
    dirs: HashSet<PathKey>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, indexing every ancestor directory of its key.
    ///
    /// Returns the entry previously stored under the same key, if any.
    pub fn insert(&mut self, entry: ManifestEntry) -> Option<ManifestEntry> {
        for dir in entry.path.ancestors() {
            if !self.dirs.insert(dir) {
                // Ancestors of an indexed directory are indexed too.
                break;
            }
        }
        self.entries.insert(entry.path.clone(), entry)
    }

    pub fn get(&self, key: &PathKey) -> Option<&ManifestEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &PathKey) -> bool {
        self.entries.contains_key(key)
    }

    /// True when at least one manifest key lies below `dir`.
    pub fn needs_dir(&self, dir: &PathKey) -> bool {
        self.dirs.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for entry in iter {
            manifest.insert(entry);
        }
        manifest
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and parse the manifest at `path`.
///
/// Returns [`ManifestError::NotFound`] if the file is absent and
/// [`ManifestError::Corrupt`] / [`ManifestError::DuplicateKey`] if it does
/// not describe a unique mapping. No partial manifest is ever returned.
pub fn load_at(path: &Path) -> Result<Manifest, ManifestError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(err) => return Err(manifest_io_err(path, err)),
    };
    let manifest = parse(&contents, path)?;
    tracing::info!(
        "loaded manifest {} ({} entries)",
        path.display(),
        manifest.len()
    );
    Ok(manifest)
}

/// Parse manifest JSON. `origin` is only used for error context.
pub fn parse(contents: &str, origin: &Path) -> Result<Manifest, ManifestError> {
    let raw: BTreeMap<String, RawEntry> =
        serde_json::from_str(contents).map_err(|source| ManifestError::Corrupt {
            path: origin.to_path_buf(),
            source,
        })?;

    let mut manifest = Manifest::new();
    for (raw_key, value) in raw {
        let key = normalize(&raw_key);
        let modified_time = parse_timestamp(&value.modified_time);
        if modified_time.is_none() {
            tracing::warn!(
                "manifest entry '{}' has unparsable modifiedTime '{}'",
                raw_key,
                value.modified_time
            );
        }
        let previous = manifest.insert(ManifestEntry {
            path: key.clone(),
            modified_time,
            locator: value.locator,
        });
        if previous.is_some() {
            return Err(ManifestError::DuplicateKey {
                path: origin.to_path_buf(),
                key: key.to_string(),
            });
        }
    }
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Save (atomic)
// ---------------------------------------------------------------------------

/// Render `manifest` in the same pretty JSON shape [`parse`] accepts.
///
/// Entries without a parsable timestamp are written with an empty
/// `modifiedTime`.
pub fn to_json(manifest: &Manifest) -> Result<String, serde_json::Error> {
    let raw: BTreeMap<&str, RawEntry> = manifest
        .iter()
        .map(|entry| {
            let raw = RawEntry {
                modified_time: entry
                    .modified_time
                    .as_ref()
                    .map(format_timestamp)
                    .unwrap_or_default(),
                locator: entry.locator.clone(),
            };
            (entry.path.as_str(), raw)
        })
        .collect();
    serde_json::to_string_pretty(&raw)
}

/// Atomically write `manifest` as pretty JSON to `path`.
///
/// Write flow: [`to_json`] → `<path>.tmp` sibling → `rename`.
pub fn save_at(path: &Path, manifest: &Manifest) -> Result<(), ManifestError> {
    let json = to_json(manifest).map_err(|source| ManifestError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| manifest_io_err(dir, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| manifest_io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(manifest_io_err(path, e));
    }
    Ok(())
}
