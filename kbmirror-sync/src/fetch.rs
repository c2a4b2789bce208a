//! Fetch-list planning: which manifest entries must be (re)acquired into the
//! staging area before a manifest-driven sync.
//!
//! Reason precedence per entry:
//! 1. `Missing` (no file under that key in the destination)
//! 2. `UnknownTime` (either timestamp unavailable; fetched to be safe)
//! 3. `Outdated` (manifest time strictly newer than the local mtime)
//!
//! Entries whose local copy is as new or newer are not listed.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use kbmirror_core::{ContentLocator, Manifest, PathKey};

use crate::error::{io_err, SyncError};

/// Why an entry needs fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FetchReason {
    Missing,
    Outdated {
        authoritative: DateTime<Utc>,
        local: DateTime<Utc>,
    },
    UnknownTime,
}

/// One entry to acquire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchItem {
    pub path: PathKey,
    #[serde(flatten)]
    pub locator: ContentLocator,
    #[serde(flatten)]
    pub reason: FetchReason,
}

/// Compare the manifest with a destination snapshot. Output is in key order.
pub fn plan_fetch(manifest: &Manifest, snapshot: &Manifest) -> Vec<FetchItem> {
    let mut items = Vec::new();
    for entry in manifest.iter() {
        let reason = match snapshot.get(&entry.path) {
            None => FetchReason::Missing,
            Some(existing) => match (entry.modified_time, existing.modified_time) {
                (Some(authoritative), Some(local)) if authoritative > local => {
                    FetchReason::Outdated {
                        authoritative,
                        local,
                    }
                }
                (Some(_), Some(_)) => continue,
                _ => FetchReason::UnknownTime,
            },
        };
        match &reason {
            FetchReason::Missing => tracing::info!("[new] {}", entry.path),
            FetchReason::Outdated {
                authoritative,
                local,
            } => tracing::info!(
                "[updated] {} (manifest {} > local {})",
                entry.path,
                authoritative,
                local
            ),
            FetchReason::UnknownTime => {
                tracing::warn!("[unknown time] {}; fetching by default", entry.path)
            }
        }
        items.push(FetchItem {
            path: entry.path.clone(),
            locator: entry.locator.clone(),
            reason,
        });
    }
    items
}

/// Write one locator per line to `path`, atomically.
pub fn write_fetch_list(path: &Path, items: &[FetchItem]) -> Result<(), SyncError> {
    let mut body = String::new();
    for item in items {
        body.push_str(&item.locator.as_display_string());
        body.push('\n');
    }

    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let tmp = PathBuf::from(format!("{}.tmp", path.display()));
    std::fs::write(&tmp, body).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}
