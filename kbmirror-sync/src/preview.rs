//! Unified-diff preview of the files a tree-driven run would overwrite.
//!
//! No files are written.

use std::path::Path;

use similar::TextDiff;

use kbmirror_core::PathKey;

use crate::error::{io_err, SyncError};
use crate::treediff::TreeDiff;

/// Preview of one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathKey,
    /// `None` when either side is not valid UTF-8.
    pub unified_diff: Option<String>,
}

/// Render a diff (destination → source) for every changed file in `diff`.
pub fn preview_changes(diff: &TreeDiff) -> Result<Vec<FileDiff>, SyncError> {
    let mut previews = Vec::new();
    for key in diff.changed_files() {
        let current = read_text(&key.to_path(&diff.dest_root))?;
        let incoming = read_text(&key.to_path(&diff.source_root))?;

        let unified_diff = match (current, incoming) {
            (Some(current), Some(incoming)) => {
                let old_header = format!("a/{key}");
                let new_header = format!("b/{key}");
                Some(
                    TextDiff::from_lines(&current, &incoming)
                        .unified_diff()
                        .header(&old_header, &new_header)
                        .context_radius(3)
                        .to_string(),
                )
            }
            _ => None,
        };
        previews.push(FileDiff {
            path: key,
            unified_diff,
        });
    }
    Ok(previews)
}

fn read_text(path: &Path) -> Result<Option<String>, SyncError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(String::from_utf8(bytes)
        .ok()
        .map(|content| content.replace("\r\n", "\n")))
}
