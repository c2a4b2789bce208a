//! Separator-agnostic path identity.
//!
//! A [`PathKey`] names one logical file (or directory) relative to a tree
//! root. Keys are `/`-separated, carry no empty or `.` segments, and resolve
//! `..` against the preceding segment. Case is preserved; case-insensitive
//! filesystems are not accounted for.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Canonical separator used inside every [`PathKey`].
pub const SEPARATOR: char = '/';

/// A normalised relative path. The empty key denotes the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PathKey(String);

/// Normalise any platform path or manifest key into a [`PathKey`].
///
/// Pure: no filesystem access, no symlink resolution.
pub fn normalize(raw: &str) -> PathKey {
    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                // Nothing left to cancel against; keep it so distinct
                // escaping keys stay distinct.
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }
    PathKey(segments.join("/"))
}

impl PathKey {
    /// The key of the tree root itself.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Build a key from a path relative to some tree root.
    pub fn from_relative(path: &Path) -> Self {
        let joined = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        normalize(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit(SEPARATOR).next()
    }

    /// Parent key; the root has no parent, top-level keys have the root.
    pub fn parent(&self) -> Option<PathKey> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind(SEPARATOR) {
            Some(idx) => Some(PathKey(self.0[..idx].to_string())),
            None => Some(PathKey::root()),
        }
    }

    /// Proper ancestor directories, nearest first, excluding the root.
    ///
    /// `a/b/c.txt` yields `a/b`, then `a`.
    pub fn ancestors(&self) -> impl Iterator<Item = PathKey> + '_ {
        self.0
            .char_indices()
            .rev()
            .filter(|(_, c)| *c == SEPARATOR)
            .map(|(idx, _)| PathKey(self.0[..idx].to_string()))
    }

    /// Append one child segment (normalised, so separators inside `name` split).
    pub fn join(&self, name: &str) -> PathKey {
        if self.is_root() {
            normalize(name)
        } else {
            normalize(&format!("{}/{}", self.0, name))
        }
    }

    /// True when `self` lies strictly below `dir`.
    pub fn is_within(&self, dir: &PathKey) -> bool {
        if dir.is_root() {
            return !self.is_root();
        }
        self.0.len() > dir.0.len()
            && self.0.starts_with(dir.as_str())
            && self.0.as_bytes()[dir.0.len()] == SEPARATOR as u8
    }

    /// Resolve this key under a physical root directory.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        if !self.is_root() {
            for segment in self.0.split(SEPARATOR) {
                path.push(segment);
            }
        }
        path
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        self.0.fmt(f)
    }
}

impl From<String> for PathKey {
    fn from(s: String) -> Self {
        normalize(&s)
    }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self {
        normalize(s)
    }
}

impl From<PathKey> for String {
    fn from(key: PathKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backslashes_and_slashes_converge() {
        assert_eq!(normalize("a\\b\\c.txt"), normalize("a/b/c.txt"));
        assert_eq!(normalize("a\\b/c.txt").as_str(), "a/b/c.txt");
    }

    #[test]
    fn dot_segments_resolve() {
        assert_eq!(normalize("./a/./b/../c.txt").as_str(), "a/c.txt");
        assert_eq!(normalize("../x").as_str(), "../x");
    }

    #[test]
    fn ancestors_nearest_first() {
        let key = normalize("a/b/c.txt");
        let ancestors: Vec<_> = key.ancestors().map(String::from).collect();
        assert_eq!(ancestors, vec!["a/b".to_string(), "a".to_string()]);
        assert_eq!(normalize("top.txt").ancestors().count(), 0);
    }

    #[test]
    fn parent_of_top_level_is_root() {
        assert_eq!(normalize("top.txt").parent(), Some(PathKey::root()));
        assert_eq!(PathKey::root().parent(), None);
    }

    #[test]
    fn is_within_requires_separator_boundary() {
        let dir = normalize("old");
        assert!(normalize("old/x.txt").is_within(&dir));
        assert!(!normalize("older/x.txt").is_within(&dir));
        assert!(!dir.is_within(&dir));
    }

    #[test]
    fn case_is_preserved() {
        assert_ne!(normalize("Docs/a.txt"), normalize("docs/a.txt"));
    }

    #[test]
    fn serde_normalises_on_deserialize() {
        let key: PathKey = serde_json::from_str(r#""a\\b//c.txt""#).unwrap();
        assert_eq!(key.as_str(), "a/b/c.txt");
    }
}
