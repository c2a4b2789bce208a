//! Shallow-then-deep file comparison.
//!
//! 1. Different sizes → different.
//! 2. Same size and same mtime (whole seconds) → equal.
//! 3. Otherwise → SHA-256 of both files decides.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use kbmirror_core::types::timestamp_from_system_time;

use crate::error::{io_err, SyncError};

/// Returns `true` when the two files' contents differ.
pub fn files_differ(source: &Path, dest: &Path) -> Result<bool, SyncError> {
    let source_meta = std::fs::metadata(source).map_err(|e| io_err(source, e))?;
    let dest_meta = std::fs::metadata(dest).map_err(|e| io_err(dest, e))?;

    if source_meta.len() != dest_meta.len() {
        return Ok(true);
    }

    let source_mtime = source_meta.modified().map_err(|e| io_err(source, e))?;
    let dest_mtime = dest_meta.modified().map_err(|e| io_err(dest, e))?;
    if timestamp_from_system_time(source_mtime) == timestamp_from_system_time(dest_mtime) {
        return Ok(false);
    }

    tracing::debug!(
        "shallow signals inconclusive, hashing {} and {}",
        source.display(),
        dest.display()
    );
    Ok(hash_file(source)? != hash_file(dest)?)
}

/// Hex SHA-256 of a file's bytes, streamed.
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::{set_file_mtime, FileTime};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn size_difference_is_decisive() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "short").unwrap();
        fs::write(&b, "longer content").unwrap();
        assert!(files_differ(&a, &b).unwrap());
    }

    #[test]
    fn same_size_different_mtime_falls_back_to_hash() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "same").unwrap();
        fs::write(&b, "same").unwrap();
        set_file_mtime(&a, FileTime::from_unix_time(1_000_000, 0)).unwrap();
        set_file_mtime(&b, FileTime::from_unix_time(2_000_000, 0)).unwrap();
        assert!(!files_differ(&a, &b).unwrap());

        fs::write(&b, "diff").unwrap();
        set_file_mtime(&b, FileTime::from_unix_time(2_000_000, 0)).unwrap();
        assert!(files_differ(&a, &b).unwrap());
    }

    #[test]
    fn same_signature_is_trusted() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, "left").unwrap();
        fs::write(&b, "rght").unwrap();
        let when = FileTime::from_unix_time(1_500_000, 0);
        set_file_mtime(&a, when).unwrap();
        set_file_mtime(&b, when).unwrap();
        assert!(!files_differ(&a, &b).unwrap(), "shallow comparison trusts stat");
    }

    #[test]
    fn hash_is_stable_hex() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a");
        fs::write(&a, "").unwrap();
        assert_eq!(
            hash_file(&a).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
