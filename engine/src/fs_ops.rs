//! Filesystem operations module.
//!
//! This module provides the low-level primitives the transfer loop is built on:
//! - Copying files with timestamp and permission preservation
//! - Moving files (rename, or copy-then-delete across devices)
//! - Creating destination directories recursively
//! - Checking whether a directory is empty

use std::fs;
use std::io;
use std::path::Path;

use filetime::FileTime;
use tracing::warn;

use crate::error::EngineError;
use crate::model::TransferMethod;

/// Copy a file from source to destination with metadata preservation.
///
/// Contents and permission bits are copied, then the source's access and
/// modification times are applied to the copy. An existing destination file
/// is overwritten.
///
/// # Returns
/// Number of bytes copied
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> io::Result<u64> {
    let src_metadata = fs::metadata(src)?;
    let bytes_copied = fs::copy(src, dst)?;

    let atime = FileTime::from_last_access_time(&src_metadata);
    let mtime = FileTime::from_last_modification_time(&src_metadata);
    filetime::set_file_times(dst, atime, mtime)?;

    Ok(bytes_copied)
}

/// Move a file, keeping its metadata.
///
/// Tries a rename first. If that fails (typically because source and
/// destination are on different devices) the file is copied with metadata
/// and the source removed afterwards.
pub fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(
                src = %src.display(),
                dst = %dst.display(),
                error = %e,
                "Rename failed, falling back to copy and delete"
            );
            copy_file_with_metadata(src, dst)?;
            fs::remove_file(src)
        }
    }
}

/// Apply the configured transfer primitive to one file.
pub fn transfer_file(src: &Path, dst: &Path, method: TransferMethod) -> io::Result<()> {
    match method {
        TransferMethod::Copy => copy_file_with_metadata(src, dst).map(|_| ()),
        TransferMethod::Move => move_file(src, dst),
    }
}

/// Ensure the parent directory of a path exists, creating it if necessary.
///
/// # Errors
/// Returns `DirectoryCreationFailed` if the parent is a file or cannot be created
pub fn ensure_parent_dir_exists(path: &Path) -> Result<(), EngineError> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };

    // Relative paths with a single component have an empty parent
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    match fs::metadata(parent) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "Parent path exists but is not a directory",
            ),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(parent).map_err(|e| EngineError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        }),
    }
}

/// True if the directory has no entries at all.
pub fn is_dir_empty(path: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_copy_file_with_metadata() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");
        fs::write(&src_file, b"test content").expect("Failed to write source");

        let an_hour_ago = SystemTime::now() - Duration::from_secs(3600);
        filetime::set_file_mtime(&src_file, FileTime::from_system_time(an_hour_ago))
            .expect("Failed to set mtime");

        let bytes = copy_file_with_metadata(&src_file, &dst_file).expect("Failed to copy");
        assert_eq!(bytes, 12);

        let content = fs::read_to_string(&dst_file).expect("Failed to read dest");
        assert_eq!(content, "test content");

        let src_mtime = FileTime::from_last_modification_time(
            &fs::metadata(&src_file).expect("Failed to stat source"),
        );
        let dst_mtime = FileTime::from_last_modification_time(
            &fs::metadata(&dst_file).expect("Failed to stat dest"),
        );
        assert_eq!(src_mtime, dst_mtime);
        assert!(src_file.exists(), "Copy must keep the source");
    }

    #[test]
    fn test_copy_overwrites_existing_destination() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");
        fs::write(&src_file, "new").expect("Failed to write source");
        fs::write(&dst_file, "old contents").expect("Failed to write dest");

        copy_file_with_metadata(&src_file, &dst_file).expect("Failed to copy");
        assert_eq!(fs::read_to_string(&dst_file).expect("Failed to read"), "new");
    }

    #[test]
    fn test_move_file_removes_source() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("moved.txt");
        fs::write(&src_file, "payload").expect("Failed to write source");

        move_file(&src_file, &dst_file).expect("Failed to move");

        assert!(!src_file.exists());
        assert_eq!(fs::read_to_string(&dst_file).expect("Failed to read"), "payload");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = move_file(
            &temp_dir.path().join("missing.txt"),
            &temp_dir.path().join("dest.txt"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ensure_parent_dir_exists() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("subdir").join("nested").join("file.txt");

        ensure_parent_dir_exists(&path).expect("Failed to create parent");
        assert!(temp_dir.path().join("subdir").join("nested").is_dir());

        // Already present is fine
        ensure_parent_dir_exists(&path).expect("Existing parent should be accepted");
    }

    #[test]
    fn test_ensure_parent_dir_rejects_file_parent() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").expect("Failed to write file");

        let result = ensure_parent_dir_exists(&blocker.join("file.txt"));
        assert!(matches!(
            result,
            Err(EngineError::DirectoryCreationFailed { .. })
        ));
    }

    #[test]
    fn test_is_dir_empty() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        assert!(is_dir_empty(temp_dir.path()).expect("Failed to list"));

        fs::write(temp_dir.path().join("f"), "x").expect("Failed to write file");
        assert!(!is_dir_empty(temp_dir.path()).expect("Failed to list"));
    }
}
