//! Empty directory sweep.
//!
//! Used after a Move to remove the directories it leaves behind, and on its
//! own from the front end. The walk is bottom-up, so a directory whose only
//! contents were empty directories is removed in the same pass.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::EngineError;
use crate::fs_ops;

/// Result of a sweep.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Number of directories actually removed
    pub removed: usize,

    /// The removed directories, deepest first
    pub removed_dirs: Vec<PathBuf>,

    /// Directories that could not be inspected or removed
    pub failures: Vec<EngineError>,
}

/// Remove every empty directory strictly below `root`.
///
/// Errors on individual directories are logged and collected; they never
/// stop the sweep. The root itself is kept even if it ends up empty.
pub fn clean_empty_dirs<P: AsRef<Path>>(root: P) -> CleanupReport {
    let root = root.as_ref();
    let mut report = CleanupReport::default();

    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                record_failure(&mut report, path, io::Error::from(e));
                continue;
            }
        };

        if !entry.file_type().is_dir() {
            continue;
        }

        let dir = entry.path();
        match fs_ops::is_dir_empty(dir) {
            Ok(true) => match fs::remove_dir(dir) {
                Ok(()) => {
                    debug!(dir = %dir.display(), "Removed empty directory");
                    report.removed += 1;
                    report.removed_dirs.push(dir.to_path_buf());
                }
                Err(e) => record_failure(&mut report, dir.to_path_buf(), e),
            },
            Ok(false) => {}
            Err(e) => record_failure(&mut report, dir.to_path_buf(), e),
        }
    }

    info!(
        root = %root.display(),
        removed = report.removed,
        failures = report.failures.len(),
        "Empty directory sweep finished"
    );
    report
}

fn record_failure(report: &mut CleanupReport, path: PathBuf, source: io::Error) {
    let err = EngineError::CleanupFailed { path, source };
    warn!("{}", err.display_chain());
    report.failures.push(err);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_empty_directories_are_removed() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("x").join("y")).expect("Failed to create dirs");

        let report = clean_empty_dirs(root);

        assert_eq!(report.removed, 2);
        assert!(report.failures.is_empty());
        assert!(!root.join("x").exists());
        assert!(root.exists(), "Root must be kept");
        assert_eq!(report.removed_dirs[0], root.join("x").join("y"));
    }

    #[test]
    fn test_non_empty_directories_are_kept() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep").join("empty")).expect("Failed to create dirs");
        fs::write(root.join("keep").join("file.txt"), "x").expect("Failed to write file");
        fs::create_dir(root.join("gone")).expect("Failed to create dir");

        let report = clean_empty_dirs(root);

        assert_eq!(report.removed, 2);
        assert!(root.join("keep").join("file.txt").exists());
        assert!(!root.join("keep").join("empty").exists());
        assert!(!root.join("gone").exists());
    }

    #[test]
    fn test_nothing_to_remove() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(temp_dir.path().join("file.txt"), "x").expect("Failed to write file");

        let report = clean_empty_dirs(temp_dir.path());
        assert_eq!(report.removed, 0);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_missing_root_is_reported_not_fatal() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let report = clean_empty_dirs(temp_dir.path().join("nonexistent"));

        assert_eq!(report.removed, 0);
        assert_eq!(report.failures.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_sweep_continues_past_undeletable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp_dir.path();
        let locked = root.join("locked");
        fs::create_dir_all(locked.join("stuck")).expect("Failed to create dirs");
        fs::create_dir(root.join("free")).expect("Failed to create dir");

        // Removing `stuck` needs write permission on `locked`
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555))
            .expect("Failed to set permissions");
        let report = clean_empty_dirs(root);

        assert!(!root.join("free").exists());
        if locked.join("stuck").exists() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))
                .expect("Failed to restore permissions");
            // stuck survives, so does its parent
            assert_eq!(report.removed, 1);
            assert_eq!(report.failures.len(), 1);
            assert!(matches!(
                &report.failures[0],
                EngineError::CleanupFailed { path, .. } if path.ends_with("stuck")
            ));
            assert!(locked.exists());
        } else {
            // Privileged users can remove it anyway
            assert_eq!(report.removed, 3);
            assert!(report.failures.is_empty());
            assert!(!locked.exists());
        }
    }

    #[test]
    fn test_failures_are_recorded_as_cleanup_errors() {
        let mut report = CleanupReport::default();
        let path = PathBuf::from("/data/inbox/sub");
        record_failure(
            &mut report,
            path.clone(),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(report.removed, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].category(), crate::error::ErrorCategory::Cleanup);
        assert!(report.failures[0].display_chain().ends_with(": denied"));
        assert!(matches!(
            &report.failures[0],
            EngineError::CleanupFailed { path: p, .. } if *p == path
        ));
    }

    #[test]
    fn test_file_root_is_reported_not_fatal() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").expect("Failed to write file");

        let report = clean_empty_dirs(&file);
        assert_eq!(report.removed, 0);
        assert!(file.exists());
    }
}
