//! Destination path planning.
//!
//! Maps a source file to its destination under the configured layout, then
//! (optionally) steps around files that are already there by appending
//! `_1`, `_2`, ... to the file stem.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::EngineError;

/// Compute where `file_path` should land under `dest_root`.
///
/// With `preserve_structure` the path relative to `source_root` is kept;
/// otherwise the file goes straight into `dest_root`. With
/// `rename_duplicates` an existing destination is avoided by renaming; without
/// it the caller will overwrite whatever is there.
///
/// The existence check runs now, so planning the same file twice against a
/// changing destination can give different answers.
///
/// # Errors
/// Returns `InvalidPath` if the file is not under `source_root` (structure
/// mode) or has no file name (flatten mode).
pub fn plan_destination(
    source_root: &Path,
    file_path: &Path,
    dest_root: &Path,
    preserve_structure: bool,
    rename_duplicates: bool,
) -> Result<PathBuf, EngineError> {
    plan_destination_with(
        source_root,
        file_path,
        dest_root,
        preserve_structure,
        rename_duplicates,
        |candidate| candidate.exists(),
    )
}

/// `plan_destination` with a caller-supplied occupancy test.
///
/// Dry runs use this to count destinations planned earlier in the same run
/// as taken, even though nothing was written.
pub fn plan_destination_with<F>(
    source_root: &Path,
    file_path: &Path,
    dest_root: &Path,
    preserve_structure: bool,
    rename_duplicates: bool,
    occupied: F,
) -> Result<PathBuf, EngineError>
where
    F: Fn(&Path) -> bool,
{
    let dest_path = if preserve_structure {
        let relative = file_path
            .strip_prefix(source_root)
            .map_err(|_| EngineError::InvalidPath {
                path: file_path.to_path_buf(),
                reason: format!("not under source root {}", source_root.display()),
            })?;
        dest_root.join(relative)
    } else {
        let name = file_path
            .file_name()
            .ok_or_else(|| EngineError::InvalidPath {
                path: file_path.to_path_buf(),
                reason: "path has no file name".to_string(),
            })?;
        dest_root.join(name)
    };

    if rename_duplicates {
        Ok(first_free(dest_path, occupied))
    } else {
        Ok(dest_path)
    }
}

/// Return `path` if it is free, otherwise the first free `stem_<n>.ext`.
pub(crate) fn first_free<F>(path: PathBuf, occupied: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    if !occupied(&path) {
        return path;
    }

    let mut counter: u64 = 1;
    loop {
        let candidate = path.with_file_name(numbered_name(&path, counter));
        if !occupied(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// `report.tar.gz` + 2 -> `report.tar_2.gz`; `.bashrc` + 1 -> `.bashrc_1`.
fn numbered_name(path: &Path, counter: u64) -> OsString {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("_{}", counter));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    name
}
