//! Source tree enumeration.
//!
//! Walks a directory tree top-down and yields every file below it, never
//! descending into a directory named `RESERVED_DIR_NAME` (where settings
//! snapshots live). Within each directory, files come first in name order,
//! followed by each subdirectory (also in name order) fully expanded, so two
//! walks over an unchanged tree produce the same sequence.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::EngineError;

/// Name of the per-source directory that holds settings snapshots.
pub const RESERVED_DIR_NAME: &str = "config_file_mover";

type EntryFilter = fn(&DirEntry) -> bool;

/// Lazy walk over the files under a root.
///
/// Yields absolute paths. Directories that cannot be read show up as
/// `EnumerationFailed` items and the walk carries on past them.
pub struct FileWalk {
    root: PathBuf,
    root_error: Option<EngineError>,
    inner: Option<FilterEntry<walkdir::IntoIter, EntryFilter>>,
}

/// Start a fresh walk over `root`.
pub fn walk_files<P: AsRef<Path>>(root: P) -> FileWalk {
    let root = root.as_ref();

    let root = match std::path::absolute(root) {
        Ok(absolute) => absolute,
        Err(e) => {
            return FileWalk {
                root: root.to_path_buf(),
                root_error: Some(EngineError::EnumerationFailed {
                    path: root.to_path_buf(),
                    source: e,
                }),
                inner: None,
            }
        }
    };

    let inner = WalkDir::new(&root)
        .sort_by(files_then_dirs)
        .into_iter()
        .filter_entry(is_walkable as EntryFilter);

    FileWalk {
        root,
        root_error: None,
        inner: Some(inner),
    }
}

impl FileWalk {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for FileWalk {
    type Item = Result<PathBuf, EngineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.root_error.take() {
            return Some(Err(err));
        }

        let inner = self.inner.as_mut()?;
        loop {
            match inner.next()? {
                Ok(entry) => {
                    if is_file_like(&entry) {
                        return Some(Ok(entry.into_path()));
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(EngineError::EnumerationFailed {
                        path,
                        source: io::Error::from(e),
                    }));
                }
            }
        }
    }
}

/// Files sort before directories, then by name.
fn files_then_dirs(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// The root is always walked; the snapshot directory never is.
fn is_walkable(entry: &DirEntry) -> bool {
    entry.depth() == 0 || !(entry.file_type().is_dir() && entry.file_name() == RESERVED_DIR_NAME)
}

/// Regular files and symlinks, except symlinks that point at directories.
fn is_file_like(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return false;
    }
    !(file_type.is_symlink() && entry.path().is_dir())
}

/// Files gathered by a complete walk, with any errors met on the way.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub files: Vec<PathBuf>,
    pub errors: Vec<EngineError>,
}

impl Enumeration {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Walk `root` to completion.
///
/// Never fails outright: unreadable directories are logged, recorded in
/// `errors`, and whatever was found elsewhere is still returned.
pub fn enumerate_files<P: AsRef<Path>>(root: P) -> Enumeration {
    let mut enumeration = Enumeration::default();

    for item in walk_files(root.as_ref()) {
        match item {
            Ok(path) => enumeration.files.push(path),
            Err(err) => {
                warn!("{}", err.display_chain());
                enumeration.errors.push(err);
            }
        }
    }

    debug!(
        root = %root.as_ref().display(),
        files = enumeration.files.len(),
        errors = enumeration.errors.len(),
        "Enumerated source tree"
    );
    enumeration
}
