//! Core data model for transfers.
//!
//! This module defines the values that flow through the engine:
//! - TransferSettings: what the user asked for (immutable for a run)
//! - TransferMethod: Copy or Move
//! - TransferOutcome / TransferSummary: what a run did, per file and in total
//! - RunOptions: per-invocation switches such as dry run

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cleanup::CleanupReport;
use crate::config_store::SnapshotId;
use crate::error::EngineError;

/// Settings for one transfer, built by the front end and handed to the engine.
///
/// The engine only ever borrows settings; a front end that keeps mutable
/// form state builds a fresh value before each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Root directory files are taken from
    pub source_root: PathBuf,

    /// Root directory files are placed under
    pub dest_root: PathBuf,

    /// Glob patterns matched against file base names; matches are skipped
    pub exclude_patterns: Vec<String>,

    /// Keep the source's relative layout (true) or flatten into dest_root (false)
    pub preserve_structure: bool,

    /// Copy or Move
    pub transfer_method: TransferMethod,

    /// Pick `name_<n>.ext` instead of overwriting an existing destination
    pub rename_duplicates: bool,
}

impl Default for TransferSettings {
    fn default() -> Self {
        TransferSettings {
            source_root: PathBuf::new(),
            dest_root: PathBuf::new(),
            exclude_patterns: Vec::new(),
            preserve_structure: true,
            transfer_method: TransferMethod::Copy,
            rename_duplicates: false,
        }
    }
}

impl TransferSettings {
    /// Settings with the given roots and default options.
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(source_root: P, dest_root: Q) -> Self {
        TransferSettings {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
            ..Default::default()
        }
    }

    pub fn with_exclude_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_method(mut self, method: TransferMethod) -> Self {
        self.transfer_method = method;
        self
    }

    pub fn with_preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    pub fn with_rename_duplicates(mut self, rename: bool) -> Self {
        self.rename_duplicates = rename;
        self
    }

    /// Check that both roots are existing, distinct directories.
    ///
    /// Called before a transfer or a snapshot save; nothing on disk is
    /// touched when this fails.
    pub fn validate(&self) -> Result<(), EngineError> {
        let source = resolve_dir(&self.source_root, Role::Source)?;
        let dest = resolve_dir(&self.dest_root, Role::Destination)?;

        if source == dest {
            return Err(EngineError::SameSourceAndDestination { path: source });
        }

        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Role {
    Source,
    Destination,
}

/// Canonicalise a root directory, mapping failures to validation errors.
fn resolve_dir(path: &Path, role: Role) -> Result<PathBuf, EngineError> {
    if path.as_os_str().is_empty() {
        return Err(EngineError::EmptyPath {
            role: match role {
                Role::Source => "Source",
                Role::Destination => "Destination",
            },
        });
    }

    match fs::metadata(path) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(EngineError::NotADirectory {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let path = path.to_path_buf();
            return Err(match role {
                Role::Source => EngineError::SourceNotFound { path },
                Role::Destination => EngineError::DestinationNotFound { path },
            });
        }
        Err(e) => {
            return Err(EngineError::InvalidPath {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }

    fs::canonicalize(path).map_err(|e| EngineError::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// The operation applied to each file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMethod {
    /// Duplicate the file; the source stays in place
    #[default]
    Copy,
    /// Duplicate the file, then remove the source
    Move,
}

impl TransferMethod {
    /// Lowercase name used in snapshot files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMethod::Copy => "copy",
            TransferMethod::Move => "move",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            TransferMethod::Copy => "Copied",
            TransferMethod::Move => "Moved",
        }
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferMethod::Copy => write!(f, "Copy"),
            TransferMethod::Move => write!(f, "Move"),
        }
    }
}

impl FromStr for TransferMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" => Ok(TransferMethod::Copy),
            "move" => Ok(TransferMethod::Move),
            other => Err(format!(
                "Invalid transfer method '{}'. Must be 'copy' or 'move'",
                other
            )),
        }
    }
}

/// Per-invocation switches for `run_transfer`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Plan every file but leave the filesystem untouched
    pub dry_run: bool,
}

impl RunOptions {
    pub fn dry_run() -> Self {
        RunOptions { dry_run: true }
    }
}

/// What happened to a single enumerated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// Copied or moved (or, in a dry run, would be)
    Transferred,
    /// Base name matched an exclude pattern
    SkippedExcluded,
}

/// Result for one file, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub kind: OutcomeKind,

    /// Absolute source path
    pub source_path: PathBuf,

    /// Source path relative to the source root
    pub source_relative: PathBuf,

    /// Absolute resolved destination; `None` when skipped
    pub destination: Option<PathBuf>,

    /// Resolved destination relative to the destination root; `None` when skipped
    pub dest_relative: Option<PathBuf>,
}

impl TransferOutcome {
    pub fn is_transferred(&self) -> bool {
        self.kind == OutcomeKind::Transferred
    }
}

/// Aggregate result of a run.
#[derive(Debug)]
pub struct TransferSummary {
    pub method: TransferMethod,
    pub dry_run: bool,

    /// Number of files enumerated (transferred + skipped)
    pub total: usize,
    pub transferred: usize,
    pub skipped: usize,

    /// One entry per enumerated file, in processing order
    pub outcomes: Vec<TransferOutcome>,

    /// Directories that could not be listed; their contents were not processed
    pub enumeration_errors: Vec<EngineError>,

    /// Post-move empty directory sweep, when one ran
    pub cleanup: Option<CleanupReport>,

    /// Snapshot written after the run, when saving succeeded
    pub snapshot: Option<SnapshotId>,
}

impl TransferSummary {
    pub(crate) fn new(method: TransferMethod, dry_run: bool, total: usize) -> Self {
        TransferSummary {
            method,
            dry_run,
            total,
            transferred: 0,
            skipped: 0,
            outcomes: Vec::with_capacity(total),
            enumeration_errors: Vec::new(),
            cleanup: None,
            snapshot: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: TransferOutcome) {
        match outcome.kind {
            OutcomeKind::Transferred => self.transferred += 1,
            OutcomeKind::SkippedExcluded => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = TransferSettings::default();
        assert!(settings.preserve_structure);
        assert!(!settings.rename_duplicates);
        assert_eq!(settings.transfer_method, TransferMethod::Copy);
        assert!(settings.exclude_patterns.is_empty());
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("copy".parse::<TransferMethod>(), Ok(TransferMethod::Copy));
        assert_eq!(" MOVE ".parse::<TransferMethod>(), Ok(TransferMethod::Move));
        assert!("rename".parse::<TransferMethod>().is_err());
    }

    #[test]
    fn test_validate_accepts_distinct_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&src).expect("Failed to create src dir");
        fs::create_dir(&dst).expect("Failed to create dst dir");

        TransferSettings::new(&src, &dst)
            .validate()
            .expect("Distinct directories should validate");
    }

    #[test]
    fn test_validate_rejects_missing_roots() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&dst).expect("Failed to create dst dir");

        let err = TransferSettings::new(&src, &dst).validate().unwrap_err();
        assert!(matches!(err, EngineError::SourceNotFound { .. }));

        let err = TransferSettings::new(&dst, &src).validate().unwrap_err();
        assert!(matches!(err, EngineError::DestinationNotFound { .. }));
    }

    #[test]
    fn test_validate_rejects_same_directory() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src");
        fs::create_dir(&src).expect("Failed to create src dir");

        // Same directory reached through a different spelling
        let alias = src.join(".");
        let err = TransferSettings::new(&src, &alias).validate().unwrap_err();
        assert!(matches!(err, EngineError::SameSourceAndDestination { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_and_file_roots() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").expect("Failed to write file");

        let err = TransferSettings::new("", temp_dir.path()).validate().unwrap_err();
        assert!(matches!(err, EngineError::EmptyPath { role: "Source" }));

        let err = TransferSettings::new(&file, temp_dir.path()).validate().unwrap_err();
        assert!(matches!(err, EngineError::NotADirectory { .. }));
    }
}
