//! Error types for the file mover engine.
//!
//! Everything the engine reports goes through `EngineError`. Each variant
//! carries the path involved and, where there is one, the underlying cause,
//! so a front end can render a meaningful message without extra context.
//! `EngineError::category` groups the variants the way callers react to them:
//! validation errors stop work before anything is touched, enumeration and
//! cleanup errors are collected while the operation carries on, transfer
//! errors abort the run, and config errors only affect the snapshot involved.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::TransferMethod;

/// Broad grouping of `EngineError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Settings rejected before any filesystem mutation
    Validation,
    /// A directory could not be listed; partial results are still returned
    Enumeration,
    /// A single file's copy/move failed; the run stops
    Transfer,
    /// A directory could not be removed; the sweep continues
    Cleanup,
    /// Snapshot read/write/parse failure
    Config,
}

/// Errors reported by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source directory does not exist
    #[error("Source directory does not exist: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// Destination directory does not exist
    #[error("Destination directory does not exist: {}", .path.display())]
    DestinationNotFound { path: PathBuf },

    /// A root path exists but is not a directory
    #[error("Not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    /// Source and destination resolve to the same directory
    #[error("Source and destination directories are the same: {}", .path.display())]
    SameSourceAndDestination { path: PathBuf },

    /// A required path was left empty
    #[error("{role} directory is not set")]
    EmptyPath { role: &'static str },

    /// Path is unusable for the requested operation
    #[error("Invalid path: {} ({reason})", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// Failed to list a directory while walking a tree
    #[error("Failed to enumerate directory: {}", .path.display())]
    EnumerationFailed { path: PathBuf, source: io::Error },

    /// Failed to create a destination directory
    #[error("Failed to create directory: {}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// The copy or move primitive failed for one file
    #[error("{method} failed: {} -> {}", .source_path.display(), .destination.display())]
    TransferFailed {
        source_path: PathBuf,
        destination: PathBuf,
        method: TransferMethod,
        source: io::Error,
    },

    /// An empty directory could not be removed or inspected
    #[error("Failed to remove directory: {}", .path.display())]
    CleanupFailed { path: PathBuf, source: io::Error },

    /// Failed to write a settings snapshot
    #[error("Failed to save config: {}", .path.display())]
    SnapshotWrite { path: PathBuf, source: io::Error },

    /// Failed to read a settings snapshot
    #[error("Failed to load config: {}", .path.display())]
    SnapshotRead { path: PathBuf, source: io::Error },

    /// Snapshot file is not valid JSON or has fields of the wrong type
    #[error("Corrupt config file: {}", .path.display())]
    SnapshotParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl EngineError {
    /// Which group of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SourceNotFound { .. }
            | Self::DestinationNotFound { .. }
            | Self::NotADirectory { .. }
            | Self::SameSourceAndDestination { .. }
            | Self::EmptyPath { .. }
            | Self::InvalidPath { .. } => ErrorCategory::Validation,
            Self::EnumerationFailed { .. } => ErrorCategory::Enumeration,
            Self::DirectoryCreationFailed { .. } | Self::TransferFailed { .. } => {
                ErrorCategory::Transfer
            }
            Self::CleanupFailed { .. } => ErrorCategory::Cleanup,
            Self::SnapshotWrite { .. } | Self::SnapshotRead { .. } | Self::SnapshotParse { .. } => {
                ErrorCategory::Config
            }
        }
    }

    /// This error followed by its underlying causes, `": "`-separated.
    pub fn display_chain(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }

    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::TransferFailed { source, .. }
            | Self::CleanupFailed { source, .. }
            | Self::SnapshotWrite { source, .. }
            | Self::SnapshotRead { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}
