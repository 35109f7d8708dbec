//! # File Mover Engine - Bulk Copy/Move Library
//!
//! A headless engine for copying or moving every file of a directory tree
//! into another directory. Designed as the foundation for multiple front
//! ends (CLI, GUI, automation).
//!
//! ## Overview
//!
//! The engine features:
//! - Recursive enumeration with a reserved snapshot directory that is never transferred
//! - Glob exclusion patterns matched against file base names
//! - Structure preserving or flattened destinations
//! - Optional `name_<n>.ext` renaming instead of overwriting
//! - Empty directory cleanup after a move
//! - Timestamped JSON snapshots of the settings used for each run
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{run_transfer, RunOptions, TransferMethod, TransferSettings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = TransferSettings::new("/data/inbox", "/data/archive")
//!     .with_exclude_patterns(["*.tmp", "Thumbs.db"])
//!     .with_method(TransferMethod::Move)
//!     .with_rename_duplicates(true);
//!
//! // See what would happen first
//! let plan = run_transfer(&settings, RunOptions::dry_run(), None)?;
//! println!("Would move {} of {} files", plan.transferred, plan.total);
//!
//! // Then do it
//! let summary = run_transfer(&settings, RunOptions::default(), None)?;
//! for outcome in &summary.outcomes {
//!     println!("{:?}: {}", outcome.kind, outcome.source_relative.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Settings, per-file outcomes and run summaries
//! - **error**: Error types and handling
//! - **pattern**: Exclusion pattern parsing and matching
//! - **planner**: Destination path resolution
//! - **enumerate**: Source tree walking
//! - **fs_ops**: Low-level filesystem operations
//! - **cleanup**: Empty directory removal
//! - **config_store**: Settings snapshots
//! - **transfer**: Run orchestration
//! - **progress**: Progress callback trait

pub mod cleanup;
pub mod config_store;
pub mod enumerate;
pub mod error;
pub mod fs_ops;
pub mod model;
pub mod pattern;
pub mod planner;
pub mod progress;
pub mod transfer;

// Re-export main types and functions
pub use cleanup::{clean_empty_dirs, CleanupReport};
pub use config_store::{
    list_snapshots, load_snapshot, save_snapshot, storage_dir, SnapshotId, SnapshotInfo,
};
pub use enumerate::{enumerate_files, walk_files, Enumeration, RESERVED_DIR_NAME};
pub use error::{EngineError, ErrorCategory};
pub use model::{
    OutcomeKind, RunOptions, TransferMethod, TransferOutcome, TransferSettings, TransferSummary,
};
pub use pattern::{is_excluded, join_patterns, parse_patterns, ExcludeMatcher};
pub use planner::plan_destination;
pub use progress::ProgressCallback;
pub use transfer::{preview, run_transfer};
