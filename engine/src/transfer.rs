//! Transfer orchestration.
//!
//! `run_transfer` is the whole pipeline: validate the settings, enumerate the
//! source tree, then for each file decide skip or keep, plan its destination
//! and copy or move it, reporting every file to the progress callback. A move
//! is followed by an empty directory sweep of the source, and every real run
//! ends by saving a snapshot of the settings it used.
//!
//! A failure on any single file stops the run. Files handled before it stay
//! where they were put; nothing is rolled back. There is no way to cancel a
//! run from the outside.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cleanup::clean_empty_dirs;
use crate::config_store::save_snapshot;
use crate::enumerate::enumerate_files;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{
    OutcomeKind, RunOptions, TransferMethod, TransferOutcome, TransferSettings, TransferSummary,
};
use crate::pattern::ExcludeMatcher;
use crate::planner::{plan_destination, plan_destination_with};
use crate::progress::ProgressCallback;

/// Run a transfer described by `settings`.
///
/// With `options.dry_run` every file is planned exactly as a real run would
/// plan it (including duplicate renaming against earlier files of the same
/// run) but nothing on disk is created, copied, moved, removed or saved.
///
/// # Errors
/// Validation errors before any work starts; `DirectoryCreationFailed` or
/// `TransferFailed` for the first file that could not be handled.
/// Directories that could not be listed do not fail the run; they are
/// reported in `TransferSummary::enumeration_errors`.
pub fn run_transfer(
    settings: &TransferSettings,
    options: RunOptions,
    progress_callback: Option<&dyn ProgressCallback>,
) -> Result<TransferSummary, EngineError> {
    settings.validate()?;

    let source_root = absolute(&settings.source_root)?;
    let dest_root = absolute(&settings.dest_root)?;
    let method = settings.transfer_method;
    let dry_run = options.dry_run;

    info!(
        source = %source_root.display(),
        destination = %dest_root.display(),
        %method,
        dry_run,
        "Starting transfer"
    );

    let matcher = ExcludeMatcher::new(&settings.exclude_patterns);
    let enumeration = enumerate_files(&source_root);
    let total = enumeration.files.len();

    let mut summary = TransferSummary::new(method, dry_run, total);
    summary.enumeration_errors = enumeration.errors;

    if let Some(callback) = progress_callback {
        callback.on_run_started(settings, total);
    }

    // Destinations claimed earlier in a dry run, standing in for the files
    // a real run would have written
    let mut planned: HashSet<PathBuf> = HashSet::new();

    for (file_index, file) in enumeration.files.into_iter().enumerate() {
        let source_relative = relative_to(&file, &source_root);
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = if matcher.is_excluded(&name) {
            debug!(file = %source_relative.display(), "Skipped (excluded)");
            TransferOutcome {
                kind: OutcomeKind::SkippedExcluded,
                source_path: file,
                source_relative,
                destination: None,
                dest_relative: None,
            }
        } else {
            let destination = if dry_run {
                plan_destination_with(
                    &source_root,
                    &file,
                    &dest_root,
                    settings.preserve_structure,
                    settings.rename_duplicates,
                    |candidate| planned.contains(candidate) || candidate.exists(),
                )?
            } else {
                plan_destination(
                    &source_root,
                    &file,
                    &dest_root,
                    settings.preserve_structure,
                    settings.rename_duplicates,
                )?
            };

            if dry_run {
                planned.insert(destination.clone());
            } else {
                transfer_one(&file, &destination, method)?;
            }

            let dest_relative = relative_to(&destination, &dest_root);
            debug!(
                file = %source_relative.display(),
                destination = %dest_relative.display(),
                "{}",
                method.past_tense()
            );
            TransferOutcome {
                kind: OutcomeKind::Transferred,
                source_path: file,
                source_relative,
                destination: Some(destination),
                dest_relative: Some(dest_relative),
            }
        };

        if let Some(callback) = progress_callback {
            callback.on_file_processed(file_index + 1, total, &outcome);
        }
        summary.record(outcome);
    }

    if !dry_run {
        if method == TransferMethod::Move {
            summary.cleanup = Some(clean_empty_dirs(&source_root));
        }

        match save_snapshot(settings, &settings.source_root) {
            Ok(id) => summary.snapshot = Some(id),
            Err(err) => warn!("Transfer finished but settings were not saved: {}", err.display_chain()),
        }
    }

    info!(
        total = summary.total,
        transferred = summary.transferred,
        skipped = summary.skipped,
        "Transfer complete"
    );

    if let Some(callback) = progress_callback {
        callback.on_run_completed(&summary);
    }

    Ok(summary)
}

/// Plan the run without touching the filesystem.
pub fn preview(settings: &TransferSettings) -> Result<TransferSummary, EngineError> {
    run_transfer(settings, RunOptions::dry_run(), None)
}

/// Create the destination's parent, then copy or move one file.
fn transfer_one(src: &Path, dst: &Path, method: TransferMethod) -> Result<(), EngineError> {
    fs_ops::ensure_parent_dir_exists(dst)?;
    fs_ops::transfer_file(src, dst, method).map_err(|e| EngineError::TransferFailed {
        source_path: src.to_path_buf(),
        destination: dst.to_path_buf(),
        method,
        source: e,
    })
}

fn absolute(path: &Path) -> Result<PathBuf, EngineError> {
    std::path::absolute(path).map_err(|e| EngineError::InvalidPath {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
