//! Progress reporting trait.
//!
//! This module defines the ProgressCallback trait, which decouples the
//! transfer loop from whatever renders it (a terminal progress bar, a GUI
//! widget, a log).

use crate::model::{TransferOutcome, TransferSettings, TransferSummary};

/// Receives progress updates from `run_transfer`.
///
/// All methods are called synchronously on the thread running the transfer.
pub trait ProgressCallback: Send {
    /// Called once enumeration is done, before the first file is processed.
    fn on_run_started(&self, settings: &TransferSettings, total: usize);

    /// Called after every file, transferred or skipped.
    ///
    /// `index` is 1-based and increases by one per call up to `total`.
    fn on_file_processed(&self, index: usize, total: usize, outcome: &TransferOutcome);

    /// Called when the run finished without error, after cleanup and auto-save.
    fn on_run_completed(&self, summary: &TransferSummary);
}
