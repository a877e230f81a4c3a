//! Notification sink for batch processing.
//!
//! This module defines the ProgressCallback trait, which keeps the engine
//! independent of how outcomes are shown (stderr lines, a GUI message log).

use crate::error::EngineError;
use crate::model::{BatchSummary, FileRecord};

/// Receives outcomes from `RecordStore::process_pending`.
///
/// All methods are called synchronously on the thread running the batch.
/// A failing record is reported through `on_record_failed` exactly once.
pub trait ProgressCallback {
    /// Called before the first record, with the number of pending records.
    fn on_batch_started(&self, total_pending: usize);

    /// Called when a record is about to be processed.
    fn on_record_started(&self, index: usize, record: &FileRecord);

    /// Called after a record was processed and updated in the store.
    fn on_record_completed(&self, index: usize, record: &FileRecord);

    /// Called when processing a record failed; the record is left unchanged.
    fn on_record_failed(&self, index: usize, record: &FileRecord, error: &EngineError);

    /// Called once every pending record has been attempted (or the batch was cancelled).
    fn on_batch_completed(&self, summary: &BatchSummary);

    /// Checked between records; returning true leaves the rest Pending.
    fn should_cancel(&self) -> bool {
        false
    }
}
