//! Core data model for tracked files.
//!
//! - FileRecord: one selected file and its processing state
//! - RecordStatus: the two-valued Pending/Done flag
//! - RecordView: a serialisable snapshot for renderers and reports
//! - BatchSummary / AddReport: outcomes of the batch operations

use crate::checksums::ChecksumValue;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Identifier of a record within a store.
pub type RecordId = Uuid;

/// Processing status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Not yet confirmed processed
    Pending,
    /// Processed successfully, or marked done by hand
    Done,
}

impl RecordStatus {
    pub fn toggled(self) -> Self {
        match self {
            RecordStatus::Pending => RecordStatus::Done,
            RecordStatus::Done => RecordStatus::Pending,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStatus::Pending => write!(f, "Pending"),
            RecordStatus::Done => write!(f, "Done"),
        }
    }
}

/// One tracked file.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Unique identifier for this record within the store
    pub id: RecordId,

    /// The originally selected file
    pub source_path: PathBuf,

    /// Fingerprint of `source_path` when the record was created or replaced
    pub original_fingerprint: ChecksumValue,

    /// Mutated copy; set only after processing succeeds
    pub output_path: Option<PathBuf>,

    /// Fingerprint of the mutated copy
    pub output_fingerprint: Option<ChecksumValue>,

    pub status: RecordStatus,

    /// Size of the file the record currently points to (source, then output)
    pub size_bytes: u64,

    /// Selection state for presentation layers
    pub selected: bool,
}

impl FileRecord {
    /// The file this record currently points to.
    pub fn current_path(&self) -> &PathBuf {
        self.output_path.as_ref().unwrap_or(&self.source_path)
    }

    pub fn size_display(&self) -> String {
        format_size(self.size_bytes)
    }

    pub fn view(&self) -> RecordView {
        RecordView {
            id: self.id,
            source_path: self.source_path.clone(),
            original_fingerprint: self.original_fingerprint.hex().to_string(),
            output_path: self.output_path.clone(),
            output_fingerprint: self
                .output_fingerprint
                .as_ref()
                .map(|c| c.hex().to_string()),
            status: self.status,
            size_bytes: self.size_bytes,
            size: self.size_display(),
            selected: self.selected,
        }
    }
}

/// Render-ready snapshot of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordView {
    pub id: RecordId,
    pub source_path: PathBuf,
    pub original_fingerprint: String,
    pub output_path: Option<PathBuf>,
    pub output_fingerprint: Option<String>,
    pub status: RecordStatus,
    pub size_bytes: u64,
    pub size: String,
    pub selected: bool,
}

/// Result of adding one or more paths to a store.
#[derive(Debug, Default)]
pub struct AddReport {
    /// Ids of records created, in insertion order
    pub added: Vec<RecordId>,

    /// Paths skipped because a record already tracks them
    pub duplicates: Vec<PathBuf>,

    /// Paths that could not be added, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

impl AddReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    /// True when nothing new entered the store ("no new files").
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// Result of replacing the sources of the selected records.
#[derive(Debug, Default)]
pub struct ReplaceReport {
    /// Records whose source was swapped for a new path
    pub replaced: usize,

    /// Selected records dropped because fewer new paths than selected records were given
    pub removed: usize,

    /// New paths beyond the selection, added as new records
    pub added: AddReport,

    /// Replacements that failed; the record was left untouched
    pub failed: Vec<(PathBuf, String)>,
}

/// Outcome of one `process_pending` run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Directory the copies were written to
    pub target_dir: PathBuf,

    /// Records the batch started on; fewer than were pending if cancelled
    pub attempted: usize,

    pub succeeded: usize,

    /// Records that failed, with their source path and reason
    pub failed: Vec<(RecordId, PathBuf, String)>,

    /// True if the progress callback asked to stop before every record ran
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Human-readable byte count ("14 B", "1.5 KB", "2.0 MB").
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.1} {}", size, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksums::ChecksumAlgorithm;

    fn record() -> FileRecord {
        FileRecord {
            id: Uuid::new_v4(),
            source_path: PathBuf::from("/data/a.bin"),
            original_fingerprint: ChecksumValue::new(ChecksumAlgorithm::Md5, "00ff".to_string()),
            output_path: None,
            output_fingerprint: None,
            status: RecordStatus::Pending,
            size_bytes: 10,
            selected: false,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(14), "14 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_status_toggle() {
        assert_eq!(RecordStatus::Pending.toggled(), RecordStatus::Done);
        assert_eq!(RecordStatus::Done.toggled(), RecordStatus::Pending);
    }

    #[test]
    fn test_current_path_follows_output() {
        let mut rec = record();
        assert_eq!(rec.current_path(), &PathBuf::from("/data/a.bin"));
        rec.output_path = Some(PathBuf::from("/out/a.bin"));
        assert_eq!(rec.current_path(), &PathBuf::from("/out/a.bin"));
    }

    #[test]
    fn test_view_serializes() {
        let view = record().view();
        let json = serde_json::to_value(&view).expect("Failed to serialize");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["original_fingerprint"], "00ff");
        assert_eq!(json["size"], "10 B");
        assert!(json["output_fingerprint"].is_null());
    }
}
