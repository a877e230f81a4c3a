use engine::{BatchSummary, EngineError, FileRecord, ProgressCallback};
use std::cell::RefCell;

/// Severity of a message shown in the GUI log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// A ProgressCallback that collects batch outcomes as notices for the message log.
#[derive(Default)]
pub struct GuiProgressCallback {
    notices: RefCell<Vec<Notice>>,
}

impl GuiProgressCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_notices(self) -> Vec<Notice> {
        self.notices.into_inner()
    }
}

impl ProgressCallback for GuiProgressCallback {
    fn on_batch_started(&self, _total_pending: usize) {}

    fn on_record_started(&self, _index: usize, _record: &FileRecord) {}

    fn on_record_completed(&self, _index: usize, _record: &FileRecord) {}

    fn on_record_failed(&self, _index: usize, record: &FileRecord, error: &EngineError) {
        self.notices.borrow_mut().push(Notice::error(format!(
            "Failed to process {}: {}",
            record.source_path.display(),
            error.detailed()
        )));
    }

    fn on_batch_completed(&self, summary: &BatchSummary) {
        self.notices.borrow_mut().push(Notice::info(format!(
            "Processed {} of {} file(s) into {}",
            summary.succeeded,
            summary.attempted,
            summary.target_dir.display()
        )));
    }
}
