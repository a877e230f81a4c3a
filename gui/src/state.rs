use crate::progress::{GuiProgressCallback, Notice};
use engine::{
    resolve_target_dir, AddReport, EngineConfig, RecordId, RecordStore, Rehasher, TargetChoice,
};
use std::path::PathBuf;

/// Notices kept in the message log.
const MAX_NOTICES: usize = 50;

/// Application state: the record store plus what the view needs around it.
#[derive(Debug)]
pub struct AppState {
    pub store: RecordStore,
    pub config: EngineConfig,

    // Input fields
    pub use_default_target: bool,

    // UI state
    pub preview: Option<RecordId>,
    pub last_target: Option<PathBuf>,
    pub notices: Vec<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        AppState {
            store: RecordStore::with_config(&config),
            config,
            use_default_target: true,
            preview: None,
            last_target: None,
            notices: Vec::new(),
        }
    }

    pub fn notify(&mut self, notice: Notice) {
        log::info!("{}", notice.text);
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            let excess = self.notices.len() - MAX_NOTICES;
            self.notices.drain(..excess);
        }
    }

    pub fn add_files(&mut self, paths: Vec<PathBuf>) {
        let report = self.store.add_many(paths);
        self.report_added(report);
    }

    pub fn add_folder(&mut self, dir: PathBuf) {
        match self.store.add_folder(&dir) {
            Ok(report) => self.report_added(report),
            Err(e) => self.notify(Notice::error(format!("Folder selection failed: {}", e))),
        }
    }

    fn report_added(&mut self, report: AddReport) {
        for (path, reason) in report.failed {
            self.notify(Notice::error(format!("Cannot add {}: {}", path.display(), reason)));
        }
        if report.added.is_empty() {
            self.notify(Notice::info("No new files"));
        } else {
            self.notify(Notice::info(format!("Added {} file(s)", report.added.len())));
        }
    }

    pub fn replace_selected(&mut self, paths: Vec<PathBuf>) {
        match self.store.replace_selected(paths) {
            Ok(report) => {
                for (path, reason) in report.failed {
                    self.notify(Notice::error(format!(
                        "Cannot replace with {}: {}",
                        path.display(),
                        reason
                    )));
                }
                if self.preview.map_or(false, |id| self.store.get(id).is_none()) {
                    self.preview = None;
                }
                self.notify(Notice::info(format!(
                    "Replaced {}, removed {}, added {}",
                    report.replaced,
                    report.removed,
                    report.added.added_count()
                )));
            }
            Err(e) => self.notify(Notice::error(e.to_string())),
        }
    }

    pub fn remove_selected(&mut self) {
        self.store.remove_selected();
        if self.preview.map_or(false, |id| self.store.get(id).is_none()) {
            self.preview = None;
        }
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.preview = None;
    }

    pub fn toggle_status(&mut self, id: RecordId) {
        if let Err(e) = self.store.toggle_status(id) {
            self.notify(Notice::error(e.to_string()));
        }
    }

    pub fn set_selected(&mut self, id: RecordId, selected: bool) {
        if let Err(e) = self.store.set_selected(id, selected) {
            self.notify(Notice::error(e.to_string()));
        }
    }

    /// Directory a custom-target picker should open in.
    pub fn source_directory(&self) -> Option<PathBuf> {
        self.store.source_directory().ok()
    }

    /// Process every pending record into the chosen target directory.
    pub fn process(&mut self, choice: TargetChoice) {
        let source_dir = match self.store.source_directory() {
            Ok(dir) => dir,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                return;
            }
        };

        let target = match resolve_target_dir(&source_dir, &choice, &self.config.target_suffix) {
            Ok(dir) => dir,
            Err(e) => {
                self.notify(Notice::error(format!(
                    "Cannot use target directory: {}",
                    e.detailed()
                )));
                return;
            }
        };

        let processor = Rehasher::from_config(&self.config);
        let callback = GuiProgressCallback::new();
        let result = self.store.process_pending(&processor, &target, Some(&callback));

        for notice in callback.into_notices() {
            self.notify(notice);
        }
        match result {
            Ok(summary) => self.last_target = Some(summary.target_dir),
            Err(e) => self.notify(Notice::error(e.to_string())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
