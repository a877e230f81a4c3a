//! In-memory record store.
//!
//! The store is the single source of truth for tracked files. Presentation
//! layers read it through `records()`/`views()` and relay user actions into
//! the mutating operations below; nothing here knows how records are shown.
//!
//! Records keep insertion order, which is also the order `process_pending`
//! walks them in. Every mutation either completes or leaves the record as it
//! was.

use crate::checksums::{
    compute_file_checksum, ChecksumAlgorithm, ChecksumValue, DEFAULT_CHUNK_SIZE,
};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::fs_ops;
use crate::model::{
    AddReport, BatchSummary, FileRecord, RecordId, RecordStatus, RecordView, ReplaceReport,
};
use crate::processor::FileProcessor;
use crate::progress::ProgressCallback;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Ordered collection of file records.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<FileRecord>,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore {
            records: Vec::new(),
            algorithm: ChecksumAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        RecordStore {
            records: Vec::new(),
            algorithm: config.algorithm,
            chunk_size: config.chunk_size.max(1),
        }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Fingerprint a path with the store's algorithm.
    pub fn fingerprint(&self, path: &Path) -> Result<ChecksumValue, EngineError> {
        compute_file_checksum(path, self.algorithm, self.chunk_size)
    }

    // ---- queries ----

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn views(&self) -> Vec<RecordView> {
        self.records.iter().map(FileRecord::view).collect()
    }

    pub fn get(&self, id: RecordId) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.records.iter().any(|r| r.source_path == path)
    }

    pub fn pending_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.status == RecordStatus::Pending)
            .count()
    }

    /// Directory of the first record's source file.
    ///
    /// Used as the base for the default target directory and as the starting
    /// point of folder pickers.
    pub fn source_directory(&self) -> Result<PathBuf, EngineError> {
        let first = self
            .records
            .first()
            .ok_or_else(|| {
                EngineError::invalid_state("no records to derive a source directory from")
            })?;

        first
            .source_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                EngineError::invalid_state(format!(
                    "source has no parent directory: {}",
                    first.source_path.display()
                ))
            })
    }

    // ---- adding ----

    /// Add a record for `path`.
    ///
    /// Returns `Ok(None)` without touching the store when the path is already
    /// tracked.
    ///
    /// # Errors
    /// - `NotFound` if `path` is not an existing regular file
    /// - `ReadError` if it cannot be hashed
    pub fn add<P: AsRef<Path>>(&mut self, path: P) -> Result<Option<RecordId>, EngineError> {
        let path = absolute(path.as_ref());
        if self.contains_path(&path) {
            log::debug!("already tracked: {}", path.display());
            return Ok(None);
        }

        let record = self.build_record(&path)?;
        let id = record.id;
        log::info!("added {} ({})", path.display(), record.original_fingerprint);
        self.records.push(record);
        Ok(Some(id))
    }

    /// Add each path in order. Duplicates and failures are reported, not counted.
    pub fn add_many<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();
        for path in paths {
            let path = path.as_ref();
            match self.add(path) {
                Ok(Some(id)) => report.added.push(id),
                Ok(None) => report.duplicates.push(path.to_path_buf()),
                Err(e) => {
                    log::warn!("could not add {}: {}", path.display(), e);
                    report.failed.push((path.to_path_buf(), e.detailed()));
                }
            }
        }
        report
    }

    /// Add the regular files directly inside `dir`; subdirectories are ignored.
    pub fn add_folder<P: AsRef<Path>>(&mut self, dir: P) -> Result<AddReport, EngineError> {
        let files = fs_ops::list_files(dir.as_ref())?;
        Ok(self.add_many(files))
    }

    fn build_record(&self, path: &Path) -> Result<FileRecord, EngineError> {
        if !path.is_file() {
            return Err(EngineError::NotFound {
                path: path.to_path_buf(),
            });
        }

        Ok(FileRecord {
            id: Uuid::new_v4(),
            source_path: path.to_path_buf(),
            original_fingerprint: self.fingerprint(path)?,
            output_path: None,
            output_fingerprint: None,
            status: RecordStatus::Pending,
            size_bytes: fs_ops::file_size(path)?,
            selected: false,
        })
    }

    // ---- removing ----

    /// Remove the given records. Unknown ids are ignored.
    ///
    /// Returns the number of records actually removed.
    pub fn remove(&mut self, ids: &[RecordId]) -> usize {
        let before = self.records.len();
        self.records.retain(|r| !ids.contains(&r.id));
        let removed = before - self.records.len();
        if removed > 0 {
            log::info!("removed {} record(s)", removed);
        }
        removed
    }

    pub fn remove_selected(&mut self) -> usize {
        let ids = self.selected_ids();
        self.remove(&ids)
    }

    pub fn clear(&mut self) {
        log::info!("cleared {} record(s)", self.records.len());
        self.records.clear();
    }

    // ---- replacing ----

    /// Point a record at a new source file, resetting its processing state.
    ///
    /// Everything is computed before the record is touched, so on error the
    /// record is unchanged.
    ///
    /// # Errors
    /// - `RecordNotFound` if `id` is unknown
    /// - `NotFound` if `new_path` is not an existing regular file
    /// - `InvalidState` if another record already tracks `new_path`
    pub fn replace_source<P: AsRef<Path>>(
        &mut self,
        id: RecordId,
        new_path: P,
    ) -> Result<(), EngineError> {
        let new_path = absolute(new_path.as_ref());
        let index = self.index_of(id)?;

        if self
            .records
            .iter()
            .any(|r| r.id != id && r.source_path == new_path)
        {
            return Err(EngineError::invalid_state(format!(
                "already tracked by another record: {}",
                new_path.display()
            )));
        }

        let fresh = self.build_record(&new_path)?;

        let record = &mut self.records[index];
        log::info!(
            "replaced {} with {}",
            record.source_path.display(),
            new_path.display()
        );
        record.source_path = fresh.source_path;
        record.original_fingerprint = fresh.original_fingerprint;
        record.output_path = None;
        record.output_fingerprint = None;
        record.status = RecordStatus::Pending;
        record.size_bytes = fresh.size_bytes;
        Ok(())
    }

    /// Replace the selected records' sources with `new_paths`, pairwise in order.
    ///
    /// Selected records beyond the number of new paths are removed; new paths
    /// beyond the number of selected records are added as new records.
    pub fn replace_selected<I, P>(&mut self, new_paths: I) -> Result<ReplaceReport, EngineError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let selected = self.selected_ids();
        if selected.is_empty() {
            return Err(EngineError::invalid_state("no records selected to replace"));
        }

        let new_paths: Vec<PathBuf> = new_paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();

        let mut report = ReplaceReport::default();
        let mut leftover = Vec::new();
        for (i, id) in selected.iter().enumerate() {
            match new_paths.get(i) {
                Some(path) => match self.replace_source(*id, path) {
                    Ok(()) => report.replaced += 1,
                    Err(e) => {
                        log::warn!("could not replace with {}: {}", path.display(), e);
                        report.failed.push((path.clone(), e.detailed()));
                    }
                },
                None => leftover.push(*id),
            }
        }
        report.removed = self.remove(&leftover);

        if new_paths.len() > selected.len() {
            report.added = self.add_many(&new_paths[selected.len()..]);
        }

        Ok(report)
    }

    // ---- status ----

    /// Flip a record between Pending and Done.
    ///
    /// This is a manual annotation; output fields are not touched.
    pub fn toggle_status(&mut self, id: RecordId) -> Result<RecordStatus, EngineError> {
        let index = self.index_of(id)?;
        let record = &mut self.records[index];
        record.status = record.status.toggled();
        Ok(record.status)
    }

    // ---- selection ----

    pub fn select_all(&mut self) {
        for record in &mut self.records {
            record.selected = true;
        }
    }

    pub fn clear_selection(&mut self) {
        for record in &mut self.records {
            record.selected = false;
        }
    }

    pub fn invert_selection(&mut self) {
        for record in &mut self.records {
            record.selected = !record.selected;
        }
    }

    pub fn set_selected(&mut self, id: RecordId, selected: bool) -> Result<(), EngineError> {
        let index = self.index_of(id)?;
        self.records[index].selected = selected;
        Ok(())
    }

    /// Ids of selected records, in display order.
    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.records
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.id)
            .collect()
    }

    pub fn selection_count(&self) -> usize {
        self.records.iter().filter(|r| r.selected).count()
    }

    // ---- processing ----

    /// Process every Pending record into `target_dir`, one at a time.
    ///
    /// A record that fails is reported through `progress` and left exactly as
    /// it was; the remaining records are still attempted.
    ///
    /// # Errors
    /// Returns EngineError only when the batch cannot start: the store is
    /// empty, or `target_dir` is not an existing directory.
    pub fn process_pending(
        &mut self,
        processor: &dyn FileProcessor,
        target_dir: &Path,
        progress: Option<&dyn ProgressCallback>,
    ) -> Result<BatchSummary, EngineError> {
        if self.records.is_empty() {
            return Err(EngineError::invalid_state("no records to process"));
        }
        fs_ops::require_dir(target_dir)?;

        let pending: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == RecordStatus::Pending)
            .map(|(i, _)| i)
            .collect();

        let mut summary = BatchSummary {
            target_dir: target_dir.to_path_buf(),
            ..BatchSummary::default()
        };

        // Outputs may never land on a tracked source or on an earlier output
        let sources: HashSet<PathBuf> =
            self.records.iter().map(|r| path_key(&r.source_path)).collect();
        let mut written: HashSet<PathBuf> = HashSet::new();

        log::info!(
            "processing {} pending record(s) into {}",
            pending.len(),
            target_dir.display()
        );
        if let Some(callback) = progress {
            callback.on_batch_started(pending.len());
        }

        for index in pending {
            if progress.map_or(false, |c| c.should_cancel()) {
                log::info!("batch cancelled");
                summary.cancelled = true;
                break;
            }

            summary.attempted += 1;
            if let Some(callback) = progress {
                callback.on_record_started(index, &self.records[index]);
            }

            let source = self.records[index].source_path.clone();
            let outcome = check_output(processor, &source, target_dir, &sources, &written)
                .and_then(|key| {
                    let processed = self.process_one(processor, &source, target_dir)?;
                    Ok((key, processed))
                });
            match outcome {
                Ok((key, (output_path, output_fingerprint, size_bytes))) => {
                    written.insert(key);
                    let record = &mut self.records[index];
                    record.output_path = Some(output_path);
                    record.output_fingerprint = Some(output_fingerprint);
                    record.size_bytes = size_bytes;
                    record.status = RecordStatus::Done;
                    summary.succeeded += 1;

                    if let Some(callback) = progress {
                        callback.on_record_completed(index, &self.records[index]);
                    }
                }
                Err(e) => {
                    log::warn!("processing {} failed: {}", source.display(), e.detailed());
                    summary
                        .failed
                        .push((self.records[index].id, source, e.detailed()));

                    if let Some(callback) = progress {
                        callback.on_record_failed(index, &self.records[index], &e);
                    }
                }
            }
        }

        log::info!(
            "batch finished: {} succeeded, {} failed",
            summary.succeeded,
            summary.failed.len()
        );
        if let Some(callback) = progress {
            callback.on_batch_completed(&summary);
        }

        Ok(summary)
    }

    fn process_one(
        &self,
        processor: &dyn FileProcessor,
        source: &Path,
        target_dir: &Path,
    ) -> Result<(PathBuf, ChecksumValue, u64), EngineError> {
        let output = processor.process(source, target_dir)?;
        let fingerprint = self.fingerprint(&output)?;
        let size = fs_ops::file_size(&output)?;
        Ok((output, fingerprint, size))
    }

    fn index_of(&self, id: RecordId) -> Result<usize, EngineError> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(EngineError::RecordNotFound { id })
    }
}

/// Reject an output that would overwrite a tracked source or a file already
/// written by this batch. Returns the output's comparison key.
fn check_output(
    processor: &dyn FileProcessor,
    source: &Path,
    target_dir: &Path,
    sources: &HashSet<PathBuf>,
    written: &HashSet<PathBuf>,
) -> Result<PathBuf, EngineError> {
    let output = processor.output_path(source, target_dir)?;
    let key = path_key(&output);
    if sources.contains(&key) {
        return Err(EngineError::invalid_state(format!(
            "output would overwrite a tracked source: {}",
            output.display()
        )));
    }
    if written.contains(&key) {
        return Err(EngineError::invalid_state(format!(
            "output already written by another record in this batch: {}",
            output.display()
        )));
    }
    Ok(key)
}

/// Canonical form of `path` for identity checks; works for files that do not
/// exist yet as long as their parent does.
fn path_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => absolute(path),
        },
        _ => absolute(path),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
