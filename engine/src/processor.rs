//! Copy-then-mutate processing of a single file.
//!
//! The source is never touched: its bytes are copied into the target
//! directory under the same file name and a few random bytes are appended to
//! the copy, which changes its fingerprint.

use crate::config::{EngineConfig, DEFAULT_APPEND_LEN};
use crate::error::EngineError;
use crate::fs_ops;
use std::path::{Path, PathBuf};

/// Produces a mutated copy of a source file inside a target directory.
pub trait FileProcessor {
    /// Returns the path of the mutated copy.
    fn process(&self, source: &Path, target_dir: &Path) -> Result<PathBuf, EngineError>;

    /// Path `process` will write for `source`, without touching the filesystem.
    fn output_path(&self, source: &Path, target_dir: &Path) -> Result<PathBuf, EngineError> {
        let file_name = source.file_name().ok_or_else(|| EngineError::NotFound {
            path: source.to_path_buf(),
        })?;
        Ok(target_dir.join(file_name))
    }
}

/// Copies the source and appends `append_len` random bytes to the copy.
#[derive(Debug, Clone)]
pub struct Rehasher {
    append_len: usize,
}

impl Rehasher {
    pub fn new(append_len: usize) -> Self {
        Rehasher {
            append_len: append_len.max(1),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.append_len)
    }

    pub fn append_len(&self) -> usize {
        self.append_len
    }
}

impl Default for Rehasher {
    fn default() -> Self {
        Self::new(DEFAULT_APPEND_LEN)
    }
}

impl FileProcessor for Rehasher {
    fn process(&self, source: &Path, target_dir: &Path) -> Result<PathBuf, EngineError> {
        if !source.is_file() {
            return Err(EngineError::NotFound {
                path: source.to_path_buf(),
            });
        }
        fs_ops::require_dir(target_dir)?;

        let dst = self.output_path(source, target_dir)?;

        if same_file(source, &dst) {
            return Err(EngineError::invalid_state(format!(
                "output would overwrite its source: {}",
                source.display()
            )));
        }

        let copied = fs_ops::copy_file_with_metadata(source, &dst)?;
        log::debug!("copied {} bytes: {} -> {}", copied, source.display(), dst.display());

        discard_on_failure(&dst, fs_ops::append_random_bytes(&dst, self.append_len))?;

        Ok(dst)
    }
}

/// Remove the half-finished output at `dst` when `result` is an error.
fn discard_on_failure<T>(dst: &Path, result: Result<T, EngineError>) -> Result<T, EngineError> {
    if result.is_err() {
        fs_ops::remove_partial(dst);
    }
    result
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
