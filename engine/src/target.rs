//! Target directory resolution.
//!
//! Copies go either to a user-chosen directory or to a dated directory
//! beside the source files, `<source_dir>/<YYYY-MM-DD>-<suffix>`.

use crate::error::EngineError;
use crate::fs_ops;
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Where processed copies should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetChoice {
    /// Dated directory inside the source directory, created if absent
    Default,
    /// An existing directory chosen by the user
    Custom(PathBuf),
}

/// Build the default dated target path without touching the filesystem.
pub fn default_target_dir(source_dir: &Path, date: NaiveDate, suffix: &str) -> PathBuf {
    source_dir.join(format!("{}-{}", date.format("%Y-%m-%d"), suffix))
}

/// Resolve `choice` to an existing directory.
///
/// The default directory uses today's local date and is created if needed;
/// a custom directory must already exist.
pub fn resolve_target_dir(
    source_dir: &Path,
    choice: &TargetChoice,
    suffix: &str,
) -> Result<PathBuf, EngineError> {
    match choice {
        TargetChoice::Default => {
            let dir = default_target_dir(source_dir, Local::now().date_naive(), suffix);
            fs_ops::ensure_dir_exists(&dir)?;
            log::info!("using default target directory {}", dir.display());
            Ok(dir)
        }
        TargetChoice::Custom(dir) => {
            fs_ops::require_dir(dir)?;
            Ok(dir.clone())
        }
    }
}
