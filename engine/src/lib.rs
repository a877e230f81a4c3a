//! # Rehash Engine
//!
//! A headless library for changing file fingerprints without touching the
//! originals. Designed as the foundation for multiple UIs (CLI, GUI).
//!
//! ## Overview
//!
//! - Streaming content fingerprints (MD5 by default, SHA-256, BLAKE3)
//! - Copy-then-mutate processing: each file is copied into a target directory
//!   and a few random bytes are appended to the copy
//! - An in-memory record store tracking per-file status, selection, and
//!   fingerprints, with per-record error isolation during batch processing
//! - Progress reporting via callbacks (decoupled from UI technology)
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{resolve_target_dir, RecordStore, Rehasher, TargetChoice};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RecordStore::new();
//! let report = store.add_many(["/data/a.bin", "/data/b.bin"]);
//! println!("Added {} files", report.added_count());
//!
//! let source_dir = store.source_directory()?;
//! let target = resolve_target_dir(&source_dir, &TargetChoice::Default, "modified")?;
//! let summary = store.process_pending(&Rehasher::default(), &target, None)?;
//!
//! for record in store.records() {
//!     println!("{}: {}", record.source_path.display(), record.status);
//! }
//! println!("{} failed", summary.failed.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (FileRecord, RecordStatus, summaries)
//! - **error**: Error types and handling
//! - **checksums**: Fingerprint computation
//! - **fs_ops**: Low-level filesystem operations
//! - **processor**: Copy-then-mutate processing of one file
//! - **store**: The record store and batch processing
//! - **target**: Target directory resolution
//! - **progress**: Progress callback trait
//! - **config**: Engine configuration

pub mod checksums;
pub mod config;
pub mod error;
pub mod fs_ops;
pub mod model;
pub mod processor;
pub mod progress;
pub mod store;
pub mod target;

// Re-export main types and functions
pub use checksums::{compute_file_checksum, fingerprint, ChecksumAlgorithm, ChecksumValue};
pub use config::EngineConfig;
pub use error::{EngineError, ErrorKind};
pub use model::{
    format_size, AddReport, BatchSummary, FileRecord, RecordId, RecordStatus, RecordView,
    ReplaceReport,
};
pub use processor::{FileProcessor, Rehasher};
pub use progress::ProgressCallback;
pub use store::RecordStore;
pub use target::{default_target_dir, resolve_target_dir, TargetChoice};
