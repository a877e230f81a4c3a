//! Error types for the rehash engine.
//!
//! `EngineError` covers every failure an engine operation can report. Batch
//! processing never aborts on a per-record error: those are handed to the
//! progress callback and collected in the batch summary instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by front ends to decide how to report an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A source or target path is missing
    NotFound,
    /// Copy, read, append, or directory-creation failure
    Io,
    /// The operation does not make sense for the current store contents
    InvalidState,
}

/// Errors raised by hashing, processing, and record store operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Path does not exist or is not a regular file
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Path exists but a directory was required
    #[error("Not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    /// Failed to read from a file
    #[error("Failed to read file: {}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create or write the destination file
    #[error("Failed to write file: {}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Copy did not complete; the partial output has been removed
    #[error("Failed to copy {} to {}", src.display(), dst.display())]
    CopyFailed {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to append the random tail to a copied file
    #[error("Failed to append to file: {}", path.display())]
    AppendError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to list a directory
    #[error("Failed to enumerate directory: {}", path.display())]
    EnumerationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Failed to create a directory
    #[error("Failed to create directory: {}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Operation rejected because of the store's current state
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// No record with the given id is in the store
    #[error("Record not found: {id}")]
    RecordNotFound { id: uuid::Uuid },

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

impl EngineError {
    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        EngineError::InvalidState {
            reason: reason.into(),
        }
    }

    /// Map this error onto one of the three reporting kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::NotADirectory { .. } | Self::RecordNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::ReadError { .. }
            | Self::WriteError { .. }
            | Self::CopyFailed { .. }
            | Self::AppendError { .. }
            | Self::EnumerationFailed { .. }
            | Self::DirectoryCreationFailed { .. } => ErrorKind::Io,
            Self::InvalidState { .. } | Self::Config { .. } => ErrorKind::InvalidState,
        }
    }

    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<u32> {
        match self {
            Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::CopyFailed { source, .. }
            | Self::AppendError { source, .. }
            | Self::EnumerationFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. } => {
                source.raw_os_error().map(|e| e as u32)
            }
            _ => None,
        }
    }

    /// Message with the underlying io error appended, for notification sinks.
    pub fn detailed(&self) -> String {
        match std::error::Error::source(self) {
            Some(cause) => format!("{}: {}", self, cause),
            None => self.to_string(),
        }
    }
}
