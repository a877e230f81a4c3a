//! Filesystem operations module.
//!
//! This module provides low-level operations for:
//! - Listing the immediate files of a directory
//! - Copying files with metadata preservation
//! - Appending random bytes to a file
//! - Creating directories

use crate::error::EngineError;
use rand::RngExt;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// List the regular files directly inside `dir`, sorted by path.
///
/// Subdirectories and their contents are ignored.
///
/// # Errors
/// - `NotFound` if `dir` does not exist
/// - `NotADirectory` if `dir` is a file
/// - `EnumerationFailed` if the directory cannot be read
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    match fs::metadata(dir) {
        Ok(metadata) if !metadata.is_dir() => {
            return Err(EngineError::NotADirectory {
                path: dir.to_path_buf(),
            })
        }
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(EngineError::NotFound {
                path: dir.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(EngineError::EnumerationFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
    }

    let entries = fs::read_dir(dir).map_err(|e| EngineError::EnumerationFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EngineError::EnumerationFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        // Follows symlinks, so a link to a regular file counts as a file
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Copy a file from source to destination with metadata preservation.
///
/// On failure the partially written destination is removed, so a caller never
/// finds a truncated copy that looks complete.
///
/// # Returns
/// Number of bytes copied
pub fn copy_file_with_metadata(src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let mut src_file = fs::File::open(src).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EngineError::NotFound {
            path: src.to_path_buf(),
        },
        _ => EngineError::ReadError {
            path: src.to_path_buf(),
            source: e,
        },
    })?;

    let src_mtime = src_file
        .metadata()
        .map_err(|e| EngineError::ReadError {
            path: src.to_path_buf(),
            source: e,
        })?
        .modified()
        .ok();

    let bytes_copied = write_stream(&mut src_file, src, dst)?;

    if let Some(mtime) = src_mtime {
        if let Err(e) = filetime::set_file_mtime(dst, filetime::FileTime::from_system_time(mtime)) {
            log::debug!("could not preserve mtime on {}: {}", dst.display(), e);
        }
    }

    Ok(bytes_copied)
}

/// Write everything `reader` yields into a new file at `dst`.
///
/// A failure while streaming removes the partially written `dst`.
fn write_stream<R: Read>(reader: &mut R, src: &Path, dst: &Path) -> Result<u64, EngineError> {
    let mut dst_file = fs::File::create(dst).map_err(|e| EngineError::WriteError {
        path: dst.to_path_buf(),
        source: e,
    })?;

    let copied = io::copy(reader, &mut dst_file).and_then(|n| {
        dst_file.sync_all()?;
        Ok(n)
    });
    drop(dst_file);

    copied.map_err(|e| {
        remove_partial(dst);
        EngineError::CopyFailed {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            source: e,
        }
    })
}

/// Append `len` random bytes to the end of an existing file.
///
/// The file is opened in append mode; existing content is never rewritten.
pub fn append_random_bytes(path: &Path, len: usize) -> Result<Vec<u8>, EngineError> {
    let mut rng = rand::rng();
    let tail: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();

    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| EngineError::AppendError {
            path: path.to_path_buf(),
            source: e,
        })?;

    file.write_all(&tail)
        .and_then(|_| file.sync_all())
        .map_err(|e| EngineError::AppendError {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(tail)
}

/// Ensure `dir` exists as a directory, creating it (and parents) if needed.
pub fn ensure_dir_exists(dir: &Path) -> Result<(), EngineError> {
    match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(EngineError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| EngineError::DirectoryCreationFailed {
                path: dir.to_path_buf(),
                source: e,
            })
        }
        Err(e) => Err(EngineError::DirectoryCreationFailed {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}

/// Require `dir` to be an existing directory.
pub fn require_dir(dir: &Path) -> Result<(), EngineError> {
    if !dir.exists() {
        return Err(EngineError::NotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(EngineError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Size of a file in bytes.
pub fn file_size(path: &Path) -> Result<u64, EngineError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EngineError::NotFound {
                path: path.to_path_buf(),
            },
            _ => EngineError::ReadError {
                path: path.to_path_buf(),
                source: e,
            },
        })
}

pub(crate) fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("could not remove partial output {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_files_is_not_recursive() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dir = temp_dir.path();
        fs::write(dir.join("b.txt"), b"b").expect("Failed to write b");
        fs::write(dir.join("a.txt"), b"a").expect("Failed to write a");
        fs::create_dir(dir.join("sub")).expect("Failed to create subdir");
        fs::write(dir.join("sub").join("c.txt"), b"c").expect("Failed to write c");

        let files = list_files(dir).expect("Failed to list");
        assert_eq!(files, vec![dir.join("a.txt"), dir.join("b.txt")]);
    }

    #[test]
    fn test_list_files_errors() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("missing");
        assert!(matches!(list_files(&missing), Err(EngineError::NotFound { .. })));

        let file = temp_dir.path().join("file.txt");
        fs::write(&file, b"x").expect("Failed to write file");
        assert!(matches!(list_files(&file), Err(EngineError::NotADirectory { .. })));
    }

    #[test]
    fn test_copy_file_with_metadata() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src_file = temp_dir.path().join("source.txt");
        let dst_file = temp_dir.path().join("dest.txt");
        fs::write(&src_file, b"test content").expect("Failed to write source");

        let past = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&src_file, past).expect("Failed to set mtime");

        let bytes = copy_file_with_metadata(&src_file, &dst_file).expect("Failed to copy");
        assert_eq!(bytes, 12);
        assert_eq!(fs::read(&dst_file).expect("Failed to read dest"), b"test content");

        let meta = fs::metadata(&dst_file).expect("Failed to stat dest");
        assert_eq!(filetime::FileTime::from_last_modification_time(&meta), past);
    }

    #[test]
    fn test_copy_missing_source() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = copy_file_with_metadata(
            &temp_dir.path().join("missing"),
            &temp_dir.path().join("out"),
        );
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_copy_onto_directory_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("a.bin");
        fs::write(&src, b"data").expect("Failed to write source");
        let blocker = temp_dir.path().join("out");
        fs::create_dir(&blocker).expect("Failed to create blocker");

        let result = copy_file_with_metadata(&src, &blocker);
        assert!(matches!(result, Err(EngineError::WriteError { .. })));
        assert!(blocker.is_dir());
    }

    /// Yields `good` bytes, then fails.
    struct FailingReader {
        good: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.good == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "device lost"));
            }
            let n = self.good.min(buf.len());
            buf[..n].fill(0xAB);
            self.good -= n;
            Ok(n)
        }
    }

    #[test]
    fn test_failed_copy_removes_partial_output() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let src = temp_dir.path().join("src.bin");
        let dst = temp_dir.path().join("dst.bin");

        let mut reader = FailingReader { good: 100 };
        let err = write_stream(&mut reader, &src, &dst).expect_err("Copy should fail");

        assert!(matches!(err, EngineError::CopyFailed { .. }));
        assert!(!dst.exists());
    }

    #[test]
    fn test_append_random_bytes() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("file.bin");
        fs::write(&path, b"0123456789").expect("Failed to write file");

        let tail = append_random_bytes(&path, 4).expect("Failed to append");
        let content = fs::read(&path).expect("Failed to read file");
        assert_eq!(content.len(), 14);
        assert_eq!(&content[..10], b"0123456789");
        assert_eq!(&content[10..], tail.as_slice());
    }

    #[test]
    fn test_append_to_missing_file_fails() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = append_random_bytes(&temp_dir.path().join("missing"), 4);
        assert!(matches!(result, Err(EngineError::AppendError { .. })));
    }

    #[test]
    fn test_ensure_dir_exists() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("a").join("b");

        ensure_dir_exists(&dir).expect("Failed to create dir");
        assert!(dir.is_dir());
        // Existing directory is fine
        ensure_dir_exists(&dir).expect("Existing dir should be accepted");

        let file = temp_dir.path().join("file");
        fs::write(&file, b"x").expect("Failed to write file");
        assert!(matches!(ensure_dir_exists(&file), Err(EngineError::NotADirectory { .. })));
    }
}
