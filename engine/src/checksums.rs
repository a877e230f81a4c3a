//! Content fingerprints.
//!
//! This module provides:
//! - The supported digest algorithms (MD5, SHA-256, BLAKE3)
//! - Streaming computation over any reader, in fixed-size chunks
//! - File-level fingerprinting used by the record store
//!
//! Fingerprints are change detectors only; MD5 is the default because it is
//! what users of this kind of tool compare against.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

/// Read buffer size used when no configuration overrides it.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// MD5 (128-bit)
    #[default]
    Md5,
    /// SHA-256 (256-bit)
    Sha256,
    /// BLAKE3 (256-bit)
    Blake3,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(EngineError::Config {
                message: format!(
                    "unknown algorithm '{}'; expected md5, sha256, or blake3",
                    other
                ),
            }),
        }
    }
}

/// A computed checksum value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChecksumValue {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ChecksumValue {
    pub fn new(algorithm: ChecksumAlgorithm, hex: String) -> Self {
        ChecksumValue { algorithm, hex }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    /// Lowercase hexadecimal digest
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Format as "algo:hex"
    pub fn to_string_with_algo(&self) -> String {
        format!("{}:{}", self.algorithm, self.hex)
    }
}

impl fmt::Display for ChecksumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}

/// Incremental digest over a byte stream.
pub trait ChecksumHasher {
    fn update(&mut self, data: &[u8]);

    fn finalize(self: Box<Self>) -> ChecksumValue;
}

struct Md5Hasher {
    context: md5::Context,
}

impl ChecksumHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        let digest = self.context.compute();
        ChecksumValue::new(ChecksumAlgorithm::Md5, format!("{:x}", digest))
    }
}

struct Sha256Hasher {
    hasher: sha2::Sha256,
}

impl ChecksumHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        use sha2::Digest;
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Sha256, format!("{:x}", digest))
    }
}

struct Blake3Hasher {
    hasher: blake3::Hasher,
}

impl ChecksumHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self: Box<Self>) -> ChecksumValue {
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Blake3, digest.to_hex().to_string())
    }
}

/// Create a new hasher for the given algorithm
pub fn create_hasher(algorithm: ChecksumAlgorithm) -> Box<dyn ChecksumHasher> {
    match algorithm {
        ChecksumAlgorithm::Md5 => Box::new(Md5Hasher {
            context: md5::Context::new(),
        }),
        ChecksumAlgorithm::Sha256 => Box::new(Sha256Hasher {
            hasher: sha2::Sha256::default(),
        }),
        ChecksumAlgorithm::Blake3 => Box::new(Blake3Hasher {
            hasher: blake3::Hasher::new(),
        }),
    }
}

/// Fold a reader through `algorithm`, reading at most `chunk_size` bytes at a time.
///
/// The digest depends only on the bytes read, never on how they were chunked.
pub fn compute_reader_checksum<R: Read>(
    reader: &mut R,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> io::Result<ChecksumValue> {
    let mut hasher = create_hasher(algorithm);
    let mut buffer = vec![0u8; chunk_size.max(1)];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hasher.finalize())
}

/// Compute the checksum of a file by streaming it in `chunk_size` pieces.
///
/// # Errors
/// - `NotFound` if `path` is missing, is not a regular file, or may not be read
/// - `ReadError` for any other open or read failure
pub fn compute_file_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
    chunk_size: usize,
) -> Result<ChecksumValue, EngineError> {
    if !path.is_file() {
        return Err(EngineError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = File::open(path).map_err(|e| open_error(path, e))?;

    let checksum =
        compute_reader_checksum(&mut file, algorithm, chunk_size).map_err(|e| {
            EngineError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

    log::debug!("{} {} = {}", algorithm, path.display(), checksum);
    Ok(checksum)
}

/// Fingerprint a file with the default algorithm and chunk size.
pub fn fingerprint(path: &Path) -> Result<ChecksumValue, EngineError> {
    compute_file_checksum(path, ChecksumAlgorithm::default(), DEFAULT_CHUNK_SIZE)
}

fn open_error(path: &Path, e: io::Error) -> EngineError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => EngineError::NotFound {
            path: path.to_path_buf(),
        },
        _ => EngineError::ReadError {
            path: path.to_path_buf(),
            source: e,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn test_algorithm_display() {
        assert_eq!(ChecksumAlgorithm::Md5.to_string(), "md5");
        assert_eq!(ChecksumAlgorithm::Sha256.to_string(), "sha256");
        assert_eq!(ChecksumAlgorithm::Blake3.to_string(), "blake3");
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("md5".parse::<ChecksumAlgorithm>().ok(), Some(ChecksumAlgorithm::Md5));
        assert_eq!("SHA256".parse::<ChecksumAlgorithm>().ok(), Some(ChecksumAlgorithm::Sha256));
        assert_eq!("blake3".parse::<ChecksumAlgorithm>().ok(), Some(ChecksumAlgorithm::Blake3));
        assert!("crc32".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_md5_known_value() {
        let checksum =
            compute_reader_checksum(&mut Cursor::new(b"hello"), ChecksumAlgorithm::Md5, 3)
                .expect("Failed to hash");
        assert_eq!(checksum.hex(), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(checksum.algorithm(), ChecksumAlgorithm::Md5);
    }

    #[test]
    fn test_sha256_known_value() {
        let checksum =
            compute_reader_checksum(&mut Cursor::new(b"hello"), ChecksumAlgorithm::Sha256, 64)
                .expect("Failed to hash");
        assert_eq!(
            checksum.hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_chunk_size_does_not_change_digest() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        for algorithm in [
            ChecksumAlgorithm::Md5,
            ChecksumAlgorithm::Sha256,
            ChecksumAlgorithm::Blake3,
        ] {
            let whole = compute_reader_checksum(&mut Cursor::new(&data), algorithm, data.len())
                .expect("Failed to hash");
            for chunk in [1, 7, 4096, 8192, 65536] {
                let chunked = compute_reader_checksum(&mut Cursor::new(&data), algorithm, chunk)
                    .expect("Failed to hash");
                assert_eq!(whole, chunked, "{} differs at chunk size {}", algorithm, chunk);
            }
        }
    }

    #[test]
    fn test_identical_content_identical_fingerprint() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let p = temp_dir.path().join("p.bin");
        let q = temp_dir.path().join("q.bin");
        fs::write(&p, b"same bytes").expect("Failed to write p");
        fs::write(&q, b"same bytes").expect("Failed to write q");

        let first = fingerprint(&p).expect("Failed to hash p");
        assert_eq!(first, fingerprint(&p).expect("Failed to rehash p"));
        assert_eq!(first, fingerprint(&q).expect("Failed to hash q"));
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("empty");
        fs::write(&path, b"").expect("Failed to write file");

        let checksum = fingerprint(&path).expect("Failed to hash");
        assert_eq!(checksum.hex(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let err = fingerprint(&temp_dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_directory_is_not_found() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let err = fingerprint(temp_dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_checksum_value_display() {
        let cs = ChecksumValue::new(ChecksumAlgorithm::Sha256, "abc123".to_string());
        assert_eq!(cs.to_string(), "abc123");
        assert_eq!(cs.to_string_with_algo(), "sha256:abc123");
    }

    #[test]
    fn test_unreadable_file_is_not_found() {
        let path = Path::new("/locked/a.bin");

        let denied = open_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, EngineError::NotFound { .. }));
        assert_eq!(denied.kind(), ErrorKind::NotFound);

        let other = open_error(path, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(other, EngineError::ReadError { .. }));
    }

    #[test]
    fn test_checksums_dedupe_in_sets() {
        let a = ChecksumValue::new(ChecksumAlgorithm::Md5, "abc".to_string());
        let b = ChecksumValue::new(ChecksumAlgorithm::Sha256, "abc".to_string());
        let set: std::collections::HashSet<_> = [a.clone(), a, b].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
