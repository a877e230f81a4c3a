//! Engine configuration.
//!
//! All fields have defaults, so an empty JSON object is a valid config file.

use crate::checksums::{ChecksumAlgorithm, DEFAULT_CHUNK_SIZE};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of random bytes appended to each copy.
pub const DEFAULT_APPEND_LEN: usize = 4;

/// Suffix for the default `<YYYY-MM-DD>-<suffix>` target directory.
pub const DEFAULT_TARGET_SUFFIX: &str = "modified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Digest used for original and output fingerprints
    pub algorithm: ChecksumAlgorithm,

    /// Read buffer size for streaming hashes
    pub chunk_size: usize,

    /// Random bytes appended to each processed copy
    pub append_len: usize,

    /// Suffix of the default dated target directory
    pub target_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            algorithm: ChecksumAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            append_len: DEFAULT_APPEND_LEN,
            target_suffix: DEFAULT_TARGET_SUFFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path).map_err(|e| EngineError::Config {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: EngineConfig = serde_json::from_str(&content).map_err(|e| EngineError::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.chunk_size == 0 {
            return Err(EngineError::Config {
                message: "chunk_size must be greater than zero".to_string(),
            });
        }
        if self.append_len == 0 {
            return Err(EngineError::Config {
                message: "append_len must be greater than zero".to_string(),
            });
        }
        let suffix = self.target_suffix.trim();
        if suffix.is_empty() || suffix.contains(&['/', '\\'][..]) {
            return Err(EngineError::Config {
                message: format!("invalid target_suffix '{}'", self.target_suffix),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.algorithm, ChecksumAlgorithm::Md5);
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.append_len, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("rehash.json");
        fs::write(&path, r#"{ "algorithm": "blake3", "target_suffix": "rehashed" }"#)
            .expect("Failed to write config");

        let config = EngineConfig::from_json_file(&path).expect("Failed to load config");
        assert_eq!(config.algorithm, ChecksumAlgorithm::Blake3);
        assert_eq!(config.target_suffix, "rehashed");
        assert_eq!(config.append_len, DEFAULT_APPEND_LEN);
    }

    #[test]
    fn test_rejects_zero_append_len() {
        let config = EngineConfig {
            append_len: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(EngineError::Config { .. })));
    }

    #[test]
    fn test_rejects_suffix_with_separator() {
        let config = EngineConfig {
            target_suffix: "a/b".to_string(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "{ not json").expect("Failed to write config");
        assert!(EngineConfig::from_json_file(&path).is_err());
    }
}
