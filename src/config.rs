//! Parameters shared by all phases of one pipeline run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration every phase must agree on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of bits in the low significance plane.
    pub bit_depth: u8,
    /// Side of the square blocks that get scrambled.
    pub block_size: u32,
    /// Shared secret seeding the block permutation.
    pub key: u64,
    /// Bits to read when no side information is available.
    pub max_bits: usize,
    /// Directory holding the artifacts passed between phases.
    pub output_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            bit_depth: 4,
            block_size: 2,
            key: 42,
            max_bits: crate::algorithm::DEFAULT_MAX_BITS,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PipelineConfig {
    /// Load a json configuration, absent fields take their default.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config: PipelineConfig = serde_json::from_str(r#"{"key": 7, "bit_depth": 3}"#).unwrap();
        assert_eq!(config.key, 7);
        assert_eq!(config.bit_depth, 3);
        assert_eq!(config.block_size, 2);
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_load_missing() {
        let r = PipelineConfig::load(Path::new("/nonexistent/config.json"));
        assert!(matches!(r, Err(Error::NotFound(_))));
    }
}
