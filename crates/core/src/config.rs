//! Run configuration

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: u64 = 8192;

/// Which validation listings to embed in the patch archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Listing for the input (old) tree only.
    Input,
    /// Listing for the output (new) tree only.
    Output,
    /// Listings for both trees.
    #[default]
    All,
    /// No validation listings.
    None,
}

impl ValidationMode {
    pub fn includes_input(self) -> bool {
        matches!(self, Self::Input | Self::All)
    }

    pub fn includes_output(self) -> bool {
        matches!(self, Self::Output | Self::All)
    }
}

impl FromStr for ValidationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            "all" => Ok(Self::All),
            "none" => Ok(Self::None),
            other => Err(Error::config(format!("unknown validation mode: {other}"))),
        }
    }
}

/// Configuration for one patch-generation run.
///
/// `block_size` is fixed for the entire run: index construction and
/// matching must agree on it or block offsets would be meaningless.
#[derive(Debug, Clone)]
pub struct DiffConfig {
    /// Root of the tree being updated from.
    pub source_root: PathBuf,
    /// Root of the tree being updated to.
    pub target_root: PathBuf,
    /// Validation listings to embed.
    pub validation: ValidationMode,
    /// Where the packaged archive is written.
    pub output: PathBuf,
    /// Block size in bytes.
    pub block_size: u64,
}

impl DiffConfig {
    /// Check the configuration before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.source_root.is_dir() {
            return Err(Error::config(format!(
                "source root is not a directory: {}",
                self.source_root.display()
            )));
        }
        if !self.target_root.is_dir() {
            return Err(Error::config(format!(
                "target root is not a directory: {}",
                self.target_root.display()
            )));
        }
        if self.block_size == 0 {
            return Err(Error::config("block size must be at least 1 byte"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_mode_parsing() {
        assert_eq!("all".parse::<ValidationMode>().unwrap(), ValidationMode::All);
        assert_eq!(
            "none".parse::<ValidationMode>().unwrap(),
            ValidationMode::None
        );
        assert!("both".parse::<ValidationMode>().is_err());
    }

    #[test]
    fn test_validation_mode_coverage() {
        assert!(ValidationMode::All.includes_input());
        assert!(ValidationMode::All.includes_output());
        assert!(ValidationMode::Input.includes_input());
        assert!(!ValidationMode::Input.includes_output());
        assert!(!ValidationMode::None.includes_input());
        assert!(!ValidationMode::None.includes_output());
    }

    #[test]
    fn test_config_rejects_zero_block_size() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiffConfig {
            source_root: dir.path().to_path_buf(),
            target_root: dir.path().to_path_buf(),
            validation: ValidationMode::default(),
            output: dir.path().join("out.tar.gz"),
            block_size: 0,
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_config_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiffConfig {
            source_root: dir.path().join("absent"),
            target_root: dir.path().to_path_buf(),
            validation: ValidationMode::default(),
            output: dir.path().join("out.tar.gz"),
            block_size: DEFAULT_BLOCK_SIZE,
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }
}
