//! Error taxonomy for patch generation

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shared `Result` alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the delta engine.
///
/// Scanning, hashing and index-construction failures are fatal for the
/// whole run; a partially built digest table would silently produce
/// wrong matches downstream.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid run configuration (missing roots, bad block size).
    #[error("invalid configuration: {details}")]
    Config { details: String },

    /// Open/read/write failure on a concrete path.
    #[error("io failure at {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Digest computation or parsing failure.
    #[error("digest failure: {details}")]
    Hash { details: String },

    /// Failure packaging or reading the patch artifact.
    #[error("archive failure at {}: {}", .path.display(), .details)]
    Archive { path: PathBuf, details: String },

    /// Malformed instruction stream.
    #[error("malformed patch stream: {details}")]
    Patch { details: String },
}

impl Error {
    /// Attach the offending path to an `io::Error`.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn config(details: impl Into<String>) -> Self {
        Self::Config {
            details: details.into(),
        }
    }

    pub fn patch(details: impl Into<String>) -> Self {
        Self::Patch {
            details: details.into(),
        }
    }
}
