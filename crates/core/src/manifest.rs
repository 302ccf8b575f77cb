//! Patch manifest: what a receiver needs besides the old tree itself

use crate::error::{Error, Result};
use crate::scan::FileRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Fixed name of the manifest inside the archive.
pub const MANIFEST_NAME: &str = "manifest.json";

/// Bumped on any incompatible change to the archive layout or the
/// instruction wire format.
pub const FORMAT_VERSION: u32 = 1;

/// Archive-level metadata.
///
/// `source_files` carries the old tree's relative paths in file-id
/// order; instruction streams reference old files purely by those ids.
/// `block_size` pins the size every stream in the archive was generated
/// with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub block_size: u64,
    pub source_files: Vec<String>,
}

impl Manifest {
    pub fn new(block_size: u64, old_records: &[FileRecord]) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            block_size,
            source_files: old_records
                .iter()
                .map(|record| record.relative.to_string_lossy().into_owned())
                .collect(),
        }
    }

    /// Write `manifest.json` at the staging root.
    pub fn write(&self, staging_root: &Path) -> Result<()> {
        let path = staging_root.join(MANIFEST_NAME);
        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| Error::Archive {
            path: path.clone(),
            details: e.to_string(),
        })?;
        Ok(())
    }

    /// Read a manifest back from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| Error::Archive {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }
}
