//! Digest tables and the inverted indices built over the old tree

use crate::error::Result;
use crate::hash::{self, ContentHash};
use crate::progress::Progress;
use crate::scan::{FileId, FileRecord};
use ahash::AHashMap;
use smallvec::SmallVec;

/// Location of one block inside the old tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLoc {
    pub file: FileId,
    pub block: u64,
}

/// Whole-file and per-block digests for one side of a diff, indexed by
/// file id. Built once per side, read-only afterwards.
#[derive(Debug, Clone)]
pub struct SideDigests {
    /// File id -> whole-file digest.
    pub files: Vec<ContentHash>,
    /// File id -> ordered block digests.
    pub blocks: Vec<Vec<ContentHash>>,
}

impl SideDigests {
    /// Digest every file in `records` at the given block size.
    ///
    /// Any read failure aborts the whole computation rather than leaving
    /// a partial table behind.
    pub fn compute(
        records: &[FileRecord],
        block_size: u64,
        progress: &dyn Progress,
    ) -> Result<Self> {
        let total = records.len() as u64;
        let mut files = Vec::with_capacity(records.len());
        let mut blocks = Vec::with_capacity(records.len());
        for (done, record) in records.iter().enumerate() {
            files.push(hash::hash_file(&record.path)?);
            blocks.push(hash::block_hashes(&record.path, block_size)?);
            progress.report(done as u64 + 1, total);
        }
        Ok(Self { files, blocks })
    }
}

/// Inverted mapping from whole-file digest to candidate old files.
///
/// Candidate lists keep insertion order, which is ascending file id, so
/// matching is deterministic.
#[derive(Debug, Default)]
pub struct WholeFileIndex {
    map: AHashMap<ContentHash, SmallVec<[FileId; 2]>>,
}

impl WholeFileIndex {
    pub fn build(digests: &SideDigests) -> Self {
        let mut map: AHashMap<ContentHash, SmallVec<[FileId; 2]>> = AHashMap::new();
        for (id, digest) in digests.files.iter().enumerate() {
            map.entry(*digest).or_default().push(id as FileId);
        }
        Self { map }
    }

    /// Candidates for a digest; empty when the digest is unknown.
    pub fn lookup(&self, digest: &ContentHash) -> &[FileId] {
        match self.map.get(digest) {
            Some(ids) => ids.as_slice(),
            None => &[],
        }
    }
}

/// Inverted mapping from block digest to candidate (file, block)
/// locations, in scan order.
#[derive(Debug, Default)]
pub struct BlockIndex {
    map: AHashMap<ContentHash, SmallVec<[BlockLoc; 2]>>,
}

impl BlockIndex {
    pub fn build(digests: &SideDigests) -> Self {
        let mut map: AHashMap<ContentHash, SmallVec<[BlockLoc; 2]>> = AHashMap::new();
        for (file, blocks) in digests.blocks.iter().enumerate() {
            for (block, digest) in blocks.iter().enumerate() {
                map.entry(*digest).or_default().push(BlockLoc {
                    file: file as FileId,
                    block: block as u64,
                });
            }
        }
        Self { map }
    }

    /// Candidates for a digest; empty when the digest is unknown.
    pub fn lookup(&self, digest: &ContentHash) -> &[BlockLoc] {
        match self.map.get(digest) {
            Some(locs) => locs.as_slice(),
            None => &[],
        }
    }
}
