//! Hash-guided matching with mandatory byte verification

use crate::error::{Error, Result};
use crate::hash::ContentHash;
use crate::index::{BlockIndex, BlockLoc, WholeFileIndex};
use crate::patch::Instruction;
use crate::scan::FileRecord;
use memmap2::Mmap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Per-run matching counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiffSummary {
    /// New-tree files processed.
    pub files: u64,
    /// Files emitted as a single whole-file copy.
    pub whole_file_copies: u64,
    /// Blocks satisfied from the old tree.
    pub blocks_copied: u64,
    /// Blocks emitted as literals.
    pub blocks_written: u64,
    /// Total literal payload bytes.
    pub literal_bytes: u64,
}

/// Matches new-tree files against the old tree's indices.
///
/// Digest equality is only a filter: every candidate is confirmed with a
/// direct byte comparison before an instruction referencing it is
/// emitted. Candidates are tried in index insertion order, so identical
/// inputs always produce identical streams. The old-side tables are
/// read-only here; independent new files could be diffed concurrently.
pub struct DiffEngine<'a> {
    old_records: &'a [FileRecord],
    whole_files: &'a WholeFileIndex,
    blocks: &'a BlockIndex,
    block_size: u64,
}

impl<'a> DiffEngine<'a> {
    pub fn new(
        old_records: &'a [FileRecord],
        whole_files: &'a WholeFileIndex,
        blocks: &'a BlockIndex,
        block_size: u64,
    ) -> Self {
        Self {
            old_records,
            whole_files,
            blocks,
            block_size,
        }
    }

    /// Produce the instruction stream for one new-tree file.
    ///
    /// Whole-file matching is attempted first; on the first verified
    /// candidate no block-level work happens at all. Otherwise blocks
    /// are resolved in strictly increasing index order, each either
    /// copied from a verified old location or emitted as a literal.
    pub fn diff_file(
        &self,
        record: &FileRecord,
        file_digest: &ContentHash,
        block_digests: &[ContentHash],
        summary: &mut DiffSummary,
    ) -> Result<Vec<Instruction>> {
        summary.files += 1;

        for &candidate in self.whole_files.lookup(file_digest) {
            let old = &self.old_records[candidate as usize];
            if files_equal(&old.path, &record.path)? {
                summary.whole_file_copies += 1;
                return Ok(vec![Instruction::CopyFile(candidate), Instruction::Done]);
            }
            tracing::debug!(
                old = %old.path.display(),
                new = %record.path.display(),
                "whole-file digest collision, bytes differ"
            );
        }

        let mut reader = File::open(&record.path).map_err(|e| Error::io(&record.path, e))?;
        let mut instructions = Vec::with_capacity(block_digests.len() + 1);
        for (index, digest) in block_digests.iter().enumerate() {
            let new_block = read_block(&mut reader, &record.path, index as u64, self.block_size)?;
            match self.match_block(digest, &new_block)? {
                Some(loc) => {
                    summary.blocks_copied += 1;
                    instructions.push(Instruction::CopyBlock {
                        file: loc.file,
                        block: loc.block,
                    });
                }
                None => {
                    summary.blocks_written += 1;
                    summary.literal_bytes += new_block.len() as u64;
                    instructions.push(Instruction::WriteBlock(new_block));
                }
            }
        }
        instructions.push(Instruction::Done);
        Ok(instructions)
    }

    /// First verified candidate for a block, if any.
    fn match_block(&self, digest: &ContentHash, new_block: &[u8]) -> Result<Option<BlockLoc>> {
        for &loc in self.blocks.lookup(digest) {
            let old = &self.old_records[loc.file as usize];
            if block_equal(
                &old.path,
                loc.block * self.block_size,
                self.block_size,
                new_block,
            )? {
                return Ok(Some(loc));
            }
            tracing::debug!(
                old = %old.path.display(),
                block = loc.block,
                "block digest collision, bytes differ"
            );
        }
        Ok(None)
    }
}

/// Byte-for-byte equality of two whole files.
pub fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    let fa = File::open(a).map_err(|e| Error::io(a, e))?;
    let fb = File::open(b).map_err(|e| Error::io(b, e))?;
    let len_a = fa.metadata().map_err(|e| Error::io(a, e))?.len();
    let len_b = fb.metadata().map_err(|e| Error::io(b, e))?.len();
    if len_a != len_b {
        return Ok(false);
    }
    if len_a == 0 {
        return Ok(true);
    }

    let ma = unsafe { Mmap::map(&fa) }.map_err(|e| Error::io(a, e))?;
    let mb = unsafe { Mmap::map(&fb) }.map_err(|e| Error::io(b, e))?;
    Ok(ma[..] == mb[..])
}

/// Compare the old file's byte range at `offset` against a new block.
///
/// The read is clamped at end of file; the candidate matches only when
/// exactly `new_block.len()` bytes are available there, which is what
/// makes the resulting `CopyBlock` reconstructible.
fn block_equal(old_path: &Path, offset: u64, block_size: u64, new_block: &[u8]) -> Result<bool> {
    let mut file = File::open(old_path).map_err(|e| Error::io(old_path, e))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|e| Error::io(old_path, e))?;
    let mut old_block = Vec::with_capacity(new_block.len());
    file.take(block_size)
        .read_to_end(&mut old_block)
        .map_err(|e| Error::io(old_path, e))?;
    Ok(old_block.as_slice() == new_block)
}

/// One block of the new file, clamped at end of file.
fn read_block(file: &mut File, path: &Path, index: u64, block_size: u64) -> Result<Vec<u8>> {
    file.seek(SeekFrom::Start(index * block_size))
        .map_err(|e| Error::io(path, e))?;
    let mut buf = Vec::with_capacity(block_size as usize);
    file.by_ref()
        .take(block_size)
        .read_to_end(&mut buf)
        .map_err(|e| Error::io(path, e))?;
    Ok(buf)
}
