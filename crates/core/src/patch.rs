//! Binary instruction-stream format and the staging writer
//!
//! A patch holds one instruction stream per target file: concatenated
//! records, each a 1-byte opcode followed by a fixed payload. File ids
//! and block indices are 8-byte little-endian regardless of platform. A
//! `WRITE_BLOCK` payload is the block's literal bytes with no length
//! prefix and is never padded; since only a file's final block may be
//! shorter than the block size, a decoder recovers a short literal's
//! length from the bytes remaining in the stream.

use crate::error::{Error, Result};
use crate::scan::FileId;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Copy an entire source file.
pub const OP_COPY_FILE: u8 = 0x01;
/// Copy one block from a source file.
pub const OP_COPY_BLOCK: u8 = 0x02;
/// Literal bytes for one block.
pub const OP_WRITE_BLOCK: u8 = 0x03;
/// End of the current file's stream.
pub const OP_DONE: u8 = 0x04;

/// One reconstruction directive.
///
/// A file's stream is either exactly `[CopyFile, Done]` or a run of
/// `CopyBlock`/`WriteBlock` covering its blocks in increasing index
/// order, terminated by `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// The target file is byte-identical to the referenced source file.
    CopyFile(FileId),
    /// Copy one block from the referenced source file.
    CopyBlock { file: FileId, block: u64 },
    /// Literal content for one block.
    WriteBlock(Vec<u8>),
    /// Terminates the file's stream.
    Done,
}

/// Serialize an instruction stream.
pub fn write_stream<W: Write>(out: &mut W, instructions: &[Instruction]) -> std::io::Result<()> {
    for instruction in instructions {
        match instruction {
            Instruction::CopyFile(id) => {
                out.write_all(&[OP_COPY_FILE])?;
                out.write_all(&id.to_le_bytes())?;
            }
            Instruction::CopyBlock { file, block } => {
                out.write_all(&[OP_COPY_BLOCK])?;
                out.write_all(&file.to_le_bytes())?;
                out.write_all(&block.to_le_bytes())?;
            }
            Instruction::WriteBlock(bytes) => {
                out.write_all(&[OP_WRITE_BLOCK])?;
                out.write_all(bytes)?;
            }
            Instruction::Done => out.write_all(&[OP_DONE])?,
        }
    }
    Ok(())
}

/// Decode one file's instruction stream.
///
/// `block_size` must be the size the stream was generated with.
pub fn read_stream(data: &[u8], block_size: u64) -> Result<Vec<Instruction>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    loop {
        let Some(&opcode) = data.get(pos) else {
            return Err(Error::patch("stream ends without DONE"));
        };
        pos += 1;
        match opcode {
            OP_COPY_FILE => {
                out.push(Instruction::CopyFile(read_u64(data, &mut pos)?));
            }
            OP_COPY_BLOCK => {
                let file = read_u64(data, &mut pos)?;
                let block = read_u64(data, &mut pos)?;
                out.push(Instruction::CopyBlock { file, block });
            }
            OP_WRITE_BLOCK => {
                // Only the final block may be short, so a literal that
                // cannot span a full block plus the trailing DONE must
                // be the remainder.
                let remaining = data.len().saturating_sub(pos);
                if remaining < 1 {
                    return Err(Error::patch("literal block truncated"));
                }
                let len = (block_size as usize).min(remaining - 1);
                out.push(Instruction::WriteBlock(data[pos..pos + len].to_vec()));
                pos += len;
            }
            OP_DONE => {
                out.push(Instruction::Done);
                if pos != data.len() {
                    return Err(Error::patch("trailing bytes after DONE"));
                }
                return Ok(out);
            }
            other => {
                return Err(Error::patch(format!("unknown opcode 0x{other:02x}")));
            }
        }
    }
}

fn read_u64(data: &[u8], pos: &mut usize) -> Result<u64> {
    let end = *pos + 8;
    let Some(bytes) = data.get(*pos..end) else {
        return Err(Error::patch("truncated integer field"));
    };
    *pos = end;
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::patch("truncated integer field"))?;
    Ok(u64::from_le_bytes(raw))
}

/// Reconstruct one target file from its instruction stream.
///
/// `source_files` maps file ids to paths inside the old tree, in
/// manifest order. `CopyBlock` copies `min(block_size, source length -
/// offset)` bytes; matching guarantees that equals the block's original
/// length.
pub fn apply_stream(
    instructions: &[Instruction],
    source_files: &[PathBuf],
    block_size: u64,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for instruction in instructions {
        match instruction {
            Instruction::CopyFile(id) => {
                let path = source_path(source_files, *id)?;
                let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
                file.read_to_end(&mut out).map_err(|e| Error::io(path, e))?;
            }
            Instruction::CopyBlock { file, block } => {
                let path = source_path(source_files, *file)?;
                let mut src = File::open(path).map_err(|e| Error::io(path, e))?;
                src.seek(SeekFrom::Start(block * block_size))
                    .map_err(|e| Error::io(path, e))?;
                src.take(block_size)
                    .read_to_end(&mut out)
                    .map_err(|e| Error::io(path, e))?;
            }
            Instruction::WriteBlock(bytes) => out.extend_from_slice(bytes),
            Instruction::Done => break,
        }
    }
    Ok(out)
}

fn source_path(source_files: &[PathBuf], id: FileId) -> Result<&PathBuf> {
    source_files
        .get(id as usize)
        .ok_or_else(|| Error::patch(format!("source file id {id} out of range")))
}

/// Writes instruction-stream files under a staging root, mirroring the
/// target tree's relative paths beneath `data/`.
pub struct PatchWriter {
    data_root: PathBuf,
    tmp_root: PathBuf,
    tmp_seq: u64,
}

impl PatchWriter {
    /// Prepare `data/` and a scratch directory beneath the staging root.
    pub fn new(staging_root: &Path) -> Result<Self> {
        let data_root = staging_root.join("data");
        fs::create_dir_all(&data_root).map_err(|e| Error::io(&data_root, e))?;
        let tmp_root = staging_root.join(".tmp");
        fs::create_dir_all(&tmp_root).map_err(|e| Error::io(&tmp_root, e))?;
        Ok(Self {
            data_root,
            tmp_root,
            tmp_seq: 0,
        })
    }

    /// Serialize one file's stream at its relative path.
    ///
    /// The stream is written to a scratch file and renamed into place
    /// once complete, so an aborted run never leaves a truncated stream
    /// that could pass for a finished one.
    pub fn write_file(&mut self, relative: &Path, instructions: &[Instruction]) -> Result<()> {
        let final_path = self.data_root.join(relative);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let tmp_path = self.tmp_root.join(format!("stream-{}", self.tmp_seq));
        self.tmp_seq += 1;

        let file = File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        write_stream(&mut writer, instructions).map_err(|e| Error::io(&tmp_path, e))?;
        writer
            .into_inner()
            .map_err(|e| Error::io(&tmp_path, e.into_error()))?;

        fs::rename(&tmp_path, &final_path).map_err(|e| Error::io(&final_path, e))?;
        tracing::debug!(path = %final_path.display(), "instruction stream written");
        Ok(())
    }
}
