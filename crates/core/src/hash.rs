//! Content digests for whole files and fixed-size blocks

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Buffer size for streaming digests.
const READ_BUF: usize = 64 * 1024;

/// A 256-bit BLAKE3 content digest.
///
/// The canonical text form is lowercase hex. Digest equality is only a
/// match *filter*; callers confirm candidates with a byte comparison.
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Create a digest from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the digest as a byte array.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let raw = hex::decode(s).map_err(|e| Error::Hash {
            details: format!("invalid digest hex: {e}"),
        })?;
        let bytes: [u8; 32] = raw.as_slice().try_into().map_err(|_| Error::Hash {
            details: format!("invalid digest length: {} bytes", raw.len()),
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Digest an in-memory byte slice.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
    ContentHash::from_bytes(*blake3::hash(data).as_bytes())
}

/// Digest an entire file, streaming in bounded chunks.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();

    let mut buf = [0u8; READ_BUF];
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentHash::from_bytes(*hasher.finalize().as_bytes()))
}

/// Digest each fixed-size block of a file, in order.
///
/// Blocks are consecutive non-overlapping windows of `block_size` bytes;
/// the final window holds the remainder and may be shorter. A zero-length
/// file yields no blocks.
pub fn block_hashes(path: &Path, block_size: u64) -> Result<Vec<ContentHash>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut buf = vec![0u8; block_size as usize];
    let mut out = Vec::new();

    loop {
        let n = read_full(&mut reader, &mut buf).map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        out.push(hash_bytes(&buf[..n]));
        if n < buf.len() {
            break;
        }
    }

    Ok(out)
}

/// SHA-256 of a file as lowercase hex, for validation listings.
///
/// Listings use SHA-256 rather than the engine's internal digest so their
/// lines can be checked with stock sha256 tooling.
pub fn sha256_hex_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();

    let mut buf = [0u8; READ_BUF];
    loop {
        let n = reader.read(&mut buf).map_err(|e| Error::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
