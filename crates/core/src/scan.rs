//! Directory-tree scanning and flattening

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Dense, zero-based identifier a regular file receives in flatten order.
///
/// Ids are stable only for the lifetime of one scan and are never
/// comparable between the two sides of a diff; matching is by content.
pub type FileId = u64;

/// One node of a scanned tree. Directories exclusively own their
/// children, so the structure is acyclic by construction.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Location of the entry on disk.
    pub path: PathBuf,
    /// Identity-bearing path relative to the scan root.
    pub relative: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Child nodes, sorted by file name.
    pub children: Vec<TreeNode>,
}

/// A scanned directory tree.
///
/// The root node is a sentinel standing for the scan root itself; it is
/// traversed but never counted as a file.
#[derive(Debug, Clone)]
pub struct FileTree {
    root: TreeNode,
}

/// A regular file in flatten order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: FileId,
    pub path: PathBuf,
    pub relative: PathBuf,
}

impl FileTree {
    /// Scan `root`, which must be an existing directory.
    ///
    /// Directory entries are sorted by name so that file ids (and with
    /// them the whole patch byte stream) are reproducible across
    /// platforms. Symlinks and other non-regular entries are skipped,
    /// never followed.
    pub fn scan(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::config(format!(
                "not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root: scan_dir(root, Path::new(""))?,
        })
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Flatten into file records: each directory's direct children
    /// first, then a descent into each subdirectory, in order.
    ///
    /// Directories are traversed but not emitted; only regular files
    /// receive an id, equal to their position in the returned sequence.
    pub fn flatten(&self) -> Vec<FileRecord> {
        let mut records = Vec::new();
        flatten_into(&self.root, &mut records);
        records
    }
}

fn scan_dir(path: &Path, relative: &Path) -> Result<TreeNode> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(path)
        .map_err(|e| Error::io(path, e))?
        .collect::<std::io::Result<_>>()
        .map_err(|e| Error::io(path, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        let child_path = entry.path();
        let child_relative = relative.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| Error::io(&child_path, e))?;

        if file_type.is_dir() {
            children.push(scan_dir(&child_path, &child_relative)?);
        } else if file_type.is_file() {
            children.push(TreeNode {
                path: child_path,
                relative: child_relative,
                is_dir: false,
                children: Vec::new(),
            });
        } else {
            tracing::warn!(path = %child_path.display(), "skipping non-regular entry");
        }
    }

    Ok(TreeNode {
        path: path.to_path_buf(),
        relative: relative.to_path_buf(),
        is_dir: true,
        children,
    })
}

fn flatten_into(node: &TreeNode, records: &mut Vec<FileRecord>) {
    for child in &node.children {
        if !child.is_dir {
            records.push(FileRecord {
                id: records.len() as FileId,
                path: child.path.clone(),
                relative: child.relative.clone(),
            });
        }
    }
    for child in &node.children {
        if child.is_dir {
            flatten_into(child, records);
        }
    }
}
