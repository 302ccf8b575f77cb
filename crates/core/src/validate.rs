//! Validation listings embedded in the patch archive

use crate::error::{Error, Result};
use crate::hash;
use crate::progress::Progress;
use crate::scan::FileRecord;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Fixed name of the old-tree listing.
pub const INPUT_LISTING: &str = "input.sha256";
/// Fixed name of the new-tree listing.
pub const OUTPUT_LISTING: &str = "output.sha256";

/// Write one `<relative-path> <hex-sha256>` line per record, in file-id
/// order.
pub fn write_listing(
    staging_root: &Path,
    name: &str,
    records: &[FileRecord],
    progress: &dyn Progress,
) -> Result<()> {
    let path = staging_root.join(name);
    let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
    let mut out = BufWriter::new(file);

    let total = records.len() as u64;
    for (done, record) in records.iter().enumerate() {
        let digest = hash::sha256_hex_file(&record.path)?;
        writeln!(out, "{} {}", record.relative.display(), digest)
            .map_err(|e| Error::io(&path, e))?;
        progress.report(done as u64 + 1, total);
    }

    out.flush().map_err(|e| Error::io(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::scan::FileTree;

    #[test]
    fn test_listing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let tree_root = dir.path().join("tree");
        std::fs::create_dir_all(tree_root.join("sub")).unwrap();
        std::fs::write(tree_root.join("abc.txt"), b"abc").unwrap();
        std::fs::write(tree_root.join("sub/empty"), b"").unwrap();

        let records = FileTree::scan(&tree_root).unwrap().flatten();
        write_listing(dir.path(), INPUT_LISTING, &records, &NoProgress).unwrap();

        let listing = std::fs::read_to_string(dir.path().join(INPUT_LISTING)).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "abc.txt ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        // SHA-256 of the empty string.
        assert_eq!(
            lines[1],
            "sub/empty e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
