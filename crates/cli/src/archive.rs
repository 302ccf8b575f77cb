//! Packs the staging root into a gzip-compressed tar archive

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;
use tar::{Builder, HeaderMode};
use vdiff_core::{Error, Result};
use walkdir::WalkDir;

/// Archive every file under `staging_root` at its relative path.
///
/// Headers are deterministic and entries are added in sorted order, so
/// identical staging trees produce byte-identical archives.
pub fn pack(staging_root: &Path, output: &Path) -> Result<()> {
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let encoder = GzEncoder::new(file, Compression::best());
    let mut builder = Builder::new(encoder);
    builder.mode(HeaderMode::Deterministic);

    for entry in WalkDir::new(staging_root).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Archive {
            path: staging_root.to_path_buf(),
            details: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(staging_root)
            .map_err(|e| Error::Archive {
                path: entry.path().to_path_buf(),
                details: e.to_string(),
            })?;
        let mut src = File::open(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
        builder
            .append_file(relative, &mut src)
            .map_err(|e| Error::Archive {
                path: output.to_path_buf(),
                details: e.to_string(),
            })?;
    }

    let encoder = builder.into_inner().map_err(|e| Error::Archive {
        path: output.to_path_buf(),
        details: e.to_string(),
    })?;
    encoder.finish().map_err(|e| Error::Archive {
        path: output.to_path_buf(),
        details: e.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    #[test]
    fn test_pack_preserves_relative_layout() {
        let staging = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(staging.path().join("data/sub")).unwrap();
        std::fs::write(staging.path().join("manifest.json"), b"{}").unwrap();
        std::fs::write(staging.path().join("data/sub/f.bin"), b"bytes").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let archive_path = out_dir.path().join("patch.tar.gz");
        pack(staging.path(), &archive_path).unwrap();

        let mut archive = tar::Archive::new(GzDecoder::new(File::open(&archive_path).unwrap()));
        let mut names = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let name = entry.path().unwrap().to_string_lossy().into_owned();
            if name == "data/sub/f.bin" {
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                assert_eq!(content, b"bytes");
            }
            names.push(name);
        }
        assert_eq!(names, ["data/sub/f.bin", "manifest.json"]);
    }

    #[test]
    fn test_pack_is_deterministic() {
        let staging = tempfile::tempdir().unwrap();
        std::fs::write(staging.path().join("a"), b"one").unwrap();
        std::fs::write(staging.path().join("b"), b"two").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let first = out_dir.path().join("first.tar.gz");
        let second = out_dir.path().join("second.tar.gz");
        pack(staging.path(), &first).unwrap();
        pack(staging.path(), &second).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }
}
