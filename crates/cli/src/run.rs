//! End-to-end patch generation pipeline

use crate::archive;
use crate::progress::BarProgress;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use vdiff_core::{
    validate, BlockIndex, DiffConfig, DiffEngine, DiffSummary, FileTree, Manifest, PatchWriter,
    Progress, SideDigests, WholeFileIndex,
};

/// Run one full diff: scan, hash, index, match, stage, package.
pub fn generate(config: &DiffConfig) -> Result<DiffSummary> {
    config.validate()?;

    let staging = tempfile::Builder::new()
        .prefix("vdiff-")
        .tempdir()
        .context("failed to create staging directory")?;
    info!(staging = %staging.path().display(), "staging directory created");

    let summary = generate_into(config, staging.path())?;

    archive::pack(staging.path(), &config.output)
        .context("failed to package staging directory")?;
    info!(output = %config.output.display(), "patch archive written");
    Ok(summary)
}

/// Build the patch directory itself. Separated from [`generate`] so
/// tests can inspect the staging tree without unpacking an archive.
pub fn generate_into(config: &DiffConfig, staging_root: &Path) -> Result<DiffSummary> {
    let old_tree = FileTree::scan(&config.source_root)
        .context("failed to scan source tree")?;
    let old_records = old_tree.flatten();
    info!(
        files = old_records.len(),
        root = %config.source_root.display(),
        "scanned source tree"
    );

    let bar = BarProgress::new("source digests");
    let old_digests = SideDigests::compute(&old_records, config.block_size, &bar)
        .context("failed to digest source tree")?;
    bar.finish();

    let whole_index = WholeFileIndex::build(&old_digests);
    let block_index = BlockIndex::build(&old_digests);

    let new_tree = FileTree::scan(&config.target_root)
        .context("failed to scan target tree")?;
    let new_records = new_tree.flatten();
    info!(
        files = new_records.len(),
        root = %config.target_root.display(),
        "scanned target tree"
    );

    let bar = BarProgress::new("target digests");
    let new_digests = SideDigests::compute(&new_records, config.block_size, &bar)
        .context("failed to digest target tree")?;
    bar.finish();

    if config.validation.includes_input() {
        let bar = BarProgress::new("input listing");
        validate::write_listing(staging_root, validate::INPUT_LISTING, &old_records, &bar)
            .context("failed to write input validation listing")?;
        bar.finish();
    }
    if config.validation.includes_output() {
        let bar = BarProgress::new("output listing");
        validate::write_listing(staging_root, validate::OUTPUT_LISTING, &new_records, &bar)
            .context("failed to write output validation listing")?;
        bar.finish();
    }

    Manifest::new(config.block_size, &old_records)
        .write(staging_root)
        .context("failed to write manifest")?;

    let engine = DiffEngine::new(&old_records, &whole_index, &block_index, config.block_size);
    let mut writer = PatchWriter::new(staging_root)?;
    let mut summary = DiffSummary::default();

    let bar = BarProgress::new("matching");
    let total = new_records.len() as u64;
    for (done, record) in new_records.iter().enumerate() {
        let instructions = engine.diff_file(
            record,
            &new_digests.files[record.id as usize],
            &new_digests.blocks[record.id as usize],
            &mut summary,
        )?;
        writer.write_file(&record.relative, &instructions)?;
        bar.report(done as u64 + 1, total);
    }
    bar.finish();

    Ok(summary)
}
