//! Hashing and matching benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs;
use std::path::Path;
use vdiff_core::{
    hash, BlockIndex, DiffEngine, DiffSummary, FileTree, NoProgress, SideDigests, WholeFileIndex,
};

const BLOCK_SIZE: u64 = 8192;

fn bench_hashing(c: &mut Criterion) {
    let data = vec![0xa5u8; 1 << 20];
    c.bench_function("hash_bytes_1m", |b| {
        b.iter(|| hash::hash_bytes(black_box(&data)))
    });
}

/// Deterministic filler so runs are comparable.
fn content(file: usize, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (file.wrapping_mul(31).wrapping_add(i / 97)) as u8)
        .collect()
}

fn populate(root: &Path, files: usize, shift: usize) {
    fs::create_dir_all(root).unwrap();
    for i in 0..files {
        fs::write(root.join(format!("f{i:02}.bin")), content(i + shift, 64 * 1024)).unwrap();
    }
}

fn bench_matching(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let old_root = dir.path().join("old");
    let new_root = dir.path().join("new");
    populate(&old_root, 16, 0);
    // Half of the new tree repeats old content, half is fresh.
    populate(&new_root, 16, 8);

    let old_records = FileTree::scan(&old_root).unwrap().flatten();
    let new_records = FileTree::scan(&new_root).unwrap().flatten();
    let old_digests = SideDigests::compute(&old_records, BLOCK_SIZE, &NoProgress).unwrap();
    let new_digests = SideDigests::compute(&new_records, BLOCK_SIZE, &NoProgress).unwrap();
    let whole = WholeFileIndex::build(&old_digests);
    let blocks = BlockIndex::build(&old_digests);

    c.bench_function("diff_16x64k", |b| {
        b.iter(|| {
            let engine = DiffEngine::new(&old_records, &whole, &blocks, BLOCK_SIZE);
            let mut summary = DiffSummary::default();
            for record in &new_records {
                let stream = engine
                    .diff_file(
                        record,
                        &new_digests.files[record.id as usize],
                        &new_digests.blocks[record.id as usize],
                        &mut summary,
                    )
                    .unwrap();
                black_box(stream);
            }
        })
    });
}

criterion_group!(benches, bench_hashing, bench_matching);
criterion_main!(benches);
