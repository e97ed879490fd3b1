//! Updater benchmarks: serial vs live vs batch.
//!
//! Run with: `cargo bench --bench updaters`

#![expect(clippy::unwrap_used)]


use std::sync::Arc;
use std::thread;

use divan::{black_box, Bencher};

use bench_utils::{clustered_updates, scattered_updates};
use smtree::{SparseMerkleTree, WriterTag};

const DEPTH: usize = 12;
const OPS: usize = 2_048;

fn main() {
    divan::main();
}

// =============================================================================
// Serial oracle
// =============================================================================

#[divan::bench]
fn serial_scattered(bencher: Bencher) {
    let updates = scattered_updates(DEPTH, OPS);
    bencher.bench_local(|| {
        let mut tree = SparseMerkleTree::new(DEPTH);
        for (key, value) in &updates {
            tree.update_serial(key, value).unwrap();
        }
        black_box(tree.root_hash())
    });
}

// =============================================================================
// Live updater
// =============================================================================

#[divan::bench(args = [1, 2, 4, 8])]
fn live_scattered(bencher: Bencher, threads: usize) {
    let updates = scattered_updates(DEPTH, OPS);
    bencher.bench_local(|| {
        let tree = Arc::new(SparseMerkleTree::new(DEPTH));
        thread::scope(|scope| {
            for chunk_id in 0..threads {
                let tree = &tree;
                let chunk = updates.chunks(OPS.div_ceil(threads)).nth(chunk_id);
                scope.spawn(move || {
                    let Some(chunk) = chunk else { return };
                    for (key, value) in chunk {
                        let seq = tree.mint_seq();
                        tree.update_live(key, value, WriterTag::new(chunk_id, seq))
                            .unwrap();
                    }
                });
            }
        });
        black_box(tree.root_hash())
    });
}

#[divan::bench(args = [2, 8])]
fn live_clustered(bencher: Bencher, threads: usize) {
    let updates = clustered_updates(DEPTH, OPS);
    bencher.bench_local(|| {
        let tree = Arc::new(SparseMerkleTree::new(DEPTH));
        thread::scope(|scope| {
            for chunk_id in 0..threads {
                let tree = &tree;
                let chunk = updates.chunks(OPS.div_ceil(threads)).nth(chunk_id);
                scope.spawn(move || {
                    let Some(chunk) = chunk else { return };
                    for (key, value) in chunk {
                        let seq = tree.mint_seq();
                        tree.update_live(key, value, WriterTag::new(chunk_id, seq))
                            .unwrap();
                    }
                });
            }
        });
        black_box(tree.root_hash())
    });
}

// =============================================================================
// Batch updater
// =============================================================================

#[divan::bench(args = [1, 2, 4, 8])]
fn batch_scattered(bencher: Bencher, workers: usize) {
    let updates = scattered_updates(DEPTH, OPS);
    bencher.bench_local(|| {
        let tree = SparseMerkleTree::new(DEPTH);
        tree.update_batch(&updates, workers).unwrap();
        black_box(tree.root_hash())
    });
}

#[divan::bench(args = [2, 8])]
fn batch_clustered(bencher: Bencher, workers: usize) {
    let updates = clustered_updates(DEPTH, OPS);
    bencher.bench_local(|| {
        let tree = SparseMerkleTree::new(DEPTH);
        tree.update_batch(&updates, workers).unwrap();
        black_box(tree.root_hash())
    });
}
