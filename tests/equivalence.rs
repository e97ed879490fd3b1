//! Cross-strategy equivalence: serial vs live vs batch.
//!
//! Every scenario drives the same update sequence through all three
//! updaters and asserts identical root digests. The serial updater is the
//! oracle throughout.

#![expect(clippy::unwrap_used)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use smtree::digest::{empty_leaf, hash_children, hash_value, Digest};
use smtree::workload::{generate_workload, Operation};
use smtree::{SparseMerkleTree, UpdatePool, WriterTag};

fn serial_root(depth: usize, updates: &[(&str, &[u8])]) -> Digest {
    let mut tree = SparseMerkleTree::new(depth);
    for (key, value) in updates {
        tree.update_serial(key, value).unwrap();
    }
    tree.root_hash()
}

fn live_root(depth: usize, updates: &[(&str, &[u8])]) -> Digest {
    let tree = SparseMerkleTree::new(depth);
    for (thread_id, (key, value)) in updates.iter().enumerate() {
        let seq = tree.mint_seq();
        tree.update_live(key, value, WriterTag::new(thread_id % 4, seq))
            .unwrap();
    }
    tree.root_hash()
}

fn batch_root(depth: usize, updates: &[(&str, &[u8])], workers: usize) -> Digest {
    let tree = SparseMerkleTree::new(depth);
    tree.update_batch(updates, workers).unwrap();
    tree.root_hash()
}

#[test]
fn single_update_all_strategies() {
    common::init_tracing();

    // Expected root spelled out from the hash contract:
    // H(H(H(H("a")||e) || H(e||e)) || H(H(e||e) || H(e||e)))
    let e = empty_leaf();
    let ee = hash_children(&e, &e);
    let expected = hash_children(
        &hash_children(&hash_children(&hash_value(b"a"), &e), &ee),
        &hash_children(&ee, &ee),
    );

    let updates: Vec<(&str, &[u8])> = vec![("000", b"a")];
    assert_eq!(serial_root(3, &updates), expected);
    assert_eq!(live_root(3, &updates), expected);
    assert_eq!(batch_root(3, &updates, 2), expected);
}

#[test]
fn two_disjoint_updates_conflict_at_root_only() {
    let updates: Vec<(&str, &[u8])> = vec![("000", b"a"), ("111", b"b")];
    let expected = serial_root(3, &updates);
    assert_eq!(live_root(3, &updates), expected);
    assert_eq!(batch_root(3, &updates, 2), expected);
}

#[test]
fn two_adjacent_updates_conflict_at_shared_prefix() {
    let updates: Vec<(&str, &[u8])> = vec![("000", b"a"), ("001", b"b")];
    let expected = serial_root(3, &updates);
    assert_eq!(live_root(3, &updates), expected);
    assert_eq!(batch_root(3, &updates, 2), expected);
}

#[test]
fn overwrite_race_last_sequence_wins() {
    // Two writers target the same leaf; the larger sequence must win no
    // matter which order the calls land in.
    let expected = serial_root(3, &[("010", b"x"), ("010", b"y")]);

    let tree = SparseMerkleTree::new(3);
    tree.update_live("010", b"x", WriterTag::new(1, 1)).unwrap();
    tree.update_live("010", b"y", WriterTag::new(2, 2)).unwrap();
    assert_eq!(tree.root_hash(), expected);

    // Reversed arrival order: the stale write is rejected at the leaf.
    let tree = SparseMerkleTree::new(3);
    tree.update_live("010", b"y", WriterTag::new(2, 2)).unwrap();
    tree.update_live("010", b"x", WriterTag::new(1, 1)).unwrap();
    assert_eq!(tree.root_hash(), expected);
}

#[test]
fn stale_leaf_write_leaves_no_trace() {
    let tree = SparseMerkleTree::new(3);
    tree.update_live("010", b"current", WriterTag::new(1, 5))
        .unwrap();
    let settled = tree.root_hash();

    tree.update_live("010", b"stale", WriterTag::new(2, 3))
        .unwrap();
    assert_eq!(tree.root_hash(), settled);
    assert_eq!(tree.leaf_hash("010").unwrap(), hash_value(b"current"));
}

#[test]
fn reader_never_observes_torn_root() {
    // One writer walks a single leaf through a series of values; every
    // root a concurrent reader can observe must be one of the roots that
    // exist between whole updates.
    const VALUES: usize = 64;
    let depth = 6;

    let mut reachable = HashSet::new();
    let mut oracle = SparseMerkleTree::new(depth);
    reachable.insert(oracle.root_hash());
    for i in 0..VALUES {
        oracle
            .update_serial("010101", i.to_string().as_bytes())
            .unwrap();
        reachable.insert(oracle.root_hash());
    }

    let tree = Arc::new(SparseMerkleTree::new(depth));
    std::thread::scope(|scope| {
        let writer = {
            let tree = Arc::clone(&tree);
            scope.spawn(move || {
                for i in 0..VALUES {
                    let seq = tree.mint_seq();
                    tree.update_live("010101", i.to_string().as_bytes(), WriterTag::new(0, seq))
                        .unwrap();
                }
            })
        };

        let tree = Arc::clone(&tree);
        scope.spawn(move || {
            while !writer.is_finished() {
                let observed = tree.root_hash();
                assert!(
                    reachable.contains(&observed),
                    "torn or stale root: {observed}"
                );
            }
        });
    });
}

#[test]
fn random_stream_equivalence_matrix() {
    common::init_tracing();

    let depth = 10;
    let total_ops = 10_000;
    let stream = generate_workload(
        &mut StdRng::seed_from_u64(0xCAFE),
        depth,
        total_ops,
        30.0,
        Duration::ZERO,
    );
    let updates: Vec<(String, Vec<u8>)> = stream
        .iter()
        .filter_map(|event| match &event.op {
            Operation::Update { key, value } => Some((key.clone(), value.clone())),
            _ => None,
        })
        .collect();

    // Serial oracle.
    let mut oracle = SparseMerkleTree::new(depth);
    for (key, value) in &updates {
        oracle.update_serial(key, value).unwrap();
    }
    let expected = oracle.root_hash();

    // Live, across pool sizes.
    for threads in [1, 2, 4, 8, 32] {
        let tree = Arc::new(SparseMerkleTree::new(depth));
        let pool = UpdatePool::new(Arc::clone(&tree), threads, Instant::now()).unwrap();
        for event in &stream {
            pool.submit(event.clone());
        }
        let report = pool.join();
        assert_eq!(report.failed_ops, 0, "threads = {threads}");
        assert_eq!(tree.root_hash(), expected, "live threads = {threads}");
        assert!(tree.is_merkle_consistent(), "live threads = {threads}");
    }

    // Batch, across batch sizes.
    for batch_size in [1, 16, 256] {
        let tree = SparseMerkleTree::new(depth);
        for chunk in updates.chunks(batch_size) {
            tree.update_batch(chunk, 8).unwrap();
        }
        assert_eq!(tree.root_hash(), expected, "batch size = {batch_size}");
        assert!(tree.is_merkle_consistent(), "batch size = {batch_size}");
    }
}
