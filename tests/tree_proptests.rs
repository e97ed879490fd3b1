//! Property-based tests for the updaters.
//!
//! Differential testing: the serial updater is the oracle, and every
//! property drives the same inputs through the live and batch updaters.

#![expect(clippy::unwrap_used, reason = "fail fast in tests")]

use proptest::prelude::*;

use smtree::key::leaf_key;
use smtree::{SparseMerkleTree, TreeError, WriterTag};

const DEPTH: usize = 6;

// ============================================================================
//  Strategies
// ============================================================================

/// A valid leaf key for the test depth.
fn valid_key() -> impl Strategy<Value = String> {
    (0..1usize << DEPTH).prop_map(|ordinal| leaf_key(DEPTH, ordinal))
}

/// A short value payload.
fn value() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..16)
}

/// A sequence of update pairs.
fn updates(max: usize) -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    prop::collection::vec((valid_key(), value()), 0..=max)
}

/// A binary string with the wrong length.
fn wrong_length_key() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::bool::ANY, 0..16)
        .prop_filter("must differ from tree depth", |bits| bits.len() != DEPTH)
        .prop_map(|bits| bits.iter().map(|&b| if b { '1' } else { '0' }).collect())
}

fn serial_root(updates: &[(String, Vec<u8>)]) -> smtree::Digest {
    let mut tree = SparseMerkleTree::new(DEPTH);
    for (key, value) in updates {
        tree.update_serial(key, value).unwrap();
    }
    tree.root_hash()
}

// ============================================================================
//  Equivalence properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Live replay of any update sequence matches the serial oracle.
    #[test]
    fn live_matches_serial(updates in updates(64)) {
        let tree = SparseMerkleTree::new(DEPTH);
        for (i, (key, value)) in updates.iter().enumerate() {
            let seq = tree.mint_seq();
            tree.update_live(key, value, WriterTag::new(i % 8, seq)).unwrap();
        }
        prop_assert_eq!(tree.root_hash(), serial_root(&updates));
        prop_assert!(tree.is_merkle_consistent());
    }

    /// A batch applied with any worker count matches serial replay with
    /// per-key last-write-wins.
    #[test]
    fn batch_matches_serial(updates in updates(64), workers in 1usize..=8) {
        let tree = SparseMerkleTree::new(DEPTH);
        tree.update_batch(&updates, workers).unwrap();

        // Oracle: last occurrence of each key wins.
        let mut last_per_key: Vec<(String, Vec<u8>)> = Vec::new();
        for (key, value) in &updates {
            if let Some(slot) = last_per_key.iter_mut().find(|(k, _)| k == key) {
                slot.1.clone_from(value);
            } else {
                last_per_key.push((key.clone(), value.clone()));
            }
        }
        prop_assert_eq!(tree.root_hash(), serial_root(&last_per_key));
        prop_assert!(tree.is_merkle_consistent());
    }

    /// Batch application is order-insensitive (P6).
    #[test]
    fn batch_is_order_insensitive(updates in updates(32), workers in 1usize..=4) {
        // Distinct keys only, so ordering carries no last-write-wins tie.
        let mut seen = std::collections::HashSet::new();
        let distinct: Vec<(String, Vec<u8>)> = updates
            .into_iter()
            .filter(|(k, _)| seen.insert(k.clone()))
            .collect();

        let forward = SparseMerkleTree::new(DEPTH);
        forward.update_batch(&distinct, workers).unwrap();

        let mut reversed_input = distinct.clone();
        reversed_input.reverse();
        let reversed = SparseMerkleTree::new(DEPTH);
        reversed.update_batch(&reversed_input, workers).unwrap();

        prop_assert_eq!(forward.root_hash(), reversed.root_hash());
    }

    /// Updating a key twice with the same value equals updating it once (P4).
    #[test]
    fn repeated_update_is_idempotent(key in valid_key(), value in value()) {
        let mut once = SparseMerkleTree::new(DEPTH);
        once.update_serial(&key, &value).unwrap();

        let mut twice = SparseMerkleTree::new(DEPTH);
        twice.update_serial(&key, &value).unwrap();
        twice.update_serial(&key, &value).unwrap();

        prop_assert_eq!(once.root_hash(), twice.root_hash());
    }

    /// Wrong-length keys error out and leave the tree unchanged (P5).
    #[test]
    fn wrong_length_keys_are_rejected(bad_key in wrong_length_key(), value in value()) {
        let tree = SparseMerkleTree::new(DEPTH);
        let before = tree.root_hash();

        let live = tree.update_live(&bad_key, &value, WriterTag::new(0, 1));
        let live_is_invalid_key_length = matches!(live, Err(TreeError::InvalidKeyLength { .. }));
        prop_assert!(live_is_invalid_key_length);

        let batch = tree.update_batch(&[(bad_key.clone(), value.clone())], 2);
        let batch_is_invalid_key_length = matches!(batch, Err(TreeError::InvalidKeyLength { .. }));
        prop_assert!(batch_is_invalid_key_length);

        let mut serial_tree = SparseMerkleTree::new(DEPTH);
        let serial = serial_tree.update_serial(&bad_key, &value);
        let serial_is_invalid_key_length =
            matches!(serial, Err(TreeError::InvalidKeyLength { .. }));
        prop_assert!(serial_is_invalid_key_length);

        prop_assert_eq!(tree.root_hash(), before);
    }

    /// Reads are pure: any mix of reads leaves digests unchanged.
    #[test]
    fn reads_do_not_mutate(updates in updates(16), reads in prop::collection::vec(valid_key(), 0..32)) {
        let tree = SparseMerkleTree::new(DEPTH);
        for (i, (key, value)) in updates.iter().enumerate() {
            let seq = tree.mint_seq();
            tree.update_live(key, value, WriterTag::new(i % 4, seq)).unwrap();
        }
        let root = tree.root_hash();
        for key in &reads {
            let _ = tree.leaf_hash(key).unwrap();
            let _ = tree.root_hash();
        }
        prop_assert_eq!(tree.root_hash(), root);
    }
}
