//! The tree skeleton: construction, readers, and the serial oracle.
//!
//! A [`SparseMerkleTree`] is a perfect binary tree of fixed depth `D`,
//! fully materialized at construction: `2^D` leaves initialized to the
//! digest of the empty string and `2^D - 1` internal nodes whose digests
//! are computed upward. The shape is immutable afterwards; updaters only
//! touch per-node state under each node's lock.
//!
//! Nodes live in a level-order arena (`Vec<Node>`), so child, parent, and
//! path lookups are index arithmetic — see [`crate::key`]. The parallel
//! updaters live in sibling modules ([`crate::live`], [`crate::batch`]);
//! this module owns the skeleton, the locked readers, and
//! [`SparseMerkleTree::update_serial`], the single-threaded oracle the
//! parallel variants are verified against.

use std::sync::atomic::AtomicU64;

use crate::digest::{empty_leaf, hash_children, hash_value, Digest};
use crate::error::{Result, TreeError};
use crate::key::{leaf_index, leaf_key, level_start};
use crate::node::Node;
use crate::ordering::COUNTER;
use crate::stop::StopTable;

/// A fixed-depth sparse Merkle tree with concurrent point updates.
///
/// # Example
///
/// ```rust
/// use smtree::SparseMerkleTree;
///
/// let mut tree = SparseMerkleTree::new(3);
/// assert_eq!(tree.leaf_count(), 8);
///
/// let empty_root = tree.root_hash();
/// tree.update_serial("010", b"some value").unwrap();
/// assert_ne!(tree.root_hash(), empty_root);
/// ```
#[derive(Debug)]
pub struct SparseMerkleTree {
    depth: usize,
    nodes: Vec<Node>,
    default_leaf: Digest,
    stop: StopTable,
    next_seq: AtomicU64,
}

impl SparseMerkleTree {
    /// Build a fully materialized tree of the given depth.
    ///
    /// Every leaf starts at `H("")`; every internal node's digest is the
    /// hash of its children's. Nodes at the same level start identical, so
    /// the per-level default digest is computed once and shared.
    #[must_use]
    pub fn new(depth: usize) -> Self {
        // defaults[level] = digest of an untouched node at that level
        let mut defaults = vec![empty_leaf(); depth + 1];
        for level in (0..depth).rev() {
            defaults[level] = hash_children(&defaults[level + 1], &defaults[level + 1]);
        }

        let total = (1usize << (depth + 1)) - 1;
        let mut nodes = Vec::with_capacity(total);
        for level in 0..=depth {
            let is_leaf = level == depth;
            for offset in 0..1usize << level {
                let index = level_start(level) + offset;
                let parent = (index > 0).then(|| (index - 1) / 2);
                let (left, right) = if is_leaf {
                    (None, None)
                } else {
                    (Some(2 * index + 1), Some(2 * index + 2))
                };
                nodes.push(Node::new(
                    leaf_key(level, offset),
                    is_leaf,
                    parent,
                    left,
                    right,
                    defaults[level],
                ));
            }
        }

        Self {
            depth,
            nodes,
            default_leaf: defaults[depth],
            stop: StopTable::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Tree depth (leaf key length).
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves (`2^depth`).
    #[inline]
    #[must_use]
    pub const fn leaf_count(&self) -> usize {
        1 << self.depth
    }

    /// Digest a leaf takes before its first update.
    #[inline]
    #[must_use]
    pub const fn default_leaf_hash(&self) -> Digest {
        self.default_leaf
    }

    /// All leaf keys, left to right.
    pub fn leaf_keys(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.leaf_count()).map(|ordinal| leaf_key(self.depth, ordinal))
    }

    /// Current root digest, copied under the root's lock.
    ///
    /// The value reflects the most recent finalization of the root; it is
    /// never a torn read, but under concurrent updates it need not
    /// correspond to a globally quiescent tree state.
    #[must_use]
    pub fn root_hash(&self) -> Digest {
        self.nodes[0].state.lock().digest
    }

    /// Current digest of the leaf at `key`, copied under the leaf's lock.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidKeyLength`] or [`TreeError::LeafNotFound`] for a
    /// malformed key.
    pub fn leaf_hash(&self, key: &str) -> Result<Digest> {
        let index = leaf_index(key, self.depth)?;
        Ok(self.nodes[index].state.lock().digest)
    }

    /// Write one leaf and recompute digests along the path to the root.
    ///
    /// Single-threaded by construction: exclusive access is enforced through
    /// `&mut self`, so no locks are taken. This is both a production path
    /// and the oracle the parallel updaters are verified against.
    ///
    /// # Errors
    ///
    /// [`TreeError::InvalidKeyLength`], [`TreeError::LeafNotFound`], or
    /// [`TreeError::NonLeafUpdate`] on a corrupted skeleton.
    pub fn update_serial(&mut self, key: &str, value: &[u8]) -> Result<()> {
        let mut current = leaf_index(key, self.depth)?;

        let leaf = &mut self.nodes[current];
        if !leaf.is_leaf {
            return Err(TreeError::NonLeafUpdate(key.to_owned()));
        }
        leaf.state.get_mut().digest = hash_value(value);

        while let Some(parent) = self.nodes[current].parent {
            let (left, right) = self.children_of(parent);
            let left_digest = self.nodes[left].state.get_mut().digest;
            let right_digest = self.nodes[right].state.get_mut().digest;
            self.nodes[parent].state.get_mut().digest = hash_children(&left_digest, &right_digest);
            current = parent;
        }
        Ok(())
    }

    /// Verify that every internal node's digest is the hash of its
    /// children's current digests (the post-drain tree invariant).
    ///
    /// Intended for tests and debugging after all operations have drained;
    /// it locks one node at a time and is not atomic with respect to
    /// concurrent writers.
    #[must_use]
    pub fn is_merkle_consistent(&self) -> bool {
        self.nodes.iter().enumerate().all(|(index, node)| {
            if node.is_leaf {
                return true;
            }
            let (left, right) = self.children_of(index);
            let left_digest = self.nodes[left].state.lock().digest;
            let right_digest = self.nodes[right].state.lock().digest;
            let expected = hash_children(&left_digest, &right_digest);
            node.state.lock().digest == expected
        })
    }

    /// Mint the next update sequence number (starts at 1; the stop table's
    /// idle threshold is 0).
    ///
    /// All live-mode writers on this tree must draw from this counter so
    /// that `seq` totally orders updates across threads.
    #[inline]
    #[must_use]
    pub fn mint_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, COUNTER) + 1
    }

    #[inline]
    pub(crate) fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline]
    pub(crate) fn stop_table(&self) -> &StopTable {
        &self.stop
    }

    /// Leaf arena index for `key`, validated against this tree's depth.
    #[inline]
    pub(crate) fn leaf_slot(&self, key: &str) -> Result<usize> {
        leaf_index(key, self.depth)
    }

    /// Children of an internal node. Callers guarantee `index` is internal.
    #[inline]
    pub(crate) fn children_of(&self, index: usize) -> (usize, usize) {
        (2 * index + 1, 2 * index + 2)
    }
}
