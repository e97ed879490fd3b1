//! Tree nodes: immutable shape plus lock-guarded mutable state.
//!
//! The tree's shape never changes after construction (I1), so each [`Node`]
//! splits into plain fields (path key, child/parent links, leaf flag) and a
//! [`NodeState`] behind a [`parking_lot::Mutex`] holding everything writers
//! mutate: the digest and the live-mode writer tags. The batch updater's
//! `visited` flag lives beside the mutex as an atomic because its reset
//! happens outside any lock during batch planning.

use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;

use crate::digest::Digest;

/// Identifies a specific update attempt: which worker issued it and where it
/// falls in that worker's sequence.
///
/// `seq` values must strictly increase per `thread_id`; the worker pool
/// mints them from a single process-wide counter, which also makes `seq` a
/// total order across workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriterTag {
    /// Index of the issuing worker, `0..MAX_THREADS`.
    pub thread_id: usize,
    /// Sequence number of this update attempt.
    pub seq: u64,
}

impl WriterTag {
    /// Tag for worker `thread_id`'s update number `seq`.
    #[inline]
    #[must_use]
    pub const fn new(thread_id: usize, seq: u64) -> Self {
        Self { thread_id, seq }
    }
}

/// Mutable per-node state, guarded by the node's lock.
#[derive(Clone, Copy, Debug)]
pub struct NodeState {
    /// Current digest of this node.
    pub digest: Digest,

    /// The writer that most recently finalized this node's digest.
    /// `None` until the first live-mode update touches the node.
    pub last_writer: Option<WriterTag>,

    /// Tag of the writer whose digest was read from the left child when this
    /// node was last recomputed.
    pub left_writer: Option<WriterTag>,

    /// As [`NodeState::left_writer`], for the right child.
    pub right_writer: Option<WriterTag>,
}

impl NodeState {
    #[inline]
    #[must_use]
    pub(crate) const fn new(digest: Digest) -> Self {
        Self {
            digest,
            last_writer: None,
            left_writer: None,
            right_writer: None,
        }
    }
}

/// One position in the tree.
///
/// Allocated at construction, lives until the tree is dropped. Only
/// [`Node::state`] and [`Node::visited`] ever change.
#[derive(Debug)]
pub struct Node {
    /// Binary path from the root ("" for the root itself).
    pub(crate) key: Box<str>,

    /// True iff this node sits at the leaf level.
    pub(crate) is_leaf: bool,

    /// Arena index of the parent; `None` for the root.
    pub(crate) parent: Option<usize>,

    /// Arena index of the left child; `None` for leaves.
    pub(crate) left: Option<usize>,

    /// Arena index of the right child; `None` for leaves.
    pub(crate) right: Option<usize>,

    /// Digest and writer bookkeeping, serialized by this lock.
    pub(crate) state: Mutex<NodeState>,

    /// Batch-mode flag: set by the first update walk to arrive at a
    /// conflict node, observed by the second.
    pub(crate) visited: AtomicBool,
}

impl Node {
    pub(crate) fn new(
        key: String,
        is_leaf: bool,
        parent: Option<usize>,
        left: Option<usize>,
        right: Option<usize>,
        digest: Digest,
    ) -> Self {
        Self {
            key: key.into_boxed_str(),
            is_leaf,
            parent,
            left,
            right,
            state: Mutex::new(NodeState::new(digest)),
            visited: AtomicBool::new(false),
        }
    }

    /// Binary path of this node.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this node is a leaf.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.is_leaf
    }
}
