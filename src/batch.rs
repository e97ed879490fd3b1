//! Batch (conflict-partitioned) updater.
//!
//! A whole batch of `(key, value)` pairs is planned up front: the pairs are
//! sorted by key and the longest common prefix of every adjacent pair marks
//! a *conflict node* — the deepest ancestor shared by both updates' paths.
//! Below its conflict nodes, every update owns its subtree outright and
//! recomputes digests without coordination. At a conflict node the two
//! ascending walks meet: the first arriver flips the node's `visited` flag
//! and stops; the second arriver finds the flag set, recomputes the node
//! from both now-final subtrees, and carries the walk upward. Exactly one
//! walk therefore finalizes each conflict node, and exactly one walk
//! reaches the root.
//!
//! Adjacent-LCP conflict sets have a useful shape: a prefix can be the LCP
//! of at most one adjacency (two adjacencies sharing it would both straddle
//! the same left/right boundary), so once duplicate keys are collapsed in
//! planning, every conflict node sees exactly two arrivals and a single
//! false→true flag transition suffices.

use std::sync::atomic::AtomicUsize;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;

use crate::digest::{hash_children, hash_value};
use crate::error::{Result, TreeError};
use crate::key::{common_prefix, node_index};
use crate::node::NodeState;
use crate::ordering::{COUNTER, VISITED_READ, VISITED_RESET, VISITED_SET};
use crate::stop::MAX_THREADS;
use crate::tracing_helpers::debug_log;
use crate::tree::SparseMerkleTree;

/// One planned update: the leaf's arena slot plus the value digest input.
struct PlannedUpdate<'a> {
    leaf: usize,
    value: &'a [u8],
}

impl SparseMerkleTree {
    /// Apply a batch of updates with `worker_count` threads.
    ///
    /// Order-insensitive: the batch is sorted by key during planning.
    /// Duplicate keys are collapsed to the last in sorted order before
    /// execution (callers that care about a different winner should
    /// deduplicate themselves). Returns the wall clock spent in the
    /// concurrent execution phase.
    ///
    /// # Errors
    ///
    /// [`TreeError::CapacityExceeded`] for a worker count of zero or above
    /// [`MAX_THREADS`]; key validation errors surface from planning before
    /// any leaf is modified.
    pub fn update_batch<K, V>(&self, pairs: &[(K, V)], worker_count: usize) -> Result<Duration>
    where
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        if worker_count == 0 || worker_count > MAX_THREADS {
            return Err(TreeError::CapacityExceeded {
                requested: worker_count,
                max: MAX_THREADS,
            });
        }
        if pairs.is_empty() {
            return Ok(Duration::ZERO);
        }

        // Planning: validate and sort by key, last write wins per key.
        let mut sorted: Vec<(&str, &[u8])> = pairs
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .collect();
        sorted.sort_by_key(|(key, _)| *key);

        let mut updates: Vec<PlannedUpdate<'_>> = Vec::with_capacity(sorted.len());
        let mut conflicts: Vec<usize> = Vec::new();
        for (i, (key, value)) in sorted.iter().enumerate() {
            let leaf = self.leaf_slot(key)?;
            if i + 1 < sorted.len() {
                let next = sorted[i + 1].0;
                if *key == next {
                    // Collapsed duplicate: the later pair carries the value.
                    continue;
                }
                let prefix = common_prefix(key, next);
                // The prefix addresses a node above the leaf level.
                let node = node_index(prefix).ok_or_else(|| TreeError::LeafNotFound((*key).to_owned()))?;
                conflicts.push(node);
            }
            updates.push(PlannedUpdate { leaf, value });
        }
        conflicts.sort_unstable();
        conflicts.dedup();

        for &index in &conflicts {
            self.node(index).visited.store(false, VISITED_RESET);
        }

        debug_log!(
            updates = updates.len(),
            conflicts = conflicts.len(),
            workers = worker_count,
            "batch planned"
        );

        // Execution: workers drain the planned updates via a shared index.
        let next_task = AtomicUsize::new(0);
        let started = Instant::now();

        thread::scope(|scope| {
            for _ in 0..worker_count.min(updates.len()) {
                scope.spawn(|| {
                    loop {
                        let task = next_task.fetch_add(1, COUNTER);
                        let Some(update) = updates.get(task) else {
                            break;
                        };
                        self.apply_batch_update(update, &conflicts);
                    }
                });
            }
        });

        Ok(started.elapsed())
    }

    /// One worker's walk for one update: write the leaf, then ascend.
    fn apply_batch_update(&self, update: &PlannedUpdate<'_>, conflicts: &[usize]) {
        {
            let mut state = self.node(update.leaf).state.lock();
            state.digest = hash_value(update.value);
        }

        let mut current = update.leaf;
        while let Some(parent_index) = self.node(current).parent {
            let parent = self.node(parent_index);
            let state = parent.state.lock();

            if conflicts.binary_search(&parent_index).is_ok() {
                // First arriver parks the combining duty on the flag and
                // stops; the sibling subtree is still in flight.
                if !parent.visited.load(VISITED_READ) {
                    parent.visited.store(true, VISITED_SET);
                    return;
                }
            }

            // Either an exclusively-owned ancestor or a conflict node whose
            // other side is already final: recompute and keep climbing.
            self.recompute_parent(parent_index, state);
            current = parent_index;
        }
    }

    /// Recompute one internal node from its children, with the parent lock
    /// already held (children are locked briefly inside).
    fn recompute_parent(&self, parent_index: usize, mut state: MutexGuard<'_, NodeState>) {
        let (left, right) = self.children_of(parent_index);
        let left_digest = self.node(left).state.lock().digest;
        let right_digest = self.node(right).state.lock().digest;
        state.digest = hash_children(&left_digest, &right_digest);
    }

    /// Node lookup by conflict-prefix path. Used by tests to inspect the
    /// planning result.
    #[cfg(test)]
    pub(crate) fn node_by_path(&self, path: &str) -> Option<&crate::node::Node> {
        let index = node_index(path)?;
        (index < (1 << (self.depth() + 1)) - 1).then(|| self.node(index))
    }
}
