//! Live (streaming) updater: per-operation writes with cooperative abort.
//!
//! Each incoming update is handled independently. A writer stamps the leaf
//! under its lock, then percolates upward one level at a time, re-checking
//! at every parent whether a newer writer on an overlapping path has asked
//! it to stop (via the [`crate::stop::StopTable`]). Preempted walks return
//! silently: the preempting writer snapshots fresh child digests at every
//! node it finalizes, so it carries the abandoned writer's work upward.
//!
//! # Lock discipline
//!
//! Within one percolation step the order is parent first, then both
//! children briefly for the digest snapshot. Every writer climbs strictly
//! bottom-up holding at most one parent plus its two children, and releases
//! the parent before locking the grandparent, so all held→wanted lock edges
//! point downward and no cycle can form.

use crate::digest::{hash_children, hash_value};
use crate::error::{Result, TreeError};
use crate::node::WriterTag;
use crate::stop::MAX_THREADS;
use crate::tracing_helpers::trace_log;
use crate::tree::SparseMerkleTree;

impl SparseMerkleTree {
    /// Apply one update concurrently, with cooperative preemption.
    ///
    /// `tag` identifies the writer; `tag.seq` values must strictly increase
    /// per `tag.thread_id` and are expected to come from
    /// [`SparseMerkleTree::mint_seq`] so they totally order updates across
    /// threads.
    ///
    /// Returns `Ok(())` both on success and on silent abandonment (a stale
    /// leaf write, or a walk preempted by a newer overlapping writer — the
    /// preempting writer establishes the final state).
    ///
    /// # Errors
    ///
    /// [`TreeError::CapacityExceeded`] when `tag.thread_id` is outside the
    /// stop table; [`TreeError::InvalidKeyLength`] /
    /// [`TreeError::LeafNotFound`] for malformed keys;
    /// [`TreeError::NonLeafUpdate`] on a corrupted skeleton.
    pub fn update_live(&self, key: &str, value: &[u8], tag: WriterTag) -> Result<()> {
        if tag.thread_id >= MAX_THREADS {
            return Err(TreeError::CapacityExceeded {
                requested: tag.thread_id + 1,
                max: MAX_THREADS,
            });
        }

        let mut current = self.leaf_slot(key)?;
        let stop = self.stop_table();

        // Leaf phase, under the leaf's lock.
        {
            let leaf = self.node(current);
            let mut state = leaf.state.lock();
            if !leaf.is_leaf() {
                return Err(TreeError::NonLeafUpdate(key.to_owned()));
            }

            if let Some(prev) = state.last_writer {
                // A later-sequenced write already landed here; this one is
                // stale and must not clobber it.
                if tag.seq <= prev.seq {
                    trace_log!(key, seq = tag.seq, prev_seq = prev.seq, "stale leaf write");
                    return Ok(());
                }
                // Tell the previous writer to abandon its upward walk.
                if prev.thread_id != tag.thread_id {
                    stop.raise(prev.thread_id, prev.seq);
                }
            }

            state.digest = hash_value(value);
            state.last_writer = Some(tag);
        }

        // Percolation phase: one level per iteration, parent lock first.
        while let Some(parent_index) = self.node(current).parent {
            let parent = self.node(parent_index);
            let mut parent_state = parent.state.lock();

            if stop.is_preempted(tag) {
                trace_log!(key, seq = tag.seq, at = parent.key(), "walk preempted");
                return Ok(());
            }

            let (left, right) = self.children_of(parent_index);

            // Redundancy check: the parent already folded in this writer's
            // digest for this child side.
            let from_left = current == left;
            let recorded = if from_left {
                parent_state.left_writer
            } else {
                parent_state.right_writer
            };
            if recorded == Some(tag) {
                return Ok(());
            }

            // Snapshot both children under their locks, then release.
            let (left_digest, left_writer, right_digest, right_writer) = {
                let left_state = self.node(left).state.lock();
                let right_state = self.node(right).state.lock();
                (
                    left_state.digest,
                    left_state.last_writer,
                    right_state.digest,
                    right_state.last_writer,
                )
            };

            // Preempt whichever writer last finalized this parent; this
            // walk carries its digests upward from here.
            if let Some(prev) = parent_state.last_writer {
                if prev.thread_id != tag.thread_id {
                    stop.raise(prev.thread_id, prev.seq);
                }
            }

            parent_state.digest = hash_children(&left_digest, &right_digest);
            parent_state.left_writer = left_writer;
            parent_state.right_writer = right_writer;
            parent_state.last_writer = Some(tag);
            drop(parent_state);

            current = parent_index;
        }

        Ok(())
    }
}
