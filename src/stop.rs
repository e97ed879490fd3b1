//! Cooperative preemption: the stop table.
//!
//! One slot per worker thread. Slot `T` holds the largest `seq` that writer
//! `T` has been asked to abandon; a walk carrying tag `(T, s)` is preempted
//! iff `slot[T] >= s`. Slots only ever go up (monotone max), so a late
//! acknowledgment is harmless: the preempted walk re-checks at its next
//! parent-lock entry and returns silently.
//!
//! The table is sized statically at [`MAX_THREADS`] slots; exceeding that is
//! a startup-time configuration error, not something checked per update.

use std::sync::atomic::AtomicU64;

use crate::node::WriterTag;
use crate::ordering::{STOP_CAS_FAILURE, STOP_CAS_SUCCESS, STOP_READ};

/// Maximum number of distinct `thread_id` values the live updater supports.
pub const MAX_THREADS: usize = 64;

/// Monotone-max preemption thresholds, one per worker thread.
#[derive(Debug)]
pub struct StopTable {
    slots: [AtomicU64; MAX_THREADS],
}

impl StopTable {
    /// A table with every threshold at zero (nothing preempted; seq starts
    /// at 1).
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Ask writer `thread_id` to abandon any walk with sequence `<= seq`.
    ///
    /// Monotone: the threshold is only raised, never lowered. Callers pass
    /// tags that were read from node state, so `thread_id` is always in
    /// range.
    pub fn raise(&self, thread_id: usize, seq: u64) {
        let slot = &self.slots[thread_id];
        let mut current = slot.load(STOP_READ);
        while seq > current {
            match slot.compare_exchange_weak(current, seq, STOP_CAS_SUCCESS, STOP_CAS_FAILURE) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// Whether the walk identified by `tag` has been asked to stop.
    #[inline]
    #[must_use]
    pub fn is_preempted(&self, tag: WriterTag) -> bool {
        self.slots[tag.thread_id].load(STOP_READ) >= tag.seq
    }

    /// Current threshold for one worker.
    #[inline]
    #[must_use]
    pub fn threshold(&self, thread_id: usize) -> u64 {
        self.slots[thread_id].load(STOP_READ)
    }
}

impl Default for StopTable {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(loom)]
mod loom_tests {
    //! Loom model of the monotone-max CAS loop.
    //!
    //! Loom explores thread interleavings deterministically; the model
    //! mirrors `StopTable::raise` on loom's atomics since loom cannot
    //! instrument `std` atomics in place.
    //!
    //! Run with: `RUSTFLAGS="--cfg loom" cargo test --lib stop::loom_tests`

    use loom::sync::atomic::{AtomicU64, Ordering};
    use loom::sync::Arc;
    use loom::thread;

    fn raise(slot: &AtomicU64, seq: u64) {
        let mut current = slot.load(Ordering::Acquire);
        while seq > current {
            match slot.compare_exchange_weak(current, seq, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    #[test]
    fn racing_raises_converge_to_max() {
        loom::model(|| {
            let slot = Arc::new(AtomicU64::new(0));

            let a = {
                let slot = Arc::clone(&slot);
                thread::spawn(move || raise(&slot, 3))
            };
            let b = {
                let slot = Arc::clone(&slot);
                thread::spawn(move || raise(&slot, 5))
            };

            a.join().unwrap();
            b.join().unwrap();

            assert_eq!(slot.load(Ordering::Acquire), 5);
        });
    }
}
