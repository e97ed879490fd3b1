//! Standard memory orderings for the crate's atomics.
//!
//! These constants keep ordering usage consistent across the codebase and
//! make the intent clear at each access point. Per-node digest state is
//! guarded by mutexes; atomics are only used for the stop table, the batch
//! `visited` flags, and plain task/sequence counters.

use std::sync::atomic::Ordering;

/// Ordering for reading a stop-table slot at a preemption checkpoint.
/// Pairs with the Release half of [`STOP_CAS_SUCCESS`].
pub const STOP_READ: Ordering = Ordering::Acquire;

/// Ordering for a successful stop-table monotone-max CAS.
pub const STOP_CAS_SUCCESS: Ordering = Ordering::AcqRel;

/// Ordering for a failed stop-table CAS. Only needs the current value.
pub const STOP_CAS_FAILURE: Ordering = Ordering::Acquire;

/// Ordering for reading a `visited` flag while holding the node lock.
pub const VISITED_READ: Ordering = Ordering::Acquire;

/// Ordering for setting a `visited` flag (first arriver, under the node lock).
pub const VISITED_SET: Ordering = Ordering::Release;

/// Ordering for resetting `visited` flags during batch planning.
/// Planning is single-threaded and precedes worker spawn.
pub const VISITED_RESET: Ordering = Ordering::Relaxed;

/// Ordering for plain counters: batch task index, sequence minting.
/// These carry no data dependencies of their own.
pub const COUNTER: Ordering = Ordering::Relaxed;
