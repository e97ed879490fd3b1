//! Operation records and random workload generation.
//!
//! The core consumes a stream of [`Operation`]s; this module is the
//! request-generation collaborator that produces them. A workload is a
//! vector of arrival-stamped events: update keys are uniform random bit
//! strings of the tree's depth, values are short random decimal strings,
//! and reads split evenly between the root and a random leaf.
//! Inter-arrival gaps are drawn from an exponential distribution so bursts
//! and lulls both occur, as in an open-loop request stream.

use std::time::Duration;

use rand::Rng;
use rand_distr::{Distribution, Exp};

use crate::key::leaf_key;

/// Mean inter-arrival gap of the generated request stream.
pub const DEFAULT_MEAN_GAP: Duration = Duration::from_micros(20);

/// One request consumed by the core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Replace the value of the leaf at `key`.
    Update {
        /// Binary leaf key of length `depth`.
        key: String,
        /// Raw value bytes; the leaf digest becomes `H(value)`.
        value: Vec<u8>,
    },
    /// Read the root digest.
    ReadRoot,
    /// Read the digest of the leaf at `key`.
    ReadLeaf {
        /// Binary leaf key of length `depth`.
        key: String,
    },
}

impl Operation {
    /// Whether this operation mutates the tree.
    #[inline]
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self, Self::Update { .. })
    }
}

/// An [`Operation`] stamped with its arrival offset from workload start.
#[derive(Clone, Debug)]
pub struct WorkloadEvent {
    /// Arrival time relative to the start of the stream.
    pub arrival: Duration,
    /// The request itself.
    pub op: Operation,
}

/// Draw one random operation.
///
/// With probability `read_percent / 100` the operation is a read, split
/// 50/50 between the root and a uniformly random leaf; otherwise it is an
/// update of a uniformly random leaf to a small random decimal value.
pub fn random_operation<R: Rng>(rng: &mut R, depth: usize, read_percent: f64) -> Operation {
    let leaf_count = 1usize << depth;
    if rng.gen_range(0.0..100.0) < read_percent {
        if rng.gen_bool(0.5) {
            Operation::ReadRoot
        } else {
            Operation::ReadLeaf {
                key: leaf_key(depth, rng.gen_range(0..leaf_count)),
            }
        }
    } else {
        Operation::Update {
            key: leaf_key(depth, rng.gen_range(0..leaf_count)),
            value: rng.gen_range(0..1000u32).to_string().into_bytes(),
        }
    }
}

/// Generate an arrival-stamped stream of `total_ops` operations.
///
/// Arrival offsets accumulate exponential gaps with the given mean, so the
/// stream can be replayed in real time by sleeping until each stamp.
pub fn generate_workload<R: Rng>(
    rng: &mut R,
    depth: usize,
    total_ops: usize,
    read_percent: f64,
    mean_gap: Duration,
) -> Vec<WorkloadEvent> {
    // A zero mean gap degenerates to all-at-once arrivals.
    let gap_dist = Exp::new(1.0 / mean_gap.as_secs_f64()).ok();

    let mut stream = Vec::with_capacity(total_ops);
    let mut clock = Duration::ZERO;
    for _ in 0..total_ops {
        stream.push(WorkloadEvent {
            arrival: clock,
            op: random_operation(rng, depth, read_percent),
        });
        if let Some(dist) = &gap_dist {
            clock += Duration::from_secs_f64(dist.sample(rng));
        }
    }
    stream
}
