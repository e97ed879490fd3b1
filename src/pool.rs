//! Worker pool: long-lived threads draining an operation queue.
//!
//! The dispatcher side submits [`WorkloadEvent`]s; `worker_count` threads
//! receive them over an unbounded channel and call into the tree — the live
//! updater for updates, the locked readers for reads. Each update draws its
//! sequence number at submit time from the tree's shared counter, so
//! sequence order equals submission order and the live protocol's
//! last-write-wins matches a serial replay of the stream.
//!
//! Shutdown is by queue drain: [`UpdatePool::join`] drops the sender, the
//! workers exit when the channel empties, and the per-worker response-time
//! logs are collected and returned.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::error::{Result, TreeError};
use crate::node::WriterTag;
use crate::ordering::COUNTER;
use crate::stop::MAX_THREADS;
use crate::tracing_helpers::warn_log;
use crate::tree::SparseMerkleTree;
use crate::workload::{Operation, WorkloadEvent};

/// An event paired with the sequence number minted at submission.
struct Job {
    event: WorkloadEvent,
    seq: u64,
}

/// What the pool reports after draining.
#[derive(Debug)]
pub struct PoolReport {
    /// Response times in microseconds, one vector per worker, measured from
    /// each event's arrival stamp to its completion.
    pub response_times_us: Vec<Vec<u64>>,
    /// Operations that returned an error (malformed keys in the stream).
    pub failed_ops: usize,
}

impl PoolReport {
    /// All workers' response times flattened into one vector.
    #[must_use]
    pub fn merged_response_times(self) -> Vec<u64> {
        self.response_times_us.into_iter().flatten().collect()
    }
}

/// A fixed-size pool of workers applying a stream of operations to one tree.
pub struct UpdatePool {
    tree: Arc<SparseMerkleTree>,
    sender: Sender<Job>,
    workers: Vec<JoinHandle<Vec<u64>>>,
    failed: Arc<AtomicUsize>,
}

impl UpdatePool {
    /// Spawn `worker_count` workers against `tree`.
    ///
    /// `anchor` is the instant arrival stamps are relative to; response
    /// times are measured against it.
    ///
    /// # Errors
    ///
    /// [`TreeError::CapacityExceeded`] when `worker_count` is zero or above
    /// [`MAX_THREADS`].
    pub fn new(tree: Arc<SparseMerkleTree>, worker_count: usize, anchor: Instant) -> Result<Self> {
        if worker_count == 0 || worker_count > MAX_THREADS {
            return Err(TreeError::CapacityExceeded {
                requested: worker_count,
                max: MAX_THREADS,
            });
        }

        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let failed = Arc::new(AtomicUsize::new(0));

        let workers = (0..worker_count)
            .map(|thread_id| {
                let tree = Arc::clone(&tree);
                let receiver: Receiver<Job> = receiver.clone();
                let failed = Arc::clone(&failed);
                thread::Builder::new()
                    .name(format!("smtree-worker-{thread_id}"))
                    .spawn(move || worker_loop(&tree, &receiver, thread_id, anchor, &failed))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        Ok(Self {
            tree,
            sender,
            workers,
            failed,
        })
    }

    /// Enqueue one event. Sequence numbers are minted here, in submission
    /// order; call from a single dispatcher thread to keep that order
    /// meaningful.
    pub fn submit(&self, event: WorkloadEvent) {
        let seq = if event.op.is_update() {
            self.tree.mint_seq()
        } else {
            0
        };
        // Receivers outlive the sender; send cannot fail while workers run.
        let _ = self.sender.send(Job { event, seq });
    }

    /// Close the queue, wait for the workers to drain it, and collect the
    /// per-worker response-time logs.
    #[must_use]
    pub fn join(self) -> PoolReport {
        drop(self.sender);
        let response_times_us = self
            .workers
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect();
        PoolReport {
            response_times_us,
            failed_ops: self.failed.load(COUNTER),
        }
    }
}

fn worker_loop(
    tree: &SparseMerkleTree,
    receiver: &Receiver<Job>,
    thread_id: usize,
    anchor: Instant,
    failed: &AtomicUsize,
) -> Vec<u64> {
    let mut response_times = Vec::new();

    while let Ok(job) = receiver.recv() {
        let outcome = match &job.event.op {
            Operation::Update { key, value } => {
                tree.update_live(key, value, WriterTag::new(thread_id, job.seq))
            }
            Operation::ReadRoot => {
                let _ = tree.root_hash();
                Ok(())
            }
            Operation::ReadLeaf { key } => tree.leaf_hash(key).map(|_| ()),
        };

        if let Err(_error) = outcome {
            warn_log!(error = %_error, thread_id, "operation failed");
            failed.fetch_add(1, COUNTER);
        }

        let completed = anchor.elapsed();
        let response = completed.saturating_sub(job.event.arrival);
        response_times.push(response.as_micros() as u64);
    }

    response_times
}
