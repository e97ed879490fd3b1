//! # smtree
//!
//! A fixed-depth sparse Merkle tree with concurrent point updates.
//!
//! The tree is a perfect binary tree of depth `D`, fully materialized at
//! construction: `2^D` leaves initialized to `SHA-256("")` and internal
//! digests computed upward. Leaves are addressed by binary path keys
//! (`'0'`/`'1'` strings of length `D`). Three updaters share the skeleton:
//!
//! - [`SparseMerkleTree::update_serial`] — single-threaded oracle; writes a
//!   leaf and recomputes the path to the root with no locking.
//! - [`SparseMerkleTree::update_live`] — streaming concurrent updater. Each
//!   writer stamps the leaf, then percolates upward under per-node locks;
//!   writers preempted by a newer overlapping writer abandon their walk
//!   cooperatively via a monotone-max stop table.
//! - [`SparseMerkleTree::update_batch`] — conflict-partitioned batch
//!   updater. Updates are sorted, adjacent-key common prefixes mark the
//!   nodes where walks meet, and exactly one walk finalizes each such node.
//!
//! Both parallel updaters converge to the root digest a serial replay of
//! the same updates would produce.
//!
//! ## Concurrency model
//!
//! - Per-node state (digest + writer tags) is guarded by that node's
//!   [`parking_lot::Mutex`]; readers copy digests under the lock and never
//!   observe torn values.
//! - Lock acquisition within one percolation step is parent first, then
//!   both children briefly. Walks climb strictly bottom-up and release the
//!   parent before locking the grandparent, so no lock cycles can form.
//! - Preemption is cooperative: writers check the stop table at every
//!   parent-lock entry and return silently when asked to stop.
//!
//! ## Example
//!
//! ```rust
//! use smtree::{SparseMerkleTree, WriterTag};
//!
//! let tree = SparseMerkleTree::new(8);
//!
//! let seq = tree.mint_seq();
//! tree.update_live("00010011", b"value", WriterTag::new(0, seq))?;
//!
//! let root = tree.root_hash();
//! assert_eq!(root, {
//!     let mut oracle = SparseMerkleTree::new(8);
//!     oracle.update_serial("00010011", b"value")?;
//!     oracle.root_hash()
//! });
//! # Ok::<(), smtree::TreeError>(())
//! ```

pub mod batch;
pub mod digest;
pub mod error;
pub mod key;
pub mod live;
pub mod node;
pub mod ordering;
pub mod pool;
pub mod stats;
pub mod stop;
mod tracing_helpers;
pub mod tree;
pub mod workload;

pub use digest::Digest;
pub use error::{Result, TreeError};
pub use node::WriterTag;
pub use pool::{PoolReport, UpdatePool};
pub use stop::{StopTable, MAX_THREADS};
pub use tree::SparseMerkleTree;
pub use workload::{Operation, WorkloadEvent};
