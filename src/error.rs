//! Error types for tree operations.

use std::fmt;

/// Result alias for fallible tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors surfaced by updaters, readers, and the worker pool.
///
/// A preempted live-mode walk is *not* an error; it returns `Ok(())` and the
/// preempting writer establishes the final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The key's length does not match the tree depth.
    InvalidKeyLength {
        /// Tree depth, i.e. the required key length.
        expected: usize,
        /// Length of the offending key.
        actual: usize,
    },

    /// No leaf exists for the key (non-binary characters, or an internal
    /// inconsistency in a properly constructed tree).
    LeafNotFound(String),

    /// An updater reached a non-leaf node where a leaf was expected.
    /// Indicates corruption.
    NonLeafUpdate(String),

    /// More workers requested than the stop table can track.
    CapacityExceeded {
        /// Requested worker count.
        requested: usize,
        /// Hard limit ([`crate::stop::MAX_THREADS`]).
        max: usize,
    },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected}, got {actual}")
            }

            Self::LeafNotFound(key) => write!(f, "leaf node not found for key: {key}"),

            Self::NonLeafUpdate(key) => {
                write!(f, "reached non-leaf node while updating leaf: {key}")
            }

            Self::CapacityExceeded { requested, max } => {
                write!(f, "worker count {requested} exceeds maximum of {max}")
            }
        }
    }
}

impl std::error::Error for TreeError {}
