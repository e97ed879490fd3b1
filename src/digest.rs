//! SHA-256 digests and the node-hash combiners.
//!
//! Every node in the tree carries a [`Digest`]: 32 raw bytes of SHA-256
//! output. Parent digests are computed over the byte-wise concatenation of
//! the left child's digest followed by the right child's. All three updaters
//! (serial, live, batch) go through the same two entry points here, so the
//! encoding can never drift between them.

use std::fmt;

use sha2::{Digest as Sha2Digest, Sha256};

/// Length of a SHA-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A SHA-256 digest as stored on a tree node.
///
/// Compared byte-for-byte. Displayed as lowercase hex.
///
/// # Example
///
/// ```rust
/// use smtree::digest::{hash_value, Digest};
///
/// let d: Digest = hash_value(b"");
/// assert_eq!(
///     d.to_hex(),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Raw digest bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering, e.g. for console output and CSV rows.
    #[inline]
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Hash an arbitrary byte string, e.g. a leaf value.
#[inline]
#[must_use]
pub fn hash_value(value: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(value);
    Digest(hasher.finalize().into())
}

/// Hash a parent node from its children: `SHA-256(left ‖ right)`.
///
/// Child order matters; swapping the children produces a different digest.
#[inline]
#[must_use]
pub fn hash_children(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Digest(hasher.finalize().into())
}

/// Digest of the empty byte string, the default for untouched leaves.
#[inline]
#[must_use]
pub fn empty_leaf() -> Digest {
    hash_value(b"")
}
