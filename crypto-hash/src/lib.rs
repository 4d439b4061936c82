//! # crypto-hash
//!
//! A minimal wrapper around BLAKE2b-256, the digest used throughout the KKTP
//! protocol to derive mailbox identifiers and VRF inputs from raw key bytes.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_hash::{hash, hash_concat, HASH_SIZE};
//!
//! let digest = hash(b"hello world");
//! assert_eq!(digest.len(), HASH_SIZE);
//!
//! // Hashing over raw concatenated bytes, never string concatenation,
//! // is what keeps VRF inputs and mailbox IDs unambiguous.
//! let a = hash_concat(&[b"alice", b"bob"]);
//! let b = hash(b"alicebob");
//! assert_eq!(a, b);
//! ```

use blake2::Blake2b;
use blake2::digest::Digest;
use blake2::digest::consts::U32;

/// Output size of BLAKE2b-256 in bytes.
pub const HASH_SIZE: usize = 32;

type Blake2b256 = Blake2b<U32>;

/// Hashes a single byte slice with BLAKE2b-256.
#[must_use]
pub fn hash(input: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Blake2b256::new();
    hasher.update(input);
    let out = hasher.finalize();
    let mut result = [0u8; HASH_SIZE];
    result.copy_from_slice(&out);
    result
}

/// Hashes the raw concatenation of several byte slices with BLAKE2b-256.
///
/// Each part is fed in order with no separator or length prefix; callers that
/// need domain separation between variable-length parts must add their own
/// framing before calling this function. The handshake engine relies on this
/// property to hash `pub_sig || pub_dh || sid` etc. as specified.
#[must_use]
pub fn hash_concat(parts: &[&[u8]]) -> [u8; HASH_SIZE] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let out = hasher.finalize();
    let mut result = [0u8; HASH_SIZE];
    result.copy_from_slice(&out);
    result
}
