//! # Hashing Utilities
//!
//! Every identifier in the sidechain is derived from one of two constructions,
//! both inherited from the main chain so that hashes agree across the bridge:
//!
//! - **double-SHA-256** — transaction ids, header hashes and merkle nodes.
//!   Applied twice to sidestep SHA-256 length extension.
//!
//! - **HASH160** — `RIPEMD160(SHA256(code))`, the 160-bit digest at the core
//!   of every [`ProgramHash`](crate::transaction::types::ProgramHash).
//!
//! ## Merkle folding
//!
//! [`merkle_root_from_branch`] rebuilds a root from a leaf, its sibling path
//! and its index. The index bits select, level by level, whether the running
//! hash is the left or the right child. An empty branch is the trivial
//! single-leaf tree whose root is the leaf itself.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use sidechain_protocol::crypto::sha256;
///
/// let hash = sha256(b"sidechain");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the double-SHA-256 hash: `SHA-256(SHA-256(data))`.
///
/// # Example
///
/// ```
/// use sidechain_protocol::crypto::double_sha256;
///
/// let tx_id = double_sha256(b"raw transaction bytes");
/// assert_eq!(tx_id.len(), 32);
/// ```
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Double-SHA-256 over several slices without concatenating them first.
pub fn double_sha256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let first = hasher.finalize();
    sha256(&first)
}

/// Compute `RIPEMD160(SHA256(data))`.
///
/// This is the 160-bit digest used for redeem-script identities.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let digest = Ripemd160::digest(sha256(data));
    let mut output = [0u8; 20];
    output.copy_from_slice(&digest);
    output
}

/// Rebuild a merkle root from a leaf hash, its sibling path and its index.
///
/// At every level the lowest remaining bit of `index` decides the side:
/// `0` means the running hash is the left child, `1` the right child.
pub fn merkle_root_from_branch(leaf: [u8; 32], branch: &[[u8; 32]], index: u32) -> [u8; 32] {
    let mut current = leaf;
    let mut index = index;
    for sibling in branch {
        current = if index & 1 == 1 {
            double_sha256_multi(&[sibling.as_slice(), current.as_slice()])
        } else {
            double_sha256_multi(&[current.as_slice(), sibling.as_slice()])
        };
        index >>= 1;
    }
    current
}
