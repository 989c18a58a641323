//! Main-chain block headers and the auxiliary proof-of-work they carry.
//!
//! A merged-mined header does not need its own proof-of-work. It points to a
//! parent block whose coinbase commits to the header hash, and the parent's
//! work counts for both chains.

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::AuxPowError;
use crate::config::MERGED_MINING_MARKER;
use crate::crypto::hash::{double_sha256, merkle_root_from_branch};
use crate::transaction::types::Hash256;

/// Fixed-width encoding used for every header and coinbase hash.
pub(crate) fn hashing_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .serialize(value)
        .unwrap_or_default()
}

fn fold_branch(leaf: Hash256, branch: &[Hash256], index: u32) -> Hash256 {
    let branch: Vec<[u8; 32]> = branch.iter().map(|h| h.0).collect();
    Hash256(merkle_root_from_branch(leaf.0, &branch, index))
}

// ---------------------------------------------------------------------------
// Parent block
// ---------------------------------------------------------------------------

/// Header of the parent block that did the actual work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentHeader {
    pub version: u32,
    pub previous: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl ParentHeader {
    pub fn hash(&self) -> Hash256 {
        Hash256(double_sha256(&hashing_bytes(self)))
    }
}

/// Coinbase of the parent block. Its script carries the merged-mining
/// commitment: [`MERGED_MINING_MARKER`] followed by the aux merkle root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentCoinbase {
    pub version: u32,
    pub script: Vec<u8>,
    pub lock_time: u32,
}

impl ParentCoinbase {
    pub fn hash(&self) -> Hash256 {
        Hash256(double_sha256(&hashing_bytes(self)))
    }

    /// The 32 bytes following the merged-mining marker, if present.
    pub fn commitment(&self) -> Option<Hash256> {
        let marker = MERGED_MINING_MARKER.len();
        let start = self
            .script
            .windows(marker)
            .position(|w| w == MERGED_MINING_MARKER)?
            + marker;
        let bytes: [u8; 32] = self.script.get(start..start + 32)?.try_into().ok()?;
        Some(Hash256(bytes))
    }
}

// ---------------------------------------------------------------------------
// AuxPow
// ---------------------------------------------------------------------------

/// Proof that a parent block's work covers a merged-mined header.
///
/// Two merkle paths are involved:
///
/// ```text
/// aux hash ──aux_merkle_branch──▶ aux root ◀── committed in parent coinbase
/// parent coinbase ──parent_merkle_branch──▶ parent_header.merkle_root
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxPow {
    pub aux_merkle_branch: Vec<Hash256>,
    pub aux_merkle_index: u32,
    pub parent_coinbase: ParentCoinbase,
    pub parent_merkle_branch: Vec<Hash256>,
    pub parent_merkle_index: u32,
    pub parent_header: ParentHeader,
}

impl AuxPow {
    /// Verify that this proof commits to `aux_hash`.
    ///
    /// Proof-of-work of the parent header is not checked here.
    pub fn check(&self, aux_hash: Hash256) -> Result<(), AuxPowError> {
        let aux_root = fold_branch(aux_hash, &self.aux_merkle_branch, self.aux_merkle_index);

        let committed = self
            .parent_coinbase
            .commitment()
            .ok_or(AuxPowError::MissingCommitment)?;
        if committed != aux_root {
            return Err(AuxPowError::CommitmentMismatch {
                expected: aux_root,
                actual: committed,
            });
        }

        let parent_root = fold_branch(
            self.parent_coinbase.hash(),
            &self.parent_merkle_branch,
            self.parent_merkle_index,
        );
        if parent_root != self.parent_header.merkle_root {
            return Err(AuxPowError::ParentMerkleMismatch);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// A main-chain block header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub version: u32,
    pub previous: Hash256,
    pub merkle_root: Hash256,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
    pub height: u32,
    pub aux_pow: AuxPow,
}

/// Every header field that is covered by the header hash.
#[derive(Serialize)]
struct HeaderView {
    version: u32,
    previous: Hash256,
    merkle_root: Hash256,
    timestamp: u32,
    bits: u32,
    nonce: u32,
    height: u32,
}

impl Header {
    /// Header hash. `aux_pow` is excluded: it commits to this hash and is
    /// attached afterwards.
    pub fn hash(&self) -> Hash256 {
        let view = HeaderView {
            version: self.version,
            previous: self.previous,
            merkle_root: self.merkle_root,
            timestamp: self.timestamp,
            bits: self.bits,
            nonce: self.nonce,
            height: self.height,
        };
        Hash256(double_sha256(&hashing_bytes(&view)))
    }
}
