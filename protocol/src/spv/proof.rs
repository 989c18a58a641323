//! Merkle inclusion proofs for main-chain transactions.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::crypto::hash::merkle_root_from_branch;
use crate::transaction::types::Hash256;

/// Maximum encoded size of a proof. A branch of 64 levels is already far
/// deeper than any real block.
const MAX_PROOF_SIZE: u64 = 64 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PROOF_SIZE)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Proof that a transaction is included in a main-chain block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Hash of the block whose merkle root the branch folds to.
    pub block_hash: Hash256,
    pub height: u32,
    /// Position of the transaction among the block's transactions.
    pub index: u32,
    /// Sibling hashes from the leaf up to (excluding) the root.
    pub branch: Vec<Hash256>,
}

impl MerkleProof {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        codec().serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        codec().deserialize(bytes)
    }

    /// Merkle root obtained by folding `tx_hash` through the branch.
    pub fn root_for(&self, tx_hash: Hash256) -> Hash256 {
        let branch: Vec<[u8; 32]> = self.branch.iter().map(|h| h.0).collect();
        Hash256(merkle_root_from_branch(tx_hash.0, &branch, self.index))
    }

    /// Whether this proof places `tx_hash` under `merkle_root`.
    pub fn proves(&self, tx_hash: Hash256, merkle_root: Hash256) -> bool {
        self.root_for(tx_hash) == merkle_root
    }
}
