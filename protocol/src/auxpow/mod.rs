//! # Merged Mining
//!
//! Sidechain blocks are secured by main-chain work. Each block carries a
//! [`SideAuxPow`]: a commitment transaction naming the block, a synthetic
//! main-chain header whose merkle root is that commitment, and an [`AuxPow`]
//! proving a parent block commits to the header.
//!
//! ## Architecture
//!
//! ```text
//! header.rs    — Header, AuxPow and the parent block it points at
//! generator.rs — MergedMiningProofGenerator seam and SideAuxPow construction
//! ```

pub mod generator;
pub mod header;

pub use generator::{
    generate_side_aux_pow, generate_side_aux_pow_at, new_side_chain_pow_tx,
    FabricatedAuxPowGenerator, MergedMiningProofGenerator, SideAuxPow,
};
pub use header::{AuxPow, Header, ParentCoinbase, ParentHeader};

use crate::transaction::types::{Hash256, TransactionType};

/// Errors from building or checking merged-mining proofs.
#[derive(Debug, thiserror::Error)]
pub enum AuxPowError {
    #[error("parent coinbase carries no merged-mining commitment")]
    MissingCommitment,

    #[error("commitment names {actual}, expected {expected}")]
    CommitmentMismatch { expected: Hash256, actual: Hash256 },

    #[error("parent coinbase is not in the parent block's merkle tree")]
    ParentMerkleMismatch,

    #[error("commitment transaction is not in the header's merkle tree")]
    SideMerkleMismatch,

    #[error("commitment transaction has type {0}, expected SideChainPow")]
    NotSideChainPow(TransactionType),

    #[error("proof generator failed: {0}")]
    Generator(String),
}
