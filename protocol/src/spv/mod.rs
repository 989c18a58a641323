//! # SPV Module
//!
//! Simplified payment verification of main-chain deposits. A deposit is
//! only credited if its embedded main-chain transaction is provably
//! included in a main-chain block the SPV service trusts.
//!
//! ## Architecture
//!
//! ```text
//! proof.rs   — MerkleProof and inclusion folding
//! service.rs — SpvService: trusted header index and its sync task
//! ```

pub mod proof;
pub mod service;

pub use proof::MerkleProof;
pub use service::{HeaderStore, SpvService};

use crate::error::VerificationError;
use crate::transaction::payload::Payload;
use crate::transaction::types::Hash256;
use crate::transaction::Transaction;

/// Errors from the SPV service.
#[derive(Debug, thiserror::Error)]
pub enum SpvError {
    #[error("block {0} is not a trusted main-chain block")]
    UnknownBlock(Hash256),

    #[error("proof claims height {actual}, trusted header is at {expected}")]
    HeightMismatch { expected: u32, actual: u32 },

    #[error("merkle branch does not fold to the root of block {0}")]
    MerkleMismatch(Hash256),

    #[error("SPV service stopped")]
    ServiceStopped,
}

/// Checks main-chain inclusion proofs.
pub trait SpvVerifier: Send + Sync {
    /// Succeed only if `proof` places `tx` in a trusted main-chain block.
    fn verify(&self, proof: &MerkleProof, tx: &Transaction) -> Result<(), SpvError>;
}

/// Verify the inclusion proof carried by a deposit transaction.
///
/// Decode failures and verifier rejections both surface as
/// [`VerificationError::CrossChainProof`].
pub fn verify_transaction(
    tx: &Transaction,
    verifier: &dyn SpvVerifier,
) -> Result<(), VerificationError> {
    let Payload::RechargeToSideChain(payload) = &tx.payload else {
        return Err(VerificationError::InvalidPayload {
            expected: "RechargeToSideChain",
        });
    };

    let proof = MerkleProof::from_bytes(&payload.merkle_proof).map_err(|e| {
        VerificationError::CrossChainProof {
            reason: format!("merkle proof deserialize failed: {}", e),
        }
    })?;
    let main_chain_tx = Transaction::from_bytes(&payload.main_chain_transaction).map_err(|e| {
        VerificationError::CrossChainProof {
            reason: format!("main-chain transaction deserialize failed: {}", e),
        }
    })?;

    verifier
        .verify(&proof, &main_chain_tx)
        .map_err(|e| VerificationError::CrossChainProof {
            reason: e.to_string(),
        })
}
