//! Error types for transaction authorization and deposit crediting.
//!
//! Every check returns the first [`VerificationError`] it hits. Callers treat
//! any error as outright rejection of the transaction; nothing in this crate
//! retries.

use thiserror::Error;

use crate::storage::StoreError;
use crate::transaction::types::ProgramHash;
use crate::vm::VmState;

/// Why a redeem script failed to authorize its identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptFailure {
    /// The engine stopped in a state other than a clean halt.
    #[error("finish state {0:?} is not HALT")]
    NotHalted(VmState),

    /// The result stack must hold exactly one item.
    #[error("result stack holds {0} items, expected 1")]
    StackDepth(usize),

    /// The single result item is not `true`.
    #[error("signature check returned false")]
    FalseResult,
}

/// Errors raised while authorizing a transaction or crediting a deposit.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// A previous output referenced by an input could not be resolved.
    #[error("reference lookup failed: {reason}")]
    ReferenceLookup { reason: String },

    /// A `Script` attribute does not hold a well-formed program hash.
    #[error("malformed script attribute: {reason}")]
    MalformedAttribute { reason: String },

    /// A program's code has no derivable program hash.
    #[error("invalid program code: {reason}")]
    InvalidProgramCode { reason: String },

    /// The number of required identities differs from the number of programs.
    #[error("{hashes} program hashes required but {programs} programs supplied")]
    CountMismatch { hashes: usize, programs: usize },

    /// The program at `index` does not hash to the identity paired with it.
    #[error("program {index} hashes to {actual}, expected {expected}")]
    OwnershipMismatch {
        index: usize,
        expected: ProgramHash,
        actual: ProgramHash,
    },

    /// The script engine rejected the program at `index`.
    #[error("program {index} for {program_hash} failed: {failure}")]
    ScriptExecution {
        index: usize,
        program_hash: ProgramHash,
        failure: ScriptFailure,
    },

    /// The payload variant does not match what the check expected.
    #[error("invalid payload: expected {expected}")]
    InvalidPayload { expected: &'static str },

    /// Embedded main-chain bytes could not be decoded.
    #[error("deserialize failed: {reason}")]
    Deserialize { reason: String },

    /// The SPV proof does not show the deposit in a trusted main-chain block.
    #[error("cross-chain proof rejected: {reason}")]
    CrossChainProof { reason: String },

    /// This main-chain deposit has already been credited.
    #[error("duplicate deposit of main-chain transaction {main_chain_tx_hash}")]
    DuplicateDeposit { main_chain_tx_hash: String },

    /// The dedup store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
