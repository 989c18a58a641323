//! # Storage Module
//!
//! The two stores the validation path touches, expressed as traits so the
//! validator never cares what sits behind them:
//!
//! ```text
//! ReferenceLookup — resolves an input's previous output (read-only)
//! DepositStore    — set of main-chain deposits already credited (read-write)
//! ```
//!
//! ## Implementations
//!
//! ```text
//! db.rs     — ChainDB, sled-backed, persistent
//! memory.rs — dashmap-backed stores for tests and ephemeral nodes
//! ```
//!
//! ## Atomicity
//!
//! Two transactions embedding the same main-chain deposit may be validated
//! at the same time. A `has` followed by an `add` lets both observe
//! "absent", so the deposit guard only ever calls
//! [`DepositStore::insert_main_chain_tx_if_absent`], which every
//! implementation performs as one atomic step.

pub mod db;
pub mod memory;

pub use db::ChainDB;
pub use memory::{MemoryDepositStore, MemoryReferenceStore};

use crate::transaction::types::Output;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Store Contracts
// ---------------------------------------------------------------------------

/// Resolves the outputs a transaction's inputs spend.
pub trait ReferenceLookup: Send + Sync {
    /// Return the previous output of every input, in input order.
    ///
    /// Fails with [`StoreError::NotFound`] if any previous transaction or
    /// output index is unknown.
    fn get_tx_reference(&self, tx: &Transaction) -> StoreResult<Vec<Output>>;
}

/// Set of main-chain deposit transaction hashes already credited.
///
/// Keys are the hex strings of main-chain transaction hashes.
pub trait DepositStore: Send + Sync {
    fn has_main_chain_tx(&self, hash: &str) -> StoreResult<bool>;

    /// Record `hash` unconditionally.
    fn add_main_chain_tx(&self, hash: &str) -> StoreResult<()>;

    /// Record `hash` unless already present, as one atomic step.
    ///
    /// Returns `true` if this call inserted it, `false` if it was already
    /// there. Of any number of concurrent calls with the same hash, exactly
    /// one returns `true`.
    fn insert_main_chain_tx_if_absent(&self, hash: &str) -> StoreResult<bool>;
}

/// Look up `tx`'s references by fetching each previous transaction.
pub(crate) fn resolve_references<F>(tx: &Transaction, mut fetch: F) -> StoreResult<Vec<Output>>
where
    F: FnMut(&crate::transaction::types::Hash256) -> StoreResult<Option<Transaction>>,
{
    let mut outputs = Vec::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        let previous = fetch(&input.previous.tx_id)?.ok_or_else(|| {
            StoreError::NotFound(format!("transaction {}", input.previous.tx_id))
        })?;
        let output = previous
            .outputs
            .get(input.previous.index as usize)
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "output {} of transaction {}",
                    input.previous.index, input.previous.tx_id
                ))
            })?;
        outputs.push(*output);
    }
    Ok(outputs)
}
