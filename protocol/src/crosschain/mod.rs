//! # Cross-Chain Deposit Guard
//!
//! A deposit from the main chain embeds the main-chain transaction that
//! locked the funds. That transaction may be credited on the sidechain at
//! most once, no matter how many sidechain transactions carry it or how
//! concurrently they are validated.
//!
//! The dedup key is the lower-case hex of the embedded transaction's hash.
//! Membership check and insert happen in a single
//! [`DepositStore::insert_main_chain_tx_if_absent`] call.

use tracing::{debug, error};

use crate::error::VerificationError;
use crate::storage::DepositStore;
use crate::transaction::payload::{Payload, PayloadRechargeToSideChain};
use crate::transaction::Transaction;

/// Decode the main-chain transaction embedded in a deposit payload.
pub fn decode_main_chain_transaction(
    payload: &PayloadRechargeToSideChain,
) -> Result<Transaction, VerificationError> {
    Transaction::from_bytes(&payload.main_chain_transaction).map_err(|e| {
        VerificationError::Deserialize {
            reason: format!("main-chain transaction: {}", e),
        }
    })
}

/// Credit the deposit carried by `tx`, or reject it if already credited.
///
/// Non-deposit transactions pass untouched. On success the main-chain
/// transaction hash has been recorded in `store`.
///
/// # Errors
///
/// - [`VerificationError::Deserialize`] if the embedded bytes are malformed.
/// - [`VerificationError::DuplicateDeposit`] if the hash was already
///   recorded.
/// - [`VerificationError::Store`] if the store fails.
pub fn check_cross_chain_transaction(
    tx: &Transaction,
    store: &dyn DepositStore,
) -> Result<(), VerificationError> {
    let Payload::RechargeToSideChain(payload) = &tx.payload else {
        return Ok(());
    };

    let main_chain_tx = decode_main_chain_transaction(payload)?;
    let main_chain_tx_hash = main_chain_tx.hash().to_string();

    if !store.insert_main_chain_tx_if_absent(&main_chain_tx_hash)? {
        error!(
            main_chain_tx = %main_chain_tx_hash,
            side_chain_tx = %tx.hash(),
            "duplicate deposit of main-chain transaction"
        );
        return Err(VerificationError::DuplicateDeposit { main_chain_tx_hash });
    }

    debug!(main_chain_tx = %main_chain_tx_hash, "deposit credited");
    Ok(())
}
