//! # Transaction Validator
//!
//! The validation context the rest of the node calls into. It owns handles
//! to every collaborator the checks need and is built once at startup:
//!
//! ```text
//! TransactionValidator
//!   ├── ReferenceLookup  previous outputs of inputs
//!   ├── ScriptEngine     runs redeem scripts
//!   ├── SpvVerifier      main-chain inclusion proofs
//!   └── DepositStore     credited main-chain deposits
//! ```
//!
//! Independent transactions may be validated from many threads at once;
//! the only shared mutable state is the deposit store, whose
//! insert-if-absent is atomic.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::crosschain;
use crate::error::VerificationError;
use crate::spv::SpvVerifier;
use crate::storage::{DepositStore, ReferenceLookup};
use crate::transaction::{verification, Transaction};
use crate::vm::ScriptEngine;

/// Validates transactions against explicitly injected collaborators.
#[derive(Clone)]
pub struct TransactionValidator {
    references: Arc<dyn ReferenceLookup>,
    engine: Arc<dyn ScriptEngine>,
    spv: Arc<dyn SpvVerifier>,
    deposits: Arc<dyn DepositStore>,
}

impl TransactionValidator {
    pub fn new(
        references: Arc<dyn ReferenceLookup>,
        engine: Arc<dyn ScriptEngine>,
        spv: Arc<dyn SpvVerifier>,
        deposits: Arc<dyn DepositStore>,
    ) -> Self {
        Self {
            references,
            engine,
            spv,
            deposits,
        }
    }

    /// Authorization only: programs for ordinary transactions, the SPV
    /// proof for deposits.
    pub fn verify_signature(&self, tx: &Transaction) -> Result<(), VerificationError> {
        verification::verify_signature(
            tx,
            self.references.as_ref(),
            self.engine.as_ref(),
            self.spv.as_ref(),
        )
    }

    /// Deposit guard only. Records the main-chain transaction on success.
    pub fn check_cross_chain_transaction(&self, tx: &Transaction) -> Result<(), VerificationError> {
        crosschain::check_cross_chain_transaction(tx, self.deposits.as_ref())
    }

    /// Full check: authorization first, then the deposit guard.
    ///
    /// A deposit whose proof fails never reaches the guard, so it does not
    /// consume its dedup key.
    pub fn validate(&self, tx: &Transaction) -> Result<(), VerificationError> {
        let result = self
            .verify_signature(tx)
            .and_then(|()| self.check_cross_chain_transaction(tx));

        match &result {
            Ok(()) => debug!(tx_hash = %tx.hash(), tx_type = %tx.tx_type(), "transaction valid"),
            Err(e) => warn!(tx_hash = %tx.hash(), tx_type = %tx.tx_type(), error = %e, "transaction rejected"),
        }
        result
    }
}

impl std::fmt::Debug for TransactionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionValidator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auxpow::Header;
    use crate::config::SpvConfig;
    use crate::spv::{MerkleProof, SpvService};
    use crate::storage::{MemoryDepositStore, MemoryReferenceStore};
    use crate::transaction::payload::{Payload, PayloadCoinBase, PayloadRechargeToSideChain};
    use crate::transaction::TransactionBuilder;
    use crate::vm::{ExecutionContext, ExecutionOutcome};

    struct AcceptAll;

    impl ScriptEngine for AcceptAll {
        fn execute(&self, _: &[u8], _: &[u8], _: &ExecutionContext<'_>) -> ExecutionOutcome {
            ExecutionOutcome::success()
        }
    }

    struct Fixture {
        validator: TransactionValidator,
        spv: Arc<SpvService>,
        deposits: Arc<MemoryDepositStore>,
    }

    fn fixture() -> Fixture {
        let spv = Arc::new(SpvService::new(SpvConfig::default()));
        let deposits = Arc::new(MemoryDepositStore::new());
        let validator = TransactionValidator::new(
            Arc::new(MemoryReferenceStore::new()),
            Arc::new(AcceptAll),
            spv.clone(),
            deposits.clone(),
        );
        Fixture {
            validator,
            spv,
            deposits,
        }
    }

    fn main_chain_tx(tag: u8) -> Transaction {
        TransactionBuilder::new(Payload::CoinBase(PayloadCoinBase {
            coinbase_data: vec![tag],
        }))
        .build()
    }

    fn deposit(spv: &SpvService, main: &Transaction, trusted: bool) -> Transaction {
        let header = Header {
            merkle_root: main.hash(),
            height: 1,
            ..Header::default()
        };
        let block_hash = if trusted {
            spv.headers().insert(header)
        } else {
            header.hash()
        };
        let proof = MerkleProof {
            block_hash,
            height: 1,
            index: 0,
            branch: vec![],
        };
        TransactionBuilder::new(Payload::RechargeToSideChain(PayloadRechargeToSideChain {
            merkle_proof: proof.to_bytes().unwrap(),
            main_chain_transaction: main.to_bytes().unwrap(),
        }))
        .build()
    }

    #[test]
    fn deposit_credited_once() {
        let f = fixture();
        let tx = deposit(&f.spv, &main_chain_tx(1), true);

        f.validator.validate(&tx).unwrap();
        assert!(matches!(
            f.validator.validate(&tx),
            Err(VerificationError::DuplicateDeposit { .. })
        ));
        assert_eq!(f.deposits.len(), 1);
    }

    #[test]
    fn failed_proof_does_not_consume_dedup_key() {
        let f = fixture();
        let main = main_chain_tx(2);

        let untrusted = deposit(&f.spv, &main, false);
        assert!(matches!(
            f.validator.validate(&untrusted),
            Err(VerificationError::CrossChainProof { .. })
        ));
        assert!(f.deposits.is_empty());

        let trusted = deposit(&f.spv, &main, true);
        f.validator.validate(&trusted).unwrap();
    }

    #[test]
    fn ordinary_transaction_skips_guard() {
        let f = fixture();
        let tx = TransactionBuilder::new(Payload::TransferAsset).build();
        f.validator.validate(&tx).unwrap();
        f.validator.validate(&tx).unwrap();
        assert!(f.deposits.is_empty());
    }

    #[test]
    fn validator_is_shareable_across_threads() {
        let f = fixture();
        let tx = deposit(&f.spv, &main_chain_tx(3), true);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let validator = f.validator.clone();
                let tx = tx.clone();
                std::thread::spawn(move || validator.validate(&tx).is_ok())
            })
            .collect();
        let accepted = handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
    }
}
