//! # ChainDB — Persistent Storage Engine
//!
//! The persistence layer behind the validation path, built on sled's
//! embedded key-value store.
//!
//! ## Tree Layout
//!
//! | Tree             | Key                         | Value                      |
//! |------------------|-----------------------------|----------------------------|
//! | `transactions`   | `tx hash` (32B)             | canonical tx bytes         |
//! | `main_chain_txs` | main-chain tx hash (hex)    | credited-at unix secs (BE) |
//!
//! ## Atomicity
//!
//! Deposit crediting goes through sled's compare-and-swap with an expected
//! old value of "absent". sled serializes concurrent swaps on one key, so
//! exactly one of two racing inserts succeeds.

use sled::{Batch, Db, Tree};
use std::path::Path;

use super::{resolve_references, DepositStore, ReferenceLookup, StoreError, StoreResult};
use crate::transaction::types::{Hash256, Output};
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// ChainDB
// ---------------------------------------------------------------------------

/// Persistent storage for sidechain transactions and credited deposits.
///
/// # Thread Safety
///
/// sled trees support concurrent reads and writes. `ChainDB` is `Clone`
/// (handles share one database) and can be shared via `Arc<ChainDB>`.
#[derive(Debug, Clone)]
pub struct ChainDB {
    db: Db,
    /// Transactions indexed by hash.
    transactions: Tree,
    /// Credited main-chain deposit hashes.
    main_chain_txs: Tree,
}

impl ChainDB {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database, removed when dropped.
    pub fn open_temporary() -> StoreResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> StoreResult<Self> {
        let transactions = db.open_tree("transactions")?;
        let main_chain_txs = db.open_tree("main_chain_txs")?;

        Ok(Self {
            db,
            transactions,
            main_chain_txs,
        })
    }

    // -- Transaction operations ---------------------------------------------

    /// Persist a single transaction under its hash.
    pub fn put_transaction(&self, tx: &Transaction) -> StoreResult<()> {
        let bytes = tx
            .to_bytes()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.transactions.insert(tx.hash().as_bytes(), bytes)?;
        Ok(())
    }

    /// Persist several transactions in one atomic batch.
    pub fn put_transactions(&self, txs: &[Transaction]) -> StoreResult<()> {
        let mut batch = Batch::default();
        for tx in txs {
            let bytes = tx
                .to_bytes()
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            batch.insert(tx.hash().as_bytes(), bytes);
        }
        self.transactions.apply_batch(batch)?;
        Ok(())
    }

    /// Retrieve a transaction by hash.
    pub fn get_transaction(&self, hash: &Hash256) -> StoreResult<Option<Transaction>> {
        match self.transactions.get(hash.as_bytes())? {
            Some(bytes) => {
                let tx = Transaction::from_bytes(&bytes)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(tx))
            }
            None => Ok(None),
        }
    }

    // -- Deposit operations -------------------------------------------------

    /// Unix time (seconds) at which a main-chain deposit was credited.
    pub fn main_chain_tx_credited_at(&self, hash: &str) -> StoreResult<Option<i64>> {
        match self.main_chain_txs.get(hash.as_bytes())? {
            Some(bytes) => {
                let secs = i64::from_be_bytes(bytes.as_ref().try_into().map_err(|_| {
                    StoreError::Serialization("invalid credited-at bytes".to_string())
                })?);
                Ok(Some(secs))
            }
            None => Ok(None),
        }
    }

    // -- Utility operations -------------------------------------------------

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn main_chain_tx_count(&self) -> usize {
        self.main_chain_txs.len()
    }

    /// Block until all pending writes are durable.
    pub fn flush(&self) -> StoreResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

fn credited_at_now() -> [u8; 8] {
    chrono::Utc::now().timestamp().to_be_bytes()
}

impl ReferenceLookup for ChainDB {
    fn get_tx_reference(&self, tx: &Transaction) -> StoreResult<Vec<Output>> {
        resolve_references(tx, |hash| self.get_transaction(hash))
    }
}

impl DepositStore for ChainDB {
    fn has_main_chain_tx(&self, hash: &str) -> StoreResult<bool> {
        Ok(self.main_chain_txs.contains_key(hash.as_bytes())?)
    }

    fn add_main_chain_tx(&self, hash: &str) -> StoreResult<()> {
        self.main_chain_txs
            .insert(hash.as_bytes(), &credited_at_now()[..])?;
        self.db.flush()?;
        Ok(())
    }

    fn insert_main_chain_tx_if_absent(&self, hash: &str) -> StoreResult<bool> {
        let swapped = self.main_chain_txs.compare_and_swap(
            hash.as_bytes(),
            None::<&[u8]>,
            Some(&credited_at_now()[..]),
        )?;
        match swapped {
            Ok(()) => {
                self.db.flush()?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::payload::Payload;
    use crate::transaction::types::{OutPoint, ProgramHash};

    fn funding_tx(owners: &[ProgramHash]) -> Transaction {
        let mut builder = TransactionBuilder::new(Payload::TransferAsset);
        for (i, owner) in owners.iter().enumerate() {
            builder = builder.output(Output {
                asset_id: Hash256([1; 32]),
                value: 100 * (i as i64 + 1),
                output_lock: 0,
                program_hash: *owner,
            });
        }
        builder.build()
    }

    #[test]
    fn open_temporary_database() {
        let db = ChainDB::open_temporary().expect("should create temp db");
        assert_eq!(db.transaction_count(), 0);
        assert_eq!(db.main_chain_tx_count(), 0);
    }

    #[test]
    fn deposits_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let db = ChainDB::open(dir.path()).expect("should open db");
            assert!(db.insert_main_chain_tx_if_absent("abcd").unwrap());
        }
        let db = ChainDB::open(dir.path()).expect("should reopen db");
        assert!(db.has_main_chain_tx("abcd").unwrap());
        assert!(db.main_chain_tx_credited_at("abcd").unwrap().is_some());
    }

    #[test]
    fn store_and_retrieve_transaction() {
        let db = ChainDB::open_temporary().unwrap();
        let tx = funding_tx(&[ProgramHash([0x21; 21])]);

        db.put_transaction(&tx).unwrap();

        let retrieved = db.get_transaction(&tx.hash()).unwrap().expect("tx exists");
        assert_eq!(retrieved, tx);
        assert!(db.get_transaction(&Hash256([0xee; 32])).unwrap().is_none());
    }

    #[test]
    fn reference_lookup_resolves_inputs_in_order() {
        let db = ChainDB::open_temporary().unwrap();
        let alice = ProgramHash([0x21; 21]);
        let bob = ProgramHash([0x12; 21]);
        let funding = funding_tx(&[alice, bob]);
        db.put_transactions(std::slice::from_ref(&funding)).unwrap();

        let spend = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(funding.hash(), 1), 0)
            .input(OutPoint::new(funding.hash(), 0), 0)
            .build();

        let outputs = db.get_tx_reference(&spend).unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].program_hash, bob);
        assert_eq!(outputs[1].program_hash, alice);
    }

    #[test]
    fn reference_lookup_fails_on_unknown_tx_or_index() {
        let db = ChainDB::open_temporary().unwrap();
        let funding = funding_tx(&[ProgramHash([0x21; 21])]);
        db.put_transaction(&funding).unwrap();

        let unknown_tx = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(Hash256([0x42; 32]), 0), 0)
            .build();
        assert!(matches!(
            db.get_tx_reference(&unknown_tx),
            Err(StoreError::NotFound(_))
        ));

        let bad_index = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(funding.hash(), 5), 0)
            .build();
        assert!(matches!(
            db.get_tx_reference(&bad_index),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn insert_if_absent_only_once() {
        let db = ChainDB::open_temporary().unwrap();
        assert!(!db.has_main_chain_tx("feed").unwrap());
        assert!(db.insert_main_chain_tx_if_absent("feed").unwrap());
        assert!(!db.insert_main_chain_tx_if_absent("feed").unwrap());
        assert!(db.has_main_chain_tx("feed").unwrap());
        assert_eq!(db.main_chain_tx_count(), 1);
    }

    #[test]
    fn add_then_insert_if_absent_reports_present() {
        let db = ChainDB::open_temporary().unwrap();
        db.add_main_chain_tx("beef").unwrap();
        assert!(!db.insert_main_chain_tx_if_absent("beef").unwrap());
    }

    #[test]
    fn concurrent_inserts_have_one_winner() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let db = Arc::new(ChainDB::open_temporary().unwrap());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    db.insert_main_chain_tx_if_absent("racing-deposit").unwrap()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("insert thread should not panic"))
            .filter(|inserted| *inserted)
            .count();
        assert_eq!(winners, 1);
    }
}
