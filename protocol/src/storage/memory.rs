//! In-memory stores.
//!
//! `DashMap` shards its keyspace behind per-shard locks; the entry API holds
//! the shard lock across the presence check and the insert, which is what
//! makes [`MemoryDepositStore::insert_main_chain_tx_if_absent`] atomic.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{resolve_references, DepositStore, ReferenceLookup, StoreResult};
use crate::transaction::types::{Hash256, Output};
use crate::transaction::Transaction;

/// Volatile set of credited main-chain deposits.
#[derive(Debug, Default)]
pub struct MemoryDepositStore {
    credited: DashMap<String, i64>,
}

impl MemoryDepositStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.credited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credited.is_empty()
    }
}

impl DepositStore for MemoryDepositStore {
    fn has_main_chain_tx(&self, hash: &str) -> StoreResult<bool> {
        Ok(self.credited.contains_key(hash))
    }

    fn add_main_chain_tx(&self, hash: &str) -> StoreResult<()> {
        self.credited
            .insert(hash.to_string(), chrono::Utc::now().timestamp());
        Ok(())
    }

    fn insert_main_chain_tx_if_absent(&self, hash: &str) -> StoreResult<bool> {
        match self.credited.entry(hash.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(chrono::Utc::now().timestamp());
                Ok(true)
            }
        }
    }
}

/// Volatile transaction index serving reference lookups.
#[derive(Debug, Default)]
pub struct MemoryReferenceStore {
    transactions: DashMap<Hash256, Transaction>,
}

impl MemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tx: Transaction) {
        self.transactions.insert(tx.hash(), tx);
    }
}

impl ReferenceLookup for MemoryReferenceStore {
    fn get_tx_reference(&self, tx: &Transaction) -> StoreResult<Vec<Output>> {
        resolve_references(tx, |hash| {
            Ok(self.transactions.get(hash).map(|entry| entry.value().clone()))
        })
    }
}
