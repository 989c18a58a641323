//! The SPV service: a trusted main-chain header index fed by a long-lived
//! sync task.
//!
//! Peer networking is not part of this crate. Whatever talks to main-chain
//! peers pushes validated headers into the channel handed to
//! [`SpvService::run`]; when that feed closes the service stops, and the
//! node treats that as fatal.

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::proof::MerkleProof;
use super::{SpvError, SpvVerifier};
use crate::auxpow::Header;
use crate::config::SpvConfig;
use crate::transaction::types::Hash256;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// HeaderStore
// ---------------------------------------------------------------------------

/// Trusted main-chain headers, indexed by hash.
#[derive(Debug, Default)]
pub struct HeaderStore {
    headers: RwLock<HashMap<Hash256, Header>>,
    best_height: RwLock<u32>,
}

impl HeaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trust `header`. Returns its hash.
    pub fn insert(&self, header: Header) -> Hash256 {
        let hash = header.hash();
        let height = header.height;
        self.headers.write().insert(hash, header);

        let mut best = self.best_height.write();
        if height > *best {
            *best = height;
        }
        hash
    }

    pub fn get(&self, hash: &Hash256) -> Option<Header> {
        self.headers.read().get(hash).cloned()
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.headers.read().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.headers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.read().is_empty()
    }

    pub fn best_height(&self) -> u32 {
        *self.best_height.read()
    }
}

// ---------------------------------------------------------------------------
// SpvService
// ---------------------------------------------------------------------------

/// SPV client state shared between the sync task and validators.
///
/// Constructed explicitly and handed to whoever needs it; share it via
/// `Arc<SpvService>`.
#[derive(Debug)]
pub struct SpvService {
    config: SpvConfig,
    client_id: u64,
    headers: HeaderStore,
}

impl SpvService {
    /// Create a service with a fresh random client id.
    pub fn new(config: SpvConfig) -> Self {
        Self {
            config,
            client_id: rand::random(),
            headers: HeaderStore::new(),
        }
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    pub fn config(&self) -> &SpvConfig {
        &self.config
    }

    pub fn headers(&self) -> &HeaderStore {
        &self.headers
    }

    /// Run the sync task until the header feed closes.
    ///
    /// Never returns `Ok`. The only exit is [`SpvError::ServiceStopped`].
    pub async fn run(&self, mut feed: mpsc::Receiver<Header>) -> Result<(), SpvError> {
        info!(
            client_id = self.client_id,
            magic = self.config.magic,
            seeds = self.config.seed_list.len(),
            min_outbound = self.config.min_outbound,
            max_connections = self.config.max_connections,
            "SPV service started"
        );

        while let Some(header) = feed.recv().await {
            let height = header.height;
            let hash = self.headers.insert(header);
            debug!(%hash, height, "main-chain header trusted");
        }

        warn!(
            headers = self.headers.len(),
            best_height = self.headers.best_height(),
            "SPV header feed closed"
        );
        Err(SpvError::ServiceStopped)
    }
}

impl SpvVerifier for SpvService {
    fn verify(&self, proof: &MerkleProof, tx: &Transaction) -> Result<(), SpvError> {
        let header = self
            .headers
            .get(&proof.block_hash)
            .ok_or(SpvError::UnknownBlock(proof.block_hash))?;

        if header.height != proof.height {
            return Err(SpvError::HeightMismatch {
                expected: header.height,
                actual: proof.height,
            });
        }

        if !proof.proves(tx.hash(), header.merkle_root) {
            return Err(SpvError::MerkleMismatch(proof.block_hash));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SPV_HEADER_CHANNEL_CAPACITY;
    use crate::transaction::payload::{Payload, PayloadCoinBase};
    use crate::transaction::TransactionBuilder;

    fn main_chain_tx() -> Transaction {
        TransactionBuilder::new(Payload::CoinBase(PayloadCoinBase {
            coinbase_data: b"main".to_vec(),
        }))
        .build()
    }

    /// A header whose merkle tree has `tx` as its only leaf.
    fn header_for(tx: &Transaction, height: u32) -> Header {
        Header {
            version: 1,
            merkle_root: tx.hash(),
            height,
            ..Header::default()
        }
    }

    #[test]
    fn header_store_tracks_best_height() {
        let store = HeaderStore::new();
        assert!(store.is_empty());
        let tx = main_chain_tx();
        store.insert(header_for(&tx, 10));
        store.insert(header_for(&tx, 4));
        assert_eq!(store.len(), 2);
        assert_eq!(store.best_height(), 10);
    }

    #[test]
    fn client_ids_are_random() {
        let a = SpvService::new(SpvConfig::default());
        let b = SpvService::new(SpvConfig::default());
        assert_ne!(a.client_id(), b.client_id());
    }

    #[test]
    fn verify_against_trusted_header() {
        let service = SpvService::new(SpvConfig::default());
        let tx = main_chain_tx();
        let block_hash = service.headers().insert(header_for(&tx, 5));

        let proof = MerkleProof {
            block_hash,
            height: 5,
            index: 0,
            branch: vec![],
        };
        service.verify(&proof, &tx).unwrap();

        let wrong_height = MerkleProof { height: 6, ..proof.clone() };
        assert!(matches!(
            service.verify(&wrong_height, &tx),
            Err(SpvError::HeightMismatch { .. })
        ));

        let other = TransactionBuilder::new(Payload::TransferAsset).build();
        assert!(matches!(
            service.verify(&proof, &other),
            Err(SpvError::MerkleMismatch(_))
        ));
    }

    #[test]
    fn unknown_block_is_rejected() {
        let service = SpvService::new(SpvConfig::default());
        let proof = MerkleProof {
            block_hash: Hash256([9; 32]),
            height: 0,
            index: 0,
            branch: vec![],
        };
        assert!(matches!(
            service.verify(&proof, &main_chain_tx()),
            Err(SpvError::UnknownBlock(_))
        ));
    }

    #[tokio::test]
    async fn run_ingests_feed_then_stops() {
        let service = SpvService::new(SpvConfig::default());
        let (tx, rx) = mpsc::channel(SPV_HEADER_CHANNEL_CAPACITY);
        let main = main_chain_tx();

        tx.send(header_for(&main, 1)).await.unwrap();
        tx.send(header_for(&main, 2)).await.unwrap();
        drop(tx);

        let result = service.run(rx).await;
        assert!(matches!(result, Err(SpvError::ServiceStopped)));
        assert_eq!(service.headers().len(), 2);
        assert_eq!(service.headers().best_height(), 2);
    }
}
