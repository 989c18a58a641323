//! Side-chain merged-mining proof construction.
//!
//! [`generate_side_aux_pow`] anchors a sidechain block in a synthetic
//! main-chain header:
//!
//! ```text
//! (side block hash, genesis hash)
//!         │ SideChainPow payload
//!         ▼
//! commitment tx ── hash ──▶ header.merkle_root   (single-leaf tree)
//!                                  │
//!                           header.hash()
//!                                  │ MergedMiningProofGenerator
//!                                  ▼
//!                           header.aux_pow
//! ```

use bincode::Options;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::header::{AuxPow, Header, ParentCoinbase, ParentHeader};
use super::AuxPowError;
use crate::config::{
    MERGED_MINING_MARKER, SIDE_AUX_HEADER_VERSION, SIDE_CHAIN_POW_PAYLOAD_VERSION,
};
use crate::crypto::hash::merkle_root_from_branch;
use crate::transaction::builder::MAX_TX_SIZE;
use crate::transaction::payload::{Payload, PayloadSideChainPow};
use crate::transaction::types::{Hash256, OutPoint};
use crate::transaction::{Transaction, TransactionBuilder};

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_TX_SIZE)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

// ---------------------------------------------------------------------------
// Generator seam
// ---------------------------------------------------------------------------

/// Produces the auxiliary proof that a parent block commits to a header.
pub trait MergedMiningProofGenerator: Send + Sync {
    fn generate(&self, header_hash: Hash256) -> Result<AuxPow, AuxPowError>;
}

/// Fabricates a parent block whose single coinbase commits to the header
/// hash. No proof-of-work is searched for.
#[derive(Debug, Clone, Copy, Default)]
pub struct FabricatedAuxPowGenerator;

impl MergedMiningProofGenerator for FabricatedAuxPowGenerator {
    fn generate(&self, header_hash: Hash256) -> Result<AuxPow, AuxPowError> {
        // marker || aux root || merkle size || merkle nonce
        let mut script = Vec::with_capacity(MERGED_MINING_MARKER.len() + 32 + 8);
        script.extend_from_slice(&MERGED_MINING_MARKER);
        script.extend_from_slice(header_hash.as_bytes());
        script.extend_from_slice(&1u32.to_le_bytes());
        script.extend_from_slice(&0u32.to_le_bytes());

        let parent_coinbase = ParentCoinbase {
            version: 1,
            script,
            lock_time: 0,
        };
        let parent_header = ParentHeader {
            version: SIDE_AUX_HEADER_VERSION,
            previous: Hash256::ZERO,
            merkle_root: parent_coinbase.hash(),
            timestamp: unix_now(),
            bits: 0,
            nonce: 0,
        };

        Ok(AuxPow {
            aux_merkle_branch: Vec::new(),
            aux_merkle_index: 0,
            parent_coinbase,
            parent_merkle_branch: Vec::new(),
            parent_merkle_index: 0,
            parent_header,
        })
    }
}

fn unix_now() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// SideAuxPow
// ---------------------------------------------------------------------------

/// Merged-mining proof for one sidechain block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideAuxPow {
    /// Path from the commitment transaction to `main_block_header.merkle_root`.
    pub side_aux_merkle_branch: Vec<Hash256>,
    pub side_aux_merkle_index: u32,
    /// The `SideChainPow` commitment transaction.
    pub side_aux_block_tx: Transaction,
    /// Header carrying the commitment, with its aux-pow attached.
    pub main_block_header: Header,
}

impl SideAuxPow {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        codec().serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        codec().deserialize(bytes)
    }

    /// Check that this proof anchors `side_block_hash`.
    ///
    /// The commitment transaction must name the block, fold through the
    /// branch to the header's merkle root, and the header's aux-pow must
    /// commit to the header hash.
    pub fn check(&self, side_block_hash: Hash256) -> Result<(), AuxPowError> {
        let Payload::SideChainPow(payload) = &self.side_aux_block_tx.payload else {
            return Err(AuxPowError::NotSideChainPow(self.side_aux_block_tx.tx_type()));
        };
        if payload.side_block_hash != side_block_hash {
            return Err(AuxPowError::CommitmentMismatch {
                expected: side_block_hash,
                actual: payload.side_block_hash,
            });
        }

        let branch: Vec<[u8; 32]> = self.side_aux_merkle_branch.iter().map(|h| h.0).collect();
        let root = merkle_root_from_branch(
            self.side_aux_block_tx.hash().0,
            &branch,
            self.side_aux_merkle_index,
        );
        if Hash256(root) != self.main_block_header.merkle_root {
            return Err(AuxPowError::SideMerkleMismatch);
        }

        self.main_block_header
            .aux_pow
            .check(self.main_block_header.hash())
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Build the commitment transaction for a side-chain proof.
///
/// It spends the null outpoint with sequence zero and carries no attributes
/// or programs; it exists only to give the commitment a hash.
pub fn new_side_chain_pow_tx(payload: PayloadSideChainPow, current_height: u32) -> Transaction {
    TransactionBuilder::new(Payload::SideChainPow(payload))
        .payload_version(SIDE_CHAIN_POW_PAYLOAD_VERSION)
        .input(OutPoint::null(), 0)
        .lock_time(current_height)
        .build()
}

/// Generate the merged-mining proof for a sidechain block, timestamped now.
pub fn generate_side_aux_pow(
    side_block_hash: Hash256,
    side_genesis_hash: Hash256,
    generator: &dyn MergedMiningProofGenerator,
) -> Result<SideAuxPow, AuxPowError> {
    generate_side_aux_pow_at(side_block_hash, side_genesis_hash, unix_now(), generator)
}

/// Generate the merged-mining proof with an explicit header timestamp.
pub fn generate_side_aux_pow_at(
    side_block_hash: Hash256,
    side_genesis_hash: Hash256,
    timestamp: u32,
    generator: &dyn MergedMiningProofGenerator,
) -> Result<SideAuxPow, AuxPowError> {
    let side_aux_block_tx = new_side_chain_pow_tx(
        PayloadSideChainPow {
            side_block_hash,
            side_genesis_hash,
        },
        0,
    );

    let mut main_block_header = Header {
        version: SIDE_AUX_HEADER_VERSION,
        previous: Hash256::ZERO,
        merkle_root: side_aux_block_tx.hash(),
        timestamp,
        bits: 0,
        nonce: 0,
        height: 0,
        aux_pow: AuxPow::default(),
    };
    let header_hash = main_block_header.hash();
    main_block_header.aux_pow = generator.generate(header_hash)?;

    debug!(
        side_block = %side_block_hash,
        header = %header_hash,
        "side aux-pow generated"
    );

    Ok(SideAuxPow {
        side_aux_merkle_branch: Vec::new(),
        side_aux_merkle_index: 0,
        side_aux_block_tx,
        main_block_header,
    })
}
