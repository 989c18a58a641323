//! Transaction payloads.
//!
//! The payload is a tagged union: each variant is one transaction kind, so
//! the kind of a transaction is always [`Payload::tx_type`] and can never
//! disagree with the data it carries.

use serde::{Deserialize, Serialize};

use super::types::{Hash256, TransactionType};

/// Payload of a coinbase transaction: arbitrary miner data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadCoinBase {
    pub coinbase_data: Vec<u8>,
}

/// Commitment of a sidechain block to a merged-mining proof.
///
/// `side_genesis_hash` pins the commitment to one chain identity, so the
/// same proof cannot be replayed onto a different sidechain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadSideChainPow {
    pub side_block_hash: Hash256,
    pub side_genesis_hash: Hash256,
}

/// A main-chain deposit to be credited on the sidechain.
///
/// Both fields are opaque encoded bytes: a [`MerkleProof`] and the
/// main-chain [`Transaction`] it proves.
///
/// [`MerkleProof`]: crate::spv::MerkleProof
/// [`Transaction`]: super::Transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRechargeToSideChain {
    pub merkle_proof: Vec<u8>,
    pub main_chain_transaction: Vec<u8>,
}

/// Withdrawal of sidechain funds to main-chain addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadTransferCrossChainAsset {
    pub cross_chain_addresses: Vec<String>,
    pub output_indexes: Vec<u64>,
    pub cross_chain_amounts: Vec<i64>,
}

/// Registration of a sidechain identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRegisterIdentification {
    pub id: String,
    pub contents: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRegisterAsset {
    pub name: String,
    pub precision: u8,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub record_type: String,
    pub record_data: Vec<u8>,
}

/// Kind-specific transaction data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    CoinBase(PayloadCoinBase),
    RegisterAsset(PayloadRegisterAsset),
    TransferAsset,
    Record(PayloadRecord),
    SideChainPow(PayloadSideChainPow),
    RechargeToSideChain(PayloadRechargeToSideChain),
    TransferCrossChainAsset(PayloadTransferCrossChainAsset),
    RegisterIdentification(PayloadRegisterIdentification),
}

impl Payload {
    pub fn tx_type(&self) -> TransactionType {
        match self {
            Self::CoinBase(_) => TransactionType::CoinBase,
            Self::RegisterAsset(_) => TransactionType::RegisterAsset,
            Self::TransferAsset => TransactionType::TransferAsset,
            Self::Record(_) => TransactionType::Record,
            Self::SideChainPow(_) => TransactionType::SideChainPow,
            Self::RechargeToSideChain(_) => TransactionType::RechargeToSideChain,
            Self::TransferCrossChainAsset(_) => TransactionType::TransferCrossChainAsset,
            Self::RegisterIdentification(_) => TransactionType::RegisterIdentification,
        }
    }
}
