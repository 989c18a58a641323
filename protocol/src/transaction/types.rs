//! Core value types for sidechain transactions.
//!
//! These are the fixed-width hashes and small records every transaction is
//! assembled from. Most are `Copy` so the validation path can pass them
//! around without touching the heap.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::config::{
    OP_CHECKMULTISIG, OP_CHECKSIG, OP_CROSS_CHAIN, OP_REGISTER_ID, PREFIX_CROSS_CHAIN,
    PREFIX_MULTISIG, PREFIX_REGISTER_ID, PREFIX_STANDARD,
};
use crate::crypto::hash::hash160;
use crate::error::VerificationError;

// ---------------------------------------------------------------------------
// Hash256
// ---------------------------------------------------------------------------

/// A 256-bit hash: transaction ids, block hashes, merkle nodes.
///
/// Serializes as raw bytes in binary formats and as hex in human-readable
/// ones (JSON).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The all-zero hash. Used as the previous hash of synthetic headers and
    /// as the txid of the null outpoint.
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| format!("invalid hex: {e}"))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))?;
        Ok(Self(array))
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self)
        }
    }
}

// ---------------------------------------------------------------------------
// ProgramHash
// ---------------------------------------------------------------------------

/// Width of a [`ProgramHash`] in bytes: one prefix byte plus HASH160.
pub const PROGRAM_HASH_SIZE: usize = 21;

/// Identity of an owner or redeem script.
///
/// Layout: `prefix || RIPEMD160(SHA256(code))`. The prefix encodes the
/// script's sign type, which lets an output declare what kind of program
/// may spend it.
///
/// # Ordering
///
/// Program hashes order as little-endian unsigned integers: the last byte is
/// the most significant. The signature verifier sorts both the required
/// hashes and the supplied programs with this order to pair them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProgramHash(pub [u8; PROGRAM_HASH_SIZE]);

impl ProgramHash {
    /// Derive the program hash of a redeem script.
    ///
    /// The prefix is chosen from the script's trailing opcode.
    ///
    /// # Errors
    ///
    /// [`VerificationError::InvalidProgramCode`] for empty code or an
    /// unrecognized trailing opcode.
    pub fn from_code(code: &[u8]) -> Result<Self, VerificationError> {
        let sign_type = code
            .last()
            .ok_or_else(|| VerificationError::InvalidProgramCode {
                reason: "empty program code".to_string(),
            })?;

        let prefix = match *sign_type {
            OP_CHECKSIG => PREFIX_STANDARD,
            OP_CHECKMULTISIG => PREFIX_MULTISIG,
            OP_CROSS_CHAIN => PREFIX_CROSS_CHAIN,
            OP_REGISTER_ID => PREFIX_REGISTER_ID,
            other => {
                return Err(VerificationError::InvalidProgramCode {
                    reason: format!("unknown sign type 0x{other:02x}"),
                })
            }
        };

        Ok(Self::with_prefix(prefix, hash160(code)))
    }

    /// Assemble a program hash from its prefix and 160-bit digest.
    pub fn with_prefix(prefix: u8, digest: [u8; 20]) -> Self {
        let mut bytes = [0u8; PROGRAM_HASH_SIZE];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(&digest);
        Self(bytes)
    }

    /// Decode a program hash from raw bytes, which must be exactly
    /// [`PROGRAM_HASH_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; PROGRAM_HASH_SIZE] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn prefix(&self) -> u8 {
        self.0[0]
    }

    pub fn as_bytes(&self) -> &[u8; PROGRAM_HASH_SIZE] {
        &self.0
    }
}

impl Ord for ProgramHash {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.iter().rev().cmp(other.0.iter().rev())
    }
}

impl PartialOrd for ProgramHash {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ProgramHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramHash({})", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// Inputs & Outputs
// ---------------------------------------------------------------------------

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_id: Hash256,
    pub index: u16,
}

impl OutPoint {
    pub fn new(tx_id: Hash256, index: u16) -> Self {
        Self { tx_id, index }
    }

    /// The null outpoint: zero txid, index zero. Coinbase-style
    /// transactions reference it because they spend nothing.
    pub fn null() -> Self {
        Self {
            tx_id: Hash256::ZERO,
            index: 0,
        }
    }

    pub fn is_null(&self) -> bool {
        self.tx_id.is_zero() && self.index == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Input {
    pub previous: OutPoint,
    pub sequence: u32,
}

/// A transaction output. `program_hash` names the identity that must
/// authorize spending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub asset_id: Hash256,
    pub value: i64,
    pub output_lock: u32,
    pub program_hash: ProgramHash,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// Usage tag of a transaction attribute. Encoded as its one-byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum AttributeUsage {
    Nonce = 0x00,
    /// Data carries a program hash that must also sign the transaction.
    Script = 0x20,
    DescriptionUrl = 0x81,
    Description = 0x90,
    Memo = 0x91,
    Confirmations = 0x92,
}

impl From<AttributeUsage> for u8 {
    fn from(usage: AttributeUsage) -> Self {
        usage as u8
    }
}

impl TryFrom<u8> for AttributeUsage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(AttributeUsage::Nonce),
            0x20 => Ok(AttributeUsage::Script),
            0x81 => Ok(AttributeUsage::DescriptionUrl),
            0x90 => Ok(AttributeUsage::Description),
            0x91 => Ok(AttributeUsage::Memo),
            0x92 => Ok(AttributeUsage::Confirmations),
            _ => Err(format!("unknown attribute usage 0x{value:02x}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub usage: AttributeUsage,
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn new(usage: AttributeUsage, data: Vec<u8>) -> Self {
        Self { usage, data }
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// A redeem script (`code`) and its witness (`parameter`).
///
/// `ProgramHash::from_code(code)` must equal the identity it authorizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub code: Vec<u8>,
    pub parameter: Vec<u8>,
}

impl Program {
    pub fn new(code: Vec<u8>, parameter: Vec<u8>) -> Self {
        Self { code, parameter }
    }

    pub fn program_hash(&self) -> Result<ProgramHash, VerificationError> {
        ProgramHash::from_code(&self.code)
    }
}

// ---------------------------------------------------------------------------
// TransactionType
// ---------------------------------------------------------------------------

/// Kind of a transaction, derived from its payload variant. Encoded as its
/// one-byte type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum TransactionType {
    CoinBase = 0x00,
    RegisterAsset = 0x01,
    TransferAsset = 0x02,
    Record = 0x03,
    SideChainPow = 0x05,
    RechargeToSideChain = 0x06,
    TransferCrossChainAsset = 0x08,
    RegisterIdentification = 0x09,
}

impl From<TransactionType> for u8 {
    fn from(kind: TransactionType) -> Self {
        kind as u8
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TransactionType::CoinBase),
            0x01 => Ok(TransactionType::RegisterAsset),
            0x02 => Ok(TransactionType::TransferAsset),
            0x03 => Ok(TransactionType::Record),
            0x05 => Ok(TransactionType::SideChainPow),
            0x06 => Ok(TransactionType::RechargeToSideChain),
            0x08 => Ok(TransactionType::TransferCrossChainAsset),
            0x09 => Ok(TransactionType::RegisterIdentification),
            _ => Err(format!("unknown transaction type 0x{value:02x}")),
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CoinBase => write!(f, "CoinBase"),
            Self::RegisterAsset => write!(f, "RegisterAsset"),
            Self::TransferAsset => write!(f, "TransferAsset"),
            Self::Record => write!(f, "Record"),
            Self::SideChainPow => write!(f, "SideChainPow"),
            Self::RechargeToSideChain => write!(f, "RechargeToSideChain"),
            Self::TransferCrossChainAsset => write!(f, "TransferCrossChainAsset"),
            Self::RegisterIdentification => write!(f, "RegisterIdentification"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
