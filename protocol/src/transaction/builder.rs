//! The [`Transaction`] record, its byte codec, and a fluent builder.
//!
//! Transactions are constructed upstream and only inspected by this crate,
//! but tests, benches and the merged-mining generator all need to assemble
//! them, hence [`TransactionBuilder`].
//!
//! ## Canonical bytes
//!
//! The codec is bincode with fixed-width little-endian integers, a size
//! limit and trailing-byte rejection. Decoding then re-encoding any accepted
//! input yields the same bytes.
//!
//! The transaction hash covers everything except `programs`: witnesses are
//! attached after the id is known and must not change it.

use bincode::Options;
use serde::{Deserialize, Serialize};

use super::payload::Payload;
use super::types::{Attribute, Hash256, Input, OutPoint, Output, Program, TransactionType};
use crate::crypto::hash::double_sha256;

/// Maximum encoded size of a transaction accepted by the codec.
pub const MAX_TX_SIZE: u64 = 8 * 1024 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_TX_SIZE)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A sidechain (or main-chain) transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub payload_version: u8,
    pub payload: Payload,
    pub attributes: Vec<Attribute>,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub lock_time: u32,
    /// Redeem scripts and witnesses, in arbitrary order.
    pub programs: Vec<Program>,
}

/// Borrowed view of every field but `programs`. Field order must match
/// [`Transaction`] so the encoding is a strict prefix of the full one.
#[derive(Serialize)]
struct UnsignedView<'a> {
    payload_version: u8,
    payload: &'a Payload,
    attributes: &'a [Attribute],
    inputs: &'a [Input],
    outputs: &'a [Output],
    lock_time: u32,
}

impl Transaction {
    pub fn tx_type(&self) -> TransactionType {
        self.payload.tx_type()
    }

    pub fn is_recharge_to_side_chain_tx(&self) -> bool {
        self.tx_type() == TransactionType::RechargeToSideChain
    }

    pub fn is_register_identification_tx(&self) -> bool {
        self.tx_type() == TransactionType::RegisterIdentification
    }

    pub fn is_side_chain_pow_tx(&self) -> bool {
        self.tx_type() == TransactionType::SideChainPow
    }

    /// Encode into canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        codec().serialize(self)
    }

    /// Decode from canonical bytes. Trailing bytes are an error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        codec().deserialize(bytes)
    }

    /// Bytes covered by the transaction hash and by signatures.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let view = UnsignedView {
            payload_version: self.payload_version,
            payload: &self.payload,
            attributes: &self.attributes,
            inputs: &self.inputs,
            outputs: &self.outputs,
            lock_time: self.lock_time,
        };
        // Only the size limit can fail, and a transaction that large could
        // never have been decoded or built in the first place.
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .serialize(&view)
            .unwrap_or_default()
    }

    /// Transaction hash: `double_sha256(signable_bytes)`.
    pub fn hash(&self) -> Hash256 {
        Hash256(double_sha256(&self.signable_bytes()))
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent construction of a [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    pub fn new(payload: Payload) -> Self {
        Self {
            tx: Transaction {
                payload_version: 0,
                payload,
                attributes: Vec::new(),
                inputs: Vec::new(),
                outputs: Vec::new(),
                lock_time: 0,
                programs: Vec::new(),
            },
        }
    }

    pub fn payload_version(mut self, version: u8) -> Self {
        self.tx.payload_version = version;
        self
    }

    pub fn input(mut self, previous: OutPoint, sequence: u32) -> Self {
        self.tx.inputs.push(Input { previous, sequence });
        self
    }

    pub fn output(mut self, output: Output) -> Self {
        self.tx.outputs.push(output);
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.tx.attributes.push(attribute);
        self
    }

    pub fn program(mut self, program: Program) -> Self {
        self.tx.programs.push(program);
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.tx.lock_time = lock_time;
        self
    }

    pub fn build(self) -> Transaction {
        self.tx
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::payload::{PayloadCoinBase, PayloadRecord};
    use crate::transaction::types::{AttributeUsage, ProgramHash};

    fn sample_tx() -> Transaction {
        TransactionBuilder::new(Payload::Record(PayloadRecord {
            record_type: "memo".to_string(),
            record_data: b"hello".to_vec(),
        }))
        .input(OutPoint::new(Hash256([3; 32]), 1), u32::MAX)
        .output(Output {
            asset_id: Hash256([9; 32]),
            value: 5_000,
            output_lock: 0,
            program_hash: ProgramHash([0x21; 21]),
        })
        .attribute(Attribute::new(AttributeUsage::Nonce, vec![1, 2, 3]))
        .program(Program::new(vec![0xac], vec![0x40]))
        .lock_time(77)
        .build()
    }

    #[test]
    fn codec_roundtrip_is_byte_identical() {
        let tx = sample_tx();
        let bytes = tx.to_bytes().unwrap();
        let decoded = Transaction::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn codec_rejects_trailing_bytes() {
        let mut bytes = sample_tx().to_bytes().unwrap();
        bytes.push(0);
        assert!(Transaction::from_bytes(&bytes).is_err());
    }

    #[test]
    fn codec_rejects_truncated_input() {
        let bytes = sample_tx().to_bytes().unwrap();
        assert!(Transaction::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Transaction::from_bytes(&[]).is_err());
    }

    #[test]
    fn hash_ignores_programs() {
        let tx = sample_tx();
        let mut stripped = tx.clone();
        stripped.programs.clear();
        assert_eq!(tx.hash(), stripped.hash());
    }

    #[test]
    fn hash_covers_lock_time() {
        let tx = sample_tx();
        let mut other = tx.clone();
        other.lock_time += 1;
        assert_ne!(tx.hash(), other.hash());
    }

    #[test]
    fn signable_bytes_prefix_full_encoding() {
        let tx = sample_tx();
        let full = tx.to_bytes().unwrap();
        let signable = tx.signable_bytes();
        assert!(full.starts_with(&signable));
    }

    #[test]
    fn type_predicates() {
        let coinbase = TransactionBuilder::new(Payload::CoinBase(PayloadCoinBase {
            coinbase_data: vec![],
        }))
        .build();
        assert_eq!(coinbase.tx_type(), TransactionType::CoinBase);
        assert!(!coinbase.is_recharge_to_side_chain_tx());
        assert!(!coinbase.is_register_identification_tx());
        assert!(!coinbase.is_side_chain_pow_tx());
    }
}
