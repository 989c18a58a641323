//! Program hash extraction and canonical ordering.
//!
//! A transaction needs one authorizing program per distinct identity it
//! touches. [`get_tx_program_hashes`] collects those identities;
//! [`sort_programs`] orders the supplied programs by the hash of their code
//! so they line up index-for-index with the sorted identities.

use std::collections::HashSet;

use super::builder::Transaction;
use super::types::{AttributeUsage, Program, ProgramHash};
use crate::config::PREFIX_REGISTER_ID;
use crate::error::VerificationError;
use crate::storage::ReferenceLookup;

/// Collect the distinct identities that must authorize `tx`.
///
/// Sources, in order:
///
/// 1. the owner of every output spent by an input,
/// 2. the program hash carried by every `Script` attribute,
/// 3. for identity registrations, the first output whose hash carries the
///    registered-identity prefix.
///
/// The result is deduplicated; its order is unspecified.
///
/// # Errors
///
/// - [`VerificationError::ReferenceLookup`] if an input's previous output
///   cannot be resolved.
/// - [`VerificationError::MalformedAttribute`] if a `Script` attribute is
///   not exactly one program hash wide.
pub fn get_tx_program_hashes(
    tx: &Transaction,
    lookup: &dyn ReferenceLookup,
) -> Result<Vec<ProgramHash>, VerificationError> {
    let references =
        lookup
            .get_tx_reference(tx)
            .map_err(|e| VerificationError::ReferenceLookup {
                reason: e.to_string(),
            })?;

    let mut unique: HashSet<ProgramHash> = references
        .iter()
        .map(|output| output.program_hash)
        .collect();

    for attribute in &tx.attributes {
        if attribute.usage != AttributeUsage::Script {
            continue;
        }
        let hash = ProgramHash::from_bytes(&attribute.data).ok_or_else(|| {
            VerificationError::MalformedAttribute {
                reason: format!(
                    "script attribute holds {} bytes, expected {}",
                    attribute.data.len(),
                    super::types::PROGRAM_HASH_SIZE
                ),
            }
        })?;
        unique.insert(hash);
    }

    if tx.is_register_identification_tx() {
        if let Some(output) = tx
            .outputs
            .iter()
            .find(|output| output.program_hash.prefix() == PREFIX_REGISTER_ID)
        {
            unique.insert(output.program_hash);
        }
    }

    Ok(unique.into_iter().collect())
}

/// Sort identities ascending by [`ProgramHash`] order.
pub fn sort_program_hashes(hashes: &mut [ProgramHash]) {
    hashes.sort();
}

/// A program paired with the hash of its code.
#[derive(Debug, Clone, Copy)]
pub struct HashedProgram<'a> {
    pub hash: ProgramHash,
    pub program: &'a Program,
}

/// Hash every program's code and sort ascending by that hash.
///
/// Each code hash is computed once. The sort is stable, so two programs with
/// colliding code hashes keep their submission order.
///
/// # Errors
///
/// [`VerificationError::InvalidProgramCode`] if any code has no program hash.
pub fn sort_programs(programs: &[Program]) -> Result<Vec<HashedProgram<'_>>, VerificationError> {
    let mut hashed = programs
        .iter()
        .map(|program| {
            Ok(HashedProgram {
                hash: program.program_hash()?,
                program,
            })
        })
        .collect::<Result<Vec<_>, VerificationError>>()?;
    hashed.sort_by_key(|p| p.hash);
    Ok(hashed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OP_CHECKSIG, OP_REGISTER_ID, PREFIX_STANDARD};
    use crate::storage::MemoryReferenceStore;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::payload::{Payload, PayloadRegisterIdentification};
    use crate::transaction::types::{Attribute, Hash256, OutPoint, Output};

    fn owner(seed: u8) -> ProgramHash {
        ProgramHash::with_prefix(PREFIX_STANDARD, [seed; 20])
    }

    fn output_to(hash: ProgramHash) -> Output {
        Output {
            asset_id: Hash256::ZERO,
            value: 10,
            output_lock: 0,
            program_hash: hash,
        }
    }

    fn funded_store(owners: &[ProgramHash]) -> (MemoryReferenceStore, Hash256) {
        let mut builder = TransactionBuilder::new(Payload::TransferAsset);
        for o in owners {
            builder = builder.output(output_to(*o));
        }
        let funding = builder.build();
        let hash = funding.hash();
        let store = MemoryReferenceStore::new();
        store.insert(funding);
        (store, hash)
    }

    #[test]
    fn collects_input_owners_once() {
        let (store, funding) = funded_store(&[owner(1), owner(1), owner(2)]);
        let tx = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(funding, 0), 0)
            .input(OutPoint::new(funding, 1), 0)
            .input(OutPoint::new(funding, 2), 0)
            .build();

        let mut hashes = get_tx_program_hashes(&tx, &store).unwrap();
        sort_program_hashes(&mut hashes);
        let mut expected = vec![owner(1), owner(2)];
        expected.sort();
        assert_eq!(hashes, expected);
    }

    #[test]
    fn includes_script_attributes() {
        let (store, funding) = funded_store(&[owner(1)]);
        let tx = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(funding, 0), 0)
            .attribute(Attribute::new(AttributeUsage::Script, owner(3).0.to_vec()))
            .attribute(Attribute::new(AttributeUsage::Memo, vec![0xff; 4]))
            .build();

        let hashes: HashSet<_> = get_tx_program_hashes(&tx, &store)
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(hashes, HashSet::from([owner(1), owner(3)]));
    }

    #[test]
    fn rejects_malformed_script_attribute() {
        let store = MemoryReferenceStore::new();
        let tx = TransactionBuilder::new(Payload::TransferAsset)
            .attribute(Attribute::new(AttributeUsage::Script, vec![0x21; 20]))
            .build();

        assert!(matches!(
            get_tx_program_hashes(&tx, &store),
            Err(VerificationError::MalformedAttribute { .. })
        ));
    }

    #[test]
    fn rejects_unresolvable_input() {
        let store = MemoryReferenceStore::new();
        let tx = TransactionBuilder::new(Payload::TransferAsset)
            .input(OutPoint::new(Hash256([7; 32]), 0), 0)
            .build();

        assert!(matches!(
            get_tx_program_hashes(&tx, &store),
            Err(VerificationError::ReferenceLookup { .. })
        ));
    }

    #[test]
    fn registration_adds_first_register_id_output() {
        let store = MemoryReferenceStore::new();
        let first_id = ProgramHash::from_code(&[0x01, OP_REGISTER_ID]).unwrap();
        let second_id = ProgramHash::from_code(&[0x02, OP_REGISTER_ID]).unwrap();
        let tx = TransactionBuilder::new(Payload::RegisterIdentification(
            PayloadRegisterIdentification {
                id: "side-id".to_string(),
                contents: vec![],
            },
        ))
        .output(output_to(owner(5)))
        .output(output_to(first_id))
        .output(output_to(second_id))
        .build();

        let hashes = get_tx_program_hashes(&tx, &store).unwrap();
        assert_eq!(hashes, vec![first_id]);
    }

    #[test]
    fn non_registration_ignores_register_id_outputs() {
        let store = MemoryReferenceStore::new();
        let id = ProgramHash::from_code(&[0x01, OP_REGISTER_ID]).unwrap();
        let tx = TransactionBuilder::new(Payload::TransferAsset)
            .output(output_to(id))
            .build();

        assert!(get_tx_program_hashes(&tx, &store).unwrap().is_empty());
    }

    #[test]
    fn sort_programs_orders_by_code_hash() {
        let programs: Vec<Program> = (0u8..6)
            .map(|i| Program::new(vec![i, OP_CHECKSIG], vec![i]))
            .collect();

        let sorted = sort_programs(&programs).unwrap();
        assert_eq!(sorted.len(), programs.len());
        for pair in sorted.windows(2) {
            assert!(pair[0].hash <= pair[1].hash);
        }
        for hashed in &sorted {
            assert_eq!(hashed.hash, hashed.program.program_hash().unwrap());
        }
    }

    #[test]
    fn sort_programs_rejects_invalid_code() {
        let programs = vec![
            Program::new(vec![0x01, OP_CHECKSIG], vec![]),
            Program::new(vec![], vec![]),
        ];
        assert!(matches!(
            sort_programs(&programs),
            Err(VerificationError::InvalidProgramCode { .. })
        ));
    }
}
