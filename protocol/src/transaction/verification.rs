//! Signature verification: pair every required identity with a program and
//! run it.
//!
//! Authorizers may attach programs in any order. Both the required program
//! hashes and the programs (keyed by the hash of their code) are sorted with
//! the same total order, which turns the pairing into a positional zip.
//! Programs whose code hashes collide would break that pairing; nothing
//! guards against it.
//!
//! Deposits from the main chain carry no programs of their own. Their
//! authorization is the SPV inclusion proof instead.

use tracing::debug;

use super::builder::Transaction;
use super::programs::{get_tx_program_hashes, sort_program_hashes, sort_programs, HashedProgram};
use super::types::ProgramHash;
use crate::config::MAX_STEPS;
use crate::error::{ScriptFailure, VerificationError};
use crate::spv::{self, SpvVerifier};
use crate::storage::ReferenceLookup;
use crate::vm::{ExecutionContext, ScriptEngine, VmState};

/// Verify that `tx` is authorized by every identity it touches.
///
/// Cross-chain deposits are delegated to the SPV verifier and nothing else
/// applies to them. Every other transaction runs:
///
/// 1. **Extract** the required program hashes ([`get_tx_program_hashes`]).
/// 2. **Count** — there must be exactly one program per required hash.
/// 3. **Sort** hashes and programs by the same order.
/// 4. **Pair & run** — see [`run_programs`].
///
/// The count is compared before any program code is hashed, so a surplus
/// program is a count mismatch even when its code is invalid.
///
/// # Errors
///
/// The first failing check, as a [`VerificationError`].
pub fn verify_signature(
    tx: &Transaction,
    lookup: &dyn ReferenceLookup,
    engine: &dyn ScriptEngine,
    spv_verifier: &dyn SpvVerifier,
) -> Result<(), VerificationError> {
    if tx.is_recharge_to_side_chain_tx() {
        return spv::verify_transaction(tx, spv_verifier);
    }

    let mut hashes = get_tx_program_hashes(tx, lookup)?;
    check_program_count(hashes.len(), tx.programs.len())?;
    sort_program_hashes(&mut hashes);
    let programs = sort_programs(&tx.programs)?;

    run_programs(tx, &hashes, &programs, engine)
}

/// Run sorted programs against sorted required hashes, position by
/// position.
///
/// Each program must hash to the identity at its position, and its
/// execution must halt cleanly with a single `true` on the stack. The first
/// failing position aborts the whole verification.
pub fn run_programs(
    tx: &Transaction,
    hashes: &[ProgramHash],
    programs: &[HashedProgram<'_>],
    engine: &dyn ScriptEngine,
) -> Result<(), VerificationError> {
    check_program_count(hashes.len(), programs.len())?;

    let signable_data = tx.signable_bytes();

    for (index, (expected, hashed)) in hashes.iter().zip(programs).enumerate() {
        if *expected != hashed.hash {
            return Err(VerificationError::OwnershipMismatch {
                index,
                expected: *expected,
                actual: hashed.hash,
            });
        }

        let context = ExecutionContext {
            transaction: tx,
            program_hash: hashed.hash,
            signable_data: &signable_data,
            max_steps: MAX_STEPS,
        };
        let outcome = engine.execute(&hashed.program.code, &hashed.program.parameter, &context);

        let failure = if outcome.state != VmState::Halt {
            Some(ScriptFailure::NotHalted(outcome.state))
        } else if outcome.stack_depth != 1 {
            Some(ScriptFailure::StackDepth(outcome.stack_depth))
        } else if !outcome.top {
            Some(ScriptFailure::FalseResult)
        } else {
            None
        };

        if let Some(failure) = failure {
            return Err(VerificationError::ScriptExecution {
                index,
                program_hash: hashed.hash,
                failure,
            });
        }
    }

    debug!(
        tx_hash = %tx.hash(),
        programs = programs.len(),
        "transaction programs verified"
    );
    Ok(())
}

fn check_program_count(hashes: usize, programs: usize) -> Result<(), VerificationError> {
    if hashes != programs {
        return Err(VerificationError::CountMismatch { hashes, programs });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
