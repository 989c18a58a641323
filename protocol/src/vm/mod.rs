//! # Script Engine Seam
//!
//! The instruction set and interpreter loop live outside this crate. The
//! signature verifier only needs a verdict per program, so the engine is a
//! trait: hand it a redeem script, its witness and the context it runs in,
//! get back the terminal state and what was left on the result stack.

use serde::{Deserialize, Serialize};

use crate::transaction::types::ProgramHash;
use crate::transaction::Transaction;

/// Terminal state of a script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmState {
    /// Ran to completion.
    Halt,
    /// Aborted on an invalid instruction, stack underflow or step limit.
    Fault,
    /// Stopped at a breakpoint without finishing.
    Break,
}

/// Everything a redeem script may inspect while it runs.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    /// The transaction being authorized.
    pub transaction: &'a Transaction,
    /// The identity this program must prove.
    pub program_hash: ProgramHash,
    /// Bytes signed by the transaction's owners (CHECKSIG operand).
    pub signable_data: &'a [u8],
    /// Instruction budget; exceeding it must end in [`VmState::Fault`].
    pub max_steps: usize,
}

/// What the engine reports after running one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub state: VmState,
    /// Number of items on the evaluation stack.
    pub stack_depth: usize,
    /// Boolean reading of the top stack item, `false` when empty.
    pub top: bool,
}

impl ExecutionOutcome {
    /// A clean halt with a single `true` on the stack.
    pub fn success() -> Self {
        Self {
            state: VmState::Halt,
            stack_depth: 1,
            top: true,
        }
    }
}

/// Executes redeem scripts.
///
/// Implementations must be deterministic and must not perform I/O. They are
/// shared across validation threads.
pub trait ScriptEngine: Send + Sync {
    /// Load `parameter` then `code` and run to completion.
    fn execute(
        &self,
        code: &[u8],
        parameter: &[u8],
        context: &ExecutionContext<'_>,
    ) -> ExecutionOutcome;
}
