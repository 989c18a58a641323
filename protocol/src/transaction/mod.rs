//! # Transaction Module
//!
//! The sidechain transaction model and the checks that decide whether a
//! transaction is authorized by the identities it touches.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Hashes, program hashes, inputs/outputs, attributes, programs
//! payload.rs      — Type-specific payloads (deposits, withdrawals, aux-pow, ...)
//! builder.rs      — Transaction, its canonical encoding, and TransactionBuilder
//! programs.rs     — Required program hash extraction and canonical ordering
//! verification.rs — Pair programs with identities and run them on the engine
//! ```
//!
//! ## Authorization
//!
//! 1. **Extract** — [`get_tx_program_hashes`] collects every identity that
//!    must sign: input owners, `Script` attributes, registered identities.
//! 2. **Sort** — identities and programs are ordered by the same total order
//!    on [`ProgramHash`], so submission order never matters.
//! 3. **Run** — [`verify_signature`] zips the two sequences and requires each
//!    program to hash to its identity and halt with a single `true`.
//!
//! ## Design Decisions
//!
//! - Transaction hashes are `double_sha256` of the canonical encoding with
//!   programs excluded, so attaching signatures never changes the hash.
//! - The transaction type is derived from the payload variant. A mismatch
//!   between the two is unrepresentable.

pub mod builder;
pub mod payload;
pub mod programs;
pub mod types;
pub mod verification;

pub use builder::{Transaction, TransactionBuilder};
pub use payload::Payload;
pub use programs::{get_tx_program_hashes, sort_program_hashes, sort_programs, HashedProgram};
pub use types::{
    Attribute, AttributeUsage, Hash256, Input, OutPoint, Output, Program, ProgramHash,
    TransactionType,
};
pub use verification::{run_programs, verify_signature};
