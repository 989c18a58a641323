// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sidechain Protocol — Core Library
//!
//! Validation core of a merged-mined sidechain: it decides whether a
//! transaction is authorized by everyone it claims to spend from, credits
//! main-chain deposits at most once, and builds the merged-mining proofs that
//! anchor sidechain blocks in main-chain work.
//!
//! ## Architecture
//!
//! - **transaction** — The transaction model, its canonical codec, program
//!   hash extraction, and the signature verifier.
//! - **vm** — The script engine seam. The interpreter itself lives elsewhere.
//! - **crosschain** — The deposit guard: one credit per main-chain transaction.
//! - **spv** — Main-chain inclusion proofs and the SPV header service.
//! - **auxpow** — Merged-mining headers, aux-pow proofs and their generator.
//! - **validation** — `TransactionValidator`, the injected validation context.
//! - **storage** — Reference lookup and deposit stores (sled and in-memory).
//! - **crypto** — Hash primitives: SHA-256, HASH160, merkle folding.
//! - **config** — Protocol constants and node configuration.
//!
//! ## Design Philosophy
//!
//! 1. No global state. Every collaborator is passed in.
//! 2. The first failed check rejects the transaction. No partial verdicts.
//! 3. Check-then-insert on shared stores is a single atomic operation.

pub mod auxpow;
pub mod config;
pub mod crosschain;
pub mod crypto;
pub mod error;
pub mod spv;
pub mod storage;
pub mod transaction;
pub mod validation;
pub mod vm;

pub use error::{ScriptFailure, VerificationError};
pub use validation::TransactionValidator;
