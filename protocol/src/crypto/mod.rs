//! # Cryptographic Primitives
//!
//! Hash constructions shared with the main chain. Signature checking is not
//! done here: redeem scripts carry their own CHECKSIG opcodes and run inside
//! the [`ScriptEngine`](crate::vm::ScriptEngine).

pub mod hash;

pub use hash::{double_sha256, double_sha256_multi, hash160, merkle_root_from_branch, sha256};
