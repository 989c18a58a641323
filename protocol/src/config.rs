//! # Protocol Configuration & Constants
//!
//! Every magic number of the sidechain core lives here, next to the
//! runtime configuration a node reads at start-up.
//!
//! The prefixes and opcodes are shared with the main chain. Changing them
//! splits the two chains' notion of who owns what, so treat them as frozen.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Program Hash Prefixes
// ---------------------------------------------------------------------------

/// Prefix of a single-signature (CHECKSIG) redeem script hash.
pub const PREFIX_STANDARD: u8 = 0x21;

/// Prefix of an m-of-n (CHECKMULTISIG) redeem script hash.
pub const PREFIX_MULTISIG: u8 = 0x12;

/// Prefix of a cross-chain redeem script hash.
pub const PREFIX_CROSS_CHAIN: u8 = 0x4b;

/// Prefix marking an output that registers a sidechain identity.
pub const PREFIX_REGISTER_ID: u8 = 0x67;

// ---------------------------------------------------------------------------
// Redeem Script Sign Types
// ---------------------------------------------------------------------------

/// Trailing opcode of a standard single-signature script.
pub const OP_CHECKSIG: u8 = 0xac;

/// Trailing opcode of an identity-registration script.
pub const OP_REGISTER_ID: u8 = 0xad;

/// Trailing opcode of a multi-signature script.
pub const OP_CHECKMULTISIG: u8 = 0xae;

/// Trailing opcode of a cross-chain script.
pub const OP_CROSS_CHAIN: u8 = 0xaf;

// ---------------------------------------------------------------------------
// Script Engine
// ---------------------------------------------------------------------------

/// Upper bound on instructions a single program may execute. Guarantees
/// termination of every redeem script.
pub const MAX_STEPS: usize = 1200;

// ---------------------------------------------------------------------------
// Merged Mining
// ---------------------------------------------------------------------------

/// Header version marking a synthetic header fabricated for a sidechain
/// merged-mining commitment. No real main-chain block uses it.
pub const SIDE_AUX_HEADER_VERSION: u32 = 0x7fff_ffff;

/// Marker preceding the auxiliary hash inside a parent coinbase script.
pub const MERGED_MINING_MARKER: [u8; 4] = [0xfa, 0xbe, 0x6d, 0x6d];

/// Version of the commitment transaction payload.
pub const SIDE_CHAIN_POW_PAYLOAD_VERSION: u8 = 0x00;

/// Version of the coinbase payload.
pub const COINBASE_PAYLOAD_VERSION: u8 = 0x04;

// ---------------------------------------------------------------------------
// SPV
// ---------------------------------------------------------------------------

/// Default main-chain network magic the SPV client speaks.
pub const DEFAULT_SPV_MAGIC: u32 = 7_630_401;

/// Default minimum number of outbound SPV peers.
pub const DEFAULT_SPV_MIN_OUTBOUND: usize = 3;

/// Default ceiling on SPV peer connections.
pub const DEFAULT_SPV_MAX_CONNECTIONS: usize = 8;

/// Capacity of the header feed into the SPV service.
pub const SPV_HEADER_CHANNEL_CAPACITY: usize = 1024;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parameters of the SPV client that tracks main-chain headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct SpvConfig {
    /// Main-chain network magic.
    pub magic: u32,
    /// Seed peers, `host:port`.
    pub seed_list: Vec<String>,
    /// Minimum outbound connections to maintain.
    pub min_outbound: usize,
    /// Maximum simultaneous connections.
    pub max_connections: usize,
}

impl Default for SpvConfig {
    fn default() -> Self {
        Self {
            magic: DEFAULT_SPV_MAGIC,
            seed_list: Vec::new(),
            min_outbound: DEFAULT_SPV_MIN_OUTBOUND,
            max_connections: DEFAULT_SPV_MAX_CONNECTIONS,
        }
    }
}

/// Node configuration, read from a JSON file.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NodeConfig {
    /// Directory holding the chain database.
    pub data_dir: PathBuf,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// `pretty` or `json`.
    pub log_format: String,
    /// SPV client parameters.
    pub spv: SpvConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            spv: SpvConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Path of the chain database inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("chain")
    }
}
