//! # CLI Interface
//!
//! Defines the command-line argument structure for `sidechain-node` using
//! `clap` derive. Supports four subcommands: `run`, `auxpow`,
//! `deposit-status`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sidechain_protocol::transaction::Hash256;

/// Merged-mined sidechain validation node.
///
/// Tracks trusted main-chain headers over SPV, persists sidechain
/// transactions and credited deposits, and produces merged-mining proofs
/// for sidechain blocks.
#[derive(Parser, Debug)]
#[command(
    name = "sidechain-node",
    about = "Merged-mined sidechain validation node",
    version,
    propagate_version = true
)]
pub struct SidechainNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the sidechain node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Generate the merged-mining proof for a sidechain block and print it
    /// as JSON.
    Auxpow(AuxPowArgs),
    /// Report whether a main-chain deposit has been credited.
    DepositStatus(DepositStatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node configuration file (JSON).
    ///
    /// When omitted, built-in defaults are used.
    #[arg(long, short = 'c', env = "SIDECHAIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory. Overrides `DataDir` from the configuration file.
    #[arg(long, short = 'd', env = "SIDECHAIN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log format, `pretty` or `json`. Overrides `LogFormat` from the
    /// configuration file.
    #[arg(long, env = "SIDECHAIN_LOG_FORMAT")]
    pub log_format: Option<String>,
}

/// Arguments for the `auxpow` subcommand.
#[derive(Parser, Debug)]
pub struct AuxPowArgs {
    /// Hash of the sidechain block to anchor (hex).
    #[arg(long, value_parser = parse_hash)]
    pub block_hash: Hash256,

    /// Genesis hash of the sidechain (hex).
    #[arg(long, value_parser = parse_hash)]
    pub genesis_hash: Hash256,
}

/// Arguments for the `deposit-status` subcommand.
#[derive(Parser, Debug)]
pub struct DepositStatusArgs {
    /// Node data directory.
    #[arg(long, short = 'd', env = "SIDECHAIN_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Main-chain transaction hash (hex).
    #[arg(long, value_parser = parse_hash)]
    pub hash: Hash256,
}

fn parse_hash(s: &str) -> Result<Hash256, String> {
    s.trim_start_matches("0x").parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        SidechainNodeCli::command().debug_assert();
    }

    #[test]
    fn parses_auxpow_hashes() {
        let block = "11".repeat(32);
        let genesis = format!("0x{}", "22".repeat(32));
        let cli = SidechainNodeCli::try_parse_from([
            "sidechain-node",
            "auxpow",
            "--block-hash",
            &block,
            "--genesis-hash",
            &genesis,
        ])
        .unwrap();

        match cli.command {
            Commands::Auxpow(args) => {
                assert_eq!(args.block_hash, Hash256([0x11; 32]));
                assert_eq!(args.genesis_hash, Hash256([0x22; 32]));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn rejects_short_hash() {
        let result = SidechainNodeCli::try_parse_from([
            "sidechain-node",
            "deposit-status",
            "--hash",
            "abcd",
        ]);
        assert!(result.is_err());
    }
}
