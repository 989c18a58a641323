// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Sidechain Node
//!
//! Entry point for the `sidechain-node` binary. Parses CLI arguments,
//! initializes logging, opens the chain database and runs the SPV service.
//!
//! The binary supports four subcommands:
//!
//! - `run`            — start the node
//! - `auxpow`         — print the merged-mining proof for a sidechain block
//! - `deposit-status` — check whether a main-chain deposit was credited
//! - `version`        — print build version information

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;

use sidechain_protocol::auxpow::{generate_side_aux_pow, FabricatedAuxPowGenerator};
use sidechain_protocol::config::{NodeConfig, SPV_HEADER_CHANNEL_CAPACITY};
use sidechain_protocol::spv::SpvService;
use sidechain_protocol::storage::{ChainDB, DepositStore};

use cli::{Commands, SidechainNodeCli};
use logging::LogFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = SidechainNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Auxpow(args) => print_aux_pow(args),
        Commands::DepositStatus(args) => print_deposit_status(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the node: chain database plus the SPV sync task.
///
/// The SPV task stopping for any reason is fatal: the process exits with a
/// non-zero status instead of validating deposits against a stale header
/// set.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }

    logging::init_logging(
        &config.log_level,
        LogFormat::from_str_lossy(&config.log_format),
    );

    tracing::info!(
        data_dir = %config.data_dir.display(),
        spv_magic = config.spv.magic,
        "starting sidechain-node"
    );

    // --- Persistent storage ---
    let db_path = config.db_path();
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = Arc::new(
        ChainDB::open(&db_path)
            .with_context(|| format!("failed to open database at {}", db_path.display()))?,
    );
    tracing::info!(
        path = %db_path.display(),
        transactions = db.transaction_count(),
        deposits = db.main_chain_tx_count(),
        "database opened"
    );

    // --- SPV service ---
    let spv = Arc::new(SpvService::new(config.spv.clone()));
    // The main-chain P2P client is external to this binary. It receives a
    // clone of `header_tx` and pushes every validated main-chain header
    // through it; transaction validators embedding this node share `spv` as
    // their `SpvVerifier`. The sender is held for the life of the node so
    // the feed only closes on shutdown.
    let (header_tx, header_rx) = mpsc::channel(SPV_HEADER_CHANNEL_CAPACITY);
    let spv_task = {
        let spv = Arc::clone(&spv);
        tokio::spawn(async move { spv.run(header_rx).await })
    };

    tokio::select! {
        res = spv_task => {
            match res {
                Ok(Err(e)) => tracing::error!(error = %e, "SPV service stopped"),
                Ok(Ok(())) => tracing::error!("SPV service stopped"),
                Err(e) => tracing::error!(error = %e, "SPV service panicked"),
            }
            if let Err(e) = db.flush() {
                tracing::error!(error = %e, "failed to flush database");
            }
            std::process::exit(1);
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
        }
    }

    drop(header_tx);
    db.flush().context("failed to flush database")?;
    tracing::info!("sidechain-node stopped");
    Ok(())
}

/// Generates a side aux-pow and prints it as pretty JSON on stdout.
fn print_aux_pow(args: cli::AuxPowArgs) -> Result<()> {
    logging::init_logging("warn", LogFormat::Pretty);

    let proof = generate_side_aux_pow(
        args.block_hash,
        args.genesis_hash,
        &FabricatedAuxPowGenerator,
    )
    .context("failed to generate side aux-pow")?;

    let json = serde_json::to_string_pretty(&proof).context("failed to encode side aux-pow")?;
    println!("{}", json);
    Ok(())
}

/// Prints whether a main-chain deposit is recorded in the node database.
fn print_deposit_status(args: cli::DepositStatusArgs) -> Result<()> {
    logging::init_logging("warn", LogFormat::Pretty);

    let hash = args.hash.to_string();
    match deposit_credited_at(&args.data_dir, &hash)? {
        Some(secs) => {
            let when = chrono::DateTime::from_timestamp(secs, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| secs.to_string());
            println!("{} credited at {}", hash, when);
        }
        None => println!("{} not credited", hash),
    }
    Ok(())
}

/// Unix time at which `hash` was credited, if it was.
fn deposit_credited_at(data_dir: &Path, hash: &str) -> Result<Option<i64>> {
    let config = NodeConfig {
        data_dir: data_dir.to_path_buf(),
        ..NodeConfig::default()
    };
    let db_path = config.db_path();
    if !db_path.is_dir() {
        anyhow::bail!("no node database at {}", db_path.display());
    }
    let db = ChainDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;

    if !db.has_main_chain_tx(hash)? {
        return Ok(None);
    }
    Ok(db.main_chain_tx_credited_at(hash)?)
}

/// Prints version information to stdout.
fn print_version() {
    println!("sidechain-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc          {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. A handler that cannot
/// be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
