//! # CLI Interface
//!
//! Defines the command-line argument structure for `dpace-node` using
//! `clap` derive. Supports four subcommands: `run`, `init`, `status`,
//! and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dPACE booking network node.
///
/// A full node for the dPACE peer-to-peer car booking network. Holds the
/// booking ledger, drives the rental lifecycle, serves the JSON-RPC API,
/// and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "dpace-node",
    about = "dPACE booking network node",
    version,
    propagate_version = true
)]
pub struct DpaceNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the dPACE node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the booking node.
    Run(RunArgs),
    /// Initialize a new node — creates the data directory and generates
    /// a fresh RSP signing keypair.
    Init(InitArgs),
    /// Query the status of a running node via its RPC endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the node data directory where the RSP key is stored.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "DPACE_DATA_DIR", default_value = "~/.dpace")]
    pub data_dir: PathBuf,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "DPACE_RPC_PORT", default_value_t = 9873)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "DPACE_METRICS_PORT", default_value_t = 9874)]
    pub metrics_port: u16,

    /// Network identifier reported by the status endpoints.
    #[arg(long, env = "DPACE_NETWORK", default_value = "devnet")]
    pub network: String,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "DPACE_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Hex-encoded Ed25519 RSP private key.
    ///
    /// If not provided, the node reads the key from the data directory.
    /// **Never pass this flag in production** — use a key file instead.
    #[arg(long, env = "DPACE_RSP_KEY")]
    pub rsp_key: Option<String>,
}

/// Arguments for the `init` subcommand.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Path to the data directory to initialize.
    #[arg(long, short = 'd', env = "DPACE_DATA_DIR", default_value = "~/.dpace")]
    pub data_dir: PathBuf,

    /// Network to configure for: mainnet, testnet, or devnet.
    #[arg(long, default_value = "devnet")]
    pub network: String,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// RPC endpoint of the running node.
    #[arg(long, default_value = "http://127.0.0.1:9873")]
    pub rpc_url: String,
}
