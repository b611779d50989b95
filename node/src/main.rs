// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # dPACE Booking Node
//!
//! Entry point for the `dpace-node` binary. Parses CLI arguments, initializes
//! logging and metrics, loads the RSP signing key, and serves the HTTP/WS API
//! over the in-memory booking ledger.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the booking node
//! - `init`    — initialize data directory and generate the RSP key
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use dpace_booking::engine::BookingEngine;
use dpace_protocol::crypto::DpaceKeypair;

use cli::{Commands, DpaceNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb short bursts without dropping events
/// for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DpaceNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full booking node: RPC/REST/WS API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "dpace_node=info,dpace_protocol=info,dpace_booking=info,tower_http=warn",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        network = %args.network,
        data_dir = %args.data_dir.display(),
        "starting dpace-node"
    );

    // --- Data directory & RSP key ---
    std::fs::create_dir_all(&args.data_dir).with_context(|| {
        format!(
            "failed to create data directory: {}",
            args.data_dir.display()
        )
    })?;
    let rsp_keypair = load_rsp_key(&args)?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Booking engine ---
    let engine = Arc::new(RwLock::new(BookingEngine::with_system_clock(
        rsp_keypair.public_key(),
    )));

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            dpace_protocol::config::PROTOCOL_VERSION,
        ),
        network: args.network.clone(),
        engine: Arc::clone(&engine),
        event_tx: event_tx.clone(),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Ledger heartbeat ---
    // Keeps the headline gauges in sync with the engine and logs a one-line
    // summary so an idle node still shows signs of life.
    let engine_ref = Arc::clone(&engine);
    let metrics_ref = Arc::clone(&node_metrics);
    let heartbeat = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            let engine = engine_ref.read().await;
            api::refresh_gauges(&metrics_ref, &engine);
            let now = engine.now();
            let overdue = engine
                .active_bookings()
                .filter(|b| dpace_booking::escalation::is_expired(b, now))
                .count();
            if overdue > 0 {
                tracing::warn!(overdue, "bookings past their escalation deadline");
            }
            tracing::debug!(
                renters = engine.renter_count(),
                cars = engine.car_count(),
                bookings = engine.booking_count(),
                "ledger heartbeat"
            );
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    heartbeat.abort();
    tracing::info!("dpace-node stopped");
    Ok(())
}

/// Resolves the RSP signing key for this node.
///
/// Priority order:
///
/// 1. `--rsp-key` flag / `DPACE_RSP_KEY` env (hex-encoded seed)
/// 2. `<data_dir>/rsp.key` file
/// 3. freshly generated — persisted to the data directory with a warning,
///    since credentials issued under any previous key stop verifying
fn load_rsp_key(args: &cli::RunArgs) -> Result<DpaceKeypair> {
    if let Some(hex_seed) = &args.rsp_key {
        let keypair = DpaceKeypair::from_hex(hex_seed.trim())
            .map_err(|e| anyhow::anyhow!("invalid RSP key from flag/env: {}", e))?;
        tracing::info!(public_key = %keypair.public_key_hex(), "RSP key loaded from flag/env");
        return Ok(keypair);
    }

    let key_path = args.data_dir.join("rsp.key");
    if key_path.exists() {
        let hex_seed = std::fs::read_to_string(&key_path)
            .with_context(|| format!("failed to read RSP key from {}", key_path.display()))?;
        let keypair = DpaceKeypair::from_hex(hex_seed.trim()).map_err(|e| {
            anyhow::anyhow!("corrupt RSP key at {}: {}", key_path.display(), e)
        })?;
        tracing::info!(public_key = %keypair.public_key_hex(), "RSP key loaded from data directory");
        return Ok(keypair);
    }

    let keypair = DpaceKeypair::generate();
    persist_rsp_key(&key_path, &keypair)?;
    tracing::warn!(
        public_key = %keypair.public_key_hex(),
        key_path = %key_path.display(),
        "no RSP key found — generated a fresh one"
    );
    Ok(keypair)
}

/// Writes the RSP key seed to disk, hex-encoded, owner-readable only.
fn persist_rsp_key(key_path: &Path, keypair: &DpaceKeypair) -> Result<()> {
    std::fs::write(key_path, hex::encode(keypair.secret_key_bytes()))
        .with_context(|| format!("failed to write RSP key to {}", key_path.display()))?;

    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(key_path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

/// Initializes a new node data directory and generates the RSP keypair.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("dpace_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), network = %args.network, "initializing node");

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let key_path = data_dir.join("rsp.key");
    if key_path.exists() {
        anyhow::bail!(
            "refusing to overwrite existing RSP key at {}",
            key_path.display()
        );
    }

    let keypair = DpaceKeypair::generate();
    persist_rsp_key(&key_path, &keypair)?;

    tracing::info!(
        public_key = %keypair.public_key_hex(),
        key_path = %key_path.display(),
        "RSP keypair generated"
    );

    println!("Node initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Network        : {}", args.network);
    println!("  RSP key        : {}", key_path.display());
    println!("  RSP public key : {}", keypair.public_key_hex());

    Ok(())
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.rpc_url.trim_end_matches('/'));
    let body: String = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET without pulling in `reqwest` as a dependency.
/// In a real deployment, swap this for a proper HTTP client.
async fn http_get(url: &str) -> Result<String> {
    // Use tokio's TCP stream + raw HTTP/1.1 to avoid adding reqwest.
    let parsed: url::Url = url
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("missing host in URL"))?;
    let port = parsed.port().unwrap_or(80);
    let path = parsed.path();

    let addr = format!("{}:{}", host, port);
    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Strip HTTP headers — everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("dpace-node {}", env!("CARGO_PKG_VERSION"));
    println!(
        "protocol   {} ({})",
        dpace_protocol::config::PROTOCOL_VERSION,
        dpace_protocol::config::PROTOCOL_FINGERPRINT
    );
    println!("rustc      {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Minimal URL parser — just enough to extract host/port/path.
/// Avoids pulling in the `url` crate for a single use.
mod url {
    pub struct Url {
        host: String,
        port: Option<u16>,
        path: String,
    }

    impl Url {
        pub fn host_str(&self) -> Option<&str> {
            Some(&self.host)
        }

        pub fn port(&self) -> Option<u16> {
            self.port
        }

        pub fn path(&self) -> &str {
            &self.path
        }
    }

    impl std::str::FromStr for Url {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            // Strip scheme.
            let rest = s
                .strip_prefix("http://")
                .or_else(|| s.strip_prefix("https://"))
                .unwrap_or(s);

            let (authority, path) = match rest.find('/') {
                Some(i) => (&rest[..i], &rest[i..]),
                None => (rest, "/"),
            };

            let (host, port) = match authority.rfind(':') {
                Some(i) => {
                    let p = authority[i + 1..]
                        .parse::<u16>()
                        .map_err(|e| format!("bad port: {}", e))?;
                    (authority[..i].to_string(), Some(p))
                }
                None => (authority.to_string(), None),
            };

            Ok(Url {
                host,
                port,
                path: path.to_string(),
            })
        }
    }
}
