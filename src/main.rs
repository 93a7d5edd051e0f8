//! rocky-client - Reverse Tunnel Client
//!
//! This is the main entry point for the rocky-client application.

use anyhow::Result;
use clap::Parser;
use rocky_client::client::run_client;
use rocky_client::config::{load_config, ClientConfig, Config, TlsConfig};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// rocky-client - expose a local service through a rocky rendezvous server
#[derive(Parser, Debug)]
#[command(name = "rocky-client")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file (overrides the address and TLS flags)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rocky server control address
    #[arg(long, default_value = "localhost:9999")]
    server: String,

    /// Rocky server tunnel address
    #[arg(long, default_value = "localhost:9998")]
    proxy: String,

    /// Target address to forward traffic to
    #[arg(long, default_value = "localhost:8090")]
    target: String,

    /// Client certificate for mutual TLS (empty disables TLS)
    #[arg(long, default_value = "")]
    communication_cert: String,

    /// Client private key for mutual TLS
    #[arg(long, default_value = "")]
    communication_key: String,

    /// CA certificate used to verify the rocky server
    #[arg(long, default_value = "")]
    communication_ca: String,

    /// Log level
    #[arg(
        short,
        long,
        default_value = "info",
        ignore_case = true,
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

impl Args {
    /// Build the configuration from the file, or from flags when no file is given
    fn into_config(self) -> Result<Config> {
        if let Some(path) = &self.config {
            let config = load_config(path)?;
            info!("Configuration loaded from: {:?}", path);
            return Ok(config);
        }

        let mut client = ClientConfig::new(&self.server, &self.proxy, &self.target);
        if !self.communication_cert.is_empty() {
            client.transport.tls = Some(TlsConfig {
                cert: self.communication_cert,
                key: self.communication_key,
                ca: self.communication_ca,
                server_name: None,
            });
        }
        Ok(Config { client })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    setup_logging(&args.log_level, args.json_log)?;

    info!(app = rocky_client::NAME, "Starting v{}", rocky_client::VERSION);

    let config = args.into_config()?;

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    tokio::spawn(async move {
        wait_for_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // Run the client
    run_client(config, shutdown_rx).await
}

/// Resolve once Ctrl+C or SIGTERM is received
async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down...");
                    }
                }
                return;
            }
            Err(e) => error!("Failed to setup SIGTERM handler: {}", e),
        }
    }

    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down...");
}

/// Setup logging based on configuration
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_lowercase()));

    if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}
