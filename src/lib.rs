//! # rocky-client - Reverse Tunnel Client
//!
//! rocky-client exposes a service that has no public listener through a
//! rocky rendezvous server. It keeps an outbound control connection to the
//! server and, for every session the server announces, opens one connection
//! back to the server's tunnel port and one to the local target, then relays
//! bytes between them.
//!
//! ## Features
//!
//! - **Outbound Only**: the client never binds a listener
//! - **Mutual TLS**: control and tunnel connections can present a client
//!   certificate and verify the server against a private CA
//! - **Automatic Reconnect**: the control connection is redialed until the
//!   client is stopped
//! - **Coordinated Teardown**: both connections of a session close together
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rocky_client::config::load_config;
//! use rocky_client::client::run_client;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("rocky.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     run_client(config, shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! The server writes `New\n<id>\n` on the control connection. The client
//! dials the target, dials the tunnel port, writes `<id>` to both the control
//! and the tunnel connection, and relays the tunnel to the target.
//!
//! ```text
//! Requester -> Rocky Server -> (tunnel) -> rocky-client -> Target
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod client;
pub mod config;
pub mod error;
pub mod helper;
pub mod protocol;
pub mod relay;
pub mod transport;

// Re-export commonly used items
pub use client::run_client;
pub use config::{load_config, ClientConfig, Config};
pub use error::{DirectiveError, RockyError};

/// Version of the rocky-client library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
