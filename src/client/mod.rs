//! Client module for rocky-client
//!
//! This module contains the client logic: the control channel connected to
//! the rocky server and the sessions it spawns.

#[allow(clippy::module_inception)]
mod client;
mod control_channel;
mod session;

pub use client::Client;
pub use control_channel::ControlChannel;
pub use session::{ControlHandle, SessionHandler, TunnelSessionHandler};

use crate::config::Config;
use crate::transport::TcpTransport;
#[cfg(feature = "rustls-tls")]
use crate::transport::TlsTransport;
use anyhow::Result;
use tokio::sync::broadcast;

/// Run the client with the given configuration
///
/// Mutual TLS is used for the control and tunnel connections when the
/// configuration carries a `[client.tls]` section.
pub async fn run_client(config: Config, shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
    let client_config = config.client;

    if client_config.transport.tls_enabled() {
        #[cfg(feature = "rustls-tls")]
        {
            let client = Client::<TlsTransport>::new(client_config)?;
            return client.run(shutdown_rx).await;
        }
        #[cfg(not(feature = "rustls-tls"))]
        {
            anyhow::bail!("TLS is not enabled. Recompile with --features rustls-tls")
        }
    }

    let client = Client::<TcpTransport>::new(client_config)?;
    client.run(shutdown_rx).await
}
