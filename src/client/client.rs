//! Main client structure
//!
//! Manages the client lifecycle and transport.

use super::control_channel::ControlChannel;
use super::session::TunnelSessionHandler;
use crate::config::ClientConfig;
use crate::error::RockyError;
use crate::transport::Transport;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Main rocky client
pub struct Client<T: Transport> {
    /// Client configuration
    config: Arc<ClientConfig>,
    /// Transport for the control and tunnel connections
    transport: Arc<T>,
}

impl<T: Transport> Client<T> {
    /// Create a new client with the given configuration
    ///
    /// Validates the configuration and builds the transport, so unreadable
    /// TLS credentials are reported here rather than on the first dial.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(RockyError::Config)?;
        let transport = Arc::new(T::new(&config.transport)?);
        Ok(Client {
            config: Arc::new(config),
            transport,
        })
    }

    /// Run the client until shutdown or until the server closes the control connection
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<bool>) -> Result<()> {
        info!("Starting rocky client");
        info!("Rocky server: {}", self.config.server_addr);
        info!("Tunnel address: {}", self.config.tunnel_addr);
        info!("Target address: {}", self.config.target_addr);
        info!("Mutual TLS: {}", self.config.transport.tls_enabled());

        let handler = Arc::new(TunnelSessionHandler::new(
            &self.config,
            self.transport.clone(),
        )?);
        let control_channel = ControlChannel::new(self.config.clone(), self.transport.clone(), handler);

        tokio::select! {
            result = control_channel.run() => {
                if let Err(e) = result {
                    error!("Control channel error: {:#}", e);
                    return Err(e);
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Shutdown signal received, stopping client");
            }
        }

        info!("Client stopped");
        Ok(())
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}
