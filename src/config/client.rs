//! Client configuration types
//!
//! Defines the main configuration structures for the rocky client.

use super::TransportConfig;
use serde::{Deserialize, Serialize};

/// Default delay between control connection attempts, in seconds
fn default_retry_interval() -> u64 {
    5
}

/// Default relay buffer size in bytes
fn default_buffer_size() -> usize {
    crate::helper::DEFAULT_BUFFER_SIZE
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Client configuration
    pub client: ClientConfig,
}

/// Client configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClientConfig {
    /// Rendezvous server control address (e.g., "rocky.example.com:9999")
    pub server_addr: String,

    /// Rendezvous server data-tunnel address (e.g., "rocky.example.com:9998")
    pub tunnel_addr: String,

    /// Local service exposed through the tunnel (e.g., "localhost:8090")
    pub target_addr: String,

    /// Seconds to wait before redialing the control address after a failed dial
    #[serde(default = "default_retry_interval")]
    pub retry_interval: u64,

    /// Relay buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Append `\n` to the session id handshake write
    #[serde(default)]
    pub handshake_newline: bool,

    /// Transport configuration (`[client.tcp]`, `[client.tls]`)
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Create a configuration with default tuning for the given addresses
    pub fn new(server_addr: &str, tunnel_addr: &str, target_addr: &str) -> Self {
        ClientConfig {
            server_addr: server_addr.to_string(),
            tunnel_addr: tunnel_addr.to_string(),
            target_addr: target_addr.to_string(),
            retry_interval: default_retry_interval(),
            buffer_size: default_buffer_size(),
            handshake_newline: false,
            transport: TransportConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("server_addr", &self.server_addr),
            ("tunnel_addr", &self.tunnel_addr),
            ("target_addr", &self.target_addr),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{} must not be empty", name));
            }
        }
        if self.buffer_size == 0 {
            return Err("buffer_size must be greater than zero".to_string());
        }
        if self.retry_interval == 0 {
            return Err("retry_interval must be greater than zero".to_string());
        }
        if let Some(tls) = &self.transport.tls {
            tls.validate()?;
        }
        Ok(())
    }
}
