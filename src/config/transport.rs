//! Transport configuration types
//!
//! Defines TCP socket tuning and the mutual-TLS credential bundle.

use serde::{Deserialize, Serialize};

/// Main transport configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TransportConfig {
    /// TCP configuration
    #[serde(default)]
    pub tcp: TcpConfig,

    /// Mutual TLS credentials; presence enables TLS on control and tunnel connections
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl TransportConfig {
    /// Whether mutual TLS is enabled
    pub fn tls_enabled(&self) -> bool {
        self.tls.is_some()
    }
}

/// Default keepalive seconds
fn default_keepalive_secs() -> u64 {
    20
}

/// Default keepalive interval
fn default_keepalive_interval() -> u64 {
    8
}

/// Default connect timeout in seconds
fn default_connect_timeout() -> u64 {
    10
}

fn default_nodelay() -> bool {
    true
}

/// TCP transport configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TcpConfig {
    /// Enable TCP_NODELAY
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,

    /// TCP keepalive idle time in seconds (0 disables keepalive)
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,

    /// TCP keepalive interval in seconds
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,

    /// Dial timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            nodelay: default_nodelay(),
            keepalive_secs: default_keepalive_secs(),
            keepalive_interval: default_keepalive_interval(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Mutual TLS credential bundle
///
/// All three paths point at PEM files. The CA file is the only trust root
/// used to verify the rendezvous server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Client certificate chain
    pub cert: String,

    /// Client private key
    pub key: String,

    /// Trusted CA certificate(s)
    pub ca: String,

    /// Name to verify the server certificate against (defaults to the dialed host)
    #[serde(default)]
    pub server_name: Option<String>,
}

impl TlsConfig {
    /// Validate that every credential path is set
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [("cert", &self.cert), ("key", &self.key), ("ca", &self.ca)] {
            if value.trim().is_empty() {
                return Err(format!("TLS {} path must not be empty", name));
            }
        }
        Ok(())
    }
}
