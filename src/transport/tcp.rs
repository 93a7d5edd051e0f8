//! TCP transport implementation
//!
//! Plain TCP connections, used for target connections and, when mutual TLS
//! is not configured, for the control and tunnel connections.

use super::{dial_tcp, SocketOpts, Transport};
use crate::config::TransportConfig;
use crate::helper::{duration_from_secs, DEFAULT_CONNECT_TIMEOUT_SECS};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;

/// TCP transport for plain connections
#[derive(Debug, Clone)]
pub struct TcpTransport {
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl TcpTransport {
    /// Create a new TCP transport with default options
    pub fn with_defaults() -> Self {
        TcpTransport {
            socket_opts: SocketOpts::default(),
            connect_timeout: duration_from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Set socket options
    pub fn with_socket_opts(mut self, opts: SocketOpts) -> Self {
        self.socket_opts = opts;
        self
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Stream = TcpStream;

    fn new(config: &TransportConfig) -> Result<Self> {
        Ok(TcpTransport {
            socket_opts: SocketOpts::from_tcp_config(&config.tcp),
            connect_timeout: duration_from_secs(config.tcp.connect_timeout),
        })
    }

    async fn connect(&self, addr: &str) -> Result<Self::Stream> {
        let stream = dial_tcp(addr, self.connect_timeout).await?;

        self.socket_opts.apply(&stream)?;

        tracing::debug!("TCP connection established to {}", addr);

        Ok(stream)
    }
}
