//! Transport module for rocky-client
//!
//! This module provides the transport layer abstraction used for the
//! control connection, the per-session tunnel connections and the target
//! connections. Plain TCP is always available; mutual TLS is available with
//! the `rustls-tls` feature.

mod tcp;
#[cfg(feature = "rustls-tls")]
mod tls;

pub use tcp::TcpTransport;
#[cfg(feature = "rustls-tls")]
pub use tls::{TlsStream, TlsTransport};

use crate::config::{TcpConfig, TransportConfig};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// TCP options applied to every dialed socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketOpts {
    /// Disable Nagle's algorithm
    pub nodelay: bool,
    /// Keepalive idle time and probe interval; `None` keeps the OS setting
    pub keepalive: Option<(Duration, Duration)>,
}

impl Default for SocketOpts {
    fn default() -> Self {
        SocketOpts::from_tcp_config(&TcpConfig::default())
    }
}

impl SocketOpts {
    /// Build options from `[client.tcp]`; a zero `keepalive_secs` leaves keepalive off
    pub fn from_tcp_config(config: &TcpConfig) -> Self {
        let keepalive = (config.keepalive_secs > 0).then(|| {
            (
                Duration::from_secs(config.keepalive_secs),
                Duration::from_secs(config.keepalive_interval.max(1)),
            )
        });
        SocketOpts {
            nodelay: config.nodelay,
            keepalive,
        }
    }

    /// Apply the options to a connected stream
    pub fn apply(&self, stream: &TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(self.nodelay)?;

        if let Some((idle, interval)) = self.keepalive {
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(idle)
                .with_interval(interval);
            socket2::SockRef::from(stream).set_tcp_keepalive(&keepalive)?;
        }

        Ok(())
    }
}

/// Transport trait for the connection types the client dials
///
/// Implementations connect to a `host:port` address and return a stream
/// implementing AsyncRead + AsyncWrite. Dropping every handle of a stream
/// closes it, which unblocks a read pending on the remote side.
#[async_trait]
pub trait Transport: Debug + Send + Sync + 'static {
    /// The stream type produced by this transport
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + Sync + Debug + 'static;

    /// Create a new transport instance from configuration
    fn new(config: &TransportConfig) -> Result<Self>
    where
        Self: Sized;

    /// Connect to a remote address
    async fn connect(&self, addr: &str) -> Result<Self::Stream>;
}

/// Open a TCP connection bounded by `timeout`
pub(crate) async fn dial_tcp(addr: &str, timeout: Duration) -> Result<TcpStream> {
    use anyhow::Context;

    tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .with_context(|| format!("Connection timeout to {}", addr))?
        .with_context(|| format!("Failed to connect to {}", addr))
}
