//! Test utilities for rocky-client
//!
//! This module provides a fake rocky server and common helpers used across
//! integration tests.

#![allow(dead_code)]

use rocky_client::config::{ClientConfig, Config};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream};

/// Bound on every wait in the integration tests
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// An address nothing is listening on
pub async fn closed_addr() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr
}

/// Accept one connection, failing the test after [`TEST_TIMEOUT`]
pub async fn accept(listener: &TcpListener) -> TcpStream {
    tokio::time::timeout(TEST_TIMEOUT, listener.accept())
        .await
        .expect("timed out waiting for a connection")
        .unwrap()
        .0
}

/// Read exactly `len` bytes, failing the test after [`TEST_TIMEOUT`]
pub async fn read_n<S: AsyncRead + Unpin>(stream: &mut S, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    tokio::time::timeout(TEST_TIMEOUT, stream.read_exact(&mut buf))
        .await
        .expect("timed out reading")
        .unwrap();
    buf
}

/// Assert the peer closes the stream within [`TEST_TIMEOUT`]
pub async fn assert_closed<S: AsyncRead + Unpin>(stream: &mut S) {
    let mut buf = Vec::new();
    let read = tokio::time::timeout(TEST_TIMEOUT, stream.read_to_end(&mut buf))
        .await
        .expect("stream was not closed");
    // A reset counts as closed too
    if let Ok(n) = read {
        assert_eq!(n, 0, "unexpected trailing bytes: {:?}", buf);
    }
}

/// Listeners standing in for the rocky server and the local target
pub struct FakeRocky {
    pub control: TcpListener,
    pub tunnel: TcpListener,
    pub target: TcpListener,
}

impl FakeRocky {
    /// Bind the control, tunnel and target listeners on loopback
    pub async fn start() -> Self {
        FakeRocky {
            control: create_test_listener().await.0,
            tunnel: create_test_listener().await.0,
            target: create_test_listener().await.0,
        }
    }

    /// Client configuration pointing at these listeners
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(
            &self.control.local_addr().unwrap().to_string(),
            &self.tunnel.local_addr().unwrap().to_string(),
            &self.target.local_addr().unwrap().to_string(),
        )
    }
}

/// Wrap a client configuration into a root configuration
pub fn root(client: ClientConfig) -> Config {
    Config { client }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_listener() {
        let (listener, addr) = create_test_listener().await;
        assert!(addr.port() > 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_fake_rocky_config() {
        let rocky = FakeRocky::start().await;
        let config = rocky.config();
        assert!(config.server_addr.starts_with("127.0.0.1:"));
        assert_ne!(config.server_addr, config.tunnel_addr);
        assert!(config.validate().is_ok());
    }
}
