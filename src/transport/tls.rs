//! Mutual TLS transport implementation
//!
//! Provides mutually authenticated TLS connections using rustls. The client
//! presents its certificate chain and verifies the server against the
//! configured CA only; there is no option to skip verification.

use super::{dial_tcp, SocketOpts, Transport};
use crate::config::{TlsConfig, TransportConfig};
use crate::error::RockyError;
use crate::helper::{duration_from_secs, host_of};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// TLS stream type alias
pub type TlsStream = tokio_rustls::client::TlsStream<TcpStream>;

/// TLS transport for mutually authenticated connections using rustls
#[derive(Clone)]
pub struct TlsTransport {
    /// TLS connector
    connector: TlsConnector,
    /// Server name for verification, overriding the dialed host
    server_name: Option<String>,
    /// Socket options to apply to connections
    socket_opts: SocketOpts,
    /// Connection timeout
    connect_timeout: Duration,
}

impl std::fmt::Debug for TlsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsTransport")
            .field("server_name", &self.server_name)
            .field("socket_opts", &self.socket_opts)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Read every PEM certificate in `path`
fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>> {
    let file = File::open(Path::new(path))
        .with_context(|| format!("Failed to open certificate file: {}", path))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse certificates from: {}", path))?;
    if certs.is_empty() {
        return Err(RockyError::Tls(format!("No certificates found in {}", path)).into());
    }
    Ok(certs)
}

/// Read the first PEM private key in `path`
fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>> {
    let file = File::open(Path::new(path))
        .with_context(|| format!("Failed to open key file: {}", path))?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .with_context(|| format!("Failed to parse private key from: {}", path))?
        .ok_or_else(|| RockyError::Tls(format!("No private key found in {}", path)).into())
}

impl TlsTransport {
    /// Create a new TLS transport from a credential bundle
    ///
    /// The credential files are read once here; dials reuse the resulting
    /// rustls configuration.
    pub fn with_config(config: &TlsConfig, socket_opts: SocketOpts) -> Result<Self> {
        let mut root_store = RootCertStore::empty();
        for cert in load_certs(&config.ca)? {
            root_store
                .add(cert)
                .with_context(|| format!("Failed to add CA certificate from {}", config.ca))?;
        }

        let cert_chain = load_certs(&config.cert)?;
        let key = load_private_key(&config.key)?;

        let tls_config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_client_auth_cert(cert_chain, key)
            .map_err(|e| RockyError::Tls(format!("Invalid client certificate or key: {}", e)))?;

        Ok(TlsTransport {
            connector: TlsConnector::from(Arc::new(tls_config)),
            server_name: config.server_name.clone(),
            socket_opts,
            connect_timeout: duration_from_secs(crate::helper::DEFAULT_CONNECT_TIMEOUT_SECS),
        })
    }

    /// Set connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for TlsTransport {
    type Stream = TlsStream;

    fn new(config: &TransportConfig) -> Result<Self> {
        let tls_config = config
            .tls
            .as_ref()
            .ok_or_else(|| RockyError::Config("TLS configuration required for TLS transport".into()))?;

        let socket_opts = SocketOpts::from_tcp_config(&config.tcp);
        Ok(TlsTransport::with_config(tls_config, socket_opts)?
            .with_connect_timeout(duration_from_secs(config.tcp.connect_timeout)))
    }

    async fn connect(&self, addr: &str) -> Result<Self::Stream> {
        let tcp_stream = dial_tcp(addr, self.connect_timeout).await?;

        // Apply socket options before TLS handshake
        self.socket_opts.apply(&tcp_stream)?;

        let hostname = self.server_name.as_deref().unwrap_or_else(|| host_of(addr));

        let server_name = ServerName::try_from(hostname.to_string())
            .with_context(|| format!("Invalid server name: {}", hostname))?;

        let tls_stream = self
            .connector
            .connect(server_name, tcp_stream)
            .await
            .with_context(|| format!("TLS handshake failed with {}", hostname))?;

        tracing::debug!("TLS connection established to {} ({})", hostname, addr);

        Ok(tls_stream)
    }
}
