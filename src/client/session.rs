//! Session establishment
//!
//! For every `New` directive the control channel hands the session id to a
//! [`SessionHandler`]. The default handler, [`TunnelSessionHandler`], dials
//! the local target and the server's tunnel port, sends the id handshake and
//! relays bytes until either side closes.

use crate::config::ClientConfig;
use crate::protocol::encode_session_id;
use crate::relay;
use crate::transport::{TcpTransport, Transport};
use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared write side of the control connection
///
/// Sessions run concurrently with the control read loop; each handshake
/// write takes the lock so writes from different sessions never interleave.
/// [`close`](ControlHandle::close) releases the writer for every clone.
#[derive(Clone)]
pub struct ControlHandle {
    writer: Arc<Mutex<Option<BoxedWriter>>>,
}

impl ControlHandle {
    /// Wrap the write half of a control connection
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        ControlHandle {
            writer: Arc::new(Mutex::new(Some(Box::new(writer)))),
        }
    }

    /// Write `payload` to the control connection and flush it
    pub async fn send(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotConnected, "control connection closed")
        })?;
        writer.write_all(payload).await?;
        writer.flush().await
    }

    /// Shut down and drop the writer; later sends fail with `NotConnected`
    pub async fn close(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                debug!("Control connection shutdown: {}", e);
            }
        }
    }
}

impl fmt::Debug for ControlHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlHandle").finish_non_exhaustive()
    }
}

/// Handles `New` directives received on the control channel.
///
/// The control channel spawns one task per directive and calls
/// [`establish`](SessionHandler::establish) in it, so implementations may
/// block on network I/O for as long as the session lives.
#[async_trait::async_trait]
pub trait SessionHandler: Send + Sync + fmt::Debug {
    /// Establish and serve the session identified by `session_id`
    async fn establish(&self, control: ControlHandle, session_id: String) -> Result<()>;
}

/// Opens the target and tunnel connections of a session and relays between them
#[derive(Debug)]
pub struct TunnelSessionHandler<T: Transport> {
    /// Transport for the tunnel connection (mutual TLS when configured)
    tunnel_transport: Arc<T>,
    /// Transport for the local target (always plain TCP)
    target_transport: TcpTransport,
    tunnel_addr: String,
    target_addr: String,
    buffer_size: usize,
    handshake_newline: bool,
}

impl<T: Transport> TunnelSessionHandler<T> {
    /// Create a handler from the client configuration
    pub fn new(config: &ClientConfig, tunnel_transport: Arc<T>) -> Result<Self> {
        Ok(TunnelSessionHandler {
            tunnel_transport,
            target_transport: TcpTransport::new(&config.transport)?,
            tunnel_addr: config.tunnel_addr.clone(),
            target_addr: config.target_addr.clone(),
            buffer_size: config.buffer_size,
            handshake_newline: config.handshake_newline,
        })
    }
}

#[async_trait::async_trait]
impl<T: Transport> SessionHandler for TunnelSessionHandler<T> {
    async fn establish(&self, control: ControlHandle, session_id: String) -> Result<()> {
        info!(session_id = %session_id, "New connection");

        debug!(session_id = %session_id, "Dialing target {}", self.target_addr);
        let target = self
            .target_transport
            .connect(&self.target_addr)
            .await
            .with_context(|| format!("Failed to dial target {}", self.target_addr))?;

        debug!(session_id = %session_id, "Dialing tunnel {}", self.tunnel_addr);
        let mut tunnel = self
            .tunnel_transport
            .connect(&self.tunnel_addr)
            .await
            .with_context(|| format!("Failed to dial tunnel {}", self.tunnel_addr))?;

        debug!(session_id = %session_id, "Sending session id to server");
        let handshake = encode_session_id(&session_id, self.handshake_newline);
        control
            .send(&handshake)
            .await
            .context("Failed to send session id on control connection")?;
        tunnel
            .write_all(&handshake)
            .await
            .context("Failed to send session id on tunnel connection")?;
        tunnel
            .flush()
            .await
            .context("Failed to flush tunnel connection")?;
        drop(control);

        debug!(session_id = %session_id, "Session established, relaying");
        relay::forward(&session_id, tunnel, target, self.buffer_size).await;
        Ok(())
    }
}
