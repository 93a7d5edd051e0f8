//! Control channel management
//!
//! Owns the control connection to the rocky server: dials it, retrying on
//! failure, reads directives from it and spawns a session task per `New`
//! directive. A clean end-of-stream from the server is fatal; every other
//! failure leads to a reconnect.

use super::session::{ControlHandle, SessionHandler};
use crate::config::ClientConfig;
use crate::error::RockyError;
use crate::helper::duration_from_secs;
use crate::protocol::{ControlFrame, Directive, DirectiveCodec};
use crate::transport::Transport;
use anyhow::Result;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};

/// Control channel for managing the connection to the rocky server
pub struct ControlChannel<T: Transport> {
    /// Client configuration
    config: Arc<ClientConfig>,
    /// Transport used to dial the control address
    transport: Arc<T>,
    /// Handler invoked for every `New` directive
    handler: Arc<dyn SessionHandler>,
}

impl<T: Transport> ControlChannel<T> {
    /// Create a new control channel
    pub fn new(
        config: Arc<ClientConfig>,
        transport: Arc<T>,
        handler: Arc<dyn SessionHandler>,
    ) -> Self {
        ControlChannel {
            config,
            transport,
            handler,
        }
    }

    /// Run the control channel with automatic reconnection
    ///
    /// Only returns when the server closes the control connection. Dropping
    /// the returned future stops the loop; sessions already spawned keep
    /// running.
    pub async fn run(&self) -> Result<()> {
        let retry_interval = duration_from_secs(self.config.retry_interval);

        loop {
            info!("Connecting to server: {}", self.config.server_addr);

            let conn = match self.transport.connect(&self.config.server_addr).await {
                Ok(conn) => conn,
                Err(e) => {
                    error!(
                        "Error dialing server: {:#}. Retrying in {:?}",
                        e, retry_interval
                    );
                    tokio::time::sleep(retry_interval).await;
                    continue;
                }
            };

            info!("Connected to rocky server {}", self.config.server_addr);

            let err = self.handle_directives(conn).await;
            if err.is_fatal() {
                error!("Control channel terminated: {}", err);
                return Err(err.into());
            }
            warn!("Control channel error: {}. Reconnecting...", err);
        }
    }

    /// Read directives until the connection fails, returning the reason
    ///
    /// The connection is closed before returning, even while sessions
    /// started on it still hold a [`ControlHandle`].
    async fn handle_directives(&self, conn: T::Stream) -> RockyError {
        let (reader, writer) = tokio::io::split(conn);
        let control = ControlHandle::new(writer);
        let mut frames = FramedRead::new(reader, DirectiveCodec::new());

        let err = self.read_directives(&mut frames, &control).await;
        drop(frames);
        control.close().await;
        err
    }

    async fn read_directives<R>(
        &self,
        frames: &mut FramedRead<R, DirectiveCodec>,
        control: &ControlHandle,
    ) -> RockyError
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        loop {
            match frames.next().await {
                Some(Ok(ControlFrame::Directive(Directive::NewSession { id }))) => {
                    debug!(session_id = %id, "Received New directive");
                    self.dispatch(control.clone(), id);
                }
                Some(Ok(ControlFrame::Unknown(line))) => {
                    warn!("Ignoring unknown message from server: {:?}", line);
                }
                Some(Err(e)) => return RockyError::Protocol(e),
                None => return RockyError::ServerClosed,
            }
        }
    }

    /// Spawn the session for `id` without waiting on it
    fn dispatch(&self, control: ControlHandle, id: String) {
        let handler = self.handler.clone();
        tokio::spawn(async move {
            if let Err(e) = handler.establish(control, id.clone()).await {
                warn!(session_id = %id, "Session error: {:#}", e);
            }
        });
    }
}
