//! Duplex forwarding between the two connections of a session
//!
//! [`forward`] runs one pump task per direction. When either pump stops
//! (end-of-stream or error) the other one is aborted, so both connections
//! are closed together and no task outlives its session.

use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

/// Direction of a pump within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Bytes from the rendezvous server to the local target
    TunnelToTarget,
    /// Bytes from the local target to the rendezvous server
    TargetToTunnel,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::TunnelToTarget => write!(f, "tunnel->target"),
            Direction::TargetToTunnel => write!(f, "target->tunnel"),
        }
    }
}

/// Copy `src` into `dst` until `src` ends, then shut down `dst`'s write side
pub async fn pump<R, W>(src: R, mut dst: W, buffer_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::with_capacity(buffer_size, src);
    let copied = tokio::io::copy_buf(&mut reader, &mut dst).await?;
    dst.shutdown().await?;
    Ok(copied)
}

/// Relay bytes between `tunnel` and `target` until either side ends
///
/// Returns the direction that stopped first. By the time this returns both
/// connections have been dropped.
pub async fn forward<A, B>(session_id: &str, tunnel: A, target: B, buffer_size: usize) -> Direction
where
    A: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    B: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (tunnel_read, tunnel_write) = tokio::io::split(tunnel);
    let (target_read, target_write) = tokio::io::split(target);

    let mut upstream = tokio::spawn(pump(tunnel_read, target_write, buffer_size));
    let mut downstream = tokio::spawn(pump(target_read, tunnel_write, buffer_size));

    let (first, result, other) = tokio::select! {
        result = &mut upstream => (Direction::TunnelToTarget, result, downstream),
        result = &mut downstream => (Direction::TargetToTunnel, result, upstream),
    };

    match result {
        Ok(Ok(bytes)) => debug!(session_id, "{} finished: {} bytes", first, bytes),
        Ok(Err(e)) => warn!(session_id, "{} error: {}", first, e),
        Err(e) => warn!(session_id, "{} task failed: {}", first, e),
    }

    // Dropping the aborted pump releases the remaining halves, which closes
    // both connections.
    other.abort();
    let _ = other.await;

    debug!(session_id, "Session closed");
    first
}
