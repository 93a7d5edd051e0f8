//! Protocol types for the rocky control channel
//!
//! The control channel is line-delimited text. The server announces a new
//! session with two lines: the marker `New` followed by the session id.

use bytes::{BufMut, Bytes, BytesMut};

/// Marker line announcing a new session
pub const NEW_SESSION_MARKER: &str = "New";

/// Line terminator on the control channel
pub const LINE_TERMINATOR: u8 = b'\n';

/// Longest control line accepted, terminator excluded
pub const MAX_LINE_LENGTH: usize = 8 * 1024;

/// Decoded instruction from the rendezvous server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Open a tunnel for the session with this id
    NewSession {
        /// Opaque id minted by the server
        id: String,
    },
}

/// One item produced by the control stream decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// A recognized directive
    Directive(Directive),
    /// A line that is not a recognized directive
    Unknown(String),
}

/// Encode the session id handshake sent to the control and tunnel connections
///
/// The id is written verbatim. When `newline` is set a `\n` is appended.
pub fn encode_session_id(id: &str, newline: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(id.len() + 1);
    buf.put_slice(id.as_bytes());
    if newline {
        buf.put_u8(LINE_TERMINATOR);
    }
    buf.freeze()
}
