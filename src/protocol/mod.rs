//! Protocol module for rocky-client
//!
//! This module implements the rocky control protocol: line-delimited
//! directives from the server and the session id handshake the client
//! sends back.

mod codec;
mod types;

pub use codec::DirectiveCodec;
pub use types::{
    encode_session_id, ControlFrame, Directive, LINE_TERMINATOR, MAX_LINE_LENGTH,
    NEW_SESSION_MARKER,
};
