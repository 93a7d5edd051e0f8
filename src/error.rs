//! Error types for rocky-client
//!
//! This module defines the custom error types used throughout the client.

use std::io;
use thiserror::Error;

/// Main error type for rocky-client operations
#[derive(Error, Debug)]
pub enum RockyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TLS credential or handshake error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Control protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] DirectiveError),

    /// The rendezvous server closed the control connection
    #[error("Server closed the control connection")]
    ServerClosed,
}

impl RockyError {
    /// Whether this error must stop the client instead of triggering a reconnect
    pub fn is_fatal(&self) -> bool {
        matches!(self, RockyError::ServerClosed)
    }
}

/// Errors produced while decoding the control stream
#[derive(Error, Debug)]
pub enum DirectiveError {
    /// IO error on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended between a `New` marker and its session id
    #[error("Control stream ended before the session id following `New`")]
    Truncated,

    /// A line exceeded the maximum accepted length
    #[error("Control line exceeds {0} bytes")]
    LineTooLong(usize),

    /// A line was not valid UTF-8
    #[error("Control line is not valid UTF-8")]
    InvalidUtf8,
}
