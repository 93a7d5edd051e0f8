//! Helper utilities for rocky-client
//!
//! This module provides common constants and small functions used throughout the application.

use std::time::Duration;

/// Default buffer size for relay IO
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default delay between control connection attempts in seconds
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 5;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

/// Extract the host part of a `host:port` address
///
/// Handles bracketed IPv6 literals (`[::1]:443` gives `::1`). An address
/// without a port is returned unchanged.
pub fn host_of(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            return &rest[..end];
        }
    }
    match addr.rsplit_once(':') {
        Some((host, _)) if !host.contains(':') => host,
        Some(_) => addr,
        None => addr,
    }
}
