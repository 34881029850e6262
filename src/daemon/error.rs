//! Daemon client error types

use std::io;
use thiserror::Error;

/// No service entry for the daemon port
pub const NL_NOSERVICE: i32 = -1;
/// Host lookup failed
pub const NL_NOHOST: i32 = -2;
/// Could not create a socket
pub const NL_NOSOCK: i32 = -4;
/// Could not connect to the daemon
pub const NL_NOCONNECT: i32 = -6;
/// The daemon closed the session
pub const NL_CLOSED: i32 = -9;
/// A report could not be decoded
pub const NL_BADREPORT: i32 = -10;

/// Error reported by the daemon client library.
///
/// The code and message are kept verbatim so lifecycle failures can be
/// surfaced exactly as the daemon described them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("gpsd err: {code} ({message})")]
pub struct DaemonError {
    pub code: i32,
    pub message: String,
}

impl DaemonError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error for one of the client's negative status codes
    pub fn from_code(code: i32) -> Self {
        let message = match code {
            NL_NOSERVICE => "can't get service entry",
            NL_NOHOST => "can't get host entry",
            NL_NOSOCK => "can't create socket",
            NL_NOCONNECT => "can't connect to host",
            NL_CLOSED => "connection closed by daemon",
            NL_BADREPORT => "malformed report",
            _ => "unknown error",
        };
        Self::new(code, message)
    }

    /// Error for a failed socket operation, keeping the OS errno
    pub fn io(error: &io::Error) -> Self {
        Self::new(error.raw_os_error().unwrap_or(-1), error.to_string())
    }
}

/// Result type for daemon client operations
pub type DaemonResult<T> = Result<T, DaemonError>;
