//! Daemon session trait and the report it exposes

use crate::core::FixRecord;
use crate::daemon::DaemonResult;
use serde::{Deserialize, Serialize};
use std::os::unix::io::RawFd;

/// Session-level fix status reported alongside each fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// The receiver has no usable fix
    NoFix,
    /// Plain fix without corrections
    Fix,
    /// Differentially corrected fix
    DgpsFix,
}

/// Latest report held by a session after a read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsData {
    pub status: SessionStatus,
    pub fix: FixRecord,
}

impl GpsData {
    pub fn new(status: SessionStatus, fix: FixRecord) -> Self {
        Self { status, fix }
    }

    /// Report with a fix and the default status
    pub fn fix(fix: FixRecord) -> Self {
        Self::new(SessionStatus::Fix, fix)
    }
}

impl Default for GpsData {
    fn default() -> Self {
        Self::new(SessionStatus::NoFix, FixRecord::not_seen())
    }
}

/// An open session with the positioning daemon.
///
/// Mirrors the client library contract: `read` refreshes the report the
/// session owns and `data` borrows it, so callers must copy what they
/// keep before the next read.
pub trait DaemonSession: Send {
    /// Ask the daemon to stream reports continuously
    fn enable_streaming(&mut self) -> DaemonResult<()>;

    /// Read one report from the daemon into the session
    fn read(&mut self) -> DaemonResult<()>;

    /// The report refreshed by the last read
    fn data(&self) -> &GpsData;

    /// Whether a complete report is already buffered client-side, in
    /// which case the socket will not signal readiness for it
    fn has_pending(&self) -> bool;

    /// Pollable descriptor that becomes readable when a report arrives
    fn fd(&self) -> RawFd;

    /// Terminate the session
    fn close(&mut self) -> DaemonResult<()>;
}

/// Opens sessions with a daemon at an optional host and port
pub trait DaemonOpener: Send {
    fn open(&self, host: Option<&str>, port: Option<&str>) -> DaemonResult<Box<dyn DaemonSession>>;
}
