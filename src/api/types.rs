//! Common API types and data structures

use crate::core::{ClockTime, GPSD_CAPS};
use crate::daemon::DaemonError;
use crate::processing::wait::WaitError;
use crate::utils::config::ConfigError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors surfaced by the source to its host
#[derive(Debug, Error)]
pub enum SourceError {
    /// The daemon session could not be opened
    #[error("failed to connect to gpsd: {0}")]
    Connect(DaemonError),
    /// Streaming could not be enabled; the session was closed again
    #[error("failed to enable gpsd streaming: {error}")]
    StreamEnable {
        error: DaemonError,
        /// Failure of the cleanup close, if it failed too
        close_error: Option<DaemonError>,
    },
    /// The daemon session could not be closed cleanly
    #[error("failed to close gpsd session: {0}")]
    Close(DaemonError),
    /// Waiting for daemon data failed
    #[error("{0}")]
    ReadinessWait(#[from] WaitError),
    /// Reading a report from the daemon failed
    #[error("failed to read from gpsd: {0}")]
    Read(DaemonError),
    /// The sample is older than the stream and was dropped
    #[error("GPS is sending data older than the pipeline (delay {delay}, pipeline time {pipeline_now})")]
    StaleSample {
        delay: ClockTime,
        pipeline_now: ClockTime,
    },
    /// The waiting producer was unlocked
    #[error("source is flushing")]
    Flushing,
    #[error("source is not started")]
    NotStarted,
    #[error("source is already started")]
    AlreadyStarted,
    /// No pipeline clock has been provided
    #[error("no pipeline clock")]
    NoClock,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The unlock channel could not be created
    #[error("failed to create wakeup channel: {0}")]
    Wakeup(#[source] std::io::Error),
}

impl SourceError {
    /// Whether the error ends the session rather than one sample
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SourceError::StaleSample { .. } | SourceError::Flushing)
    }

    /// Daemon code and text behind the error, if the daemon reported one
    pub fn daemon_error(&self) -> Option<&DaemonError> {
        match self {
            SourceError::Connect(error)
            | SourceError::Close(error)
            | SourceError::Read(error)
            | SourceError::StreamEnable { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Static description of the source element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementMetadata {
    pub name: &'static str,
    pub long_name: &'static str,
    pub classification: &'static str,
    pub description: &'static str,
    pub caps: &'static str,
}

pub const METADATA: ElementMetadata = ElementMetadata {
    name: "gpsdsrc",
    long_name: "Source for gpsd data",
    classification: "Source/Sensor/Device",
    description: "Stream data from gpsd",
    caps: GPSD_CAPS,
};

/// Per-session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    /// Output units handed to the caller
    pub produced: u64,
    /// Reports discarded for lacking a fix
    pub filtered: u64,
    /// Fixes dropped as older than the stream
    pub stale_drops: u64,
    /// Fixes whose capture time was ahead of wall time
    pub clock_anomalies: u64,
}
