//! gpsd pipeline source
//!
//! Streams position fixes from a gpsd daemon into a media pipeline.
//! Each emitted unit carries one fix of at least 2D quality, stamped
//! with a presentation time on the pipeline clock that accounts for
//! the delay between capture and ingestion.

pub mod core;
pub mod daemon;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{Altitude, ClockTime, FixMode, FixRecord, Motion, Position};
pub use daemon::{DaemonError, DaemonOpener, DaemonSession, GpsData, MockDaemon, SessionStatus};
pub use processing::{
    compute_timestamp, ManualClock, MonotonicClock, OutputUnit, PipelineClock, SystemWallClock, WallClock,
};
pub use utils::{ConfigError, SourceConfig, TimestampSource};
pub use api::{GpsdSrc, JsonFormatter, SourceError, SourceResult, SourceStats, TextFormatter, UnlockHandle};
