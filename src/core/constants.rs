//! Daemon defaults and clock constants

/// Host used when no gpsd host is configured
pub const DEFAULT_GPSD_HOST: &str = "localhost";

/// Port used when no gpsd port is configured
pub const DEFAULT_GPSD_PORT: &str = "2947";

/// Media type advertised for emitted buffers
pub const GPSD_CAPS: &str = "application/gpsd";

/// Nanoseconds per second, the pipeline clock resolution
pub const NSEC_PER_SEC: u64 = 1_000_000_000;
