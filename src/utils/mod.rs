//! Configuration

pub mod config;

pub use config::{ConfigError, SourceConfig, TimestampSource};
