use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Which clock dominates presentation timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    /// Derive timestamps from the fix capture time
    #[default]
    Gps,
    /// Use the pipeline clock at ingestion
    Pipeline,
}

impl TimestampSource {
    pub fn nick(&self) -> &'static str {
        match self {
            TimestampSource::Gps => "gps",
            TimestampSource::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick())
    }
}

impl FromStr for TimestampSource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gps" => Ok(TimestampSource::Gps),
            "pipeline" => Ok(TimestampSource::Pipeline),
            _ => Err(ConfigError::InvalidParameter {
                parameter: "timestamp".to_string(),
                value: s.to_string(),
                reason: "expected \"gps\" or \"pipeline\"".to_string(),
            }),
        }
    }
}

/// Configuration validation and loading errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid {parameter} = {value:?}: {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
    #[error("configuration I/O error: {message}")]
    IoError { message: String },
    #[error("configuration serialization error: {message}")]
    SerializationError { message: String },
}

/// Source configuration, read when the source starts
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// The host location for gpsd (name or IP address); empty for the default
    pub host: String,
    /// The gpsd port number; empty for the default
    pub port: String,
    /// Timestamp source
    #[serde(rename = "timestamp")]
    pub timestamp_source: TimestampSource,
}

impl SourceConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }

    pub fn with_timestamp_source(mut self, source: TimestampSource) -> Self {
        self.timestamp_source = source;
        self
    }

    /// Host to pass to the daemon client, `None` for its default
    pub fn host(&self) -> Option<&str> {
        Some(self.host.as_str()).filter(|h| !h.is_empty())
    }

    /// Port to pass to the daemon client, `None` for its default
    pub fn port(&self) -> Option<&str> {
        Some(self.port.as_str()).filter(|p| !p.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidParameter {
                parameter: "host".to_string(),
                value: self.host.clone(),
                reason: "must not contain whitespace".to_string(),
            });
        }

        if let Some(port) = self.port() {
            match port.parse::<u16>() {
                Ok(p) if p > 0 => {}
                _ => {
                    return Err(ConfigError::InvalidParameter {
                        parameter: "port".to_string(),
                        value: port.to_string(),
                        reason: "must be a port number between 1 and 65535".to_string(),
                    })
                }
            }
        }

        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SourceConfig = serde_json::from_str(json).map_err(|e| ConfigError::SerializationError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
            message: e.to_string(),
        })
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path.as_ref().display(), e),
        })?;
        Self::from_json_str(&contents)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = self.to_json_string()?;
        fs::write(path.as_ref(), json).map_err(|e| ConfigError::IoError {
            message: format!("{}: {}", path.as_ref().display(), e),
        })
    }
}
