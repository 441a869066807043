use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    // IO
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parsing
    #[error("failed to parse TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    // Validation
    #[error("site '{name}' has an empty id")]
    EmptySiteId { name: String },

    #[error("duplicate site id '{id}'")]
    DuplicateSite { id: String },

    #[error("site '{id}' has an empty log_path")]
    EmptyLogPath { id: String },

    #[error("maintenance_hour must be 0-23, got {hour}")]
    InvalidMaintenanceHour { hour: u32 },

    #[error("interval_secs must be at least 1")]
    ZeroInterval,

    #[error("invalid network '{value}' in exclude_networks: {source}")]
    InvalidNetwork {
        value: String,
        #[source]
        source: ipnet::AddrParseError,
    },
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
