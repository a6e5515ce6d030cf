//! Error types for the beatgrid command-line driver

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the driver
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No config file at the expected location
    #[error("Config file not found at {}", .0.display())]
    NotFound(std::path::PathBuf),

    /// Tempo or rhythm rejected by the scheduler
    #[error("Tempo error: {0}")]
    Tempo(#[from] beatgrid_core::TempoError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}
