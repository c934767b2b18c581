//! Error types for Airfacts

use thiserror::Error;

/// Result type alias for Airfacts operations
pub type Result<T> = std::result::Result<T, AirfactsError>;

/// Main error type shared by the Airfacts crates
#[derive(Error, Debug)]
pub enum AirfactsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid distance unit '{0}'. Use 'km', 'mi' (miles), or 'nm' (nautical miles)")]
    InvalidUnit(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
