//! Error types for taf-core

use thiserror::Error;

/// Main error type for taf-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for taf-core
pub type Result<T> = std::result::Result<T, Error>;
