//! Error types for taf-keepalive

use std::net::SocketAddr;

use thiserror::Error;

/// Main error type for the keep-alive server.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for taf-keepalive.
pub type Result<T> = std::result::Result<T, ServerError>;
