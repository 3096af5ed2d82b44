//! Common error types for mini-goga components.

use std::fmt;

/// A specialized Result type for mini-goga operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for mini-goga operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Target list error: {0}")]
    Targets(String),

    #[error("Probe client error: {0}")]
    Client(String),
}

impl Error {
    /// Create a new target list error.
    pub fn targets(msg: impl fmt::Display) -> Self {
        Error::Targets(msg.to_string())
    }

    /// Create a new probe client error.
    pub fn client(msg: impl fmt::Display) -> Self {
        Error::Client(msg.to_string())
    }
}
