//! Error types for the Crptgate client.

use thiserror::Error;

/// Main error type for Crptgate operations.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API returned a non-success status code
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Network or connection-level failures
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body serialization errors
    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A caller waiting for a permit was cancelled before one became available
    #[error("Cancelled while waiting for a rate limit permit")]
    Cancelled,

    /// The rate limiter was shut down while the caller was waiting
    #[error("Rate limiter is shut down")]
    Closed,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Crptgate operations.
pub type Result<T> = std::result::Result<T, CrptError>;
