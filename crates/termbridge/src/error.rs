//! Error types for Termbridge

use thiserror::Error;

/// Main error type for Termbridge operations
#[derive(Error, Debug)]
pub enum TermbridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Termbridge operations
pub type Result<T> = std::result::Result<T, TermbridgeError>;
