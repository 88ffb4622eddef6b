use std::io;
use thiserror::Error;

/// Custom error type for the pmadump application
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Unexpected response format: {0}")]
    ResponseFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for the pmadump application
pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    /// Create an authentication error
    pub fn auth<S: Into<String>>(msg: S) -> Self {
        ExportError::Auth(msg.into())
    }

    /// Create a navigation error
    pub fn navigation<S: Into<String>>(msg: S) -> Self {
        ExportError::Navigation(msg.into())
    }

    /// Create a response format error
    pub fn response_format<S: Into<String>>(msg: S) -> Self {
        ExportError::ResponseFormat(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        ExportError::InvalidInput(msg.into())
    }
}
