//! Error types for ShopSeeker.

use thiserror::Error;

/// Result type alias using ShopSeeker's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ShopSeeker.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Ingestion Errors
    // =========================================================================
    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    // =========================================================================
    // Analysis Errors
    // =========================================================================
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request rejected: {0}")]
    RequestRejected(String),

    // =========================================================================
    // Location Errors
    // =========================================================================
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an unreadable file error.
    pub fn unreadable_file(msg: impl Into<String>) -> Self {
        Self::UnreadableFile(msg.into())
    }

    /// Create a service unavailable error.
    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Create an invalid response error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a request rejected error.
    pub fn request_rejected(msg: impl Into<String>) -> Self {
        Self::RequestRejected(msg.into())
    }

    /// Create a location unavailable error.
    pub fn location_unavailable(msg: impl Into<String>) -> Self {
        Self::LocationUnavailable(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The bare message carried by the error, without the kind prefix.
    ///
    /// This is what the session surfaces to the user; the three analysis
    /// kinds are not distinguished there.
    pub fn message(&self) -> String {
        match self {
            Self::UnreadableFile(msg)
            | Self::ServiceUnavailable(msg)
            | Self::InvalidResponse(msg)
            | Self::RequestRejected(msg)
            | Self::LocationUnavailable(msg)
            | Self::Config(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::Other(err) => err.to_string(),
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
