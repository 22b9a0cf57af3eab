//! Error types for auditdesk.
//!
//! This module defines all error types used throughout the auditdesk crate,
//! providing enough context to tell which API call failed and why.

use thiserror::Error;

/// The main error type for auditdesk operations.
#[derive(Error, Debug)]
pub enum Error {
    // === API Errors ===
    /// The request never produced an HTTP response (connect, timeout, TLS...).
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint path that was requested.
        endpoint: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status code.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    HttpStatus {
        /// Endpoint path that was requested.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Server-provided detail, or the raw body when no detail is present.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response from {endpoint}: {message}")]
    Decode {
        /// Endpoint path that was requested.
        endpoint: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system or terminal operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for auditdesk operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a configuration validation error.
    #[must_use]
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create a decode error for the given endpoint.
    #[must_use]
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from talking to the API.
    ///
    /// Covers requests that never got a response, requests the server
    /// rejected, and responses that could not be decoded.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::Decode { .. }
        )
    }

    /// The HTTP status code, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
