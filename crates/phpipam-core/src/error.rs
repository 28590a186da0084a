//! Error types for PHPIPAM operations.
//!
//! Every failure the core can produce is one variant of [`Error`]. Nothing is
//! retried or recovered silently; the error is handed straight back to the
//! caller of the controller method.

use thiserror::Error;

/// Main error type for PHPIPAM operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Login was rejected, the auth endpoint was unreachable, or its reply was unreadable
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// The HTTP exchange itself failed (connect, timeout, reading the body)
    #[error("Transport error: {0}")]
    TransportError(String),

    /// PHPIPAM answered with a non-2xx status or `success: false`
    #[error("PHPIPAM API error {code} (HTTP {status}): {message}")]
    ApiError {
        /// HTTP status of the response
        status: u16,
        /// `code` member of the envelope
        code: i64,
        /// Envelope message, or the raw body when there is none
        message: String,
        /// Raw response body
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to decode response (HTTP {status}): {message}")]
    DecodeError {
        /// HTTP status of the response
        status: u16,
        /// Parser error
        message: String,
        /// Raw response body
        body: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request URL could not be built
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The request payload could not be serialized
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Specialized result type for PHPIPAM operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthError(_) => "AUTH_ERROR",
            Self::TransportError(_) => "TRANSPORT_ERROR",
            Self::ApiError { .. } => "API_ERROR",
            Self::DecodeError { .. } => "DECODE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
        }
    }

    /// HTTP status of the response that produced this error, when there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } | Self::DecodeError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::InvalidRequest(_) | Self::DecodeError { .. }
        )
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::TransportError(format!("request timed out: {err}"))
        } else if err.is_connect() {
            Self::TransportError(format!("connection failed: {err}"))
        } else {
            Self::TransportError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
