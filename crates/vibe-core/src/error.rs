//! Error types for the Vibe core library
//!
//! Every failure on the request path resolves to exactly one [`ErrorKind`]
//! and is surfaced as an immutable [`Error`] value. Problems detected while
//! building a client are reported separately as [`ConfigError`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::http::signature::SignatureError;

/// Closed taxonomy of request failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Transport failure or deadline exceeded
    NetworkError,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 422
    ValidationError,
    /// HTTP 409
    Conflict,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx, or an unreadable success body
    ServerError,
    /// Anything else
    UnknownError,
}

impl ErrorKind {
    /// Every kind, in declaration order
    pub const ALL: [ErrorKind; 9] = [
        ErrorKind::NetworkError,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::ValidationError,
        ErrorKind::Conflict,
        ErrorKind::RateLimited,
        ErrorKind::ServerError,
        ErrorKind::UnknownError,
    ];

    /// Map an HTTP status to its kind
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            422 => ErrorKind::ValidationError,
            429 => ErrorKind::RateLimited,
            500.. => ErrorKind::ServerError,
            _ => ErrorKind::UnknownError,
        }
    }

    /// Whether a caller may reasonably re-issue the operation
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkError | ErrorKind::RateLimited | ErrorKind::ServerError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ServerError => "SERVER_ERROR",
            ErrorKind::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized request error
///
/// Fields are private: once an error has been built at its failure site it
/// is only ever read.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[error("{kind}: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl Error {
    /// Create an error of the given kind
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            details: None,
        }
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub(crate) fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Advisory retry hint; the client never retries on its own
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

/// Free-function form of [`Error::is_retryable`]
pub fn is_retryable(error: &Error) -> bool {
    error.is_retryable()
}

/// Convenience type alias for request results
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving configuration or building a client
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A setting could not be parsed
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// The signing key could not be turned into a MAC key
    #[error("Invalid signing key: {0}")]
    Signing(#[from] SignatureError),

    /// Proxy mode was configured to require signing but no key resolved
    #[error("Proxy mode requires a signing key but none was configured")]
    MissingSigningKey,

    /// The HTTP transport could not be constructed
    #[error("Failed to create HTTP transport: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}
