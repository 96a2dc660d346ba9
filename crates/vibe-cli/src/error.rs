//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

use colored::Colorize;
use vibe_core::ErrorKind;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A request to the backend failed
    #[error("{0}")]
    Api(#[from] vibe_core::Error),

    /// The client could not be constructed from the resolved settings
    #[error("Client configuration error: {0}")]
    Client(#[from] vibe_core::ConfigError),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} format", path.display(), expected)]
    InvalidFormat { path: PathBuf, expected: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument value
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    ///
    /// Backend failures get one code per error kind so scripts can branch on
    /// them without parsing output.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Api(e) => api_exit_code(e.kind()),
            Self::Client(_) => 5,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::InvalidArgs(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

fn api_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::NetworkError => 20,
        ErrorKind::Unauthorized => 21,
        ErrorKind::Forbidden => 22,
        ErrorKind::NotFound => 23,
        ErrorKind::ValidationError => 24,
        ErrorKind::Conflict => 25,
        ErrorKind::RateLimited => 26,
        ErrorKind::ServerError => 27,
        ErrorKind::UnknownError => 28,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if let Error::Api(api) = error {
        return format_api_error(api, use_color);
    }

    if use_color {
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

fn format_api_error(error: &vibe_core::Error, use_color: bool) -> String {
    let status = error
        .http_status()
        .map(|s| format!(" (HTTP {})", s))
        .unwrap_or_default();
    let label = format!("{}{}", error.kind(), status);

    let mut out = if use_color {
        format!("{} {} {}", "Error:".red().bold(), label.yellow(), error.message())
    } else {
        format!("Error: {} {}", label, error.message())
    };

    if let Some(details) = error.details() {
        let details = serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
        out.push_str("\nDetails: ");
        out.push_str(&details);
    }
    if error.is_retryable() {
        out.push_str("\nThis error is transient; retry with --retries N.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_have_distinct_exit_codes() {
        let mut codes: Vec<i32> = ErrorKind::ALL
            .iter()
            .map(|kind| Error::Api(vibe_core::Error::new(*kind, "x")).exit_code())
            .collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn test_format_api_error() {
        let api = vibe_core::Error::from_response(429, "Too Many Requests", r#"{"message": "slow down"}"#);
        let formatted = format_error(&Error::Api(api), false);
        assert!(formatted.starts_with("Error: RATE_LIMITED (HTTP 429) slow down"));
        assert!(formatted.contains("--retries"));
    }

    #[test]
    fn test_format_plain_error() {
        let formatted = format_error(&Error::invalid_args("bad filter"), false);
        assert_eq!(formatted, "Error: Invalid arguments: bad filter");
        assert!(Error::invalid_args("x").should_show_help());
    }
}
