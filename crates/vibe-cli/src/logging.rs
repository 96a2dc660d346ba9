//! Logging utilities for the Vibe CLI
//!
//! This module provides:
//! - Structured logging setup (compact, full, JSON)
//! - Session request ID generation
//! - Sensitive data redaction
//! - Performance timing spans

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Enable ANSI output on the console
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
    /// Extra `target=level` directives
    pub directives: Vec<String>,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
            directives: Vec::new(),
        }
    }
}

impl LoggingConfig {
    /// Config file first, then `-v` flags on top
    pub fn from_sources(verbosity: u8, file: &crate::config::LoggingConfig) -> Self {
        let mut config = Self::default();
        config.merge_with_file(file);
        config.apply_verbosity(verbosity);
        config
    }

    /// Overwrite only the settings a verbosity level controls; 0 leaves all
    fn apply_verbosity(&mut self, verbosity: u8) {
        match verbosity {
            0 => {}
            1 => self.level = "info".to_string(),
            2 => {
                self.level = "debug".to_string();
                self.source_location = true;
            }
            _ => {
                self.level = "trace".to_string();
                self.format = LogFormat::Full;
                self.source_location = true;
                self.thread_ids = true;
            }
        }
    }

    /// Apply settings from the configuration file
    pub fn merge_with_file(&mut self, file: &crate::config::LoggingConfig) {
        if let Some(level) = &file.level {
            self.level = level.clone();
        }
        if let Some(format) = file.format.as_deref() {
            match LogFormat::parse(format) {
                Some(format) => self.format = format,
                None => eprintln!("Warning: invalid log format '{}' in config file", format),
            }
        }
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self) {
        // RUST_LOG takes precedence
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("VIBE_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Warning: invalid VIBE_LOG_FORMAT '{}', using default", format),
            }
        }
    }

    /// Surface request/response events from the client at info level
    pub fn with_request_logging(mut self) -> Self {
        self.directives.push("vibe_core=info".to_string());
        self
    }
}

/// Initialize the global logging system
///
/// Logs go to stderr so stdout stays clean for command output.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = create_env_filter(&config)?;
    let ansi = config.console && std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Json => tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish()),
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = generate_request_id();
    REQUEST_ID
        .set(request_id.clone())
        .map_err(|_| Error::other("Request ID already initialized"))?;

    tracing::debug!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// Create environment filter based on configuration
fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.level, e)))?;

    for directive in &config.directives {
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| Error::config(format!("Invalid filter directive: {}", e)))?,
        );
    }

    Ok(filter)
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span with request ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use std::sync::OnceLock;

    static SECRET_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static BEARER_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    fn secret_regex() -> Option<&'static Regex> {
        SECRET_REGEX
            .get_or_init(|| {
                Regex::new(
                    r#"(?i)(signing[_-]?key|api[_-]?key|token|signature|password|secret)([=:\s]+)['"]?([^\s'",}]{3,})['"]?"#,
                )
                .ok()
            })
            .as_ref()
    }

    fn bearer_regex() -> Option<&'static Regex> {
        BEARER_REGEX
            .get_or_init(|| Regex::new(r"(?i)\bbearer\s+[a-zA-Z0-9_.~+/=-]+").ok())
            .as_ref()
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();

        if let Some(regex) = bearer_regex() {
            result = regex.replace_all(&result, "Bearer ***").to_string();
        }
        if let Some(regex) = secret_regex() {
            result = regex.replace_all(&result, "$1$2***").to_string();
        }

        result
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && !val.is_null() {
                        *val = serde_json::Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_json_value(item);
                }
            }
            serde_json::Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    /// Check if a JSON key names a secret
    fn is_sensitive_key(key: &str) -> bool {
        let key_lower = key.to_lowercase();
        key_lower.contains("signing_key")
            || key_lower.contains("signingkey")
            || key_lower.contains("token")
            || key_lower.contains("password")
            || key_lower.contains("secret")
            || key_lower.contains("signature")
            || key_lower == "authorization"
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let input = "signing_key=c2VjcmV0a2V5 token: abcdef123 Authorization: Bearer eyJhbGciOi.xyz";
        let redacted = redaction::redact_sensitive(input);
        assert!(redacted.contains("signing_key=***"));
        assert!(redacted.contains("token: ***"));
        assert!(redacted.contains("Bearer ***"));
        assert!(!redacted.contains("c2VjcmV0a2V5"));
        assert!(!redacted.contains("abcdef123"));
        assert!(!redacted.contains("eyJhbGciOi"));
    }

    #[test]
    fn test_json_redaction() {
        let mut value = serde_json::json!({
            "signing_key": "c2VjcmV0",
            "api_url": "https://api.example.com",
            "client_id": "app",
            "nested": {"access_token": "tok", "title": "keep me"},
            "require_signing": null
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["signing_key"], "***");
        assert_eq!(value["api_url"], "https://api.example.com");
        assert_eq!(value["client_id"], "app");
        assert_eq!(value["nested"]["access_token"], "***");
        assert_eq!(value["nested"]["title"], "keep me");
        assert!(value["require_signing"].is_null());
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let no_file = crate::config::LoggingConfig::default();
        let config = LoggingConfig::from_sources(0, &no_file);
        assert_eq!(config.level, "warn");
        assert!(!config.source_location);

        let config = LoggingConfig::from_sources(2, &no_file);
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_sources(3, &no_file);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_merge_with_file() {
        let mut config = LoggingConfig::default();
        config.merge_with_file(&crate::config::LoggingConfig {
            level: Some("debug".into()),
            format: Some("json".into()),
        });
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_verbosity_flags_beat_file_level() {
        let file = crate::config::LoggingConfig {
            level: Some("debug".into()),
            format: Some("json".into()),
        };

        let config = LoggingConfig::from_sources(0, &file);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let config = LoggingConfig::from_sources(1, &file);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);

        let config = LoggingConfig::from_sources(3, &file);
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);

        let quiet_file = crate::config::LoggingConfig {
            level: Some("error".into()),
            format: None,
        };
        assert_eq!(LoggingConfig::from_sources(2, &quiet_file).level, "debug");
    }

    #[test]
    fn test_request_logging_directive_is_valid() {
        let config = LoggingConfig::default().with_request_logging();
        assert!(create_env_filter(&config).is_ok());
    }

    #[test]
    fn test_request_id_format() {
        let id = generate_request_id();
        assert!(id.starts_with("req_"));
        assert_eq!(id.len(), 4 + 32);
    }
}
