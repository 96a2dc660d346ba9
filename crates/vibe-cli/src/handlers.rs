//! Command handlers for CLI subcommands
//!
//! Each submodule implements one command family; the helpers here turn
//! command-line input into client calls.

mod admin;
mod completions;
mod config;
mod data;

pub use admin::handle_admin;
pub use completions::handle_completions;
pub use config::handle_config;
pub use data::{handle_create, handle_delete, handle_get, handle_list, handle_update};

use crate::cli::{ConnectionArgs, RetryArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use vibe_core::{Client, FilterValue, RetryPolicy};

/// Build a client from the config file and command-line overrides
pub fn build_client(connection: &ConnectionArgs, config: &Config) -> Result<Client> {
    let client = Client::new(config.client_options(connection))?;
    tracing::debug!(config = ?client.config(), "Client ready");
    Ok(client)
}

/// Parse a JSON payload given inline or as `@path`
pub fn read_payload(input: &str) -> Result<Value> {
    if let Some(path) = input.strip_prefix('@') {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::FileNotFound { path });
        }
        let content = std::fs::read_to_string(&path)?;
        return serde_json::from_str(&content).map_err(|_| Error::InvalidFormat {
            path,
            expected: "JSON".to_string(),
        });
    }

    serde_json::from_str(input)
        .map_err(|e| Error::invalid_args(format!("payload is not valid JSON: {}", e)))
}

/// Parse `field=value` or `field:operator=value`
///
/// Values are read as JSON when they parse (`true`, `3`, `"x"`), otherwise
/// taken as plain strings.
pub fn parse_filter(input: &str) -> Result<(String, FilterValue)> {
    let (key, raw) = input.split_once('=').ok_or_else(|| {
        Error::invalid_args(format!(
            "filter '{}' must look like field=value or field:operator=value",
            input
        ))
    })?;

    let (field, operator) = match key.split_once(':') {
        Some((field, operator)) => (field.trim(), Some(operator.trim())),
        None => (key.trim(), None),
    };
    if field.is_empty() {
        return Err(Error::invalid_args(format!("filter '{}' has no field name", input)));
    }

    let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    let filter = match operator {
        Some("") => return Err(Error::invalid_args(format!("filter '{}' has an empty operator", input))),
        Some(operator) => FilterValue::condition(operator, value),
        None => FilterValue::Literal(value),
    };

    Ok((field.to_string(), filter))
}

/// Run `operation`, retrying transient failures when `--retries` is set
pub async fn with_retries<F, Fut, T>(retry: RetryArgs, mut operation: F) -> vibe_core::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = vibe_core::Result<T>>,
{
    if retry.retries == 0 {
        return operation().await;
    }
    vibe_core::retry_with_backoff(RetryPolicy::new(retry.retries), operation).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;
    use std::sync::atomic::{AtomicU32, Ordering};
    use vibe_core::ErrorKind;

    #[test]
    fn test_parse_filter_literal() {
        let (field, value) = parse_filter("done=false").unwrap();
        assert_eq!(field, "done");
        assert_eq!(value, FilterValue::Literal(json!(false)));

        let (_, value) = parse_filter("title=Buy milk").unwrap();
        assert_eq!(value, FilterValue::Literal(json!("Buy milk")));
    }

    #[test]
    fn test_parse_filter_operator() {
        let (field, value) = parse_filter("priority:gte=2").unwrap();
        assert_eq!(field, "priority");
        assert_eq!(value, FilterValue::condition("gte", 2));

        let (_, value) = parse_filter("note:contains=a=b").unwrap();
        assert_eq!(value, FilterValue::condition("contains", "a=b"));
    }

    #[test]
    fn test_parse_filter_rejects_malformed() {
        assert!(matches!(parse_filter("done"), Err(Error::InvalidArgs(_))));
        assert!(matches!(parse_filter("=1"), Err(Error::InvalidArgs(_))));
        assert!(matches!(parse_filter("a:=1"), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_read_payload_inline_and_file() {
        assert_eq!(read_payload(r#"{"title": "x"}"#).unwrap(), json!({"title": "x"}));
        assert!(matches!(read_payload("{oops"), Err(Error::InvalidArgs(_))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"done": true}"#).unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(read_payload(&arg).unwrap(), json!({"done": true}));

        assert!(matches!(
            read_payload("@/no/such/payload.json"),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_with_retries_disabled_runs_once() {
        let calls = AtomicU32::new(0);
        let result: vibe_core::Result<()> = with_retries(RetryArgs { retries: 0 }, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(vibe_core::Error::new(ErrorKind::ServerError, "down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retries_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let result = with_retries(RetryArgs { retries: 2 }, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(vibe_core::Error::new(ErrorKind::NetworkError, "reset"))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
