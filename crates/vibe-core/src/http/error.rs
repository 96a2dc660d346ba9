//! Error normalization for HTTP responses and transport failures
//!
//! Converts non-success responses and anything thrown below the HTTP layer
//! into the closed [`ErrorKind`] taxonomy.

use serde_json::{json, Value};

use crate::error::{Error, ErrorKind};
use crate::http::transport::TransportError;

pub const TIMEOUT_MESSAGE: &str = "Request timed out";
pub const NETWORK_MESSAGE: &str =
    "Unable to reach the server. Check your network connection and try again.";

impl Error {
    /// Normalize a non-success HTTP response
    pub fn from_response(status: u16, status_text: &str, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, status_text));
        let details = parsed.as_ref().and_then(extract_details);

        Error::new(ErrorKind::from_status(status), message)
            .with_status(status)
            .with_details(details)
    }

    /// Normalize a transport failure
    pub fn from_transport(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => Error::timed_out(),
            TransportError::Network(cause) => Error::new(ErrorKind::NetworkError, NETWORK_MESSAGE)
                .with_details(Some(json!({ "cause": cause }))),
            TransportError::Other(message) => Error::new(ErrorKind::UnknownError, message),
        }
    }

    /// Normalize an arbitrary failure
    ///
    /// Errors that are already normalized pass through unchanged.
    pub fn from_failure(error: anyhow::Error) -> Self {
        let error = match error.downcast::<Error>() {
            Ok(normalized) => return normalized,
            Err(other) => other,
        };
        let error = match error.downcast::<TransportError>() {
            Ok(transport) => return Error::from_transport(transport),
            Err(other) => other,
        };
        let error = match error.downcast::<reqwest::Error>() {
            Ok(request) => return Error::from_transport(request.into()),
            Err(other) => other,
        };
        if error.is::<tokio::time::error::Elapsed>() {
            return Error::timed_out();
        }
        Error::new(ErrorKind::UnknownError, error.to_string())
    }

    /// Best-effort conversion for values that are not errors at all
    pub fn from_display(value: impl std::fmt::Display) -> Self {
        Error::new(ErrorKind::UnknownError, value.to_string())
    }

    pub(crate) fn timed_out() -> Self {
        Error::new(ErrorKind::NetworkError, TIMEOUT_MESSAGE)
    }
}

impl From<TransportError> for Error {
    fn from(error: TransportError) -> Self {
        Error::from_transport(error)
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::from_failure(error)
    }
}

fn extract_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .or_else(|| body.get("message").and_then(Value::as_str))
        .map(str::to_string)
}

fn extract_details(body: &Value) -> Option<Value> {
    body.get("error")
        .and_then(|e| e.get("details"))
        .or_else(|| body.get("details"))
        .cloned()
}
