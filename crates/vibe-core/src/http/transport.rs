//! Transport seam between the request executor and the network
//!
//! The executor only ever sees [`WireRequest`] / [`WireResponse`]; the
//! default [`ReqwestTransport`] maps those onto `reqwest`.

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;

use crate::error::ConfigError;

/// A fully built request, ready to go on the wire
#[derive(Debug, Clone, PartialEq)]
pub struct WireRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl WireRequest {
    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status line and raw body text
#[derive(Debug, Clone, PartialEq)]
pub struct WireResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl WireResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP layer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, reset, body read)
    #[error("network request failed: {0}")]
    Network(String),

    /// The request was cancelled by a deadline
    #[error("request timed out")]
    Timeout,

    /// Anything the transport could not classify
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() || error.is_request() || error.is_body() || error.is_decode() {
            TransportError::Network(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

/// Sends a request and returns its status and body
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError>;
}

/// Default transport backed by `reqwest`
///
/// No client-level timeout is set; the executor owns the deadline.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ConfigError> {
        let client = ReqwestClient::builder()
            .user_agent(concat!("vibe-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Transport {
                message: e.to_string(),
                source: Some(e.into()),
            })?;
        Ok(Self { client })
    }

    /// Reuse an existing `reqwest` client (connection pool, proxies, TLS)
    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(WireResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_response_status_text() {
        let response = WireResponse::new(404, "");
        assert_eq!(response.status_text, "Not Found");
        assert!(!response.is_success());
        assert!(WireResponse::new(204, "").is_success());
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = WireRequest {
            method: Method::GET,
            url: "http://localhost/v1/todos".to_string(),
            headers: vec![("X-Vibe-Client-Id".to_string(), "app".to_string())],
            body: None,
        };
        assert_eq!(request.header("x-vibe-client-id"), Some("app"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn test_transport_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }
}
