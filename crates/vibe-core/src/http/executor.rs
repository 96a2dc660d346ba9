//! Request execution
//!
//! One call = resolve token, build the wire request for the active transport
//! mode, send it under the configured deadline, then normalize the result.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, trace};

use crate::config::ResolvedConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::http::request::{build_wire_request, RequestOptions, TransportMode};
use crate::http::response::parse_body;
use crate::http::transport::{HttpTransport, WireRequest, WireResponse};

/// Issues requests against the configured backend
#[derive(Clone)]
pub struct RequestExecutor {
    config: Arc<ResolvedConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    pub fn new(config: Arc<ResolvedConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn mode(&self) -> TransportMode {
        TransportMode::select(&self.config)
    }

    /// Execute a logical request and return the parsed success body
    pub async fn execute(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let token = if options.skip_auth {
            None
        } else {
            self.resolve_token().await?
        };

        let timestamp = chrono::Utc::now().timestamp();
        let request = build_wire_request(&self.config, endpoint, &options, token.as_deref(), timestamp)
            .map_err(|e| Error::new(ErrorKind::UnknownError, format!("Failed to sign request: {}", e)))?;

        self.log_request(&options, &request);

        let response = match tokio::time::timeout(self.config.timeout(), self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(Error::from_transport(e)),
            Err(_) => {
                self.log_timeout(endpoint);
                return Err(Error::timed_out());
            }
        };

        self.log_response(&response);

        if !response.is_success() {
            return Err(Error::from_response(
                response.status,
                &response.status_text,
                &response.body,
            ));
        }

        parse_body(response.status, &response.body)
    }

    async fn resolve_token(&self) -> Result<Option<String>> {
        let Some(supplier) = self.config.token_supplier() else {
            return Ok(None);
        };
        supplier.access_token().await.map_err(Error::from_failure)
    }

    fn log_request(&self, options: &RequestOptions, request: &WireRequest) {
        if self.config.debug() {
            info!(
                method = %request.method,
                url = %request.url,
                logical_method = %options.method,
                "vibe request"
            );
        } else {
            trace!(method = %request.method, url = %request.url, "vibe request");
        }
    }

    fn log_response(&self, response: &WireResponse) {
        if self.config.debug() {
            info!(status = response.status, "vibe response");
        } else {
            trace!(status = response.status, "vibe response");
        }
    }

    fn log_timeout(&self, endpoint: &str) {
        let timeout_ms = self.config.timeout().as_millis() as u64;
        if self.config.debug() {
            info!(endpoint, timeout_ms, "vibe request timed out");
        } else {
            trace!(endpoint, timeout_ms, "vibe request timed out");
        }
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
