//! Wire-shape selection for direct and proxy transports
//!
//! Direct mode sends the logical request as-is to `{api_url}{endpoint}`.
//! Proxy mode tunnels it as `POST {idp_url}/api/vibe/proxy` with body
//! `{endpoint, method, data}`, signed over the logical method and endpoint.

use reqwest::Method;
use serde_json::{json, Value};

use crate::config::{ProxySigning, ResolvedConfig};
use crate::http::signature::SignatureError;
use crate::http::transport::WireRequest;

pub const PROXY_PATH: &str = "/api/vibe/proxy";
pub const HEADER_CLIENT_ID: &str = "X-Vibe-Client-Id";
pub const HEADER_TIMESTAMP: &str = "X-Vibe-Timestamp";
pub const HEADER_SIGNATURE: &str = "X-Vibe-Signature";

/// Per-call options for [`crate::http::RequestExecutor::execute`]
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Do not consult the token supplier
    pub skip_auth: bool,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            skip_auth: false,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post(body: Value) -> Self {
        Self::new(Method::POST).with_body(body)
    }

    pub fn patch(body: Value) -> Self {
        Self::new(Method::PATCH).with_body(body)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Which wire protocol a request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Direct,
    Proxy,
}

impl TransportMode {
    pub fn select(config: &ResolvedConfig) -> Self {
        if config.use_proxy() {
            TransportMode::Proxy
        } else {
            TransportMode::Direct
        }
    }
}

/// Build the request that actually goes on the wire
///
/// `timestamp` is unix seconds and is only used when signing.
pub fn build_wire_request(
    config: &ResolvedConfig,
    endpoint: &str,
    options: &RequestOptions,
    token: Option<&str>,
    timestamp: i64,
) -> Result<WireRequest, SignatureError> {
    let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
    if let Some(token) = token {
        headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    }

    match TransportMode::select(config) {
        TransportMode::Direct => {
            if options.body.is_some() {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
            }
            Ok(WireRequest {
                method: options.method.clone(),
                url: format!("{}{}", config.api_url(), endpoint),
                headers,
                body: options.body.clone(),
            })
        }
        TransportMode::Proxy => {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
            headers.push((HEADER_CLIENT_ID.to_string(), config.client_id().to_string()));

            if let ProxySigning::Signed(key) = config.signing() {
                let signature = key.sign(timestamp, options.method.as_str(), endpoint)?;
                headers.push((HEADER_TIMESTAMP.to_string(), timestamp.to_string()));
                headers.push((HEADER_SIGNATURE.to_string(), signature));
            }

            Ok(WireRequest {
                method: Method::POST,
                url: format!("{}{}", config.idp_url(), PROXY_PATH),
                headers,
                body: Some(json!({
                    "endpoint": endpoint,
                    "method": options.method.as_str(),
                    "data": options.body.clone().unwrap_or(Value::Null),
                })),
            })
        }
    }
}
