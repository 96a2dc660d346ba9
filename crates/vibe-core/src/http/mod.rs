//! HTTP layer for the Vibe backend
//!
//! This module provides:
//! - HMAC request signing for proxy mode
//! - Direct / proxy wire-shape selection
//! - Request execution with deadlines and auth headers
//! - Success-envelope unwrapping
//! - Error normalization into the closed error taxonomy

pub mod error;
pub mod executor;
pub mod request;
pub mod response;
pub mod signature;
pub mod transport;

pub use error::{NETWORK_MESSAGE, TIMEOUT_MESSAGE};
pub use executor::RequestExecutor;
pub use request::{build_wire_request, RequestOptions, TransportMode, PROXY_PATH};
pub use response::{
    is_document_envelope, parse_body, total_count, unwrap_document_envelope, unwrap_list,
    unwrap_one, ListEnvelope, SingleEnvelope,
};
pub use signature::{sign, SignatureError, SigningKey};
pub use transport::{HttpTransport, ReqwestTransport, TransportError, WireRequest, WireResponse};

// Re-export commonly used types
pub use reqwest::{Method, StatusCode};
