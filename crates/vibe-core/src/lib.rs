//! Vibe Core - typed client for the Vibe document/collection backend
//!
//! This crate provides the request, authentication and response
//! normalization layer shared by the two backend transport modes:
//!
//! - **Direct mode**: REST calls against `{api_url}/v1/...`
//! - **Proxy mode**: every call tunneled through `POST {idp_url}/api/vibe/proxy`,
//!   HMAC-signed when a signing key is configured
//!
//! # Main Components
//!
//! - **Configuration**: explicit options > environment > defaults ([`ClientOptions`])
//! - **HTTP layer**: signing, wire-shape selection, execution, envelope unwrapping
//!   and error normalization ([`http`])
//! - **Collections**: typed list/get/create/update/delete ([`Collection`])
//! - **Admin**: roles, users and tenant endpoints ([`AdminApi`])
//! - **Retry**: opt-in backoff driven by [`is_retryable`] ([`retry`])
//!
//! # Example
//!
//! ```no_run
//! use serde_json::Value;
//! use vibe_core::{ClientOptions, Client, ListQuery};
//!
//! async fn example() -> vibe_core::Result<()> {
//!     let client = Client::new(ClientOptions::new().api_url("https://api.example.com"))
//!         .expect("valid configuration");
//!     let todos = client.collection("todos");
//!     let page = todos.list::<Value>(&ListQuery::new().limit(10)).await?;
//!     println!("{} of {}", page.data.len(), page.pagination.total);
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;

// Re-export main types for convenience
pub use admin::AdminApi;
pub use client::{create_client, Client};
pub use collection::{
    Collection, FilterValue, ListQuery, ListResult, OrderDirection, Pagination,
};
pub use config::{
    ClientOptions, EnvSource, ProcessEnv, ProxySigning, ResolvedConfig, StaticToken,
    TokenSupplier,
};
pub use error::{is_retryable, ConfigError, Error, ErrorKind, Result};
pub use http::{HttpTransport, Method, RequestOptions, TransportMode};
pub use retry::{retry_with_backoff, RetryPolicy};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
