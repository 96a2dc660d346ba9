//! Client facade
//!
//! Owns the resolved configuration and request executor, and hands out
//! collection accessors and the admin API built on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::admin::AdminApi;
use crate::collection::Collection;
use crate::config::{ClientOptions, ProcessEnv, ResolvedConfig};
use crate::error::{ConfigError, Result};
use crate::http::{HttpTransport, RequestExecutor, RequestOptions, ReqwestTransport};

/// Entry point to the Vibe backend
///
/// Cloning is cheap; clones share configuration, transport and the
/// accessor cache.
#[derive(Clone)]
pub struct Client {
    executor: Arc<RequestExecutor>,
    collections: Arc<Mutex<HashMap<String, Arc<Collection>>>>,
}

impl Client {
    /// Build a client from explicit options, the process environment and
    /// a `.env` file, in that order of precedence
    pub fn new(options: ClientOptions) -> std::result::Result<Self, ConfigError> {
        let config = options.resolve(&ProcessEnv::with_dotenv())?;
        Self::with_config(config)
    }

    /// Build a client from the environment and defaults only
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::new(ClientOptions::default())
    }

    /// Build a client from an already resolved configuration
    pub fn with_config(config: ResolvedConfig) -> std::result::Result<Self, ConfigError> {
        let transport = ReqwestTransport::new()?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Build a client over a custom transport
    pub fn with_transport(config: ResolvedConfig, transport: Arc<dyn HttpTransport>) -> Self {
        tracing::debug!(
            api_url = %config.api_url(),
            proxy = config.use_proxy(),
            signed = config.signing().is_signed(),
            "Creating Vibe client"
        );
        Self {
            executor: Arc::new(RequestExecutor::new(Arc::new(config), transport)),
            collections: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &ResolvedConfig {
        self.executor.config()
    }

    /// Accessor for a named collection; the same instance is returned for
    /// the same name
    pub fn collection(&self, name: &str) -> Arc<Collection> {
        let mut cache = self
            .collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Collection::new(name, self.executor.clone())))
            .clone()
    }

    pub fn admin(&self) -> AdminApi {
        AdminApi::new(self.executor.clone())
    }

    /// Issue a raw request through the executor
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        self.executor.execute(endpoint, options).await
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}

/// Shorthand for [`Client::new`]
pub fn create_client(options: ClientOptions) -> std::result::Result<Client, ConfigError> {
    Client::new(options)
}
