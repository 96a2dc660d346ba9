//! Client configuration
//!
//! Settings resolve in three tiers: explicit [`ClientOptions`] first, then an
//! [`EnvSource`], then the built-in defaults below. The result is an
//! immutable [`ResolvedConfig`] shared by everything a client creates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::ConfigError;
use crate::http::signature::SigningKey;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_COLLECTION_GROUP: &str = "default";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable names read by [`ClientOptions::resolve`]
pub mod env_keys {
    pub const API_URL: &str = "VIBE_API_URL";
    pub const IDP_URL: &str = "VIBE_IDP_URL";
    pub const CLIENT_ID: &str = "VIBE_CLIENT_ID";
    pub const SIGNING_KEY: &str = "VIBE_SIGNING_KEY";
    pub const REQUIRE_SIGNING: &str = "VIBE_REQUIRE_SIGNING";
    pub const COLLECTION_GROUP: &str = "VIBE_COLLECTION_GROUP";
    pub const DEBUG: &str = "VIBE_DEBUG";
    pub const TIMEOUT_MS: &str = "VIBE_TIMEOUT_MS";
}

/// Key/value source for the environment tier
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Set once the first `.env` lookup has run, whether or not a file was found
static DOTENV_LOADED: OnceLock<bool> = OnceLock::new();

/// Reads the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    /// Load `.env` from the working directory (if any) before reading
    ///
    /// The file is read at most once per process; later calls only read
    /// the environment.
    pub fn with_dotenv() -> Self {
        DOTENV_LOADED.get_or_init(|| match dotenv::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded .env file");
                true
            }
            Err(_) => false,
        });
        Self
    }

    /// Whether a `.env` file has been looked up and found
    pub fn dotenv_loaded() -> Option<bool> {
        DOTENV_LOADED.get().copied()
    }
}

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Supplies a bearer token for each authenticated call
///
/// Called fresh on every request that does not skip auth. Returning
/// `Ok(None)` sends the request without an `Authorization` header.
#[async_trait]
pub trait TokenSupplier: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<Option<String>>;
}

/// A fixed token, or none
#[derive(Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("StaticToken(***)"),
            None => f.write_str("StaticToken(None)"),
        }
    }
}

#[async_trait]
impl TokenSupplier for StaticToken {
    async fn access_token(&self) -> anyhow::Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// How proxy-mode requests are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySigning {
    /// Requests carry `X-Vibe-Timestamp` and `X-Vibe-Signature`
    Signed(SigningKey),
    /// Legacy mode: no signing key was configured
    Unsigned,
}

impl ProxySigning {
    pub fn is_signed(&self) -> bool {
        matches!(self, ProxySigning::Signed(_))
    }
}

/// Explicit settings; every `None` falls through to the environment
#[derive(Clone, Default)]
pub struct ClientOptions {
    pub api_url: Option<String>,
    /// Proxy host. `Some("")` forces direct mode regardless of environment.
    pub idp_url: Option<String>,
    pub client_id: Option<String>,
    /// Base64-encoded HMAC key
    pub signing_key: Option<String>,
    /// Refuse to build a proxy-mode client without a signing key
    pub require_signing: Option<bool>,
    pub collection_group: Option<String>,
    pub debug: Option<bool>,
    pub timeout_millis: Option<u64>,
    pub token_supplier: Option<Arc<dyn TokenSupplier>>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn idp_url(mut self, url: impl Into<String>) -> Self {
        self.idp_url = Some(url.into());
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = Some(key.into());
        self
    }

    pub fn require_signing(mut self, require: bool) -> Self {
        self.require_signing = Some(require);
        self
    }

    pub fn collection_group(mut self, group: impl Into<String>) -> Self {
        self.collection_group = Some(group.into());
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn timeout_millis(mut self, millis: u64) -> Self {
        self.timeout_millis = Some(millis);
        self
    }

    pub fn token_supplier(mut self, supplier: impl TokenSupplier + 'static) -> Self {
        self.token_supplier = Some(Arc::new(supplier));
        self
    }

    /// Resolve against an environment source
    pub fn resolve(&self, env: &dyn EnvSource) -> Result<ResolvedConfig, ConfigError> {
        let api_url = pick_string(&self.api_url, env, env_keys::API_URL)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        // An explicit empty proxy host is meaningful: it pins direct mode.
        let idp_url = match &self.idp_url {
            Some(url) => url.trim().to_string(),
            None => non_empty(env.get(env_keys::IDP_URL)).unwrap_or_default(),
        };

        let client_id = pick_string(&self.client_id, env, env_keys::CLIENT_ID).unwrap_or_default();
        let collection_group = pick_string(&self.collection_group, env, env_keys::COLLECTION_GROUP)
            .unwrap_or_else(|| DEFAULT_COLLECTION_GROUP.to_string());

        let require_signing = match self.require_signing {
            Some(value) => value,
            None => env_bool(env, env_keys::REQUIRE_SIGNING)?.unwrap_or(false),
        };
        let debug = match self.debug {
            Some(value) => value,
            None => env_bool(env, env_keys::DEBUG)?.unwrap_or(false),
        };
        let timeout_millis = match self.timeout_millis {
            Some(value) => value,
            None => env_u64(env, env_keys::TIMEOUT_MS)?.unwrap_or(DEFAULT_TIMEOUT_MS),
        };
        if timeout_millis == 0 {
            return Err(ConfigError::invalid(env_keys::TIMEOUT_MS, "timeout must be greater than zero"));
        }

        // Direct mode never signs, so a key there is neither decoded nor validated.
        let signing = match pick_string(&self.signing_key, env, env_keys::SIGNING_KEY) {
            Some(encoded) if !idp_url.is_empty() => {
                ProxySigning::Signed(SigningKey::from_base64(&encoded)?)
            }
            Some(_) => {
                tracing::debug!("Ignoring signing key in direct mode");
                ProxySigning::Unsigned
            }
            None => ProxySigning::Unsigned,
        };

        let config = ResolvedConfig {
            api_url: api_url.trim_end_matches('/').to_string(),
            idp_url: idp_url.trim_end_matches('/').to_string(),
            client_id,
            signing,
            collection_group,
            debug,
            timeout: Duration::from_millis(timeout_millis),
            token_supplier: self.token_supplier.clone(),
        };

        if config.use_proxy() && !config.signing.is_signed() {
            if require_signing {
                return Err(ConfigError::MissingSigningKey);
            }
            tracing::warn!(
                idp_url = %config.idp_url,
                "No signing key configured; proxy requests will be sent unsigned"
            );
        }

        Ok(config)
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_url", &self.api_url)
            .field("idp_url", &self.idp_url)
            .field("client_id", &self.client_id)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "***"))
            .field("require_signing", &self.require_signing)
            .field("collection_group", &self.collection_group)
            .field("debug", &self.debug)
            .field("timeout_millis", &self.timeout_millis)
            .field("token_supplier", &self.token_supplier.is_some())
            .finish()
    }
}

/// Immutable configuration owned by a client
#[derive(Clone)]
pub struct ResolvedConfig {
    api_url: String,
    idp_url: String,
    client_id: String,
    signing: ProxySigning,
    collection_group: String,
    debug: bool,
    timeout: Duration,
    token_supplier: Option<Arc<dyn TokenSupplier>>,
}

impl ResolvedConfig {
    /// Resolve defaults and the process environment, loading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        ClientOptions::default().resolve(&ProcessEnv::with_dotenv())
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn idp_url(&self) -> &str {
        &self.idp_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn signing(&self) -> &ProxySigning {
        &self.signing
    }

    pub fn collection_group(&self) -> &str {
        &self.collection_group
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token_supplier(&self) -> Option<&Arc<dyn TokenSupplier>> {
        self.token_supplier.as_ref()
    }

    /// Derived: proxy mode iff a proxy host resolved
    pub fn use_proxy(&self) -> bool {
        !self.idp_url.is_empty()
    }
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_url", &self.api_url)
            .field("idp_url", &self.idp_url)
            .field("use_proxy", &self.use_proxy())
            .field("client_id", &self.client_id)
            .field("signing", &self.signing)
            .field("collection_group", &self.collection_group)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .field("token_supplier", &self.token_supplier.is_some())
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pick_string(explicit: &Option<String>, env: &dyn EnvSource, key: &str) -> Option<String> {
    non_empty(explicit.clone()).or_else(|| non_empty(env.get(key)))
}

fn env_bool(env: &dyn EnvSource, key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = non_empty(env.get(key)) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::invalid(key, format!("expected a boolean, got '{}'", raw))),
    }
}

fn env_u64(env: &dyn EnvSource, key: &str) -> Result<Option<u64>, ConfigError> {
    non_empty(env.get(key))
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|e| ConfigError::invalid(key, format!("'{}': {}", raw, e)))
        })
        .transpose()
}
