//! Configuration management for the CLI
//!
//! Settings come from, highest precedence first:
//! - Command-line flags
//! - A configuration file (TOML, YAML or JSON)
//! - `VIBE_*` environment variables and `.env`
//! - Built-in defaults

use crate::cli::ConnectionArgs;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vibe_core::{ClientOptions, StaticToken};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings
    pub connection: ConnectionConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Backend connection settings; unset fields fall through to the environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub api_url: Option<String>,
    pub idp_url: Option<String>,
    pub client_id: Option<String>,
    pub signing_key: Option<String>,
    pub require_signing: Option<bool>,
    pub collection_group: Option<String>,
    pub timeout_ms: Option<u64>,
    pub debug: Option<bool>,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Maximum columns shown in record tables
    pub max_columns: usize,

    /// Maximum characters per table cell
    pub max_cell_width: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `-v` flags override it
    pub level: Option<String>,

    /// Log format (compact, full, json)
    pub format: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_columns: 6,
            max_cell_width: 40,
        }
    }
}

/// File formats understood by [`Config::from_file`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::of(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Json => serde_json::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content).map_err(|e| Error::InvalidFormat {
                path: path.to_path_buf(),
                expected: format!("TOML ({})", e.message()),
            })?,
        };

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        match Self::locate() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            Self::from_file(path)
        } else {
            Self::load()
        }
    }

    /// First default configuration file that exists
    pub fn locate() -> Option<PathBuf> {
        Self::default_config_paths().into_iter().find(|p| p.exists())
    }

    /// Default configuration file paths, in search order
    pub fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("vibe.toml"), PathBuf::from(".vibe.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vibe").join("config.toml"));
        }

        paths
    }

    /// Client options from this file, overridden by command-line flags
    pub fn client_options(&self, flags: &ConnectionArgs) -> ClientOptions {
        let file = &self.connection;
        let mut options = ClientOptions::new();

        options.api_url = flags.api_url.clone().or_else(|| file.api_url.clone());
        options.idp_url = flags.idp_url.clone().or_else(|| file.idp_url.clone());
        options.client_id = flags.client_id.clone().or_else(|| file.client_id.clone());
        options.signing_key = flags.signing_key.clone().or_else(|| file.signing_key.clone());
        options.require_signing = file.require_signing;
        options.collection_group = flags
            .collection_group
            .clone()
            .or_else(|| file.collection_group.clone());
        options.timeout_millis = flags.timeout_ms.or(file.timeout_ms);
        options.debug = if flags.debug { Some(true) } else { file.debug };

        if let Some(token) = flags.token.as_deref().filter(|t| !t.is_empty()) {
            options = options.token_supplier(StaticToken::new(token));
        }

        options
    }
}
