//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConnectionArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use vibe_core::ResolvedConfig;

/// Handle the config command
pub async fn handle_config(
    args: ConfigArgs,
    connection: &ConnectionArgs,
    config: &Config,
    config_file: Option<&Path>,
    output: &mut OutputWriter,
) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let client = super::build_client(connection, config)?;
            show(client.config(), output)
        }
        ConfigAction::Path => path(config_file, output),
    }
}

/// Secret-free summary of the effective client configuration
pub(crate) fn config_summary(resolved: &ResolvedConfig) -> Value {
    json!({
        "mode": if resolved.use_proxy() { "proxy" } else { "direct" },
        "api_url": resolved.api_url(),
        "idp_url": resolved.idp_url(),
        "client_id": resolved.client_id(),
        "signing": if resolved.signing().is_signed() { "signed" } else { "unsigned" },
        "collection_group": resolved.collection_group(),
        "timeout_ms": resolved.timeout().as_millis() as u64,
        "debug": resolved.debug(),
        "token_supplier": resolved.token_supplier().is_some(),
    })
}

fn show(resolved: &ResolvedConfig, output: &mut OutputWriter) -> Result<()> {
    let summary = config_summary(resolved);
    if !output.is_human() {
        return output.data(&summary);
    }

    output.section("Effective Configuration")?;
    if let Value::Object(map) = &summary {
        for (key, value) in map {
            let text = match value {
                Value::String(s) if s.is_empty() => "(not set)".to_string(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            output.field(key, &text)?;
        }
    }
    if resolved.use_proxy() && !resolved.signing().is_signed() {
        output.warning("Proxy requests are unsigned; set VIBE_SIGNING_KEY or --signing-key")?;
    }
    Ok(())
}

fn path(config_file: Option<&Path>, output: &mut OutputWriter) -> Result<()> {
    let in_use: Option<PathBuf> = match config_file {
        Some(path) => Some(path.to_path_buf()),
        None => Config::locate(),
    };
    let searched: Vec<String> = Config::default_config_paths()
        .iter()
        .map(|p| p.display().to_string())
        .collect();

    if !output.is_human() {
        return output.data(&json!({
            "in_use": in_use.as_ref().map(|p| p.display().to_string()),
            "search_paths": searched,
        }));
    }

    match &in_use {
        Some(path) => output.field("in use", &path.display().to_string())?,
        None => output.field("in use", "(none, using environment and defaults)")?,
    }
    output.section("Search Paths")?;
    for path in &searched {
        output.writeln(&format!("  {}", path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use vibe_core::{ClientOptions, StaticToken};

    #[test]
    fn test_summary_never_contains_secrets() {
        let resolved = ClientOptions::new()
            .idp_url("https://idp.example.com")
            .client_id("app")
            .signing_key("c2VjcmV0")
            .token_supplier(StaticToken::new("super-secret-token"))
            .resolve(&HashMap::<String, String>::new())
            .unwrap();

        let summary = config_summary(&resolved);
        let text = summary.to_string();

        assert_eq!(summary["mode"], "proxy");
        assert_eq!(summary["signing"], "signed");
        assert_eq!(summary["token_supplier"], true);
        assert!(!text.contains("c2VjcmV0"));
        assert!(!text.contains("super-secret-token"));
    }

    #[test]
    fn test_summary_direct_mode() {
        let resolved = ClientOptions::new()
            .api_url("http://localhost:8080")
            .idp_url("")
            .resolve(&HashMap::<String, String>::new())
            .unwrap();

        let summary = config_summary(&resolved);
        assert_eq!(summary["mode"], "direct");
        assert_eq!(summary["api_url"], "http://localhost:8080");
        assert_eq!(summary["signing"], "unsigned");
    }
}
