//! `chatrelay-config`: chatrelay runtime configuration.
//!
//! Provides:
//! - Typed config schema (provider, relay, storage, gateway, logging)
//! - YAML read/write with a backup of the previous file
//! - `${ENV_VAR}` substitution
//! - Config redaction for safe display
//! - Default value application
//! - Validation with errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{
    config_dir, config_file_path, load_config, load_raw, write_config_text,
    STARTER_CONFIG,
};
pub use redact::{collect_redacted_paths, redact, redacted_yaml};
pub use schema::{
    ChatRelayConfig, GatewayConfig, LoggingConfig, ProviderConfig, RelayConfig, StorageConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Env var consulted when `provider.apiKey` is unset.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Load, substitute env vars, apply defaults, and validate a config file.
///
/// This is the main entry point for loading a config at runtime. Validation
/// warnings are logged; validation errors fail the load.
pub async fn load_and_prepare(path: &Path) -> Result<ChatRelayConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();
    load_and_prepare_with(path, &env).await
}

/// [`load_and_prepare`] against an explicit environment.
pub async fn load_and_prepare_with(path: &Path, env: &HashMap<String, String>) -> Result<ChatRelayConfig> {
    let raw = load_raw(path).await?;
    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: ChatRelayConfig = serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))?;
    let mut config = apply_all_defaults(config);

    if let Some(provider) = config.provider.as_mut() {
        if provider.api_key.as_deref().map_or(true, str::is_empty) {
            provider.api_key = env.get(API_KEY_ENV).filter(|k| !k.is_empty()).cloned();
        }
    }

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        return Err(first).context(format!("Invalid config at: {}", path.display()));
    }

    Ok(config)
}
