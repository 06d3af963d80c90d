//! Config file read/write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::schema::ChatRelayConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Written by `chatrelay config init`.
pub const STARTER_CONFIG: &str = r#"# chatrelay configuration
provider:
  kind: openai            # openai | ollama | mock
  model: gpt-4o
  apiKey: ${OPENAI_API_KEY}
  # baseUrl: https://api.openai.com/v1
  # systemPrompt: You are a helpful assistant.
  connectTimeoutSecs: 10
  requestTimeoutSecs: 120

relay:
  fallbackText: Sorry, there was an error getting a response.

storage:
  kind: local             # local | http
  dir: data/media
  maxUploadMb: 25
  # endpoint: https://s3.example.com
  # bucket: chat-uploads
  # token: ${STORAGE_TOKEN}
  # publicBaseUrl: https://cdn.example.com

gateway:
  host: 127.0.0.1
  port: 8080

logging:
  level: info
  # dir: logs
"#;

/// Resolve the chatrelay config directory.
/// Priority: `CHATRELAY_CONFIG_DIR` env > `~/.chatrelay/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHATRELAY_CONFIG_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    match dirs::home_dir() {
        Some(home) => home.join(".chatrelay"),
        None => PathBuf::from(".chatrelay"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the raw YAML document as a JSON value tree, before env substitution.
///
/// A missing file reads as an empty mapping (first run).
pub async fn load_raw(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }

    let value: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(value)
}

/// Load and parse the config from disk without env substitution or defaults.
pub async fn load_config(path: &Path) -> Result<ChatRelayConfig> {
    let value = load_raw(path).await?;
    serde_json::from_value(value)
        .with_context(|| format!("Invalid config at: {}", path.display()))
}

/// Write a config document verbatim, e.g. [`STARTER_CONFIG`].
pub async fn write_config_text(text: &str, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        let bak = path.with_extension("yaml.bak");
        if let Err(e) = fs::copy(path, &bak).await {
            warn!("Failed to create backup {}: {}", bak.display(), e);
        }
    }

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, text.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.yaml")).await.unwrap();
        assert_eq!(cfg, ChatRelayConfig::default());
    }

    #[tokio::test]
    async fn write_then_load_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());

        write_config_text("gateway:\n  port: 9001\n", &path).await.unwrap();
        write_config_text("gateway:\n  port: 9002\n", &path).await.unwrap();

        let cfg = load_config(&path).await.unwrap();
        assert_eq!(cfg.gateway().port, Some(9002));
        let backup = std::fs::read_to_string(path.with_extension("yaml.bak")).unwrap();
        assert!(backup.contains("9001"));
    }

    #[tokio::test]
    async fn starter_config_parses() {
        let value: serde_json::Value = serde_yaml::from_str(STARTER_CONFIG).unwrap();
        assert_eq!(value["provider"]["apiKey"], "${OPENAI_API_KEY}");
        assert_eq!(value["storage"]["maxUploadMb"], 25);
    }

    #[tokio::test]
    async fn invalid_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "provider: [unclosed").unwrap();
        assert!(load_config(&path).await.is_err());
    }
}
