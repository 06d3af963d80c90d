//! Builds the injected collaborators from config.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use chatrelay_config::{ChatRelayConfig, ProviderConfig, StorageConfig};
use chatrelay_core::{ChatError, CompletionProvider, MediaStore};
use chatrelay_media::{HttpObjectStore, LocalMediaStore};
use chatrelay_providers::{http_client, MockProvider, OllamaProvider, OpenAiProvider, ProviderRegistry};
use chatrelay_relay::ReplyProducer;

fn config_error(message: impl Into<String>) -> anyhow::Error {
    ChatError::Config(message.into()).into()
}

/// Every known provider kind, configured from `config`. The configured
/// model only applies to the selected kind; the others keep their defaults.
pub fn build_registry(config: &ProviderConfig) -> Result<ProviderRegistry> {
    let client = http_client(
        Duration::from_secs(config.connect_timeout_secs.unwrap_or(10)),
        config.request_timeout_secs.map(Duration::from_secs),
    )?;
    let kind = config.kind.as_deref().unwrap_or("openai");
    let model = config.model.as_deref();

    let mut openai = OpenAiProvider::new(config.api_key.clone().unwrap_or_default()).with_client(client.clone());
    let ollama_model = model.filter(|_| kind == "ollama").unwrap_or("llama3");
    let mut ollama = OllamaProvider::new(ollama_model).with_client(client);
    if let Some(model) = model.filter(|_| kind == "openai") {
        openai = openai.with_model(model);
    }
    if let Some(url) = &config.base_url {
        match kind {
            "openai" => openai = openai.with_base_url(url),
            "ollama" => ollama = ollama.with_base_url(url),
            _ => {}
        }
    }
    if let Some(prompt) = &config.system_prompt {
        openai = openai.with_system_prompt(prompt);
        ollama = ollama.with_system_prompt(prompt);
    }

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(openai));
    registry.register(Arc::new(ollama));
    registry.register(Arc::new(MockProvider::echo("mock")));
    Ok(registry)
}

pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    let registry = build_registry(config)?;
    let kind = config.kind.as_deref().unwrap_or("openai");
    let Some(provider) = registry.get(kind) else {
        return Err(config_error(format!(
            "unknown provider kind '{kind}' (known: {})",
            registry.list().join(", ")
        )));
    };

    info!(provider = %provider.name(), model = ?config.model, "Provider ready");
    Ok(provider)
}

/// The store plus the directory to serve under `/media` when it is local.
pub fn build_store(config: &StorageConfig) -> Result<(Arc<dyn MediaStore>, Option<PathBuf>)> {
    let max_bytes = config.max_upload_bytes();
    match config.kind.as_deref().unwrap_or("local") {
        "local" => {
            let dir = PathBuf::from(config.dir.as_deref().unwrap_or("data/media"));
            let base = config
                .public_base_url
                .clone()
                .ok_or_else(|| config_error("storage.publicBaseUrl is required for the local store"))?;
            let store = LocalMediaStore::new(&dir, base).with_max_bytes(max_bytes);
            Ok((Arc::new(store), Some(dir)))
        }
        "http" => {
            let endpoint = config
                .endpoint
                .as_deref()
                .ok_or_else(|| config_error("storage.endpoint is required"))?;
            let bucket = config
                .bucket
                .as_deref()
                .ok_or_else(|| config_error("storage.bucket is required"))?;
            let base = config
                .public_base_url
                .as_deref()
                .ok_or_else(|| config_error("storage.publicBaseUrl is required"))?;
            let mut store = HttpObjectStore::new(endpoint, bucket, base).with_max_bytes(max_bytes);
            if let Some(token) = &config.token {
                store = store.with_token(token);
            }
            Ok((Arc::new(store), None))
        }
        other => Err(config_error(format!("unknown storage kind '{other}'"))),
    }
}

pub fn build_producer(config: &ChatRelayConfig) -> Result<ReplyProducer> {
    let provider = build_provider(&config.provider())?;
    let mut producer = ReplyProducer::new(provider);
    if let Some(text) = config.relay().fallback_text {
        producer = producer.with_fallback_text(text);
    }
    Ok(producer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_config::apply_all_defaults;

    #[test]
    fn builds_from_defaults() {
        let cfg = apply_all_defaults(ChatRelayConfig::default());
        let producer = build_producer(&cfg).unwrap();
        assert_eq!(producer.provider_name(), "openai");

        let (store, dir) = build_store(&cfg.storage()).unwrap();
        assert_eq!(store.name(), "local");
        assert_eq!(dir, Some(PathBuf::from("data/media")));
    }

    #[test]
    fn mock_and_http_kinds() {
        let provider = build_provider(&ProviderConfig {
            kind: Some("mock".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(provider.name(), "mock");

        let (store, dir) = build_store(&StorageConfig {
            kind: Some("http".into()),
            endpoint: Some("https://s3.example.com".into()),
            bucket: Some("b".into()),
            public_base_url: Some("https://cdn.example.com".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(store.name(), "http");
        assert!(dir.is_none());
    }

    #[test]
    fn registry_holds_every_kind() {
        let registry = build_registry(&ProviderConfig::default()).unwrap();
        assert_eq!(registry.list(), vec!["mock", "ollama", "openai"]);
    }

    #[test]
    fn unknown_kinds_fail() {
        let err = build_provider(&ProviderConfig {
            kind: Some("nope".into()),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err.downcast_ref::<ChatError>(), Some(ChatError::Config(m)) if m.contains("nope")));

        let err = build_store(&StorageConfig {
            kind: Some("ftp".into()),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err.downcast_ref::<ChatError>(), Some(ChatError::Config(_))));
    }

    #[test]
    fn http_store_requires_bucket() {
        let err = build_store(&StorageConfig {
            kind: Some("http".into()),
            endpoint: Some("https://s3.example.com".into()),
            public_base_url: Some("https://cdn.example.com".into()),
            ..Default::default()
        })
        .err()
        .unwrap();
        assert_eq!(err.to_string(), "configuration error: storage.bucket is required");
    }
}
