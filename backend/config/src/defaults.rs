//! Config defaults: fills every unset field of a parsed config.

use chatrelay_core::DEFAULT_FALLBACK_TEXT;

use crate::schema::{
    ChatRelayConfig, GatewayConfig, LoggingConfig, ProviderConfig, RelayConfig, StorageConfig,
};

pub const DEFAULT_PROVIDER_KIND: &str = "openai";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_STORAGE_KIND: &str = "local";
pub const DEFAULT_STORAGE_DIR: &str = "data/media";
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 25;

pub const DEFAULT_GATEWAY_HOST: &str = "127.0.0.1";
pub const DEFAULT_GATEWAY_PORT: u16 = 8080;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ChatRelayConfig) -> ChatRelayConfig {
    let config = apply_provider_defaults(config);
    let config = apply_relay_defaults(config);
    let config = apply_gateway_defaults(config);
    let config = apply_storage_defaults(config);
    apply_logging_defaults(config)
}

/// Kind, a model that matches it, and HTTP timeouts.
fn apply_provider_defaults(mut config: ChatRelayConfig) -> ChatRelayConfig {
    let provider = config.provider.get_or_insert_with(ProviderConfig::default);
    let kind = provider
        .kind
        .get_or_insert_with(|| DEFAULT_PROVIDER_KIND.to_string())
        .clone();
    if provider.model.is_none() {
        provider.model = match kind.as_str() {
            "ollama" => Some(DEFAULT_OLLAMA_MODEL.to_string()),
            "openai" => Some(DEFAULT_OPENAI_MODEL.to_string()),
            _ => None,
        };
    }
    provider
        .connect_timeout_secs
        .get_or_insert(DEFAULT_CONNECT_TIMEOUT_SECS);
    provider
        .request_timeout_secs
        .get_or_insert(DEFAULT_REQUEST_TIMEOUT_SECS);
    config
}

fn apply_relay_defaults(mut config: ChatRelayConfig) -> ChatRelayConfig {
    let relay = config.relay.get_or_insert_with(RelayConfig::default);
    if relay.fallback_text.as_deref().map_or(true, |t| t.trim().is_empty()) {
        relay.fallback_text = Some(DEFAULT_FALLBACK_TEXT.to_string());
    }
    config
}

fn apply_gateway_defaults(mut config: ChatRelayConfig) -> ChatRelayConfig {
    let gateway = config.gateway.get_or_insert_with(GatewayConfig::default);
    gateway
        .host
        .get_or_insert_with(|| DEFAULT_GATEWAY_HOST.to_string());
    gateway.port.get_or_insert(DEFAULT_GATEWAY_PORT);
    config
}

/// Must run after the gateway defaults: the local store's public URL points
/// at the gateway's `/media` route.
fn apply_storage_defaults(mut config: ChatRelayConfig) -> ChatRelayConfig {
    let gateway = config.gateway();
    let storage = config.storage.get_or_insert_with(StorageConfig::default);
    let kind = storage
        .kind
        .get_or_insert_with(|| DEFAULT_STORAGE_KIND.to_string())
        .clone();
    storage.max_upload_mb.get_or_insert(DEFAULT_MAX_UPLOAD_MB);

    if kind == "local" {
        storage
            .dir
            .get_or_insert_with(|| DEFAULT_STORAGE_DIR.to_string());
        if storage.public_base_url.is_none() {
            storage.public_base_url = Some(format!(
                "http://{}:{}/media",
                gateway.host.as_deref().unwrap_or(DEFAULT_GATEWAY_HOST),
                gateway.port.unwrap_or(DEFAULT_GATEWAY_PORT)
            ));
        }
    }
    config
}

fn apply_logging_defaults(mut config: ChatRelayConfig) -> ChatRelayConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_empty_config() {
        let cfg = apply_all_defaults(ChatRelayConfig::default());
        let provider = cfg.provider();
        assert_eq!(provider.kind.as_deref(), Some("openai"));
        assert_eq!(provider.model.as_deref(), Some("gpt-4o"));
        assert_eq!(provider.request_timeout_secs, Some(DEFAULT_REQUEST_TIMEOUT_SECS));
        assert_eq!(cfg.relay().fallback_text.as_deref(), Some(DEFAULT_FALLBACK_TEXT));
        assert_eq!(
            cfg.storage().public_base_url.as_deref(),
            Some("http://127.0.0.1:8080/media")
        );
        assert_eq!(cfg.logging().level.as_deref(), Some("info"));
    }

    #[test]
    fn model_follows_provider_kind() {
        let cfg = ChatRelayConfig {
            provider: Some(ProviderConfig {
                kind: Some("ollama".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(apply_all_defaults(cfg).provider().model.as_deref(), Some("llama3"));
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = ChatRelayConfig {
            relay: Some(RelayConfig {
                fallback_text: Some("Out of credits.".into()),
            }),
            gateway: Some(GatewayConfig {
                host: Some("0.0.0.0".into()),
                port: Some(9000),
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.relay().fallback_text.as_deref(), Some("Out of credits."));
        assert_eq!(
            cfg.storage().public_base_url.as_deref(),
            Some("http://0.0.0.0:9000/media")
        );
    }

    #[test]
    fn http_storage_gets_no_local_dir() {
        let cfg = ChatRelayConfig {
            storage: Some(StorageConfig {
                kind: Some("http".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let storage = apply_all_defaults(cfg).storage();
        assert!(storage.dir.is_none());
        assert!(storage.public_base_url.is_none());
        assert_eq!(storage.max_upload_mb, Some(DEFAULT_MAX_UPLOAD_MB));
    }
}
