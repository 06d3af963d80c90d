//! Config validation: schema checks with user-friendly messages.

use thiserror::Error;

use crate::schema::ChatRelayConfig;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ChatRelayConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_provider(config, &mut report);
    validate_storage(config, &mut report);
    validate_gateway(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_provider(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let Some(provider) = &config.provider else { return };
    match provider.kind.as_deref() {
        None | Some("ollama") | Some("mock") => {}
        Some("openai") => {
            if provider.api_key.as_deref().map_or(true, str::is_empty) {
                report.warn(
                    "provider.apiKey",
                    "No API key configured and OPENAI_API_KEY is unset; every reply will be the fallback text",
                );
            }
        }
        Some(other) => report.error(
            "provider.kind",
            format!("Unknown provider '{other}'. Use 'openai', 'ollama', or 'mock'"),
        ),
    }
    if provider.connect_timeout_secs == Some(0) {
        report.error("provider.connectTimeoutSecs", "connectTimeoutSecs must be > 0");
    }
    if provider.request_timeout_secs == Some(0) {
        report.error("provider.requestTimeoutSecs", "requestTimeoutSecs must be > 0");
    }
}

fn validate_storage(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let Some(storage) = &config.storage else { return };
    match storage.kind.as_deref() {
        None | Some("local") => {}
        Some("http") => {
            for (path, value) in [
                ("storage.endpoint", &storage.endpoint),
                ("storage.bucket", &storage.bucket),
                ("storage.publicBaseUrl", &storage.public_base_url),
            ] {
                if value.as_deref().map_or(true, str::is_empty) {
                    report.error(path, "Required when storage.kind is 'http'");
                }
            }
            if storage.token.is_none() {
                report.warn("storage.token", "Uploading without a bearer token");
            }
        }
        Some(other) => report.error(
            "storage.kind",
            format!("Unknown storage '{other}'. Use 'local' or 'http'"),
        ),
    }
    if storage.max_upload_mb == Some(0) {
        report.error("storage.maxUploadMb", "maxUploadMb must be >= 1");
    }
}

fn validate_gateway(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let Some(gw) = &config.gateway else { return };
    if let Some(port) = gw.port {
        if port == 0 {
            report.error("gateway.port", "Port must be > 0");
        } else if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "gateway.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
}

fn validate_logging(config: &ChatRelayConfig, report: &mut ValidationReport) {
    let Some(level) = config.logging.as_ref().and_then(|l| l.level.as_deref()) else {
        return;
    };
    if !matches!(
        level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        report.warn("logging.level", format!("Unknown level '{level}'; using it as a filter directive"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{GatewayConfig, ProviderConfig, StorageConfig};

    #[test]
    fn empty_config_is_valid() {
        let report = validate(&ChatRelayConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn defaults_without_key_only_warn() {
        let report = validate(&apply_all_defaults(ChatRelayConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.path == "provider.apiKey"));
    }

    #[test]
    fn unknown_provider_is_error() {
        let cfg = ChatRelayConfig {
            provider: Some(ProviderConfig {
                kind: Some("gemini".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "provider.kind");
    }

    #[test]
    fn http_storage_requires_endpoint_and_bucket() {
        let cfg = ChatRelayConfig {
            storage: Some(StorageConfig {
                kind: Some("http".into()),
                endpoint: Some("https://s3.example.com".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let paths: Vec<_> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["storage.bucket", "storage.publicBaseUrl"]);
    }

    #[test]
    fn privileged_port_warns() {
        let cfg = ChatRelayConfig {
            gateway: Some(GatewayConfig {
                port: Some(81),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 1);
    }
}
