//! Safe-to-share config snapshots with secrets masked.

use serde_json::Value;

use crate::schema::ChatRelayConfig;

/// Keys whose string values are secrets.
const SECRET_KEYS: &[&str] = &["apiKey", "token", "secret", "password"];

const MASK: &str = "***";

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Mask every non-empty secret. Keeps a four-character hint for long values
/// so users can tell which key is configured.
fn mask(secret: &str) -> String {
    let hint: String = secret.chars().take(4).collect();
    if secret.chars().count() > 8 {
        format!("{hint}{MASK}")
    } else {
        MASK.to_string()
    }
}

/// Redact a config value tree in place of its secrets.
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) if is_secret_key(k) && !s.is_empty() => Value::String(mask(s)),
                        other => redact(other),
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Dotted paths of every secret that `redact` would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    fn walk(value: &Value, path: &str, out: &mut Vec<String>) {
        if let Value::Object(map) = value {
            for (k, v) in map {
                let child = if path.is_empty() { k.clone() } else { format!("{path}.{k}") };
                match v {
                    Value::String(s) if is_secret_key(k) && !s.is_empty() => out.push(child),
                    other => walk(other, &child, out),
                }
            }
        }
    }
    let mut out = Vec::new();
    walk(value, "", &mut out);
    out
}

/// YAML rendering of `config` with secrets masked, for `config show`.
pub fn redacted_yaml(config: &ChatRelayConfig) -> anyhow::Result<String> {
    let value = serde_json::to_value(config)?;
    Ok(serde_yaml::to_string(&redact(&value))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ProviderConfig, StorageConfig};
    use serde_json::json;

    #[test]
    fn masks_secrets_with_hint() {
        let v = json!({"provider": {"apiKey": "sk-proj-abcdefghijk", "model": "gpt-4o"}, "storage": {"token": "short"}});
        let out = redact(&v);
        assert_eq!(out["provider"]["apiKey"], "sk-p***");
        assert_eq!(out["provider"]["model"], "gpt-4o");
        assert_eq!(out["storage"]["token"], "***");
    }

    #[test]
    fn reports_paths() {
        let v = json!({"provider": {"apiKey": "x"}, "storage": {"token": ""}});
        assert_eq!(collect_redacted_paths(&v), vec!["provider.apiKey"]);
    }

    #[test]
    fn yaml_never_contains_secret() {
        let cfg = ChatRelayConfig {
            provider: Some(ProviderConfig {
                api_key: Some("sk-live-0123456789".into()),
                ..Default::default()
            }),
            storage: Some(StorageConfig {
                token: Some("bucket-token-xyz".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let yaml = redacted_yaml(&cfg).unwrap();
        assert!(!yaml.contains("0123456789"));
        assert!(!yaml.contains("token-xyz"));
        assert!(yaml.contains("apiKey"));
    }
}
