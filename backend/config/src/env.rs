//! `${VAR_NAME}` substitution in config string values.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are matched. `$${VAR}` is an
//! escape and yields a literal `${VAR}`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Matches both `${VAR}` and the escaped `$${VAR}`; group 1 is the extra `$`.
static ENV_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").expect("env reference pattern is valid")
});

#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute references using `env` instead of the process environment.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    let mut out = value.clone();
    substitute_in_place(&mut out, env, &mut String::new())?;
    Ok(out)
}

fn substitute_in_place(
    value: &mut Value,
    env: &HashMap<String, String>,
    path: &mut String,
) -> Result<(), MissingEnvVarError> {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = substitute_str(s, env, path)?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                let len = path.len();
                path.push_str(&format!("[{i}]"));
                substitute_in_place(item, env, path)?;
                path.truncate(len);
            }
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let len = path.len();
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(key);
                substitute_in_place(child, env, path)?;
                path.truncate(len);
            }
        }
        _ => {}
    }
    Ok(())
}

fn substitute_str(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    let mut missing = None;
    let replaced = ENV_REF.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name).filter(|v| !v.is_empty()) {
            Some(v) => v.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var_name) => Err(MissingEnvVarError {
            var_name,
            config_path: path.to_string(),
        }),
        None => Ok(replaced.into_owned()),
    }
}

/// Env var names referenced anywhere in `value`, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    let mut stack = vec![value];
    while let Some(v) = stack.pop() {
        match v {
            Value::String(s) => vars.extend(
                ENV_REF
                    .captures_iter(s)
                    .filter(|caps| caps[1].is_empty())
                    .map(|caps| caps[2].to_string()),
            ),
            Value::Array(items) => stack.extend(items),
            Value::Object(map) => stack.extend(map.values()),
            _ => {}
        }
    }
    vars.sort();
    vars.dedup();
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_values() {
        let v = json!({"provider": {"apiKey": "${OPENAI_API_KEY}", "baseUrl": "http://${HOST}:1234/v1"}});
        let out = resolve_env_vars_with(&v, &env(&[("OPENAI_API_KEY", "sk-abc"), ("HOST", "box")])).unwrap();
        assert_eq!(out["provider"]["apiKey"], "sk-abc");
        assert_eq!(out["provider"]["baseUrl"], "http://box:1234/v1");
    }

    #[test]
    fn missing_var_reports_path() {
        let v = json!({"storage": {"token": "${MISSING_TOKEN}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err();
        assert_eq!(err.var_name, "MISSING_TOKEN");
        assert_eq!(err.config_path, "storage.token");
    }

    #[test]
    fn empty_var_counts_as_missing() {
        let v = json!(["${EMPTY}"]);
        let err = resolve_env_vars_with(&v, &env(&[("EMPTY", "")])).unwrap_err();
        assert_eq!(err.config_path, "[0]");
    }

    #[test]
    fn escaped_reference_is_literal() {
        let v = json!({"systemPrompt": "Use $${HOME} literally, key ${KEY}"});
        let out = resolve_env_vars_with(&v, &env(&[("KEY", "k")])).unwrap();
        assert_eq!(out["systemPrompt"], "Use ${HOME} literally, key k");
    }

    #[test]
    fn lowercase_names_are_not_references() {
        let v = json!({"a": "${lower}"});
        let out = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(out["a"], "${lower}");
    }

    #[test]
    fn collects_unescaped_references() {
        let v = json!({"a": "${FOO}", "b": {"c": ["${BAR} $${SKIP}", "${FOO}"]}});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
    }
}
