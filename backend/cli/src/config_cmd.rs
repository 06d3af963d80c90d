//! `chatrelay config` subcommands.

use std::path::Path;

use anyhow::Result;

use chatrelay_config::{
    collect_redacted_paths, redacted_yaml, validate, write_config_text, ChatRelayConfig,
    STARTER_CONFIG,
};

use crate::terminal_output::{dim, note_error, note_info, note_success, note_warn};

/// Print the effective config with secrets masked. `env_refs` are the
/// `${VAR}` names the file references.
pub fn show(config: &ChatRelayConfig, path: &Path, env_refs: &[String]) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));
    if !path.exists() {
        println!("{}", dim("(file not found; showing defaults)"));
    }
    for var in env_refs {
        let state = if std::env::var_os(var).is_some() { "set" } else { "unset" };
        println!("{}", dim(&format!("env {var}: {state}")));
    }

    let masked = collect_redacted_paths(&serde_json::to_value(config)?);
    if !masked.is_empty() {
        println!("{}", dim(&format!("masked: {}", masked.join(", "))));
    }
    println!("{}", redacted_yaml(config)?);

    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&format!("{}: {}", warning.path, warning.message));
    }
    for error in &report.errors {
        note_error(&format!("{}: {}", error.path, error.message));
    }
    Ok(())
}

/// Write the starter config. Refuses to overwrite unless `force` is set.
pub async fn init(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        note_warn(&format!(
            "{} already exists; pass --force to overwrite (a .bak copy is kept)",
            path.display()
        ));
        return Ok(false);
    }
    write_config_text(STARTER_CONFIG, path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(true)
}
