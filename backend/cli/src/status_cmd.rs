//! `chatrelay status`: ask a running gateway for its health report.

use std::time::Duration;

use anyhow::Result;

use crate::terminal_output::{note_error, note_success, render_table};

pub async fn run(host: &str, port: u16) -> Result<()> {
    let url = format!("http://{host}:{port}/api/health");
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let body: serde_json::Value = match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => resp.json().await?,
        Ok(resp) => {
            note_error(&format!("Gateway at {url} answered {}", resp.status()));
            return Ok(());
        }
        Err(_) => {
            note_error(&format!("chatrelay is not running on {host}:{port}"));
            return Ok(());
        }
    };

    note_success(&format!("Gateway up at {host}:{port}"));
    print!("{}", render_table(&["Field", "Value"], &health_rows(&body)));
    Ok(())
}

fn health_rows(body: &serde_json::Value) -> Vec<Vec<String>> {
    ["status", "version", "provider", "store", "uptimeSeconds"]
        .iter()
        .map(|key| {
            let value = match &body[*key] {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            vec![key.to_string(), value]
        })
        .collect()
}
