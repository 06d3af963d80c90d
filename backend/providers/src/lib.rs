//! Streaming text-generation providers.
//!
//! Each provider implements [`CompletionProvider`] and yields chunks as the
//! upstream service produces them.

pub mod decode;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use mock::{MockProvider, MockStep};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use chatrelay_core::{CompletionProvider, Message};

/// Chat message as sent on the wire to chat-completions style endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

/// Prepend the system prompt (if any) to the conversation history.
pub(crate) fn wire_messages(system_prompt: Option<&str>, history: &[Message]) -> Vec<WireMessage> {
    let system = system_prompt
        .filter(|prompt| !prompt.trim().is_empty())
        .map(|prompt| WireMessage {
            role: "system".to_string(),
            content: prompt.to_string(),
        });

    system
        .into_iter()
        .chain(history.iter().map(|m| WireMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }))
        .collect()
}

/// HTTP client shared by the network providers. Timeouts live here; the
/// relay itself has none.
pub fn http_client(connect_timeout: Duration, request_timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

/// Registry of completion providers, looked up by name.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn CompletionProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
