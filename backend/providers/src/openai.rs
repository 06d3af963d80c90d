use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatrelay_core::{ChunkStream, CompletionChunk, CompletionProvider, Message, UpstreamError};

use crate::decode::SseDecoder;
use crate::{wire_messages, WireMessage};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI-compatible chat completions provider (streaming mode).
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ErrorBody>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Turn one SSE data payload into a chunk.
fn parse_event(data: &str) -> Result<CompletionChunk, UpstreamError> {
    let event: StreamResponse = serde_json::from_str(data)
        .map_err(|e| UpstreamError::Malformed(format!("{e}: {data}")))?;

    if let Some(error) = event.error {
        return Err(match error.code.as_deref() {
            Some("insufficient_quota") | Some("rate_limit_exceeded") => {
                UpstreamError::Quota(error.message)
            }
            _ => UpstreamError::Service(error.message),
        });
    }

    let text = event
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content);
    Ok(CompletionChunk { text })
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn submit_incremental_completion(
        &self,
        history: &[Message],
    ) -> Result<ChunkStream, UpstreamError> {
        let body = ChatRequest {
            model: &self.model,
            messages: wire_messages(self.system_prompt.as_deref(), history),
            stream: true,
        };

        debug!(model = %self.model, messages = body.messages.len(), "Opening OpenAI stream");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_status(status.as_u16(), error_body));
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::default();

            while let Some(next) = body.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(UpstreamError::Network(e.to_string()));
                        return;
                    }
                };
                for data in decoder.push(&bytes) {
                    if data.trim() == "[DONE]" {
                        return;
                    }
                    let parsed = parse_event(&data);
                    let failed = parsed.is_err();
                    yield parsed;
                    if failed {
                        return;
                    }
                }
            }

            if let Some(data) = decoder.finish() {
                if data.trim() != "[DONE]" {
                    yield parse_event(&data);
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
