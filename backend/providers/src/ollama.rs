use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatrelay_core::{ChunkStream, CompletionChunk, CompletionProvider, Message, UpstreamError};

use crate::decode::LineDecoder;
use crate::{wire_messages, WireMessage};

/// Ollama local LLM provider, streaming newline-delimited JSON.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    system_prompt: Option<String>,
}

impl OllamaProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: "http://localhost:11434".to_string(),
            model: model.into(),
            system_prompt: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
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
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatLine {
    message: Option<OllamaDelta>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct OllamaDelta {
    #[serde(default)]
    content: String,
}

/// Parse one NDJSON line; `Ok(None)` marks the final line.
fn parse_line(line: &str) -> Result<Option<CompletionChunk>, UpstreamError> {
    let parsed: OllamaChatLine = serde_json::from_str(line)
        .map_err(|e| UpstreamError::Malformed(format!("{e}: {line}")))?;
    if let Some(error) = parsed.error {
        return Err(UpstreamError::Service(error));
    }
    let chunk = CompletionChunk {
        text: parsed.message.map(|m| m.content).filter(|c| !c.is_empty()),
    };
    if parsed.done && chunk.text.is_none() {
        return Ok(None);
    }
    Ok(Some(chunk))
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn submit_incremental_completion(
        &self,
        history: &[Message],
    ) -> Result<ChunkStream, UpstreamError> {
        let body = OllamaChatRequest {
            model: &self.model,
            messages: wire_messages(self.system_prompt.as_deref(), history),
            stream: true,
        };

        debug!(model = %self.model, "Opening Ollama stream");

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
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
            let mut decoder = LineDecoder::default();

            while let Some(next) = body.next().await {
                let bytes = match next {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(UpstreamError::Network(e.to_string()));
                        return;
                    }
                };
                for line in decoder.push(&bytes) {
                    match parse_line(&line) {
                        Ok(Some(chunk)) => {
                            yield Ok(chunk);
                        }
                        Ok(None) => return,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(line) = decoder.finish() {
                match parse_line(&line) {
                    Ok(Some(chunk)) => {
                        yield Ok(chunk);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        yield Err(e);
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn final_line_ends_stream() {
        assert_eq!(parse_line(r#"{"message":{"role":"assistant","content":""},"done":true}"#).unwrap(), None);
        assert_eq!(
            parse_line(r#"{"message":{"role":"assistant","content":"Hi"},"done":false}"#).unwrap(),
            Some(CompletionChunk::text("Hi"))
        );
        assert!(matches!(parse_line(r#"{"error":"model not found"}"#), Err(UpstreamError::Service(_))));
    }

    #[tokio::test]
    async fn streams_ndjson_body() {
        let server = MockServer::start().await;
        let body = [
            r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#,
            r#"{"message":{"role":"assistant","content":"lo"},"done":false}"#,
            r#"{"message":{"role":"assistant","content":""},"done":true,"eval_count":2}"#,
        ]
        .join("\n");
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new("llama3").with_base_url(server.uri());
        let chunks: Vec<_> = provider
            .submit_incremental_completion(&[Message::user("hi")])
            .await
            .unwrap()
            .collect()
            .await;

        let text: String = chunks.into_iter().filter_map(|c| c.unwrap().text).collect();
        assert_eq!(text, "Hello");
    }

    #[tokio::test]
    async fn sends_namespaced_model_unchanged() {
        let server = MockServer::start().await;
        let model = "hf.co/bartowski/Llama-3.2-1B-Instruct-GGUF";
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({ "model": model })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"message":{"role":"assistant","content":"ok"},"done":true}"#,
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(model).with_base_url(server.uri());
        let chunks: Vec<_> = provider
            .submit_incremental_completion(&[Message::user("hi")])
            .await
            .unwrap()
            .collect()
            .await;

        let text: String = chunks.into_iter().filter_map(|c| c.unwrap().text).collect();
        assert_eq!(text, "ok");
    }
}
