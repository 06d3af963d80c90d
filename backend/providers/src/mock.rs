use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use chatrelay_core::{ChunkStream, CompletionChunk, CompletionProvider, Message, UpstreamError};

/// One scripted step of a mock completion.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Yield a chunk with text.
    Chunk(String),
    /// Yield a chunk without text (role-only delta).
    Empty,
    /// Fail mid-stream.
    Fail(String),
}

#[derive(Debug, Clone)]
enum Script {
    Steps(Vec<MockStep>),
    /// Stream the last user message back word by word.
    Echo,
}

/// A mock provider that streams canned chunks.
pub struct MockProvider {
    name: String,
    script: Script,
    open_error: Option<String>,
    chunk_delay: Option<Duration>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Script::Steps(Vec::new()),
            open_error: None,
            chunk_delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Offline provider that answers with the user's own words.
    pub fn echo(name: impl Into<String>) -> Self {
        Self {
            script: Script::Echo,
            ..Self::new(name)
        }
    }

    pub fn with_chunks<I, S>(mut self, chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script = Script::Steps(chunks.into_iter().map(|c| MockStep::Chunk(c.into())).collect());
        self
    }

    pub fn with_steps(mut self, steps: Vec<MockStep>) -> Self {
        self.script = Script::Steps(steps);
        self
    }

    /// Fail before any chunk is produced.
    pub fn failing_on_open(mut self, message: impl Into<String>) -> Self {
        self.open_error = Some(message.into());
        self
    }

    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = Some(delay);
        self
    }

    /// Histories received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn steps_for(&self, history: &[Message]) -> Vec<MockStep> {
        match &self.script {
            Script::Steps(steps) => steps.clone(),
            Script::Echo => {
                let last = history
                    .iter()
                    .rev()
                    .find(|m| m.is_user())
                    .map(|m| m.content.as_str())
                    .unwrap_or_default();
                let mut steps = vec![MockStep::Chunk("You said:".to_string())];
                steps.extend(last.split_whitespace().map(|w| MockStep::Chunk(format!(" {w}"))));
                steps
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit_incremental_completion(
        &self,
        history: &[Message],
    ) -> Result<ChunkStream, UpstreamError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(history.to_vec());
        }
        if let Some(message) = &self.open_error {
            return Err(UpstreamError::Network(message.clone()));
        }

        let steps = self.steps_for(history);
        let delay = self.chunk_delay;
        let stream = async_stream::stream! {
            for step in steps {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match step {
                    MockStep::Chunk(text) => {
                        yield Ok(CompletionChunk::text(text));
                    }
                    MockStep::Empty => {
                        yield Ok(CompletionChunk::empty());
                    }
                    MockStep::Fail(message) => {
                        yield Err(UpstreamError::Service(message));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
