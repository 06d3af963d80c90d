use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::error::{UploadError, UpstreamError};
use crate::message::Message;

/// One incremental piece of a completion. `text` is absent for
/// role-only or finish-reason deltas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionChunk {
    pub text: Option<String>,
}

impl CompletionChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}

/// Lazy sequence of chunks returned by a provider.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<CompletionChunk, UpstreamError>> + Send>>;

/// A text-generation service able to stream a completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Open an incremental completion for the given history.
    async fn submit_incremental_completion(
        &self,
        history: &[Message],
    ) -> Result<ChunkStream, UpstreamError>;
}

/// Where a streaming reply is rendered.
///
/// Implementations are synchronous and must tolerate repeated identical calls.
pub trait ReplyDisplay: Send {
    fn append_message(&mut self, message: Message);

    /// Replace the content of the last message wholesale.
    fn replace_last_message(&mut self, content: String);
}

/// A file handed to a media store.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Object storage that turns an uploaded blob into a resolvable URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    fn name(&self) -> &str;

    async fn upload(&self, file: &UploadFile) -> Result<String, UploadError>;
}
