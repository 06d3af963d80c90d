//! One conversation wired to a producer and an optional media store.

use std::sync::Arc;

use tracing::{info, warn};

use chatrelay_core::{
    ChatError, Conversation, MediaStore, Message, ReplyDisplay, SEND_FAILED_TEXT, UploadError,
    UploadFile,
};

use crate::consumer::consume_reply;
use crate::producer::ReplyProducer;
use crate::upload::upload_media;

/// Forwards display writes to the conversation and reports the new text of
/// the last message to an observer.
struct ObservedDisplay<'a, F> {
    conversation: &'a mut Conversation,
    on_update: F,
}

impl<F> ReplyDisplay for ObservedDisplay<'_, F>
where
    F: FnMut(&str) + Send,
{
    fn append_message(&mut self, message: Message) {
        (self.on_update)(&message.content);
        self.conversation.append_message(message);
    }

    fn replace_last_message(&mut self, content: String) {
        (self.on_update)(&content);
        self.conversation.replace_last_message(content);
    }
}

pub struct ChatSession {
    id: String,
    producer: ReplyProducer,
    store: Option<Arc<dyn MediaStore>>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, producer: ReplyProducer) -> Self {
        Self {
            id: id.into(),
            producer,
            store: None,
            conversation: Conversation::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn MediaStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    /// Send a user message and wait for the full reply.
    ///
    /// Whitespace-only input is ignored and yields `Ok(None)`. Otherwise the
    /// returned message is the final assistant entry of the conversation.
    pub async fn send(&mut self, input: &str) -> Result<Option<Message>, ChatError> {
        self.send_observed(input, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `on_update` with the full text of
    /// the assistant message every time it changes.
    pub async fn send_observed<F>(&mut self, input: &str, on_update: F) -> Result<Option<Message>, ChatError>
    where
        F: FnMut(&str) + Send,
    {
        let text = input.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.conversation.push(Message::user(text));

        let history = self.conversation.messages().to_vec();
        let stream = match self.producer.start(&self.id, history) {
            Ok(stream) => stream,
            Err(err) => {
                warn!(conversation_id = %self.id, error = %err, "Could not start reply");
                let notice = Message::assistant(SEND_FAILED_TEXT);
                self.conversation.push(notice.clone());
                return Ok(Some(notice));
            }
        };

        let mut display = ObservedDisplay {
            conversation: &mut self.conversation,
            on_update,
        };
        match consume_reply(stream, &mut display).await {
            Ok(reply) => {
                info!(conversation_id = %self.id, chars = reply.chars().count(), "Reply received");
            }
            Err(err) => {
                warn!(conversation_id = %self.id, error = %err, "Reply relay broke");
                self.conversation.replace_last_message(SEND_FAILED_TEXT.to_string());
            }
        }
        Ok(self.conversation.last().cloned())
    }

    /// Upload an attachment and record the outcome in the conversation.
    ///
    /// Either the `Uploaded file: [name](url)` user message or the failure
    /// notice is appended; the returned result carries the URL or the reason.
    pub async fn upload(&mut self, file: &UploadFile) -> Result<String, UploadError> {
        let outcome = match &self.store {
            Some(store) => upload_media(store.as_ref(), file, &self.id).await,
            None => {
                let unavailable = NoStore;
                upload_media(&unavailable, file, &self.id).await
            }
        };
        self.conversation.push(outcome.message);
        outcome.result
    }
}

/// Stand-in store for sessions built without one; rejects every upload.
struct NoStore;

#[async_trait::async_trait]
impl MediaStore for NoStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn upload(&self, _file: &UploadFile) -> Result<String, UploadError> {
        Err(UploadError::Invalid("no media store configured".into()))
    }
}
