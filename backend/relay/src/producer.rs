//! Send side of the reply relay.
//!
//! Opens one incremental completion and forwards its chunks to the reply
//! channel. Upstream failures become the fallback text; completion is always
//! signaled exactly once.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{Instrument, debug, info_span, warn};

use chatrelay_core::{
    ChatError, CompletionProvider, DEFAULT_FALLBACK_TEXT, Message, ReplySender, ReplyStream,
    UpstreamError, reply_channel, validate_history,
};
use chatrelay_logging::{ChatEvent, EventLogger};

/// How a relay run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { chunks: usize, chars: usize },
    Fallback { error: String, chunks_before_failure: usize },
}

/// Starts relay runs against an injected provider.
#[derive(Clone)]
pub struct ReplyProducer {
    provider: Arc<dyn CompletionProvider>,
    fallback_text: String,
}

impl ReplyProducer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            provider,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
        }
    }

    pub fn with_fallback_text(mut self, text: impl Into<String>) -> Self {
        self.fallback_text = text.into();
        self
    }

    pub fn fallback_text(&self) -> &str {
        &self.fallback_text
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Validate the history, spawn the relay task, and hand back the reply
    /// stream before any chunk exists. Must be called inside a tokio runtime.
    pub fn start(&self, conversation_id: &str, history: Vec<Message>) -> Result<ReplyStream, ChatError> {
        validate_history(&history)?;

        let (sender, stream) = reply_channel();
        let span = info_span!(
            "relay",
            conversation_id = %conversation_id,
            provider = %self.provider.name()
        );
        tokio::spawn(
            relay(
                Arc::clone(&self.provider),
                history,
                sender,
                self.fallback_text.clone(),
                conversation_id.to_string(),
            )
            .instrument(span),
        );
        Ok(stream)
    }
}

/// Run one exchange to completion, writing into `sender`.
pub async fn relay(
    provider: Arc<dyn CompletionProvider>,
    history: Vec<Message>,
    mut sender: ReplySender,
    fallback_text: String,
    conversation_id: String,
) -> RelayOutcome {
    EventLogger::log_event(
        &conversation_id,
        ChatEvent::ExchangeStarted {
            provider: provider.name().to_string(),
            history_len: history.len(),
        },
    );

    let outcome = match forward(provider.as_ref(), &history, &mut sender).await {
        Ok(chars) => {
            let chunks = sender.relayed();
            EventLogger::log_event(&conversation_id, ChatEvent::ReplyCompleted { chunks, chars });
            RelayOutcome::Completed { chunks, chars }
        }
        Err(err) => {
            let chunks_before_failure = sender.relayed();
            warn!(error = %err, chunks_before_failure, "Upstream failed; relaying fallback");
            EventLogger::log_event(
                &conversation_id,
                ChatEvent::UpstreamFailed {
                    error_msg: err.to_string(),
                    chunks_before_failure,
                },
            );
            sender.reset(fallback_text);
            RelayOutcome::Fallback {
                error: err.to_string(),
                chunks_before_failure,
            }
        }
    };

    if !sender.is_observed() {
        debug!("Reply finished with no consumer attached");
    }
    sender.done();
    outcome
}

/// Relay every non-empty chunk; returns the number of characters relayed.
async fn forward(
    provider: &dyn CompletionProvider,
    history: &[Message],
    sender: &mut ReplySender,
) -> Result<usize, UpstreamError> {
    let mut upstream = provider.submit_incremental_completion(history).await?;
    let mut chars = 0;
    while let Some(chunk) = upstream.next().await {
        if let Some(text) = chunk?.text.filter(|t| !t.is_empty()) {
            chars += text.chars().count();
            sender.update(text);
        }
    }
    Ok(chars)
}
