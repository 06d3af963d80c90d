//! Receive side of the reply relay.

use futures::StreamExt;
use tracing::trace;

use chatrelay_core::{ChatError, Message, ReplyDisplay, ReplyEvent, ReplyState, ReplyStream};

/// Drive one reply into `display`.
///
/// Appends an empty assistant placeholder, then replaces it with the
/// accumulated text on every event. Returns the final reply text once the
/// producer signals completion. Dropping the future detaches the display;
/// the producer keeps running and its writes go nowhere.
pub async fn consume_reply<D>(mut stream: ReplyStream, display: &mut D) -> Result<String, ChatError>
where
    D: ReplyDisplay + ?Sized,
{
    display.append_message(Message::assistant(""));

    let mut state = ReplyState::default();
    while let Some(event) = stream.next().await {
        let text = match &event {
            ReplyEvent::Chunk(chunk) => state.push_chunk(chunk)?,
            ReplyEvent::Reset(text) => state.reset(text)?,
        };
        trace!(len = text.len(), "Reply updated");
        display.replace_last_message(text.to_owned());
    }

    Ok(state.complete()?.to_owned())
}
