//! Streamed chat replies over Server-Sent Events.
//!
//! `POST /api/chat` answers with `chunk` events carrying appended text,
//! `reset` events carrying a full replacement, and one final `done`.

use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use chatrelay_core::{Message, ReplyEvent};

use crate::error::ApiError;
use crate::server::GatewayState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Correlates log events; generated when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// SSE data lines are split on `\n` and may not contain `\r`.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn to_sse(event: ReplyEvent) -> Event {
    match event {
        ReplyEvent::Chunk(text) => Event::default()
            .event("chunk")
            .data(normalize_line_endings(&text)),
        ReplyEvent::Reset(text) => Event::default()
            .event("reset")
            .data(normalize_line_endings(&text)),
    }
}

/// Handler for `POST /api/chat`.
///
/// A client that disconnects drops the stream; the relay task finishes on
/// its own and its remaining writes are discarded.
pub async fn chat_stream(
    State(state): State<GatewayState>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let conversation_id = request
        .conversation_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let replies = state.producer.start(&conversation_id, request.messages)?;
    info!(conversation_id = %conversation_id, "Streaming chat reply");

    let events = replies
        .map(|event| Ok::<_, Infallible>(to_sse(event)))
        .chain(stream::once(async {
            Ok(Event::default().event("done").data("[DONE]"))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
