//! Attachment upload endpoint.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use chatrelay_core::UploadFile;
use chatrelay_relay::upload_media;

use crate::error::ApiError;
use crate::server::GatewayState;

pub const FILE_NAME_HEADER: &str = "x-file-name";
pub const CONVERSATION_HEADER: &str = "x-conversation-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Handler for `POST /api/upload`: the raw body is the file.
///
/// `200 { url, message }` on success, `502 { error, message }` when the store
/// rejects it. `message` is the conversation message for the outcome.
pub async fn upload_file(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let name = header_str(&headers, FILE_NAME_HEADER)
        .ok_or_else(|| ApiError::bad_request(format!("missing {FILE_NAME_HEADER} header")))?
        .to_string();
    let content_type = header_str(&headers, header::CONTENT_TYPE.as_str())
        .unwrap_or("application/octet-stream")
        .to_string();
    let conversation_id = header_str(&headers, CONVERSATION_HEADER)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(file = %name, bytes = body.len(), "Received upload");
    let file = UploadFile::new(name, content_type, body);
    let outcome = upload_media(state.store.as_ref(), &file, &conversation_id).await;

    let response = match outcome.result {
        Ok(url) => (
            StatusCode::OK,
            Json(json!({ "url": url, "message": outcome.message })),
        ),
        Err(err) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": err.to_string(), "message": outcome.message })),
        ),
    };
    Ok(response.into_response())
}
