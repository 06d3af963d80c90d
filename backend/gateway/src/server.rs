//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use chatrelay_core::MediaStore;
use chatrelay_media::media_router;
use chatrelay_relay::ReplyProducer;

use crate::{chat_sse, health_api, upload};

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub producer: ReplyProducer,
    pub store: Arc<dyn MediaStore>,
    pub max_upload_bytes: usize,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(producer: ReplyProducer, store: Arc<dyn MediaStore>, max_upload_bytes: usize) -> Self {
        Self {
            producer,
            store,
            max_upload_bytes,
            started_at: Instant::now(),
        }
    }
}

/// Build the gateway router. `media_dir` is the local store's directory,
/// served under `/media` when set.
pub fn router(state: GatewayState, media_dir: Option<PathBuf>) -> Router {
    let upload_limit = state.max_upload_bytes;
    let mut app = Router::new()
        .route("/api/chat", post(chat_sse::chat_stream))
        .route(
            "/api/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/health", get(health_api::get_health))
        .with_state(state);

    if let Some(dir) = media_dir {
        app = app.nest("/media", media_router(dir));
    }
    app
}

/// Serve `app` until Ctrl-C.
#[instrument(skip(app))]
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use chatrelay_core::{CompletionProvider, UploadError, UploadFile};
    use chatrelay_media::LocalMediaStore;
    use chatrelay_providers::{MockProvider, MockStep};

    struct RejectingStore;

    #[async_trait::async_trait]
    impl MediaStore for RejectingStore {
        fn name(&self) -> &str {
            "rejecting"
        }

        async fn upload(&self, _file: &UploadFile) -> Result<String, UploadError> {
            Err(UploadError::Rejected {
                status: 403,
                body: "AccessDenied".into(),
            })
        }
    }

    fn app_with(mock: MockProvider, store: Arc<dyn MediaStore>, media_dir: Option<PathBuf>) -> Router {
        let provider: Arc<dyn CompletionProvider> = Arc::new(mock);
        router(GatewayState::new(ReplyProducer::new(provider), store, 1024), media_dir)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn chat_streams_chunks_then_one_done() {
        let app = app_with(
            MockProvider::new("mock").with_chunks(["Sure", "! Here", "'s the data..."]),
            Arc::new(RejectingStore),
            None,
        );

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        let sure = text.find("data: Sure").unwrap();
        let here = text.find("data: ! Here").unwrap();
        let data = text.find("data: 's the data...").unwrap();
        let done = text.find("event: done").unwrap();
        assert!(sure < here && here < data && data < done);
        assert_eq!(text.matches("event: chunk").count(), 3);
        assert_eq!(text.matches("event: done").count(), 1);
    }

    #[tokio::test]
    async fn chat_streams_chunks_with_carriage_returns() {
        let app = app_with(
            MockProvider::new("mock").with_chunks(["line one\r\n", "line two\r", "a\r\nb"]),
            Arc::new(RejectingStore),
            None,
        );

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let text = body_text(response).await;
        assert!(!text.contains('\r'));
        assert!(text.contains("data: a\ndata: b"));
        assert_eq!(text.matches("event: chunk").count(), 3);
        assert_eq!(text.matches("event: done").count(), 1);
    }

    #[tokio::test]
    async fn chat_failure_streams_reset_with_fallback() {
        let app = app_with(
            MockProvider::new("mock").with_steps(vec![
                MockStep::Chunk("par".into()),
                MockStep::Fail("boom".into()),
            ]),
            Arc::new(RejectingStore),
            None,
        );

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .await
            .unwrap();

        let text = body_text(response).await;
        assert!(text.contains("event: reset\ndata: Sorry, there was an error getting a response."));
        assert_eq!(text.matches("event: done").count(), 1);
    }

    #[tokio::test]
    async fn chat_rejects_history_not_ending_with_user() {
        let app = app_with(MockProvider::echo("mock"), Arc::new(RejectingStore), None);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "messages": [{"role": "assistant", "content": "hello"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("invalid history"));
    }

    #[tokio::test]
    async fn upload_to_local_store_is_served_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalMediaStore::new(dir.path(), "http://localhost:8080/media"));
        let app = app_with(MockProvider::echo("mock"), store, Some(dir.path().to_path_buf()));

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/upload")
                    .header("x-file-name", "notes.txt")
                    .header("content-type", "text/plain")
                    .body(Body::from("remember the milk"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        let url = json["url"].as_str().unwrap().to_string();
        assert_eq!(json["message"]["role"], "user");
        assert_eq!(
            json["message"]["content"],
            format!("Uploaded file: [notes.txt]({url})")
        );

        let served_path = url.strip_prefix("http://localhost:8080").unwrap();
        let served = app
            .oneshot(Request::get(served_path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(served.status(), StatusCode::OK);
        assert_eq!(body_text(served).await, "remember the milk");
    }

    #[tokio::test]
    async fn upload_failure_is_bad_gateway_with_notice() {
        let app = app_with(MockProvider::echo("mock"), Arc::new(RejectingStore), None);

        let response = app
            .oneshot(
                Request::post("/api/upload")
                    .header("x-file-name", "a.png")
                    .body(Body::from(vec![1u8, 2, 3]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["message"]["content"], "File upload failed. Please try again.");
        assert!(json["error"].as_str().unwrap().contains("403"));
    }

    #[tokio::test]
    async fn upload_requires_file_name_and_respects_limit() {
        let app = app_with(MockProvider::echo("mock"), Arc::new(RejectingStore), None);

        let missing = app
            .clone()
            .oneshot(Request::post("/api/upload").body(Body::from("x")).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let too_big = app
            .oneshot(
                Request::post("/api/upload")
                    .header("x-file-name", "big.bin")
                    .body(Body::from(vec![0u8; 2048]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(too_big.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn health_reports_collaborators() {
        let app = app_with(MockProvider::echo("mock"), Arc::new(RejectingStore), None);

        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "chatrelay");
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["store"], "rejecting");
    }
}
