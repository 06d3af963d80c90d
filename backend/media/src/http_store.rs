use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use chatrelay_core::{MediaStore, UploadError, UploadFile};

use crate::mime_detect::resolve_content_type;
use crate::{DEFAULT_MAX_UPLOAD_BYTES, check_upload, object_key};

/// S3-style object store reached over plain HTTP `PUT`.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
    public_base_url: String,
    max_bytes: usize,
}

impl HttpObjectStore {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            token: None,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl MediaStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(&self, file: &UploadFile) -> Result<String, UploadError> {
        check_upload(file, self.max_bytes)?;

        let key = object_key(&file.name);
        let target = format!("{}/{}/{}", self.endpoint, self.bucket, key);
        debug!(target = %target, bytes = file.len(), "Putting object");

        let mut request = self
            .client
            .put(&target)
            .header(
                reqwest::header::CONTENT_TYPE,
                resolve_content_type(&file.name, &file.content_type),
            )
            .body(file.bytes.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(key = %key, "Stored upload in object store");
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn puts_object_and_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/chat-uploads/uploads/[0-9a-f-]{36}-photo\.png$"))
            .and(header("authorization", "Bearer s3cret"))
            .and(header("content-type", "image/png"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpObjectStore::new(server.uri(), "chat-uploads", "https://cdn.example.com")
            .with_token("s3cret");
        let url = store
            .upload(&UploadFile::new("photo.png", "", vec![1u8; 10 * 1024 * 1024]))
            .await
            .unwrap();

        assert!(url.starts_with("https://cdn.example.com/uploads/"));
        assert!(url.ends_with("-photo.png"));
    }

    #[tokio::test]
    async fn non_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("AccessDenied"))
            .mount(&server)
            .await;

        let store = HttpObjectStore::new(server.uri(), "b", "https://cdn.example.com");
        let err = store
            .upload(&UploadFile::new("a.txt", "text/plain", "hello"))
            .await
            .unwrap_err();

        match err {
            UploadError::Rejected { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "AccessDenied");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let store = HttpObjectStore::new("http://127.0.0.1:9", "b", "https://cdn.example.com");
        let err = store
            .upload(&UploadFile::new("a.txt", "text/plain", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Network(_)));
    }
}
