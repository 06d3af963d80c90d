use thiserror::Error;

/// Failure reaching or reading from the text-generation service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error: {0}")]
    Network(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("quota exceeded: {0}")]
    Quota(String),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("upstream reported an error: {0}")]
    Service(String),
}

impl UpstreamError {
    /// Classify a non-success HTTP status from the completion endpoint.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => UpstreamError::Auth(body),
            429 => UpstreamError::Quota(body),
            _ => UpstreamError::Status { status, body },
        }
    }
}

/// Failure storing an uploaded file or resolving its URL.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid upload: {0}")]
    Invalid(String),

    #[error("storage write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("object store unreachable: {0}")]
    Network(String),
}

/// Top-level error type for the chatrelay runtime.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid history: {0}")]
    InvalidHistory(String),

    #[error("invalid reply transition: {0}")]
    InvalidTransition(String),

    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
