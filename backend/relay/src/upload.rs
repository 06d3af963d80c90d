use tracing::warn;

use chatrelay_core::{Message, MediaStore, UPLOAD_FAILED_TEXT, UploadError, UploadFile};
use chatrelay_logging::{ChatEvent, EventLogger};

/// Result of one attachment upload: the message to show in the conversation
/// and the store's verdict.
#[derive(Debug)]
pub struct UploadOutcome {
    pub message: Message,
    pub result: Result<String, UploadError>,
}

impl UploadOutcome {
    pub fn url(&self) -> Option<&str> {
        self.result.as_ref().ok().map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Hand `file` to the store and build the conversation message for the
/// outcome. Never fails: a rejected upload yields the failure notice.
pub async fn upload_media(store: &dyn MediaStore, file: &UploadFile, conversation_id: &str) -> UploadOutcome {
    match store.upload(file).await {
        Ok(url) => {
            EventLogger::log_event(
                conversation_id,
                ChatEvent::UploadCompleted {
                    file_name: file.name.clone(),
                    url: url.clone(),
                    bytes: file.len(),
                },
            );
            UploadOutcome {
                message: Message::uploaded_file(&file.name, &url),
                result: Ok(url),
            }
        }
        Err(err) => {
            warn!(store = store.name(), file = %file.name, error = %err, "Upload failed");
            EventLogger::log_event(
                conversation_id,
                ChatEvent::UploadFailed {
                    file_name: file.name.clone(),
                    error_msg: err.to_string(),
                },
            );
            UploadOutcome {
                message: Message::assistant(UPLOAD_FAILED_TEXT),
                result: Err(err),
            }
        }
    }
}
