pub mod channel;
pub mod conversation;
pub mod error;
pub mod message;
pub mod reply;
pub mod sidebar;
pub mod traits;

pub use channel::{reply_channel, ReplyEvent, ReplySender, ReplyStream};
pub use conversation::{validate_history, Conversation};
pub use error::{ChatError, UploadError, UpstreamError};
pub use message::{Message, Role, DEFAULT_FALLBACK_TEXT, SEND_FAILED_TEXT, UPLOAD_FAILED_TEXT};
pub use reply::ReplyState;
pub use sidebar::{ConversationRecord, Sidebar};
pub use traits::{
    ChunkStream, CompletionChunk, CompletionProvider, MediaStore, ReplyDisplay, UploadFile,
};
