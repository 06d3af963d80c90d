//! Media stores for chat attachments.
//!
//! Both stores implement [`MediaStore`](chatrelay_core::MediaStore): the
//! local one writes to disk and is served back by [`media_router`], the HTTP
//! one `PUT`s into an S3-style bucket.

use uuid::Uuid;

use chatrelay_core::{UploadError, UploadFile};

pub mod http_store;
pub mod local;
pub mod media_server;
pub mod mime_detect;

pub use http_store::HttpObjectStore;
pub use local::LocalMediaStore;
pub use media_server::media_router;
pub use mime_detect::{detect_mime_type, is_inline_safe, resolve_content_type};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Prefix shared by every object key.
pub const UPLOAD_PREFIX: &str = "uploads";

/// Keep ASCII alphanumerics and `.-_`; everything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.trim_matches('.').is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}

/// `{uuid}-{sanitized name}`, unique per upload.
pub fn stored_file_name(name: &str) -> String {
    format!("{}-{}", Uuid::new_v4(), sanitize_file_name(name))
}

/// `uploads/{uuid}-{sanitized name}`.
pub fn object_key(name: &str) -> String {
    format!("{UPLOAD_PREFIX}/{}", stored_file_name(name))
}

/// Reject empty and oversize payloads before any I/O.
pub fn check_upload(file: &UploadFile, max_bytes: usize) -> Result<(), UploadError> {
    if file.is_empty() {
        return Err(UploadError::Invalid(format!("{} is empty", file.name)));
    }
    if file.len() > max_bytes {
        return Err(UploadError::Invalid(format!(
            "{} is {} bytes, limit is {max_bytes}",
            file.name,
            file.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_names() {
        assert_eq!(sanitize_file_name("my report (v2).pdf"), "my_report__v2_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name("résumé.doc"), "r_sum_.doc");
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name(".."), "file");
    }

    #[test]
    fn object_keys_are_prefixed_and_unique() {
        let a = object_key("a.png");
        let b = object_key("a.png");
        assert!(a.starts_with("uploads/"));
        assert!(a.ends_with("-a.png"));
        assert_eq!(a.len(), "uploads/".len() + 36 + "-a.png".len());
        assert_ne!(a, b);
    }

    #[test]
    fn size_limits() {
        let file = UploadFile::new("a.bin", "application/octet-stream", vec![0u8; 10]);
        assert!(check_upload(&file, 10).is_ok());
        assert!(matches!(check_upload(&file, 9), Err(UploadError::Invalid(_))));
    }
}
