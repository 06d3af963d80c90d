//! MIME type detection for uploaded and served files.

use std::path::Path;

/// Detect MIME type by file extension.
pub fn detect_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Images
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "svg"          => "image/svg+xml",
        "heic"         => "image/heic",

        // Audio / video
        "mp3"          => "audio/mpeg",
        "wav"          => "audio/wav",
        "m4a"          => "audio/mp4",
        "mp4"          => "video/mp4",
        "webm"         => "video/webm",
        "mov"          => "video/quicktime",

        // Documents
        "pdf"          => "application/pdf",
        "doc"          => "application/msword",
        "docx"         => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls"          => "application/vnd.ms-excel",
        "xlsx"         => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pptx"         => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" | "log"  => "text/plain",
        "md"           => "text/markdown",
        "csv"          => "text/csv",
        "json"         => "application/json",
        "zip"          => "application/zip",

        _              => "application/octet-stream",
    }
}

/// Content type to store an upload under: the client's declared type when it
/// gave a specific one, otherwise a guess from the file name.
pub fn resolve_content_type(file_name: &str, declared: &str) -> String {
    let declared = declared.trim();
    if declared.is_empty() || declared == "application/octet-stream" {
        detect_mime_type(Path::new(file_name)).to_string()
    } else {
        declared.to_string()
    }
}

/// Whether a file is safe to render in the browser rather than download.
pub fn is_inline_safe(mime: &str) -> bool {
    matches!(
        mime,
        "image/jpeg" | "image/png" | "image/gif" | "image/webp"
        | "audio/mpeg" | "audio/wav"
        | "video/mp4" | "video/webm"
        | "text/plain" | "application/pdf"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_by_extension_case_insensitively() {
        assert_eq!(detect_mime_type(&PathBuf::from("photo.JPG")), "image/jpeg");
        assert_eq!(detect_mime_type(&PathBuf::from("report.pdf")), "application/pdf");
    }

    #[test]
    fn unknown_extension_fallback() {
        assert_eq!(detect_mime_type(&PathBuf::from("file.xyz")), "application/octet-stream");
        assert_eq!(detect_mime_type(&PathBuf::from("Makefile")), "application/octet-stream");
    }

    #[test]
    fn declared_type_wins_unless_generic() {
        assert_eq!(resolve_content_type("a.png", "image/x-custom"), "image/x-custom");
        assert_eq!(resolve_content_type("a.png", ""), "image/png");
        assert_eq!(resolve_content_type("a.csv", "application/octet-stream"), "text/csv");
    }

    #[test]
    fn svg_is_not_inline() {
        assert!(is_inline_safe("image/png"));
        assert!(!is_inline_safe("image/svg+xml"));
        assert!(!is_inline_safe("text/html"));
    }
}
