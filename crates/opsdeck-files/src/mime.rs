//! MIME classification from file extensions.
//!
//! The editor only needs a fixed table: enough to decide between inline
//! text delivery and attachment download, and to label the download.

use std::path::Path;

/// Look up the MIME type for a path from its extension.
///
/// Unknown or missing extensions fall back to `application/octet-stream`.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("txt") | Some("log") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("csv") => "text/csv",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("yaml") | Some("yml") => "application/x-yaml",
        Some("xml") => "application/xml",
        Some("ts") => "application/typescript",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// MIME type prefixes that may be delivered inline as JSON-wrapped text.
const TEXT_VIEWABLE_PREFIXES: &[&str] = &[
    "text/",
    "application/javascript",
    "application/json",
    "application/x-yaml",
    "application/xml",
    "application/typescript",
];

/// Check whether a MIME type is classified as text-viewable.
pub fn is_text_viewable(mime: &str) -> bool {
    TEXT_VIEWABLE_PREFIXES.iter().any(|p| mime.starts_with(p))
}
