//! Sandboxed file access for the opsdeck editor.
//!
//! Everything the in-browser editor does to the filesystem goes through this
//! crate: untrusted client paths are resolved against a configured root
//! directory with strict escape prevention, and file content is served
//! either as inline text (for viewable MIME types) or as a downloadable
//! byte stream.

pub mod error;
pub mod mime;
pub mod resolver;
pub mod service;

pub use error::{FilesError, FilesResult};
pub use mime::{is_text_viewable, mime_for_path};
pub use resolver::PathResolver;
pub use service::{FileAccessService, FileContent, FileRecord};
