//! Stat, read, and write operations on files beneath the root.

use crate::{mime, FilesError, FilesResult, PathResolver};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// A point-in-time view of a file, derived from a stat/access call.
///
/// Transient by design: records are computed per request and never stored.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub resolved_path: PathBuf,
    pub is_directory: bool,
    pub size_bytes: u64,
    pub mime_type: &'static str,
    pub is_writable: bool,
}

/// Content returned by a read, classified for delivery.
#[derive(Debug)]
pub enum FileContent {
    /// Text-viewable content, delivered inline.
    Text { content: String, writable: bool },
    /// Anything else, delivered as an attachment download.
    Binary {
        bytes: Vec<u8>,
        mime: &'static str,
        filename: String,
    },
}

/// File read/write operations jailed to the resolver's root.
///
/// The service works on resolved paths; callers resolve client input
/// through [`PathResolver::resolve`] first. Reads are fully buffered --
/// this backs an editor, not a general-purpose file server.
pub struct FileAccessService {
    resolver: PathResolver,
}

impl FileAccessService {
    /// Create a new service over the given resolver.
    pub fn new(resolver: PathResolver) -> Self {
        Self { resolver }
    }

    /// Get the path resolver.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Stat a resolved path.
    ///
    /// Fails with `NotFound` if the path does not exist; directories stat
    /// fine and report `is_writable = false`.
    pub async fn stat(&self, resolved: &Path) -> FilesResult<FileRecord> {
        let meta = fs::metadata(resolved).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FilesError::NotFound(resolved.display().to_string())
            } else {
                FilesError::Io(e)
            }
        })?;

        let is_directory = meta.is_dir();
        let is_writable = if is_directory {
            false
        } else {
            probe_writable(resolved).await
        };

        Ok(FileRecord {
            resolved_path: resolved.to_path_buf(),
            is_directory,
            size_bytes: meta.len(),
            mime_type: mime::mime_for_path(resolved),
            is_writable,
        })
    }

    /// Read a file's content.
    ///
    /// With `for_viewing` set and a text-viewable MIME type, returns the
    /// decoded text plus the writability probe result. Otherwise returns
    /// the raw bytes for attachment download.
    pub async fn read(&self, resolved: &Path, for_viewing: bool) -> FilesResult<FileContent> {
        let record = self.stat(resolved).await?;

        if record.is_directory {
            return Err(FilesError::IsDirectory(resolved.display().to_string()));
        }

        if for_viewing && mime::is_text_viewable(record.mime_type) {
            let content = fs::read_to_string(resolved).await?;
            debug!(path = %resolved.display(), bytes = content.len(), "Read file for viewing");
            return Ok(FileContent::Text {
                content,
                writable: record.is_writable,
            });
        }

        let bytes = fs::read(resolved).await?;
        let filename = resolved
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        debug!(path = %resolved.display(), bytes = bytes.len(), "Read file for download");

        Ok(FileContent::Binary {
            bytes,
            mime: record.mime_type,
            filename,
        })
    }

    /// Overwrite a file's content in full.
    ///
    /// Fails with `NotWritable` only when the target exists and the probe
    /// fails. A missing target is an implicit create: the containing
    /// directory's own permissions decide, and a failure there surfaces as
    /// a plain IO error. No snapshot is taken here -- snapshot creation is
    /// an explicit, separate call made by the editor before saving.
    pub async fn write(&self, resolved: &Path, content: &str) -> FilesResult<()> {
        match fs::metadata(resolved).await {
            Ok(meta) => {
                if meta.is_dir() {
                    return Err(FilesError::IsDirectory(resolved.display().to_string()));
                }
                if !probe_writable(resolved).await {
                    return Err(FilesError::NotWritable(resolved.display().to_string()));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(FilesError::Io(e)),
        }

        fs::write(resolved, content).await?;
        debug!(path = %resolved.display(), bytes = content.len(), "Wrote file");
        Ok(())
    }
}

/// Probe whether a file can be opened for writing.
///
/// Absence of the permission is data, not an error.
async fn probe_writable(path: &Path) -> bool {
    fs::OpenOptions::new().write(true).open(path).await.is_ok()
}
