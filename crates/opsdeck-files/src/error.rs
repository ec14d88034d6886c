//! File access error types.

use thiserror::Error;

/// Result type for file access operations.
pub type FilesResult<T> = Result<T, FilesError>;

/// Errors that can occur during sandboxed file access.
#[derive(Debug, Error)]
pub enum FilesError {
    /// The requested path escapes the configured root directory.
    ///
    /// Carries only the client-supplied path; the resolved server-side path
    /// must never appear in messages shown to untrusted clients.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The path does not exist.
    #[error("File not found: {0}")]
    NotFound(String),

    /// The path is a directory but the operation requires a file.
    #[error("Not a file: {0}")]
    IsDirectory(String),

    /// The target exists but the write-permission probe failed.
    #[error("File is not writable: {0}")]
    NotWritable(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_echoes_requested_path_only() {
        let err = FilesError::AccessDenied("../../etc/passwd".to_string());
        assert_eq!(err.to_string(), "Access denied: ../../etc/passwd");
    }

    #[test]
    fn io_error_wraps() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = FilesError::from(io_err);
        assert!(err.to_string().contains("IO error"));
    }
}
