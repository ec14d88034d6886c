//! Snapshot error types.

use opsdeck_files::FilesError;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Path resolution failed (escape attempt or similar).
    #[error(transparent)]
    Files(#[from] FilesError),

    /// The original file is missing or is a directory.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No snapshot with the given id exists in the collection.
    #[error("Snapshot not found: {0}")]
    NotFound(String),

    /// Every retention slot is consumed by locked snapshots; the caller
    /// must unlock or delete one before creating another.
    #[error("All snapshot slots are locked")]
    AllSlotsLocked,

    /// The storage backing the snapshot collection cannot be written.
    #[error("Snapshot storage unavailable: {0}")]
    StorageUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_slots_locked_displays() {
        assert_eq!(
            SnapshotError::AllSlotsLocked.to_string(),
            "All snapshot slots are locked"
        );
    }

    #[test]
    fn files_error_passes_through() {
        let err = SnapshotError::from(FilesError::AccessDenied("../x".to_string()));
        assert_eq!(err.to_string(), "Access denied: ../x");
    }
}
