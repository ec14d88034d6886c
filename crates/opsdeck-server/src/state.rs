//! Server state.

use opsdeck_files::{FileAccessService, PathResolver};
use opsdeck_snapshot::SnapshotStore;
use opsdeck_storage::Storage;
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state.
///
/// The file service and snapshot store each get their own resolver over
/// the same root; they share no other state, so a snapshot failure can
/// never block the live file read/write path.
#[derive(Clone)]
pub struct AppState {
    /// Sandboxed file access.
    pub files: Arc<FileAccessService>,
    /// Snapshot history.
    pub snapshots: Arc<SnapshotStore>,
}

impl AppState {
    /// Create a new app state over the given editor root and blob store.
    pub fn new(root: PathBuf, storage: Arc<dyn Storage>) -> Self {
        let files = FileAccessService::new(PathResolver::new(root.clone()));
        let snapshots = SnapshotStore::new(PathResolver::new(root), storage);
        Self {
            files: Arc::new(files),
            snapshots: Arc::new(snapshots),
        }
    }
}
