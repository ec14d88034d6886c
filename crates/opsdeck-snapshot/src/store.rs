//! Snapshot storage with lock-aware retention.

use crate::{Snapshot, SnapshotCollection, SnapshotError, SnapshotResult};
use opsdeck_files::PathResolver;
use opsdeck_storage::Storage;
use opsdeck_util::path::relative_to;
use std::collections::HashMap;
use std::path::{Component, Path};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Hard ceiling on snapshots per file. Not configurable.
pub const MAX_SNAPSHOTS: usize = 10;

/// Per-file snapshot history over a keyed blob store.
///
/// Every operation is a read-modify-write of the whole collection,
/// serialized per storage key by a process-local async mutex. The backing
/// store itself offers no locking, so deployments sharing one storage
/// directory across processes can still lose updates.
pub struct SnapshotStore {
    resolver: PathResolver,
    storage: Arc<dyn Storage>,
    locks: KeyLocks,
}

impl SnapshotStore {
    /// Create a new snapshot store.
    ///
    /// The resolver jails original-file paths to the editor root; the
    /// storage holds one JSON document per original file.
    pub fn new(resolver: PathResolver, storage: Arc<dyn Storage>) -> Self {
        Self {
            resolver,
            storage,
            locks: KeyLocks::default(),
        }
    }

    /// List the snapshots of one original file, newest first.
    ///
    /// A missing (or externally deleted) original file yields an empty
    /// list rather than an error, so the editor keeps working after files
    /// vanish underneath it. Absent or malformed persisted data is also
    /// treated as empty.
    pub async fn list(&self, file_path: &str) -> SnapshotResult<Vec<Snapshot>> {
        let resolved = self.resolver.resolve(file_path)?;

        if !is_existing_file(&resolved).await {
            debug!(path = %file_path, "Original file missing; reporting empty history");
            return Ok(Vec::new());
        }

        let key = self.storage_key(&resolved);
        let mut snapshots = self.load_or_default(&key).await.snapshots;
        snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(snapshots)
    }

    /// Capture a new snapshot of one original file.
    ///
    /// Prunes the oldest unlocked snapshots to keep the collection within
    /// [`MAX_SNAPSHOTS`]. When locked snapshots consume every slot the new
    /// snapshot cannot survive pruning; the create is rejected with
    /// `AllSlotsLocked` and nothing is persisted.
    pub async fn create(
        &self,
        file_path: &str,
        content: &str,
        language: &str,
    ) -> SnapshotResult<Vec<Snapshot>> {
        let resolved = self.resolver.resolve(file_path)?;

        if !is_existing_file(&resolved).await {
            return Err(SnapshotError::FileNotFound(file_path.to_string()));
        }

        let key = self.storage_key(&resolved);
        let _guard = self.locks.acquire(&key.join("/")).await;

        let collection = self.load_or_default(&key).await;

        let snapshot = Snapshot::new(content, language);
        let new_id = snapshot.id.clone();

        let mut snapshots = collection.snapshots;
        snapshots.insert(0, snapshot);

        let (locked, mut unlocked): (Vec<Snapshot>, Vec<Snapshot>) =
            snapshots.into_iter().partition(|s| s.locked);

        // Eviction order: oldest unlocked first. Ids are ascending ULIDs,
        // so the id tie-break keeps ordering deterministic when two
        // snapshots land on the same timestamp.
        unlocked.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        let keep_unlocked = MAX_SNAPSHOTS.saturating_sub(locked.len());
        if unlocked.len() > keep_unlocked {
            let excess = unlocked.len() - keep_unlocked;
            unlocked.drain(..excess);
        }

        if !unlocked.iter().any(|s| s.id == new_id) {
            // The fresh snapshot was itself evicted: every slot is held by
            // a locked entry. Leave the persisted collection untouched.
            return Err(SnapshotError::AllSlotsLocked);
        }

        let mut merged: Vec<Snapshot> = locked.into_iter().chain(unlocked).collect();
        merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let updated = SnapshotCollection { snapshots: merged };
        self.persist(&key, &updated).await?;

        info!(
            path = %file_path,
            id = %new_id,
            count = updated.snapshots.len(),
            "Created snapshot"
        );

        Ok(updated.snapshots)
    }

    /// Flip the lock flag of one snapshot, returning the updated entry.
    ///
    /// Timestamp and content are untouched; locking only exempts the
    /// snapshot from automatic pruning.
    pub async fn toggle_lock(&self, file_path: &str, snapshot_id: &str) -> SnapshotResult<Snapshot> {
        let resolved = self.resolver.resolve(file_path)?;
        let key = self.storage_key(&resolved);
        let _guard = self.locks.acquire(&key.join("/")).await;

        let mut collection = self.load_or_default(&key).await;

        let snapshot = collection
            .snapshots
            .iter_mut()
            .find(|s| s.id == snapshot_id)
            .ok_or_else(|| SnapshotError::NotFound(snapshot_id.to_string()))?;

        snapshot.locked = !snapshot.locked;
        let updated = snapshot.clone();

        self.persist(&key, &collection).await?;

        info!(id = %snapshot_id, locked = updated.locked, "Toggled snapshot lock");
        Ok(updated)
    }

    /// Delete one snapshot unconditionally, locked or not.
    pub async fn delete(&self, file_path: &str, snapshot_id: &str) -> SnapshotResult<()> {
        let resolved = self.resolver.resolve(file_path)?;
        let key = self.storage_key(&resolved);
        let _guard = self.locks.acquire(&key.join("/")).await;

        let mut collection = self.load_or_default(&key).await;

        let before = collection.snapshots.len();
        collection.snapshots.retain(|s| s.id != snapshot_id);
        if collection.snapshots.len() == before {
            return Err(SnapshotError::NotFound(snapshot_id.to_string()));
        }

        if collection.snapshots.is_empty() {
            let refs = key_refs(&key);
            self.storage
                .remove(&refs)
                .await
                .map_err(|e| SnapshotError::StorageUnavailable(e.to_string()))?;
        } else {
            self.persist(&key, &collection).await?;
        }

        info!(id = %snapshot_id, "Deleted snapshot");
        Ok(())
    }

    /// Derive the storage key for an original file.
    ///
    /// Root-relative directory structure is preserved as key segments;
    /// each segment is sanitized so the backend's own suffix handling
    /// cannot make distinct files collide.
    fn storage_key(&self, resolved: &Path) -> Vec<String> {
        let relative = relative_to(resolved, self.resolver.root())
            .unwrap_or_else(|| resolved.to_path_buf());

        let mut key = vec!["snapshots".to_string()];
        for component in relative.components() {
            if let Component::Normal(segment) = component {
                key.push(sanitize_segment(&segment.to_string_lossy()));
            }
        }
        key
    }

    async fn load_or_default(&self, key: &[String]) -> SnapshotCollection {
        let refs = key_refs(key);
        match self.storage.load(&refs).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(collection) => collection,
                Err(e) => {
                    warn!(key = %key.join("/"), error = %e, "Malformed snapshot data; treating as empty");
                    SnapshotCollection::default()
                }
            },
            Ok(None) => SnapshotCollection::default(),
            Err(e) => {
                warn!(key = %key.join("/"), error = %e, "Failed to load snapshot data; treating as empty");
                SnapshotCollection::default()
            }
        }
    }

    async fn persist(&self, key: &[String], collection: &SnapshotCollection) -> SnapshotResult<()> {
        let value = serde_json::to_value(collection)
            .map_err(|e| SnapshotError::StorageUnavailable(e.to_string()))?;
        let refs = key_refs(key);
        self.storage
            .save(&refs, &value)
            .await
            .map_err(|e| SnapshotError::StorageUnavailable(e.to_string()))
    }
}

/// Process-local per-key mutexes serializing collection read-modify-write.
#[derive(Default)]
struct KeyLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let cell = {
            let mut map = self.inner.lock().await;
            map.entry(key.to_string()).or_default().clone()
        };
        cell.lock_owned().await
    }
}

async fn is_existing_file(path: &Path) -> bool {
    matches!(fs::metadata(path).await, Ok(meta) if meta.is_file())
}

fn key_refs(key: &[String]) -> Vec<&str> {
    key.iter().map(String::as_str).collect()
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdeck_files::FilesError;
    use opsdeck_storage::MemoryStorage;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SnapshotStore, Arc<MemoryStorage>) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "live content").unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let store = SnapshotStore::new(PathResolver::new(dir.path()), storage.clone());
        (dir, store, storage)
    }

    async fn create_n(store: &SnapshotStore, path: &str, n: usize) -> Vec<String> {
        let mut ids = Vec::new();
        for i in 0..n {
            let snapshots = store
                .create(path, &format!("version {i}"), "text")
                .await
                .unwrap();
            ids.push(snapshots[0].id.clone());
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        ids
    }

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let (_dir, store, _) = setup();

        let ids = create_n(&store, "notes.txt", 3).await;

        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), 3);
        // Newest first: reverse creation order
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[1].id, ids[1]);
        assert_eq!(listed[2].id, ids[0]);
    }

    #[tokio::test]
    async fn test_retention_caps_at_ten() {
        let (_dir, store, _) = setup();

        let ids = create_n(&store, "notes.txt", 11).await;

        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), MAX_SNAPSHOTS);

        // The oldest of the 11 was pruned; the newest 10 remain
        let listed_ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert!(!listed_ids.contains(&ids[0].as_str()));
        for id in &ids[1..] {
            assert!(listed_ids.contains(&id.as_str()));
        }
    }

    #[tokio::test]
    async fn test_locked_snapshot_survives_pruning() {
        let (_dir, store, _) = setup();

        let first = create_n(&store, "notes.txt", 1).await.remove(0);
        store.toggle_lock("notes.txt", &first).await.unwrap();

        let more = create_n(&store, "notes.txt", 10).await;

        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), MAX_SNAPSHOTS);

        let listed_ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        // The locked first snapshot is retained; the oldest unlocked
        // (first of the later batch) was evicted instead.
        assert!(listed_ids.contains(&first.as_str()));
        assert!(!listed_ids.contains(&more[0].as_str()));
    }

    #[tokio::test]
    async fn test_all_slots_locked_rejects_create() {
        let (_dir, store, _) = setup();

        let ids = create_n(&store, "notes.txt", 10).await;
        for id in &ids {
            let updated = store.toggle_lock("notes.txt", id).await.unwrap();
            assert!(updated.locked);
        }

        let err = store
            .create("notes.txt", "one too many", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::AllSlotsLocked));

        // The collection is exactly as it was before the attempt
        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), 10);
        assert!(listed.iter().all(|s| s.locked));
        let listed_ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        for id in &ids {
            assert!(listed_ids.contains(&id.as_str()));
        }
    }

    #[tokio::test]
    async fn test_toggle_lock_preserves_everything_else() {
        let (_dir, store, _) = setup();

        let snapshots = store.create("notes.txt", "body", "yaml").await.unwrap();
        let original = snapshots[0].clone();

        let locked = store.toggle_lock("notes.txt", &original.id).await.unwrap();
        assert!(locked.locked);
        assert_eq!(locked.id, original.id);
        assert_eq!(locked.timestamp, original.timestamp);
        assert_eq!(locked.content, original.content);
        assert_eq!(locked.language, original.language);

        let unlocked = store.toggle_lock("notes.txt", &original.id).await.unwrap();
        assert!(!unlocked.locked);
    }

    #[tokio::test]
    async fn test_toggle_lock_unknown_id() {
        let (_dir, store, _) = setup();
        create_n(&store, "notes.txt", 1).await;

        let err = store
            .toggle_lock("notes.txt", "snp_missing")
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_locked_snapshots_too() {
        let (_dir, store, _) = setup();

        let ids = create_n(&store, "notes.txt", 2).await;
        store.toggle_lock("notes.txt", &ids[0]).await.unwrap();

        // Locks protect against pruning, not manual deletion
        store.delete("notes.txt", &ids[0]).await.unwrap();

        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, ids[1]);
    }

    #[tokio::test]
    async fn test_delete_last_snapshot_removes_storage_entry() {
        let (_dir, store, storage) = setup();

        let ids = create_n(&store, "notes.txt", 1).await;
        assert!(storage.exists(&["snapshots", "notes_txt"]).await.unwrap());

        store.delete("notes.txt", &ids[0]).await.unwrap();
        assert!(!storage.exists(&["snapshots", "notes_txt"]).await.unwrap());
        assert!(store.list("notes.txt").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let (_dir, store, _) = setup();
        create_n(&store, "notes.txt", 1).await;

        let err = store.delete("notes.txt", "snp_missing").await.unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_missing_file_is_empty() {
        let (_dir, store, _) = setup();
        let listed = store.list("does_not_exist.txt").await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_list_directory_is_empty() {
        let (dir, store, _) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let listed = store.list("sub").await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_create_missing_file_fails() {
        let (_dir, store, _) = setup();
        let err = store
            .create("does_not_exist.txt", "content", "text")
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_traversal_is_denied_not_swallowed() {
        let (_dir, store, _) = setup();
        let err = store.list("../../etc/passwd").await.unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::Files(FilesError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_persisted_data_treated_as_empty() {
        let (_dir, store, storage) = setup();

        storage
            .save(&["snapshots", "notes_txt"], &json!("garbage"))
            .await
            .unwrap();

        assert!(store.list("notes.txt").await.unwrap().is_empty());

        // The next create overwrites the garbage wholesale
        let snapshots = store.create("notes.txt", "fresh", "text").await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(store.list("notes.txt").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_keys_preserve_directories_and_distinguish_extensions() {
        let (dir, store, storage) = setup();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("sub/a.md"), "y").unwrap();

        store.create("sub/a.txt", "x", "text").await.unwrap();
        store.create("sub/a.md", "y", "markdown").await.unwrap();

        assert!(storage.exists(&["snapshots", "sub", "a_txt"]).await.unwrap());
        assert!(storage.exists(&["snapshots", "sub", "a_md"]).await.unwrap());

        assert_eq!(store.list("sub/a.txt").await.unwrap().len(), 1);
        assert_eq!(store.list("sub/a.md").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_both_survive() {
        let (_dir, store, _) = setup();
        let store = Arc::new(store);

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.create("notes.txt", "writer a", "text").await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.create("notes.txt", "writer b", "text").await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        // The per-key mutex serializes the two read-modify-write cycles
        let listed = store.list("notes.txt").await.unwrap();
        assert_eq!(listed.len(), 2);
    }
}
