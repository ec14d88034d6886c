//! JSON file-based storage implementation.
//!
//! This storage backend stores each key as a separate JSON file.
//! Keys are mapped to file paths: `["snapshots", "etc", "hosts_conf"]` ->
//! `snapshots/etc/hosts_conf.json` under the base path.

use crate::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// JSON file-based storage.
#[derive(Clone)]
pub struct JsonStorage {
    base_path: PathBuf,
}

impl JsonStorage {
    /// Create a new JSON storage at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the file path for a key.
    fn key_to_path(&self, key: &[&str]) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        // Validate key components (no path traversal)
        for component in key {
            if component.is_empty()
                || component.contains('/')
                || component.contains('\\')
                || *component == "."
                || *component == ".."
            {
                return Err(StorageError::invalid_key(format!(
                    "Invalid key component: {}",
                    component
                )));
            }
        }

        let mut path = self.base_path.clone();
        for component in key {
            path.push(component);
        }
        path.set_extension("json");

        Ok(path)
    }
}

#[async_trait]
impl Storage for JsonStorage {
    async fn load(&self, key: &[&str]) -> StorageResult<Option<Value>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Loading from storage");

        match fs::read_to_string(&path).await {
            Ok(content) => {
                let value: Value = serde_json::from_str(&content)?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn save(&self, key: &[&str], value: &Value) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Saving to storage");

        // Create parent directories (idempotent)
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(value)?;

        // Write atomically (write to temp file, then rename)
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &path).await?;

        Ok(())
    }

    async fn remove(&self, key: &[&str]) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Removing from storage");

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn exists(&self, key: &[&str]) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(path.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let value = json!({ "name": "test", "count": 42 });
        storage.save(&["snapshots", "data"], &value).await.unwrap();

        let loaded = storage.load(&["snapshots", "data"]).await.unwrap();
        assert_eq!(loaded, Some(value));
    }

    #[tokio::test]
    async fn test_load_not_found() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        let loaded = storage.load(&["nonexistent"]).await.unwrap();
        assert_eq!(loaded, None);
    }

    #[tokio::test]
    async fn test_load_malformed_is_error() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let result = storage.load(&["bad"]).await;
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.save(&["key"], &json!({ "v": 1 })).await.unwrap();
        storage.save(&["key"], &json!({ "v": 2 })).await.unwrap();

        let loaded = storage.load(&["key"]).await.unwrap().unwrap();
        assert_eq!(loaded["v"], 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage.save(&["key"], &json!(true)).await.unwrap();
        assert!(storage.exists(&["key"]).await.unwrap());

        storage.remove(&["key"]).await.unwrap();
        assert!(!storage.exists(&["key"]).await.unwrap());

        // Removing a missing key is not an error
        storage.remove(&["key"]).await.unwrap();
    }

    #[tokio::test]
    async fn test_nested_key_creates_directories() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        storage
            .save(&["snapshots", "etc", "nginx", "site_conf"], &json!([]))
            .await
            .unwrap();

        assert!(dir
            .path()
            .join("snapshots/etc/nginx/site_conf.json")
            .exists());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let dir = tempdir().unwrap();
        let storage = JsonStorage::new(dir.path());

        // Empty key
        assert!(storage.save(&[], &json!(null)).await.is_err());

        // Path traversal attempt
        assert!(storage
            .save(&["..", "etc", "passwd"], &json!(null))
            .await
            .is_err());

        // Slash in component
        assert!(storage.save(&["path/traversal"], &json!(null)).await.is_err());

        // Empty component
        assert!(storage.save(&["a", ""], &json!(null)).await.is_err());
    }
}
