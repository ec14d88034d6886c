//! Storage layer for opsdeck.
//!
//! This crate provides the key-value blob storage abstraction behind which
//! the console's at-rest-encrypted store lives, with two backends:
//! - JSON file storage (default)
//! - In-memory storage (for testing)
//!
//! The store is deliberately opaque to callers: a keyed JSON blob goes in,
//! a keyed JSON blob (or nothing) comes out. Whether a backend encrypts the
//! bytes on disk is its own business; the trait is the boundary.

pub mod error;
pub mod json;
pub mod memory;

pub use error::{StorageError, StorageResult};
pub use json::JsonStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde_json::Value;

/// A trait for keyed JSON blob storage backends.
///
/// Keys are represented as path segments, e.g., `["snapshots", "notes_txt"]`.
/// Values are whole JSON documents; there is no partial-document API.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load a value from storage.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn load(&self, key: &[&str]) -> StorageResult<Option<Value>>;

    /// Save a value to storage, overwriting any previous value.
    ///
    /// Creates parent directories if necessary.
    async fn save(&self, key: &[&str], value: &Value) -> StorageResult<()>;

    /// Remove a value from storage. Removing a missing key is not an error.
    async fn remove(&self, key: &[&str]) -> StorageResult<()>;

    /// Check if a key exists.
    async fn exists(&self, key: &[&str]) -> StorageResult<bool>;
}
