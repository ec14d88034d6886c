//! Snapshot data structures.

use chrono::{DateTime, Utc};
use opsdeck_util::Identifier;
use serde::{Deserialize, Serialize};

/// A captured copy of one file's content at a point in time.
///
/// Immutable once created, except for the lock flag. Identity is the `id`;
/// display ordering is by `timestamp` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unique identifier for this snapshot.
    pub id: String,

    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// The captured file content.
    pub content: String,

    /// Editor language tag for syntax highlighting.
    pub language: String,

    /// Locked snapshots are exempt from automatic pruning; they still
    /// count toward the retention ceiling and can be deleted explicitly.
    #[serde(rename = "isLocked", default)]
    pub locked: bool,
}

impl Snapshot {
    /// Create a new unlocked snapshot with a fresh id and timestamp.
    pub fn new(content: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: Identifier::snapshot(),
            timestamp: Utc::now(),
            content: content.into(),
            language: language.into(),
            locked: false,
        }
    }
}

/// The full snapshot history of one original file, as persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotCollection {
    pub snapshots: Vec<Snapshot>,
}
