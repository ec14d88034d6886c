//! Per-file snapshot history for the opsdeck editor.
//!
//! Each file beneath the editor root can carry a bounded history of content
//! snapshots, persisted through the console's keyed blob store. Retention
//! is lock-aware: the oldest unlocked snapshots are pruned to keep each
//! collection within [`MAX_SNAPSHOTS`], while locked snapshots survive
//! pruning (but still count toward the ceiling and can be deleted
//! explicitly).

pub mod error;
pub mod snapshot;
pub mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::{Snapshot, SnapshotCollection};
pub use store::{SnapshotStore, MAX_SNAPSHOTS};
