//! Snapshot history for Context Records.
//!
//! Every save appends an immutable [`Snapshot`] to its lineage with a
//! strictly increasing version. Restore re-saves an older version's content
//! as a new version; nothing is rewritten.
//!
//! ```text
//! save_record ──► SnapshotStore::save_snapshot ──► MemorySnapshotStore
//!                   (expected_latest check)     └─► JsonlSnapshotStore
//! restore_snapshot ──► diff_snapshots + save_snapshot
//! ```

pub mod diff;
pub mod jsonl;
pub mod restore;
pub mod snapshot;
pub mod store;

pub use diff::{FieldChange, VersionDiff, diff_sections, diff_snapshots};
pub use jsonl::{
    JsonlError, JsonlSnapshotStore, read_snapshots, read_snapshots_from_path, write_snapshots,
    write_snapshots_to_path,
};
pub use restore::{RestoreOutcome, restore_snapshot};
pub use snapshot::{SaveRequest, Snapshot, SnapshotSummary};
pub use store::{MemorySnapshotStore, SaveOutcome, SnapshotStore, StoreError, save_record};
