//! The snapshot-store contract and its in-memory arena implementation.
//!
//! History is append-only and keyed by `(lineage, version)`. The current
//! snapshot of a lineage is simply the one with the highest version; there
//! is no separate head pointer to keep in sync.

use std::collections::BTreeMap;
use std::sync::Mutex;
use ucr_kernel::{ContextRecord, LineageId};

use crate::jsonl::JsonlError;
use crate::snapshot::{SaveRequest, Snapshot, SnapshotSummary};

/// Errors raised by snapshot stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    #[error("failed to serialize snapshot content: {0}")]
    Serialize(String),

    #[error("snapshot not found: {lineage} v{version}")]
    SnapshotNotFound { lineage: LineageId, version: u64 },

    #[error("lineage has no snapshots: {0}")]
    LineageNotFound(LineageId),

    /// Another writer saved first. The caller should re-read and retry.
    #[error("version conflict: expected latest {expected:?}, found {actual:?}")]
    VersionConflict {
        expected: Option<u64>,
        actual: Option<u64>,
    },

    #[error("store lock poisoned")]
    LockPoisoned,

    /// Another writer holds the history lock. The caller should retry.
    #[error("history lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("failed to acquire history lock {lock_path}: {message}")]
    LockIo { lock_path: String, message: String },
}

/// Persistence collaborator for snapshot history.
pub trait SnapshotStore {
    /// Fetch one version of a lineage.
    fn get_snapshot(
        &self,
        lineage: &LineageId,
        version: u64,
    ) -> Result<Option<Snapshot>, StoreError>;

    /// Highest version of a lineage, `None` if it has no snapshots.
    fn latest_version(&self, lineage: &LineageId) -> Result<Option<u64>, StoreError>;

    /// Version history in ascending order.
    fn versions(&self, lineage: &LineageId) -> Result<Vec<SnapshotSummary>, StoreError>;

    /// Append the next version. Fails with `VersionConflict` when
    /// `request.expected_latest` is stale.
    fn save_snapshot(
        &self,
        lineage: &LineageId,
        request: SaveRequest,
    ) -> Result<Snapshot, StoreError>;

    /// The latest snapshot of a lineage.
    fn latest_snapshot(&self, lineage: &LineageId) -> Result<Option<Snapshot>, StoreError> {
        match self.latest_version(lineage)? {
            Some(version) => self.get_snapshot(lineage, version),
            None => Ok(None),
        }
    }
}

/// Verify the optimistic-concurrency token and return the next version.
pub(crate) fn next_version(
    lineage: &LineageId,
    expected: Option<u64>,
    actual: Option<u64>,
) -> Result<u64, StoreError> {
    if expected != actual {
        tracing::warn!(
            lineage = %lineage,
            ?expected,
            ?actual,
            "snapshot save rejected: version conflict"
        );
        return Err(StoreError::VersionConflict { expected, actual });
    }
    Ok(actual.map_or(1, |v| v + 1))
}

/// In-memory arena of snapshots.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<BTreeMap<(LineageId, u64), Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing snapshots (e.g. loaded from disk).
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let index = snapshots
            .into_iter()
            .map(|s| ((s.lineage_id, s.version), s))
            .collect();
        Self {
            snapshots: Mutex::new(index),
        }
    }

    /// Total number of snapshots across all lineages.
    pub fn len(&self) -> Result<usize, StoreError> {
        let map = self.snapshots.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

fn latest_in(map: &BTreeMap<(LineageId, u64), Snapshot>, lineage: &LineageId) -> Option<u64> {
    map.range((*lineage, 0)..=(*lineage, u64::MAX))
        .next_back()
        .map(|((_, version), _)| *version)
}

impl SnapshotStore for MemorySnapshotStore {
    fn get_snapshot(
        &self,
        lineage: &LineageId,
        version: u64,
    ) -> Result<Option<Snapshot>, StoreError> {
        let map = self.snapshots.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.get(&(*lineage, version)).cloned())
    }

    fn latest_version(&self, lineage: &LineageId) -> Result<Option<u64>, StoreError> {
        let map = self.snapshots.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(latest_in(&map, lineage))
    }

    fn versions(&self, lineage: &LineageId) -> Result<Vec<SnapshotSummary>, StoreError> {
        let map = self.snapshots.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map
            .range((*lineage, 0)..=(*lineage, u64::MAX))
            .map(|(_, snapshot)| snapshot.summary())
            .collect())
    }

    fn save_snapshot(
        &self,
        lineage: &LineageId,
        request: SaveRequest,
    ) -> Result<Snapshot, StoreError> {
        let mut map = self.snapshots.lock().map_err(|_| StoreError::LockPoisoned)?;
        let version = next_version(lineage, request.expected_latest, latest_in(&map, lineage))?;
        let snapshot = Snapshot::from_request(*lineage, version, request)?;
        map.insert((*lineage, version), snapshot.clone());
        Ok(snapshot)
    }
}

/// Result of an ordinary editing save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(Snapshot),
    /// Content and metadata match the latest snapshot; nothing was written.
    Unchanged(Snapshot),
}

impl SaveOutcome {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            SaveOutcome::Created(s) | SaveOutcome::Unchanged(s) => s,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, SaveOutcome::Created(_))
    }
}

/// Save a working copy as the next version of its lineage, skipping no-op saves.
pub fn save_record<S: SnapshotStore + ?Sized>(
    store: &S,
    record: &ContextRecord,
) -> Result<SaveOutcome, StoreError> {
    let hash = record
        .content_hash()
        .map_err(|e| StoreError::Serialize(e.to_string()))?;
    let latest = store.latest_snapshot(&record.lineage_id)?;

    if let Some(latest) = latest.as_ref()
        && latest.matches_record(record, &hash)
    {
        tracing::debug!(
            lineage = %record.lineage_id,
            version = latest.version,
            "save skipped: content unchanged"
        );
        return Ok(SaveOutcome::Unchanged(latest.clone()));
    }

    let expected = latest.as_ref().map(|s| s.version);
    let snapshot = store.save_snapshot(
        &record.lineage_id,
        SaveRequest::from_record(record, expected),
    )?;
    tracing::info!(
        lineage = %snapshot.lineage_id,
        version = snapshot.version,
        hash = snapshot.hash.short(),
        status = %snapshot.status,
        "snapshot saved"
    );
    Ok(SaveOutcome::Created(snapshot))
}
