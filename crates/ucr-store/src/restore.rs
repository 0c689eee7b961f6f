//! Restore: re-save an older version's content as a new version.

use serde::{Deserialize, Serialize};
use ucr_kernel::LineageId;

use crate::diff::{VersionDiff, diff_snapshots};
use crate::snapshot::{SaveRequest, Snapshot};
use crate::store::{SnapshotStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOutcome {
    /// The newly created snapshot.
    pub snapshot: Snapshot,
    /// What the restore changed, from the previous latest to the target.
    pub diff: VersionDiff,
    pub restored_from: u64,
}

/// Restore `target` of `lineage` by saving its sections and status as the
/// next version. History is never rewritten, and restoring the latest
/// version still appends a new one.
pub fn restore_snapshot<S: SnapshotStore + ?Sized>(
    store: &S,
    lineage: &LineageId,
    target: u64,
) -> Result<RestoreOutcome, StoreError> {
    let latest = store
        .latest_snapshot(lineage)?
        .ok_or(StoreError::LineageNotFound(*lineage))?;
    let target_snapshot =
        store
            .get_snapshot(lineage, target)?
            .ok_or(StoreError::SnapshotNotFound {
                lineage: *lineage,
                version: target,
            })?;

    let diff = diff_snapshots(&latest, &target_snapshot)?;
    let snapshot = store.save_snapshot(
        lineage,
        SaveRequest::restoring(&target_snapshot, Some(latest.version)),
    )?;

    tracing::info!(
        lineage = %lineage,
        restored_from = target,
        version = snapshot.version,
        status = %snapshot.status,
        changes = diff.changes.len(),
        "snapshot restored"
    );

    Ok(RestoreOutcome {
        snapshot,
        diff,
        restored_from: target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySnapshotStore, save_record};
    use ucr_kernel::{BrandIdentity, ContextRecord};

    #[test]
    fn unknown_lineage_is_reported() {
        let store = MemorySnapshotStore::new();
        let lineage = LineageId::new();
        let err = restore_snapshot(&store, &lineage, 1).unwrap_err();
        assert!(matches!(err, StoreError::LineageNotFound(l) if l == lineage));
    }

    #[test]
    fn unknown_version_is_reported() {
        let store = MemorySnapshotStore::new();
        let mut record = ContextRecord::new(LineageId::new());
        record.sections.brand_identity = Some(BrandIdentity {
            name: "Acme".into(),
            ..Default::default()
        });
        save_record(&store, &record).unwrap();

        let err = restore_snapshot(&store, &record.lineage_id, 7).unwrap_err();
        assert!(matches!(err, StoreError::SnapshotNotFound { version: 7, .. }));
        assert_eq!(store.len().unwrap(), 1);
    }
}
