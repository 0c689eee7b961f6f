//! Integration tests: snapshot history across the in-memory and JSONL stores.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use ucr_kernel::{
    BrandIdentity, CategoryDefinition, ContextRecord, GuardrailRules, LineageId, Status,
};
use ucr_store::{
    JsonlSnapshotStore, MemorySnapshotStore, SaveRequest, SnapshotStore, StoreError,
    diff_snapshots, restore_snapshot, save_record,
};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "ucr-store-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn draft() -> ContextRecord {
    let mut record = ContextRecord::new(LineageId::new());
    record.sections.brand_identity = Some(BrandIdentity {
        name: "Acme Running".into(),
        domain: "acmerunning.com".into(),
        ..Default::default()
    });
    record
}

/// Three versions: draft, categorized + AI_READY, guarded + HUMAN_CONFIRMED.
fn build_history<S: SnapshotStore>(store: &S) -> ContextRecord {
    let mut record = draft();
    save_record(store, &record).expect("v1 should save");

    record.status = Status::AiReady;
    record.sections.category_definition = Some(CategoryDefinition {
        primary_category: "running shoes".into(),
        ..Default::default()
    });
    save_record(store, &record).expect("v2 should save");

    record.status = Status::HumanConfirmed;
    record.sections.negative_scope = Some(GuardrailRules {
        excluded_keywords: vec!["cheap".into()],
        ..Default::default()
    });
    save_record(store, &record).expect("v3 should save");
    record
}

fn assert_restore_then_diff_is_empty<S: SnapshotStore>(store: &S) {
    let record = build_history(store);
    let lineage = record.lineage_id;

    let outcome = restore_snapshot(store, &lineage, 1).expect("restore should succeed");
    assert_eq!(outcome.snapshot.version, 4);
    assert_eq!(outcome.snapshot.restored_from, Some(1));
    assert_eq!(outcome.restored_from, 1);
    assert!(!outcome.diff.is_empty());

    let v1 = store
        .get_snapshot(&lineage, 1)
        .expect("read should succeed")
        .expect("v1 should exist");
    let diff = diff_snapshots(&outcome.snapshot, &v1).expect("diff should succeed");
    assert!(diff.is_empty(), "unexpected changes: {:?}", diff.changed_fields());
    assert_eq!(outcome.snapshot.hash, v1.hash);
}

#[test]
fn restore_then_diff_is_empty_in_memory() {
    assert_restore_then_diff_is_empty(&MemorySnapshotStore::new());
}

#[test]
fn restore_then_diff_is_empty_on_disk() {
    let tmp = TempDirGuard::new("restore");
    assert_restore_then_diff_is_empty(&JsonlSnapshotStore::open(
        tmp.path().join("history.jsonl"),
    ));
}

#[test]
fn restore_moves_status_backward_while_version_increases() {
    let store = MemorySnapshotStore::new();
    let record = build_history(&store);

    let outcome = restore_snapshot(&store, &record.lineage_id, 2).expect("restore should succeed");
    assert_eq!(outcome.snapshot.status, Status::AiReady);

    let latest = store
        .latest_snapshot(&record.lineage_id)
        .expect("read should succeed")
        .expect("latest should exist");
    assert_eq!(latest.version, 4);
    assert_eq!(latest.status, Status::AiReady);
    assert_eq!(
        outcome.diff.changed_fields(),
        vec![
            "negative_scope.enforcement.allow_model_suggestion",
            "negative_scope.enforcement.hard_exclusion",
            "negative_scope.enforcement.require_human_override_for_expansion",
            "negative_scope.excluded_categories",
            "negative_scope.excluded_competitors",
            "negative_scope.excluded_keywords",
            "negative_scope.excluded_use_cases",
        ]
    );
}

#[test]
fn restoring_latest_appends_a_duplicate_content_version() {
    let store = MemorySnapshotStore::new();
    let record = build_history(&store);

    let outcome = restore_snapshot(&store, &record.lineage_id, 3).expect("restore should succeed");
    assert_eq!(outcome.snapshot.version, 4);
    assert!(outcome.diff.is_empty());

    let versions = store.versions(&record.lineage_id).expect("list should succeed");
    assert_eq!(versions.len(), 4);
    assert_eq!(versions[2].hash, versions[3].hash);
}

#[test]
fn diff_is_symmetric_across_versions() {
    let store = MemorySnapshotStore::new();
    let record = build_history(&store);
    let v1 = store.get_snapshot(&record.lineage_id, 1).unwrap().unwrap();
    let v3 = store.get_snapshot(&record.lineage_id, 3).unwrap().unwrap();

    let forward = diff_snapshots(&v1, &v3).unwrap();
    let backward = diff_snapshots(&v3, &v1).unwrap();
    assert_eq!(forward.changed_fields(), backward.changed_fields());
    for (f, b) in forward.changes.iter().zip(&backward.changes) {
        assert_eq!(f.old_value, b.new_value);
        assert_eq!(f.new_value, b.old_value);
    }
}

#[test]
fn stale_restore_conflicts_and_leaves_history_untouched() {
    let store = MemorySnapshotStore::new();
    let record = build_history(&store);

    let target = store.get_snapshot(&record.lineage_id, 1).unwrap().unwrap();
    let err = store
        .save_snapshot(&record.lineage_id, SaveRequest::restoring(&target, Some(2)))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::VersionConflict {
            expected: Some(2),
            actual: Some(3)
        }
    ));
    assert_eq!(store.latest_version(&record.lineage_id).unwrap(), Some(3));
}

#[test]
fn jsonl_history_reloads_identically() {
    let tmp = TempDirGuard::new("reload");
    let path = tmp.path().join("nested/history.jsonl");
    let record = build_history(&JsonlSnapshotStore::open(&path));

    let reopened = JsonlSnapshotStore::open(&path);
    let latest = reopened
        .latest_snapshot(&record.lineage_id)
        .expect("read should succeed")
        .expect("latest should exist");
    assert_eq!(latest.version, 3);
    assert_eq!(latest.to_record(), record);
}
