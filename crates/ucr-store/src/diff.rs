//! Structural diff between two snapshots' section content.
//!
//! Objects are walked key by key; arrays and scalars compare whole. A field
//! missing on one side compares as `null`, so a section that exists only in
//! one snapshot shows up as one change per leaf field rather than a single
//! opaque blob.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use ucr_kernel::{LineageId, SectionId, SectionSet};

use crate::snapshot::Snapshot;
use crate::store::StoreError;

/// One changed leaf, addressed as `<section_key>.<field>[.<nested>]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: Value,
    pub new_value: Value,
}

impl FieldChange {
    /// The same change seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            field: self.field.clone(),
            old_value: self.new_value.clone(),
            new_value: self.old_value.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub lineage_id: LineageId,
    pub from_version: u64,
    pub to_version: u64,
    pub changes: Vec<FieldChange>,
}

impl VersionDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }
}

/// Field-level changes from `old` to `new`, in section order then key order.
pub fn diff_sections(
    old: &SectionSet,
    new: &SectionSet,
) -> Result<Vec<FieldChange>, serde_json::Error> {
    let old = serde_json::to_value(old)?;
    let new = serde_json::to_value(new)?;

    let mut changes = Vec::new();
    for id in SectionId::ALL {
        let key = id.key();
        walk(
            key,
            old.get(key).unwrap_or(&Value::Null),
            new.get(key).unwrap_or(&Value::Null),
            &mut changes,
        );
    }
    Ok(changes)
}

/// Diff two snapshots of the same lineage. `a` is the "from" side.
pub fn diff_snapshots(a: &Snapshot, b: &Snapshot) -> Result<VersionDiff, StoreError> {
    let changes = diff_sections(&a.sections, &b.sections)
        .map_err(|e| StoreError::Serialize(e.to_string()))?;
    tracing::debug!(
        lineage = %a.lineage_id,
        from = a.version,
        to = b.version,
        changes = changes.len(),
        "snapshot diff computed"
    );
    Ok(VersionDiff {
        lineage_id: a.lineage_id,
        from_version: a.version,
        to_version: b.version,
        changes,
    })
}

fn walk(path: &str, old: &Value, new: &Value, out: &mut Vec<FieldChange>) {
    let empty = Map::new();
    let (old_map, new_map) = match (old, new) {
        (Value::Object(a), Value::Object(b)) => (a, b),
        (Value::Object(a), Value::Null) => (a, &empty),
        (Value::Null, Value::Object(b)) => (&empty, b),
        _ => {
            if old != new {
                out.push(FieldChange {
                    field: path.to_string(),
                    old_value: old.clone(),
                    new_value: new.clone(),
                });
            }
            return;
        }
    };

    let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
    for key in keys {
        walk(
            &format!("{path}.{key}"),
            old_map.get(key).unwrap_or(&Value::Null),
            new_map.get(key).unwrap_or(&Value::Null),
            out,
        );
    }
}
