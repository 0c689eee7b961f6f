//! Snapshot: an immutable, versioned copy of a Context Record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ucr_kernel::{Confidence, ContentHash, ContextRecord, LineageId, SectionSet, Status};

use crate::store::StoreError;

/// One persisted version of a record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lineage_id: LineageId,
    pub version: u64,
    pub hash: ContentHash,
    pub status: Status,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub cmo_safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Version this snapshot was restored from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<u64>,
    #[serde(default)]
    pub sections: SectionSet,
}

impl Snapshot {
    /// Materialize a snapshot for `version` from a save request.
    pub(crate) fn from_request(
        lineage_id: LineageId,
        version: u64,
        request: SaveRequest,
    ) -> Result<Self, StoreError> {
        let hash = request
            .sections
            .content_hash()
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(Self {
            lineage_id,
            version,
            hash,
            status: request.status,
            confidence: request.confidence,
            cmo_safe: request.cmo_safe,
            valid_until: request.valid_until,
            created_at: Utc::now(),
            restored_from: request.restored_from,
            sections: request.sections,
        })
    }

    /// An editable working copy carrying this snapshot's content and status.
    pub fn to_record(&self) -> ContextRecord {
        ContextRecord {
            lineage_id: self.lineage_id,
            status: self.status,
            confidence: self.confidence,
            cmo_safe: self.cmo_safe,
            valid_until: self.valid_until,
            sections: self.sections.clone(),
        }
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            version: self.version,
            hash: self.hash.clone(),
            status: self.status,
            created_at: self.created_at,
            restored_from: self.restored_from,
        }
    }

    /// Same content and same governance metadata as `record`.
    pub(crate) fn matches_record(&self, record: &ContextRecord, hash: &ContentHash) -> bool {
        &self.hash == hash
            && self.status == record.status
            && self.confidence == record.confidence
            && self.cmo_safe == record.cmo_safe
            && self.valid_until == record.valid_until
    }
}

/// History listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub version: u64,
    pub hash: ContentHash,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restored_from: Option<u64>,
}

/// Content to persist as the next version of a lineage.
///
/// `expected_latest` is the optimistic-concurrency token: the version the
/// writer last saw (`None` for a new lineage). A store must refuse the save
/// when the lineage has moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub sections: SectionSet,
    pub status: Status,
    pub confidence: Confidence,
    pub cmo_safe: bool,
    pub valid_until: Option<DateTime<Utc>>,
    pub restored_from: Option<u64>,
    pub expected_latest: Option<u64>,
}

impl SaveRequest {
    pub fn from_record(record: &ContextRecord, expected_latest: Option<u64>) -> Self {
        Self {
            sections: record.sections.clone(),
            status: record.status,
            confidence: record.confidence,
            cmo_safe: record.cmo_safe,
            valid_until: record.valid_until,
            restored_from: None,
            expected_latest,
        }
    }

    /// A request that re-saves `snapshot`'s content as a new version.
    pub fn restoring(snapshot: &Snapshot, expected_latest: Option<u64>) -> Self {
        Self {
            sections: snapshot.sections.clone(),
            status: snapshot.status,
            confidence: snapshot.confidence,
            cmo_safe: snapshot.cmo_safe,
            valid_until: snapshot.valid_until,
            restored_from: Some(snapshot.version),
            expected_latest,
        }
    }
}
