//! Lifecycle state machine for a record's `status`.
//!
//! ```text
//! DRAFT_AI → AI_READY → AI_ANALYSIS_RUN → HUMAN_CONFIRMED → LOCKED
//!     └──────────┴─────────────┴────────────────┴──→ EXPIRED (valid_until elapsed)
//! ```
//!
//! Transitions only move forward. `EXPIRED` is time-triggered: a record whose
//! `valid_until` has passed is treated as expired by every gate, whatever its
//! stored status. `LOCKED` and `EXPIRED` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LifecycleError;
use crate::record::ContextRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    DraftAi,
    AiReady,
    AiAnalysisRun,
    HumanConfirmed,
    Locked,
    Expired,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::DraftAi,
        Status::AiReady,
        Status::AiAnalysisRun,
        Status::HumanConfirmed,
        Status::Locked,
        Status::Expired,
    ];

    /// Every status a usable record can have.
    pub const NOT_EXPIRED: [Status; 5] = [
        Status::DraftAi,
        Status::AiReady,
        Status::AiAnalysisRun,
        Status::HumanConfirmed,
        Status::Locked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::DraftAi => "DRAFT_AI",
            Status::AiReady => "AI_READY",
            Status::AiAnalysisRun => "AI_ANALYSIS_RUN",
            Status::HumanConfirmed => "HUMAN_CONFIRMED",
            Status::Locked => "LOCKED",
            Status::Expired => "EXPIRED",
        }
    }

    /// Position on the forward path; `None` for `EXPIRED`.
    pub fn rank(self) -> Option<u8> {
        match self {
            Status::DraftAi => Some(0),
            Status::AiReady => Some(1),
            Status::AiAnalysisRun => Some(2),
            Status::HumanConfirmed => Some(3),
            Status::Locked => Some(4),
            Status::Expired => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Locked | Status::Expired)
    }

    /// Forward moves (skips allowed), or expiry from any non-terminal state.
    pub fn can_transition_to(self, next: Status) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown status `{s}`"))
    }
}

/// Outcome of a lifecycle gate. `message` is reused verbatim in audit traces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCheck {
    pub valid: bool,
    pub status: Status,
    pub message: String,
}

/// Apply a status change to a working copy.
pub fn transition(record: &mut ContextRecord, next: Status) -> Result<(), LifecycleError> {
    if !record.status.can_transition_to(next) {
        return Err(LifecycleError::IllegalTransition {
            from: record.status,
            to: next,
        });
    }
    tracing::debug!(
        lineage = %record.lineage_id,
        from = %record.status,
        to = %next,
        "status transition"
    );
    record.status = next;
    Ok(())
}

/// The status gates should see at `now`, with time-triggered expiry applied.
pub fn effective_status(record: &ContextRecord, now: DateTime<Utc>) -> Status {
    match record.valid_until {
        Some(until) if until <= now && !record.status.is_terminal() => Status::Expired,
        _ => record.status,
    }
}

/// Decide whether `record` satisfies `required`. Never fails.
pub fn check_status(
    record: &ContextRecord,
    required: &[Status],
    now: DateTime<Utc>,
) -> LifecycleCheck {
    let status = effective_status(record, now);
    let valid = required.contains(&status);

    let message = if valid {
        format!("status {status} satisfies requirement")
    } else if status == Status::Expired {
        match record.valid_until {
            Some(until) if record.status != Status::Expired => format!(
                "record expired at {}; re-validate before running operations",
                until.to_rfc3339()
            ),
            _ => "record is EXPIRED; re-validate before running operations".to_string(),
        }
    } else {
        format!(
            "status {status} does not satisfy requirement (allowed: {})",
            join_statuses(required)
        )
    };

    LifecycleCheck {
        valid,
        status,
        message,
    }
}

/// Boundary form of [`check_status`], evaluated against the current time.
pub fn check_lifecycle_status(record: &ContextRecord, required: &[Status]) -> LifecycleCheck {
    check_status(record, required, Utc::now())
}

fn join_statuses(statuses: &[Status]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
