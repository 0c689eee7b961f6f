//! # UCR Kernel
//!
//! The governance engine for Context Records: a record is admissible for an
//! operation exactly when its lifecycle status is accepted, every required
//! section carries content, and every declared entity check passes.
//!
//! This crate is a **pure decision layer**. It never generates content and
//! never persists anything; snapshot history lives in `ucr-store`.
//!
//! ## Architecture
//!
//! ```text
//! ContextRecord         ← Eight typed sections A–H + status metadata
//!     │
//! lifecycle             ← Status gate (EXPIRED is the hard block)
//!     │
//! availability          ← Per-section presence predicates
//!     │
//! preflight             ← Entity checks + aggregation → PreflightReport
//!     │
//! trace                 ← Ordered, digest-stamped audit entries
//!
//! guardrail             ← Negative-scope scan of generated text
//! quality               ← Weighted 0–100 score and grade
//! ```

pub mod availability;
pub mod error;
pub mod guardrail;
pub mod hash;
pub mod lifecycle;
pub mod preflight;
pub mod quality;
pub mod record;
pub mod registry;
pub mod trace;

pub use availability::{SectionCheck, check_sections, is_section_available};
pub use error::{ConfigError, LifecycleError};
pub use guardrail::{
    GuardrailDecision, RejectedTerm, TermFilter, Violation, ViolationType, competitor_names,
    enforce, enforce_for_record, filter_terms, scan_text,
};
pub use hash::{ContentHash, canonical_json};
pub use lifecycle::{
    LifecycleCheck, Status, check_lifecycle_status, check_status, effective_status, transition,
};
pub use preflight::{
    Admission, EntityCheckResult, PreflightReport, PreflightStatus, admit, measure, run_check,
    run_preflight,
};
pub use quality::{Grade, QualityScore, compute_quality_score};
pub use record::{
    BrandIdentity, CategoryDefinition, ChannelContext, CompetitiveSet, Competitor,
    CompetitorEvidence, CompetitorStatus, Confidence, ContextRecord, DemandDefinition, Governance,
    GrowthPriority, GuardrailEnforcement, GuardrailRules, InvestmentLevel, LineageId,
    RiskTolerance, SectionId, SectionRef, SectionSet, StrategicIntent,
};
pub use registry::{EntityCheckSpec, EntityMetric, ModuleRegistry, ModuleRequirements};
pub use trace::{AuditRecord, TraceEntry, TraceSeverity, build_trace};
