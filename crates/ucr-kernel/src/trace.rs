//! Audit traces for preflight decisions.
//!
//! A trace is an ordered list of entries: every critical entry, then every
//! low entry, then every info entry. Within a group the order follows the
//! report (lifecycle, sections in declared order, entity checks in declared
//! order). Rule ids and reasons are fixed-format, so replaying the same
//! report produces byte-identical output and the same `trace_digest`.

use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;
use crate::preflight::PreflightReport;
use crate::record::SectionId;

pub const RULE_LIFECYCLE: &str = "lifecycle.status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Low,
    Info,
}

impl TraceSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceSeverity::Critical => "critical",
            TraceSeverity::Low => "low",
            TraceSeverity::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
    pub reason: String,
    pub severity: TraceSeverity,
}

impl TraceEntry {
    fn new(
        rule_id: String,
        section_id: Option<SectionId>,
        reason: String,
        severity: TraceSeverity,
    ) -> Self {
        Self {
            rule_id,
            section_id,
            reason,
            severity,
        }
    }

    /// One-line rendering: `severity rule_id [section] reason`.
    pub fn render(&self) -> String {
        let section = self
            .section_id
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        format!(
            "{} {}{section} {}",
            self.severity.as_str(),
            self.rule_id,
            self.reason
        )
    }
}

/// Convert a preflight report into ordered audit entries.
pub fn build_trace(report: &PreflightReport) -> Vec<TraceEntry> {
    let mut critical = Vec::new();
    let mut low = Vec::new();
    let mut info = Vec::new();

    let lifecycle = TraceEntry::new(
        RULE_LIFECYCLE.to_string(),
        None,
        report.lifecycle.message.clone(),
        if report.lifecycle.valid {
            TraceSeverity::Info
        } else {
            TraceSeverity::Critical
        },
    );
    if report.lifecycle.valid {
        info.push(lifecycle);
    } else {
        critical.push(lifecycle);
    }

    for check in &report.section_checks {
        let kind = if check.required { "required" } else { "optional" };
        let rule_id = format!("section.{kind}.{}", check.section);
        match (check.required, check.available) {
            (_, true) => info.push(TraceEntry::new(
                rule_id,
                Some(check.section),
                format!("{} section {} is available", kind, check.name),
                TraceSeverity::Info,
            )),
            (true, false) => critical.push(TraceEntry::new(
                rule_id,
                Some(check.section),
                format!("required section {} is missing", check.name),
                TraceSeverity::Critical,
            )),
            (false, false) => low.push(TraceEntry::new(
                rule_id,
                Some(check.section),
                format!("optional section {} is empty", check.name),
                TraceSeverity::Low,
            )),
        }
    }

    for check in &report.entity_checks {
        let rule_id = format!("entity.{}", check.check_id);
        let section = Some(check.metric.section());
        if check.passed {
            info.push(TraceEntry::new(
                rule_id,
                section,
                format!(
                    "{}: {}/{}",
                    check.description, check.current_value, check.required_value
                ),
                TraceSeverity::Info,
            ));
        } else {
            let hint = check
                .hint
                .as_deref()
                .map(|h| format!("; {h}"))
                .unwrap_or_default();
            critical.push(TraceEntry::new(
                rule_id,
                section,
                format!(
                    "{}: {}/{}{hint}",
                    check.description, check.current_value, check.required_value
                ),
                TraceSeverity::Critical,
            ));
        }
    }

    critical.extend(low);
    critical.extend(info);
    critical
}

/// Trace entries stamped to the record content they were produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub module_id: String,
    pub record_hash: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_version: Option<u64>,
    pub admitted: bool,
    pub entries: Vec<TraceEntry>,
    pub trace_digest: ContentHash,
}

impl AuditRecord {
    pub fn new(
        report: &PreflightReport,
        record_hash: ContentHash,
        record_version: Option<u64>,
    ) -> Self {
        let entries = build_trace(report);
        let trace_digest = trace_digest(&record_hash, &entries);
        Self {
            module_id: report.module_id.clone(),
            record_hash,
            record_version,
            admitted: report.lifecycle.valid && report.all_requirements_met,
            entries,
            trace_digest,
        }
    }

    /// Recompute the digest and compare; false means the entries were altered.
    pub fn verify(&self) -> bool {
        trace_digest(&self.record_hash, &self.entries) == self.trace_digest
    }
}

fn trace_digest(record_hash: &ContentHash, entries: &[TraceEntry]) -> ContentHash {
    let mut builder = ContentHash::builder().field("record_hash", &record_hash.0);
    for (index, entry) in entries.iter().enumerate() {
        builder = builder
            .field_int("index", index as i64)
            .field("rule_id", &entry.rule_id)
            .field_opt("section_id", entry.section_id.map(SectionId::letter))
            .field("severity", entry.severity.as_str())
            .field("reason", &entry.reason);
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Status;
    use crate::preflight::run_preflight;
    use crate::record::{BrandIdentity, ContextRecord, LineageId};
    use crate::registry::ModuleRegistry;
    use chrono::Utc;

    fn partial_record() -> ContextRecord {
        let mut record = ContextRecord::new(LineageId::new());
        record.sections.brand_identity = Some(BrandIdentity {
            name: "Acme".into(),
            domain: "acme.com".into(),
            ..Default::default()
        });
        record
    }

    fn render(entries: &[TraceEntry]) -> String {
        entries
            .iter()
            .map(TraceEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn trace_orders_errors_then_warnings_then_successes() {
        let registry = ModuleRegistry::builtin();
        let report = run_preflight(&registry, "competitor-analysis", &partial_record(), Utc::now());
        let trace = build_trace(&report);

        insta::assert_snapshot!(render(&trace), @r"
        critical section.required.C [C] required section Competitive Set is missing
        critical entity.min_approved_competitors [C] At least 3 approved competitors: 0/3; add 3 approved competitors in section C (Competitive Set)
        low section.optional.B [B] optional section Category Definition is empty
        low section.optional.G [G] optional section Negative Scope is empty
        info lifecycle.status status DRAFT_AI satisfies requirement
        info section.required.A [A] required section Brand Identity is available
        info entity.brand_domain [A] Brand domain is set: 1/1
        ");
    }

    #[test]
    fn lifecycle_failure_leads_the_trace() {
        let registry = ModuleRegistry::builtin();
        let mut record = partial_record();
        record.status = Status::Expired;
        let report = run_preflight(&registry, "guardrail-audit", &record, Utc::now());
        let trace = build_trace(&report);
        assert_eq!(trace[0].rule_id, RULE_LIFECYCLE);
        assert_eq!(trace[0].severity, TraceSeverity::Critical);

        let severities: Vec<TraceSeverity> = trace.iter().map(|e| e.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort();
        assert_eq!(severities, sorted);
    }

    #[test]
    fn identical_reports_give_identical_audit_records() {
        let registry = ModuleRegistry::builtin();
        let record = partial_record();
        let now = Utc::now();
        let hash = record.content_hash().unwrap();

        let first = AuditRecord::new(
            &run_preflight(&registry, "keyword-generation", &record, now),
            hash.clone(),
            Some(3),
        );
        let second = AuditRecord::new(
            &run_preflight(&registry, "keyword-generation", &record, now),
            hash,
            Some(3),
        );
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert!(first.verify());
        assert!(!first.admitted);
    }

    #[test]
    fn tampered_entries_fail_verification() {
        let registry = ModuleRegistry::builtin();
        let record = partial_record();
        let report = run_preflight(&registry, "keyword-generation", &record, Utc::now());
        let mut audit = AuditRecord::new(&report, record.content_hash().unwrap(), None);
        audit.entries.pop();
        assert!(!audit.verify());
    }
}
