//! Preflight: is a record admissible for one operation?
//!
//! A preflight run aggregates three heterogeneous kinds of check:
//! - the lifecycle gate (status against the module's accepted statuses)
//! - section availability (required sections block, optional ones warn)
//! - quantitative entity checks (counts and scalar presence)
//!
//! `all_requirements_met` is a plain AND over every required-section check
//! and every entity check. There is no partial credit here; grading is the
//! quality scorer's job. Nothing in this module returns an error: an
//! unknown module yields a report with `status = error`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{SectionCheck, check_sections};
use crate::lifecycle::{LifecycleCheck, Status, check_status};
use crate::record::{CompetitorStatus, ContextRecord, SectionId, SectionRef, count_nonblank, is_blank};
use crate::registry::{EntityCheckSpec, EntityMetric, ModuleRegistry};

/// Outcome of one entity check, with enough detail to render a fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCheckResult {
    pub check_id: String,
    pub metric: EntityMetric,
    pub passed: bool,
    pub current_value: u32,
    pub required_value: u32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightStatus {
    Ready,
    MissingRequirements,
    Error,
}

impl PreflightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PreflightStatus::Ready => "ready",
            PreflightStatus::MissingRequirements => "missing_requirements",
            PreflightStatus::Error => "error",
        }
    }
}

/// Ephemeral validation result for one (module, record) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightReport {
    pub module_id: String,
    /// `ready` only when the lifecycle gate passes and every requirement is met.
    pub status: PreflightStatus,
    pub lifecycle: LifecycleCheck,
    pub section_checks: Vec<SectionCheck>,
    pub entity_checks: Vec<EntityCheckResult>,
    pub missing_required: Vec<SectionId>,
    pub warnings: Vec<String>,
    pub required_statuses: Vec<Status>,
    pub all_requirements_met: bool,
    pub summary: String,
}

/// Full admission decision: lifecycle gate AND preflight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub admitted: bool,
    pub report: PreflightReport,
}

/// Read a metric from the record. Absent sections read as zero.
pub fn measure(record: &ContextRecord, metric: EntityMetric) -> u32 {
    let value = match (metric, record.section(metric.section())) {
        (EntityMetric::ApprovedCompetitors, Some(SectionRef::CompetitiveSet(c))) => c
            .all()
            .filter(|comp| comp.status == CompetitorStatus::Approved && !is_blank(&comp.name))
            .count(),
        (EntityMetric::Competitors, Some(SectionRef::CompetitiveSet(c))) => {
            c.all().filter(|comp| !is_blank(&comp.name)).count()
        }
        (EntityMetric::CategoryTerms, Some(SectionRef::CategoryDefinition(b))) => {
            count_nonblank(&b.included)
        }
        (EntityMetric::PrimaryCategory, Some(SectionRef::CategoryDefinition(b))) => {
            usize::from(!is_blank(&b.primary_category))
        }
        (EntityMetric::SeedTerms, Some(SectionRef::DemandDefinition(d))) => {
            count_nonblank(&d.seed_terms)
        }
        (EntityMetric::DemandThemes, Some(SectionRef::DemandDefinition(d))) => {
            count_nonblank(&d.demand_themes)
        }
        (EntityMetric::ExcludedTerms, Some(SectionRef::NegativeScope(g))) => g.term_count(),
        (EntityMetric::BrandDomain, Some(SectionRef::BrandIdentity(a))) => {
            usize::from(!is_blank(&a.domain))
        }
        (EntityMetric::PrimaryGoal, Some(SectionRef::StrategicIntent(e))) => {
            usize::from(!is_blank(&e.primary_goal))
        }
        _ => 0,
    };
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Evaluate one entity check against the record.
pub fn run_check(record: &ContextRecord, spec: &EntityCheckSpec) -> EntityCheckResult {
    let current_value = measure(record, spec.metric);
    let passed = current_value >= spec.min;
    let hint = (!passed).then(|| remediation_hint(spec, current_value));
    let description = if spec.description.is_empty() {
        format!("{} >= {}", spec.metric.label(), spec.min)
    } else {
        spec.description.clone()
    };

    EntityCheckResult {
        check_id: spec.id.clone(),
        metric: spec.metric,
        passed,
        current_value,
        required_value: spec.min,
        description,
        hint,
    }
}

fn remediation_hint(spec: &EntityCheckSpec, current: u32) -> String {
    let section = spec.metric.section();
    if spec.metric.is_scalar() {
        return format!(
            "set the {} in section {section} ({})",
            spec.metric.label(),
            section.name()
        );
    }
    let missing = spec.min.saturating_sub(current);
    let more = if current == 0 { "" } else { " more" };
    format!(
        "add {missing}{more} {} in section {section} ({})",
        spec.metric.label(),
        section.name()
    )
}

/// Run every declared check for `module_id` against `record` at `now`.
pub fn run_preflight(
    registry: &ModuleRegistry,
    module_id: &str,
    record: &ContextRecord,
    now: DateTime<Utc>,
) -> PreflightReport {
    let Some(module) = registry.get(module_id) else {
        tracing::debug!(module = module_id, "preflight for unknown module");
        return PreflightReport {
            module_id: module_id.to_string(),
            status: PreflightStatus::Error,
            lifecycle: check_status(record, &[], now),
            section_checks: Vec::new(),
            entity_checks: Vec::new(),
            missing_required: Vec::new(),
            warnings: Vec::new(),
            required_statuses: Vec::new(),
            all_requirements_met: false,
            summary: format!("unknown module `{module_id}`"),
        };
    };

    let lifecycle = check_status(record, &module.required_statuses, now);
    let section_checks = check_sections(
        record,
        &module.required_sections,
        &module.optional_sections,
    );
    let entity_checks: Vec<EntityCheckResult> = module
        .entity_checks
        .iter()
        .map(|spec| run_check(record, spec))
        .collect();

    let missing_required: Vec<SectionId> = section_checks
        .iter()
        .filter(|c| c.required && !c.available)
        .map(|c| c.section)
        .collect();
    let warnings: Vec<String> = section_checks
        .iter()
        .filter(|c| !c.required && !c.available)
        .map(|c| format!("optional section {} ({}) is empty", c.section, c.name))
        .collect();
    let failed_checks = entity_checks.iter().filter(|c| !c.passed).count();

    let all_requirements_met = missing_required.is_empty() && failed_checks == 0;
    let status = if lifecycle.valid && all_requirements_met {
        PreflightStatus::Ready
    } else {
        PreflightStatus::MissingRequirements
    };

    let summary = if !lifecycle.valid {
        format!("{}: blocked by lifecycle: {}", module.id, lifecycle.message)
    } else if all_requirements_met {
        format!(
            "{}: all requirements met ({} sections, {} checks)",
            module.id,
            module.required_sections.len(),
            entity_checks.len()
        )
    } else {
        format!(
            "{}: {} required section(s) missing, {} check(s) failed",
            module.id,
            missing_required.len(),
            failed_checks
        )
    };

    tracing::debug!(
        module = %module.id,
        lineage = %record.lineage_id,
        status = status.as_str(),
        missing = missing_required.len(),
        failed_checks,
        "preflight evaluated"
    );

    PreflightReport {
        module_id: module.id.clone(),
        status,
        lifecycle,
        section_checks,
        entity_checks,
        missing_required,
        warnings,
        required_statuses: module.required_statuses.clone(),
        all_requirements_met,
        summary,
    }
}

/// Lifecycle gate plus preflight, as a single admit/deny decision.
pub fn admit(
    registry: &ModuleRegistry,
    module_id: &str,
    record: &ContextRecord,
    now: DateTime<Utc>,
) -> Admission {
    let report = run_preflight(registry, module_id, record, now);
    let admitted = report.lifecycle.valid && report.all_requirements_met;
    Admission { admitted, report }
}
