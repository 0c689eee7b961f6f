//! Weighted quality score over a record's current content.
//!
//! Four sub-scores, each 0–100:
//!
//! | dimension              | weight | measures                                        |
//! |------------------------|--------|-------------------------------------------------|
//! | completeness           | 0.25   | policy fields populated across A, B, E          |
//! | competitor_confidence  | 0.25   | competitors approved with a selection rationale |
//! | negative_strength      | 0.30   | breadth of the G exclusion lists + hard flag    |
//! | evidence_coverage      | 0.20   | competitors with attached evidence artifacts    |
//!
//! The score is always derived, never stored. Same content, same score.

use serde::{Deserialize, Serialize};

use crate::record::{CompetitorStatus, ContextRecord, GuardrailRules, count_nonblank, has_any, is_blank};

pub const WEIGHT_COMPLETENESS: f64 = 0.25;
pub const WEIGHT_COMPETITOR_CONFIDENCE: f64 = 0.25;
pub const WEIGHT_NEGATIVE_STRENGTH: f64 = 0.30;
pub const WEIGHT_EVIDENCE_COVERAGE: f64 = 0.20;

pub const GRADE_HIGH_THRESHOLD: u8 = 75;
pub const GRADE_MEDIUM_THRESHOLD: u8 = 50;

/// Terms per exclusion list that earn the list its full share.
const NEGATIVE_LIST_SATURATION: usize = 3;
const NEGATIVE_LIST_POINTS: f64 = 20.0;
const HARD_EXCLUSION_POINTS: f64 = 20.0;

const COMPLETENESS_FIELDS: u32 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Low,
    Medium,
    High,
}

impl Grade {
    pub fn from_overall(overall: u8) -> Self {
        if overall >= GRADE_HIGH_THRESHOLD {
            Grade::High
        } else if overall >= GRADE_MEDIUM_THRESHOLD {
            Grade::Medium
        } else {
            Grade::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::Low => "low",
            Grade::Medium => "medium",
            Grade::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    pub completeness: u8,
    pub competitor_confidence: u8,
    pub negative_strength: u8,
    pub evidence_coverage: u8,
    pub overall: u8,
    pub grade: Grade,
}

/// Score a record.
pub fn compute_quality_score(record: &ContextRecord) -> QualityScore {
    let completeness = completeness(record);
    let competitor_confidence = competitor_confidence(record);
    let negative_strength = negative_strength(record.sections.negative_scope.as_ref());
    let evidence_coverage = evidence_coverage(record);

    let weighted = WEIGHT_COMPLETENESS * f64::from(completeness)
        + WEIGHT_COMPETITOR_CONFIDENCE * f64::from(competitor_confidence)
        + WEIGHT_NEGATIVE_STRENGTH * f64::from(negative_strength)
        + WEIGHT_EVIDENCE_COVERAGE * f64::from(evidence_coverage);
    let overall = to_percent(weighted);
    let grade = Grade::from_overall(overall);

    tracing::debug!(
        lineage = %record.lineage_id,
        completeness,
        competitor_confidence,
        negative_strength,
        evidence_coverage,
        overall,
        grade = grade.as_str(),
        "quality score computed"
    );

    QualityScore {
        completeness,
        competitor_confidence,
        negative_strength,
        evidence_coverage,
        overall,
        grade,
    }
}

fn completeness(record: &ContextRecord) -> u8 {
    let mut populated = 0u32;
    let mut mark = |present: bool| populated += u32::from(present);

    if let Some(a) = &record.sections.brand_identity {
        mark(!is_blank(&a.name));
        mark(!is_blank(&a.domain));
        mark(!is_blank(&a.industry));
        mark(!is_blank(&a.business_model));
        mark(!is_blank(&a.target_market));
        mark(has_any(&a.primary_geography));
    }
    if let Some(b) = &record.sections.category_definition {
        mark(!is_blank(&b.primary_category));
        mark(has_any(&b.included));
    }
    if let Some(e) = &record.sections.strategic_intent {
        mark(!is_blank(&e.primary_goal));
        mark(e.growth_priority.is_some());
        mark(e.risk_tolerance.is_some());
    }

    ratio(populated as usize, COMPLETENESS_FIELDS as usize)
}

fn competitor_confidence(record: &ContextRecord) -> u8 {
    let Some(set) = &record.sections.competitive_set else {
        return 0;
    };
    let total = set.all().count();
    let supported = set
        .all()
        .filter(|c| c.status == CompetitorStatus::Approved && c.evidence.has_rationale())
        .count();
    ratio(supported, total)
}

fn evidence_coverage(record: &ContextRecord) -> u8 {
    let Some(set) = &record.sections.competitive_set else {
        return 0;
    };
    let total = set.all().count();
    let covered = set.all().filter(|c| c.evidence.has_artifacts()).count();
    ratio(covered, total)
}

fn negative_strength(rules: Option<&GuardrailRules>) -> u8 {
    let Some(rules) = rules else {
        return 0;
    };
    let breadth: f64 = [
        &rules.excluded_categories,
        &rules.excluded_keywords,
        &rules.excluded_use_cases,
        &rules.excluded_competitors,
    ]
    .into_iter()
    .map(|list| {
        let n = count_nonblank(list).min(NEGATIVE_LIST_SATURATION);
        n as f64 / NEGATIVE_LIST_SATURATION as f64 * NEGATIVE_LIST_POINTS
    })
    .sum();

    // The hard flag only counts when there is something to enforce.
    let hard = if rules.enforcement.hard_exclusion && rules.term_count() > 0 {
        HARD_EXCLUSION_POINTS
    } else {
        0.0
    };
    to_percent(breadth + hard)
}

fn ratio(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    to_percent(part as f64 / total as f64 * 100.0)
}

fn to_percent(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
