//! Section availability: does a section carry minimum content?
//!
//! "Available" is a presence test, not a validity test. Quantitative rules
//! (how many competitors, how many terms) belong to the preflight checker.

use serde::{Deserialize, Serialize};

use crate::record::{ContextRecord, SectionId, SectionRef, has_any, is_blank};

/// One row of a per-operation section checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCheck {
    pub section: SectionId,
    pub name: String,
    pub required: bool,
    pub available: bool,
}

/// Whether `section` of `record` is non-empty. Absent sections are unavailable.
pub fn is_section_available(record: &ContextRecord, section: SectionId) -> bool {
    record.section(section).is_some_and(section_has_content)
}

fn section_has_content(section: SectionRef<'_>) -> bool {
    match section {
        SectionRef::BrandIdentity(a) => !is_blank(&a.domain) || !is_blank(&a.name),
        SectionRef::CategoryDefinition(b) => {
            !is_blank(&b.primary_category) || has_any(&b.included)
        }
        SectionRef::CompetitiveSet(c) => c.all().any(|comp| !is_blank(&comp.name)),
        SectionRef::DemandDefinition(d) => has_any(&d.seed_terms) || has_any(&d.demand_themes),
        SectionRef::StrategicIntent(e) => {
            !is_blank(&e.primary_goal) || e.growth_priority.is_some()
        }
        SectionRef::ChannelContext(f) => f.seo_investment_level.is_some(),
        SectionRef::NegativeScope(g) => g.term_count() > 0,
        SectionRef::Governance(h) => h.context_confidence.is_some(),
    }
}

/// Build the checklist for an operation: required sections first, then
/// optional ones, each in declared order.
pub fn check_sections(
    record: &ContextRecord,
    required: &[SectionId],
    optional: &[SectionId],
) -> Vec<SectionCheck> {
    let required_rows = required.iter().map(|id| (*id, true));
    let optional_rows = optional.iter().map(|id| (*id, false));

    required_rows
        .chain(optional_rows)
        .map(|(section, required)| SectionCheck {
            section,
            name: section.name().to_string(),
            required,
            available: is_section_available(record, section),
        })
        .collect()
}
