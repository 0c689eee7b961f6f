//! Guardrail enforcement over generated text.
//!
//! The scanner reports; it never blocks. Matching is a case-insensitive
//! substring search, so "nike" also matches "Nikesh".
//!
//! Whether violations block is decided by [`enforce`], from the record's
//! `hard_exclusion` flag. Different callers may apply the same scan with
//! different strictness by calling [`scan_text`] directly.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::record::{ContextRecord, GuardrailRules, is_blank};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    ExcludedCategory,
    ExcludedKeyword,
    ExcludedUseCase,
    ExcludedCompetitor,
    Competitor,
}

impl ViolationType {
    /// Source list of the matched term.
    pub fn field(self) -> &'static str {
        match self {
            ViolationType::ExcludedCategory => "negative_scope.excluded_categories",
            ViolationType::ExcludedKeyword => "negative_scope.excluded_keywords",
            ViolationType::ExcludedUseCase => "negative_scope.excluded_use_cases",
            ViolationType::ExcludedCompetitor => "negative_scope.excluded_competitors",
            ViolationType::Competitor => "competitive_set",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub matched_term: String,
    pub violation_type: ViolationType,
}

/// Caller-side decision after applying `hard_exclusion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailDecision {
    pub blocked: bool,
    pub violations: Vec<Violation>,
    /// The candidate text, withheld when blocked.
    pub text: Option<String>,
}

/// A generated term that failed the scan, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedTerm {
    pub term: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFilter {
    pub kept: Vec<String>,
    pub rejected: Vec<RejectedTerm>,
}

/// Scan `text` against every exclusion list plus `competitor_names`.
///
/// One violation per distinct (term, type). Output is sorted by type then
/// term, so it does not depend on list order.
pub fn scan_text(
    text: &str,
    rules: &GuardrailRules,
    competitor_names: &[String],
) -> Vec<Violation> {
    let haystack = text.to_lowercase();
    let lists: [(&[String], ViolationType); 5] = [
        (&rules.excluded_categories, ViolationType::ExcludedCategory),
        (&rules.excluded_keywords, ViolationType::ExcludedKeyword),
        (&rules.excluded_use_cases, ViolationType::ExcludedUseCase),
        (&rules.excluded_competitors, ViolationType::ExcludedCompetitor),
        (competitor_names, ViolationType::Competitor),
    ];

    let mut found: BTreeSet<(ViolationType, String)> = BTreeSet::new();
    for (terms, violation_type) in lists {
        for term in terms {
            if is_blank(term) {
                continue;
            }
            let needle = term.trim().to_lowercase();
            if haystack.contains(&needle) {
                found.insert((violation_type, needle));
            }
        }
    }

    found
        .into_iter()
        .map(|(violation_type, matched_term)| Violation {
            field: violation_type.field().to_string(),
            matched_term,
            violation_type,
        })
        .collect()
}

/// Scan, then block when `hard_exclusion` is set and anything matched.
pub fn enforce(
    text: &str,
    rules: &GuardrailRules,
    competitor_names: &[String],
) -> GuardrailDecision {
    let violations = scan_text(text, rules, competitor_names);
    let blocked = rules.enforcement.hard_exclusion && !violations.is_empty();

    if blocked {
        tracing::warn!(
            violations = violations.len(),
            "generated text blocked by hard exclusion"
        );
    } else if !violations.is_empty() {
        tracing::debug!(
            violations = violations.len(),
            "guardrail violations attached as warnings"
        );
    }

    GuardrailDecision {
        blocked,
        text: (!blocked).then(|| text.to_string()),
        violations,
    }
}

/// [`enforce`] using the record's own negative scope and competitor set.
/// A record without section G has nothing to enforce beyond competitor names.
pub fn enforce_for_record(text: &str, record: &ContextRecord) -> GuardrailDecision {
    let default_rules = GuardrailRules::default();
    let rules = record
        .sections
        .negative_scope
        .as_ref()
        .unwrap_or(&default_rules);
    enforce(text, rules, &competitor_names(record))
}

/// Split a generated term list into terms that pass and terms that do not.
pub fn filter_terms(
    candidates: &[String],
    rules: &GuardrailRules,
    competitor_names: &[String],
) -> TermFilter {
    let mut filter = TermFilter::default();
    for term in candidates {
        let violations = scan_text(term, rules, competitor_names);
        if violations.is_empty() {
            filter.kept.push(term.clone());
        } else {
            filter.rejected.push(RejectedTerm {
                term: term.clone(),
                violations,
            });
        }
    }
    filter
}

/// Names of every competitor in section C, in list order.
pub fn competitor_names(record: &ContextRecord) -> Vec<String> {
    record
        .sections
        .competitive_set
        .as_ref()
        .map(|set| {
            set.all()
                .filter(|c| !is_blank(&c.name))
                .map(|c| c.name.clone())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CompetitiveSet, Competitor, GuardrailEnforcement, LineageId};

    fn rules() -> GuardrailRules {
        GuardrailRules {
            excluded_categories: vec!["Apparel".into()],
            excluded_keywords: vec!["free".into(), "cheap".into()],
            excluded_use_cases: vec!["resale".into()],
            excluded_competitors: vec!["nike".into()],
            enforcement: GuardrailEnforcement::default(),
        }
    }

    #[test]
    fn matches_case_insensitively() {
        let only_nike = GuardrailRules {
            excluded_competitors: vec!["nike".into()],
            ..Default::default()
        };
        let violations = scan_text("Nike shoes", &only_nike, &[]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].matched_term, "nike");
        assert_eq!(violations[0].violation_type, ViolationType::ExcludedCompetitor);
        assert_eq!(violations[0].field, "negative_scope.excluded_competitors");

        assert!(scan_text("running shoes", &only_nike, &[]).is_empty());
    }

    #[test]
    fn deduplicates_same_term_and_type() {
        let rules = GuardrailRules {
            excluded_keywords: vec!["free".into(), "FREE".into(), " free ".into()],
            ..Default::default()
        };
        let violations = scan_text("free shipping, free returns", &rules, &[]);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn same_term_in_two_lists_reports_both_types() {
        let violations = scan_text("Nike running", &rules(), &["Nike".to_string()]);
        let types: Vec<ViolationType> = violations.iter().map(|v| v.violation_type).collect();
        assert_eq!(
            types,
            vec![ViolationType::ExcludedCompetitor, ViolationType::Competitor]
        );
    }

    #[test]
    fn order_of_terms_does_not_change_result() {
        let text = "cheap apparel for resale, free delivery";
        let forward = scan_text(text, &rules(), &[]);
        let mut reversed_rules = rules();
        reversed_rules.excluded_keywords.reverse();
        let reversed = scan_text(text, &reversed_rules, &[]);
        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 4);
    }

    #[test]
    fn blank_terms_never_match() {
        let rules = GuardrailRules {
            excluded_keywords: vec![String::new(), "   ".into()],
            ..Default::default()
        };
        assert!(scan_text("anything at all", &rules, &[]).is_empty());
    }

    #[test]
    fn hard_exclusion_withholds_text() {
        let mut strict = rules();
        strict.enforcement.hard_exclusion = true;
        let decision = enforce("cheap trainers", &strict, &[]);
        assert!(decision.blocked);
        assert!(decision.text.is_none());
        assert_eq!(decision.violations.len(), 1);
    }

    #[test]
    fn soft_exclusion_returns_text_with_warnings() {
        let decision = enforce("cheap trainers", &rules(), &[]);
        assert!(!decision.blocked);
        assert_eq!(decision.text.as_deref(), Some("cheap trainers"));
        assert_eq!(decision.violations.len(), 1);
    }

    #[test]
    fn clean_text_is_never_blocked() {
        let mut strict = rules();
        strict.enforcement.hard_exclusion = true;
        let decision = enforce("trail running tips", &strict, &[]);
        assert!(!decision.blocked);
        assert!(decision.violations.is_empty());
    }

    #[test]
    fn filter_terms_partitions_candidates() {
        let candidates = vec![
            "trail running shoes".to_string(),
            "free running shoes".to_string(),
            "nike pegasus".to_string(),
        ];
        let filter = filter_terms(&candidates, &rules(), &[]);
        assert_eq!(filter.kept, vec!["trail running shoes".to_string()]);
        let rejected: Vec<&str> = filter.rejected.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(rejected, vec!["free running shoes", "nike pegasus"]);
    }

    #[test]
    fn record_enforcement_uses_competitor_set() {
        let mut record = ContextRecord::new(LineageId::new());
        record.sections.competitive_set = Some(CompetitiveSet {
            direct: vec![Competitor {
                name: "Brooks".into(),
                ..Default::default()
            }],
            ..Default::default()
        });
        let decision = enforce_for_record("brooks ghost review", &record);
        assert_eq!(decision.violations.len(), 1);
        assert_eq!(decision.violations[0].violation_type, ViolationType::Competitor);
        assert!(!decision.blocked);
    }
}
