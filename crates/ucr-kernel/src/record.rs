//! The Context Record: eight typed sections plus governance metadata.
//!
//! Sections are addressed through [`SectionId`] and read through
//! [`SectionRef`], one variant per section. Engine code matches on
//! `SectionRef` exhaustively instead of resolving field paths, so a section
//! added here is a compile error everywhere it is not yet handled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::hash::ContentHash;
use crate::lifecycle::Status;

/// Identity of one record lineage (all snapshots of one brand context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineageId(pub Uuid);

impl LineageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LineageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Coarse confidence in the record, also used for section H.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

/// One of the eight sections A–H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionId {
    #[serde(rename = "A", alias = "brand_identity")]
    BrandIdentity,
    #[serde(rename = "B", alias = "category_definition")]
    CategoryDefinition,
    #[serde(rename = "C", alias = "competitive_set")]
    CompetitiveSet,
    #[serde(rename = "D", alias = "demand_definition")]
    DemandDefinition,
    #[serde(rename = "E", alias = "strategic_intent")]
    StrategicIntent,
    #[serde(rename = "F", alias = "channel_context")]
    ChannelContext,
    #[serde(rename = "G", alias = "negative_scope")]
    NegativeScope,
    #[serde(rename = "H", alias = "governance")]
    Governance,
}

impl SectionId {
    pub const ALL: [SectionId; 8] = [
        SectionId::BrandIdentity,
        SectionId::CategoryDefinition,
        SectionId::CompetitiveSet,
        SectionId::DemandDefinition,
        SectionId::StrategicIntent,
        SectionId::ChannelContext,
        SectionId::NegativeScope,
        SectionId::Governance,
    ];

    /// Single-letter identifier.
    pub fn letter(self) -> &'static str {
        match self {
            SectionId::BrandIdentity => "A",
            SectionId::CategoryDefinition => "B",
            SectionId::CompetitiveSet => "C",
            SectionId::DemandDefinition => "D",
            SectionId::StrategicIntent => "E",
            SectionId::ChannelContext => "F",
            SectionId::NegativeScope => "G",
            SectionId::Governance => "H",
        }
    }

    /// Field name of the section inside [`SectionSet`]'s serialized form.
    pub fn key(self) -> &'static str {
        match self {
            SectionId::BrandIdentity => "brand_identity",
            SectionId::CategoryDefinition => "category_definition",
            SectionId::CompetitiveSet => "competitive_set",
            SectionId::DemandDefinition => "demand_definition",
            SectionId::StrategicIntent => "strategic_intent",
            SectionId::ChannelContext => "channel_context",
            SectionId::NegativeScope => "negative_scope",
            SectionId::Governance => "governance",
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            SectionId::BrandIdentity => "Brand Identity",
            SectionId::CategoryDefinition => "Category Definition",
            SectionId::CompetitiveSet => "Competitive Set",
            SectionId::DemandDefinition => "Demand Definition",
            SectionId::StrategicIntent => "Strategic Intent",
            SectionId::ChannelContext => "Channel Context",
            SectionId::NegativeScope => "Negative Scope",
            SectionId::Governance => "Governance",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for SectionId {
    type Err = String;

    /// Accepts either the letter (`"G"`, `"g"`) or the key (`"negative_scope"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SectionId::ALL
            .into_iter()
            .find(|id| id.letter().eq_ignore_ascii_case(s) || id.key() == s)
            .ok_or_else(|| format!("unknown section `{s}` (expected A-H)"))
    }
}

// ── Section A ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub business_model: String,
    #[serde(default)]
    pub target_market: String,
    #[serde(default)]
    pub primary_geography: Vec<String>,
}

// ── Section B ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    #[serde(default)]
    pub primary_category: String,
    /// Category terms that are in scope.
    #[serde(default)]
    pub included: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub alternative_names: Vec<String>,
}

// ── Section C ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorStatus {
    Approved,
    #[default]
    Pending,
    Rejected,
}

/// Why a competitor is in the set, and what backs that up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorEvidence {
    #[serde(default)]
    pub why_selected: String,
    #[serde(default)]
    pub top_overlap_keywords: Vec<String>,
    #[serde(default)]
    pub serp_examples: Vec<String>,
}

impl CompetitorEvidence {
    /// Has a non-blank selection rationale.
    pub fn has_rationale(&self) -> bool {
        !self.why_selected.trim().is_empty()
    }

    /// Has at least one attached artifact (overlap keyword or SERP example).
    pub fn has_artifacts(&self) -> bool {
        has_any(&self.top_overlap_keywords) || has_any(&self.serp_examples)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub status: CompetitorStatus,
    #[serde(default)]
    pub evidence: CompetitorEvidence,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitiveSet {
    #[serde(default)]
    pub direct: Vec<Competitor>,
    #[serde(default)]
    pub indirect: Vec<Competitor>,
    #[serde(default)]
    pub marketplaces: Vec<Competitor>,
}

impl CompetitiveSet {
    /// All competitors, direct then indirect then marketplaces.
    pub fn all(&self) -> impl Iterator<Item = &Competitor> {
        self.direct
            .iter()
            .chain(self.indirect.iter())
            .chain(self.marketplaces.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.indirect.is_empty() && self.marketplaces.is_empty()
    }
}

// ── Section D ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandDefinition {
    #[serde(default)]
    pub seed_terms: Vec<String>,
    #[serde(default)]
    pub demand_themes: Vec<String>,
    #[serde(default)]
    pub problem_terms: Vec<String>,
}

// ── Section E ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthPriority {
    Defend,
    Grow,
    Expand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategicIntent {
    #[serde(default)]
    pub primary_goal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_priority: Option<GrowthPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default)]
    pub secondary_goals: Vec<String>,
}

// ── Section F ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentLevel {
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_investment_level: Option<InvestmentLevel>,
    #[serde(default)]
    pub paid_media_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketplace_dependence: Option<InvestmentLevel>,
}

// ── Section G ──

/// Enforcement strictness for the negative scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailEnforcement {
    #[serde(default)]
    pub hard_exclusion: bool,
    #[serde(default)]
    pub allow_model_suggestion: bool,
    #[serde(default)]
    pub require_human_override_for_expansion: bool,
}

/// Section G: what generated content must not touch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailRules {
    #[serde(default)]
    pub excluded_categories: Vec<String>,
    #[serde(default)]
    pub excluded_keywords: Vec<String>,
    #[serde(default)]
    pub excluded_use_cases: Vec<String>,
    #[serde(default)]
    pub excluded_competitors: Vec<String>,
    #[serde(default)]
    pub enforcement: GuardrailEnforcement,
}

impl GuardrailRules {
    /// Non-blank terms across all four exclusion lists.
    pub fn term_count(&self) -> usize {
        [
            &self.excluded_categories,
            &self.excluded_keywords,
            &self.excluded_use_cases,
            &self.excluded_competitors,
        ]
        .into_iter()
        .map(|list| count_nonblank(list))
        .sum()
    }
}

// ── Section H ──

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Governance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_confidence: Option<Confidence>,
    #[serde(default)]
    pub model_suggested: bool,
    #[serde(default)]
    pub human_verified: bool,
    #[serde(default)]
    pub reviewed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: String,
}

/// The eight sections of a record. Absent sections are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_identity: Option<BrandIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_definition: Option<CategoryDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_set: Option<CompetitiveSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_definition: Option<DemandDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategic_intent: Option<StrategicIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_context: Option<ChannelContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_scope: Option<GuardrailRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<Governance>,
}

/// Borrowed view of one present section.
#[derive(Debug, Clone, Copy)]
pub enum SectionRef<'a> {
    BrandIdentity(&'a BrandIdentity),
    CategoryDefinition(&'a CategoryDefinition),
    CompetitiveSet(&'a CompetitiveSet),
    DemandDefinition(&'a DemandDefinition),
    StrategicIntent(&'a StrategicIntent),
    ChannelContext(&'a ChannelContext),
    NegativeScope(&'a GuardrailRules),
    Governance(&'a Governance),
}

impl SectionSet {
    /// Typed access to one section; `None` when the section is absent.
    pub fn section(&self, id: SectionId) -> Option<SectionRef<'_>> {
        match id {
            SectionId::BrandIdentity => self.brand_identity.as_ref().map(SectionRef::BrandIdentity),
            SectionId::CategoryDefinition => self
                .category_definition
                .as_ref()
                .map(SectionRef::CategoryDefinition),
            SectionId::CompetitiveSet => {
                self.competitive_set.as_ref().map(SectionRef::CompetitiveSet)
            }
            SectionId::DemandDefinition => self
                .demand_definition
                .as_ref()
                .map(SectionRef::DemandDefinition),
            SectionId::StrategicIntent => self
                .strategic_intent
                .as_ref()
                .map(SectionRef::StrategicIntent),
            SectionId::ChannelContext => {
                self.channel_context.as_ref().map(SectionRef::ChannelContext)
            }
            SectionId::NegativeScope => self.negative_scope.as_ref().map(SectionRef::NegativeScope),
            SectionId::Governance => self.governance.as_ref().map(SectionRef::Governance),
        }
    }

    /// Fingerprint of the section content.
    pub fn content_hash(&self) -> Result<ContentHash, serde_json::Error> {
        ContentHash::of_canonical(self)
    }
}

/// The editable working copy of a Context Record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Required on input; a record without one cannot be tied to its history.
    pub lineage_id: LineageId,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub cmo_safe: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sections: SectionSet,
}

impl ContextRecord {
    /// A fresh draft with no content.
    pub fn new(lineage_id: LineageId) -> Self {
        Self {
            lineage_id,
            status: Status::DraftAi,
            confidence: Confidence::Low,
            cmo_safe: false,
            valid_until: None,
            sections: SectionSet::default(),
        }
    }

    pub fn section(&self, id: SectionId) -> Option<SectionRef<'_>> {
        self.sections.section(id)
    }

    pub fn content_hash(&self) -> Result<ContentHash, serde_json::Error> {
        self.sections.content_hash()
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub(crate) fn count_nonblank(list: &[String]) -> usize {
    list.iter().filter(|s| !is_blank(s)).count()
}

pub(crate) fn has_any(list: &[String]) -> bool {
    list.iter().any(|s| !is_blank(s))
}
