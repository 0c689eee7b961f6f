//! Module registry: what each operation requires of a record.
//!
//! A "module" is a downstream operation identified by a stable id. Each one
//! declares required and optional sections, the statuses it accepts, and a
//! list of quantitative entity checks. The built-in rule set can be replaced
//! by a TOML file of the same shape:
//!
//! ```toml
//! [[module]]
//! id = "keyword-generation"
//! name = "Keyword Generation"
//! required_sections = ["A", "B", "D"]
//! optional_sections = ["C", "G"]
//!
//! [[module.entity_checks]]
//! id = "min_category_terms"
//! metric = "category_terms"
//! min = 3
//! description = "At least 3 category terms"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::lifecycle::Status;
use crate::record::SectionId;

const MODULE_ID_PATTERN: &str = r"^[a-z][a-z0-9_-]*$";

/// A typed quantity read from a record. Replaces dotted field paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityMetric {
    ApprovedCompetitors,
    Competitors,
    CategoryTerms,
    SeedTerms,
    DemandThemes,
    ExcludedTerms,
    BrandDomain,
    PrimaryCategory,
    PrimaryGoal,
}

impl EntityMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityMetric::ApprovedCompetitors => "approved_competitors",
            EntityMetric::Competitors => "competitors",
            EntityMetric::CategoryTerms => "category_terms",
            EntityMetric::SeedTerms => "seed_terms",
            EntityMetric::DemandThemes => "demand_themes",
            EntityMetric::ExcludedTerms => "excluded_terms",
            EntityMetric::BrandDomain => "brand_domain",
            EntityMetric::PrimaryCategory => "primary_category",
            EntityMetric::PrimaryGoal => "primary_goal",
        }
    }

    /// The section the metric reads from.
    pub fn section(self) -> SectionId {
        match self {
            EntityMetric::ApprovedCompetitors | EntityMetric::Competitors => {
                SectionId::CompetitiveSet
            }
            EntityMetric::CategoryTerms | EntityMetric::PrimaryCategory => {
                SectionId::CategoryDefinition
            }
            EntityMetric::SeedTerms | EntityMetric::DemandThemes => SectionId::DemandDefinition,
            EntityMetric::ExcludedTerms => SectionId::NegativeScope,
            EntityMetric::BrandDomain => SectionId::BrandIdentity,
            EntityMetric::PrimaryGoal => SectionId::StrategicIntent,
        }
    }

    /// Scalar metrics measure presence (0 or 1) rather than a count.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            EntityMetric::BrandDomain | EntityMetric::PrimaryCategory | EntityMetric::PrimaryGoal
        )
    }

    /// Plural noun for count metrics, field label for scalar ones.
    pub fn label(self) -> &'static str {
        match self {
            EntityMetric::ApprovedCompetitors => "approved competitors",
            EntityMetric::Competitors => "competitors",
            EntityMetric::CategoryTerms => "category terms",
            EntityMetric::SeedTerms => "seed terms",
            EntityMetric::DemandThemes => "demand themes",
            EntityMetric::ExcludedTerms => "excluded terms",
            EntityMetric::BrandDomain => "brand domain",
            EntityMetric::PrimaryCategory => "primary category",
            EntityMetric::PrimaryGoal => "primary goal",
        }
    }
}

/// One declared quantitative rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCheckSpec {
    pub id: String,
    pub metric: EntityMetric,
    #[serde(default = "default_min")]
    pub min: u32,
    #[serde(default)]
    pub description: String,
}

fn default_min() -> u32 {
    1
}

impl EntityCheckSpec {
    pub fn new(id: &str, metric: EntityMetric, min: u32, description: &str) -> Self {
        Self {
            id: id.to_string(),
            metric,
            min,
            description: description.to_string(),
        }
    }
}

/// Requirements one operation places on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRequirements {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub required_sections: Vec<SectionId>,
    #[serde(default)]
    pub optional_sections: Vec<SectionId>,
    #[serde(default = "default_statuses")]
    pub required_statuses: Vec<Status>,
    #[serde(default)]
    pub entity_checks: Vec<EntityCheckSpec>,
}

fn default_statuses() -> Vec<Status> {
    Status::NOT_EXPIRED.to_vec()
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default, rename = "module")]
    modules: Vec<ModuleRequirements>,
}

/// Operation id → requirements.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleRequirements>,
}

impl ModuleRegistry {
    /// Build a registry, rejecting malformed or conflicting declarations.
    pub fn from_modules(modules: Vec<ModuleRequirements>) -> Result<Self, ConfigError> {
        let id_re = Regex::new(MODULE_ID_PATTERN)?;
        let mut index = BTreeMap::new();

        for module in modules {
            validate_module(&id_re, &module)?;
            if index.contains_key(&module.id) {
                return Err(ConfigError::DuplicateModule(module.id));
            }
            index.insert(module.id.clone(), module);
        }

        Ok(Self { modules: index })
    }

    /// Parse a registry from TOML text. `origin` names the source in errors.
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        let parsed: RegistryFile = toml::from_str(text).map_err(|source| ConfigError::ParseToml {
            path: origin.to_string(),
            source,
        })?;
        Self::from_modules(parsed.modules)
    }

    /// Load a registry from a TOML file.
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_toml_str(&text, &path.display().to_string())?;
        tracing::debug!(
            path = %path.display(),
            modules = registry.len(),
            "loaded module registry"
        );
        Ok(registry)
    }

    /// The default rule set.
    pub fn builtin() -> Self {
        use EntityMetric as M;
        use SectionId::*;

        let modules = vec![
            module(
                "keyword-generation",
                "Keyword Generation",
                &[BrandIdentity, CategoryDefinition, DemandDefinition],
                &[CompetitiveSet, NegativeScope],
                vec![
                    EntityCheckSpec::new(
                        "min_category_terms",
                        M::CategoryTerms,
                        3,
                        "At least 3 category terms",
                    ),
                    EntityCheckSpec::new("min_seed_terms", M::SeedTerms, 1, "At least 1 seed term"),
                ],
            ),
            module(
                "competitor-analysis",
                "Competitor Analysis",
                &[BrandIdentity, CompetitiveSet],
                &[CategoryDefinition, NegativeScope],
                vec![
                    EntityCheckSpec::new(
                        "min_approved_competitors",
                        M::ApprovedCompetitors,
                        3,
                        "At least 3 approved competitors",
                    ),
                    EntityCheckSpec::new(
                        "brand_domain",
                        M::BrandDomain,
                        1,
                        "Brand domain is set",
                    ),
                ],
            ),
            module(
                "demand-analysis",
                "Demand Analysis",
                &[BrandIdentity, CategoryDefinition, DemandDefinition],
                &[StrategicIntent, ChannelContext],
                vec![EntityCheckSpec::new(
                    "min_demand_themes",
                    M::DemandThemes,
                    2,
                    "At least 2 demand themes",
                )],
            ),
            module(
                "strategic-summary",
                "Strategic Summary",
                &[BrandIdentity, CategoryDefinition, CompetitiveSet, StrategicIntent],
                &[ChannelContext, Governance],
                vec![
                    EntityCheckSpec::new(
                        "min_approved_competitors",
                        M::ApprovedCompetitors,
                        1,
                        "At least 1 approved competitor",
                    ),
                    EntityCheckSpec::new(
                        "primary_goal",
                        M::PrimaryGoal,
                        1,
                        "Primary strategic goal is set",
                    ),
                ],
            ),
            module(
                "guardrail-audit",
                "Guardrail Audit",
                &[BrandIdentity, NegativeScope],
                &[Governance],
                vec![EntityCheckSpec::new(
                    "min_excluded_terms",
                    M::ExcludedTerms,
                    1,
                    "At least 1 exclusion term",
                )],
            ),
        ];

        let modules = modules
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect::<BTreeMap<_, _>>();
        Self { modules }
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRequirements> {
        self.modules.get(id)
    }

    /// Iterate modules in id order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleRequirements> {
        self.modules.values()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

fn module(
    id: &str,
    name: &str,
    required: &[SectionId],
    optional: &[SectionId],
    entity_checks: Vec<EntityCheckSpec>,
) -> ModuleRequirements {
    ModuleRequirements {
        id: id.to_string(),
        name: name.to_string(),
        required_sections: required.to_vec(),
        optional_sections: optional.to_vec(),
        required_statuses: default_statuses(),
        entity_checks,
    }
}

fn validate_module(id_re: &Regex, module: &ModuleRequirements) -> Result<(), ConfigError> {
    if !id_re.is_match(&module.id) {
        return Err(ConfigError::InvalidModuleId(module.id.clone()));
    }
    if module.required_statuses.is_empty() {
        return Err(ConfigError::EmptyStatuses(module.id.clone()));
    }

    let required: BTreeSet<SectionId> = module.required_sections.iter().copied().collect();
    if let Some(section) = module
        .optional_sections
        .iter()
        .find(|s| required.contains(*s))
    {
        return Err(ConfigError::SectionConflict {
            module: module.id.clone(),
            section: section.letter().to_string(),
        });
    }

    let mut seen = BTreeSet::new();
    for check in &module.entity_checks {
        if !seen.insert(check.id.as_str()) {
            return Err(ConfigError::DuplicateCheck {
                module: module.id.clone(),
                check: check.id.clone(),
            });
        }
    }
    Ok(())
}
