//! Error types for kernel operations.
//!
//! Only configuration loading and explicit lifecycle transitions can fail.
//! Lifecycle gates, missing content and guardrail violations are reported as
//! data, never as errors.

use crate::lifecycle::Status;

/// A status change that the lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition { from: Status, to: Status },
}

/// Errors raised while loading a module registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid module id `{0}` (expected lowercase letters, digits, `-` or `_`)")]
    InvalidModuleId(String),

    #[error("duplicate module id: {0}")]
    DuplicateModule(String),

    #[error("module {module}: duplicate entity check id `{check}`")]
    DuplicateCheck { module: String, check: String },

    #[error("module {module}: section {section} is listed as both required and optional")]
    SectionConflict { module: String, section: String },

    #[error("module {0}: required_statuses must not be empty")]
    EmptyStatuses(String),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
