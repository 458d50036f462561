//! Analyzer configuration

use indexmap::IndexMap;
use pxl_diagnostics::{ErrorCode, PXL0600};
use pxl_types::METADATA_COLUMN_PREFIX;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Phase;

/// Problems with an [`AnalyzerConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown analyzer phase '{0}'")]
    UnknownPhase(String),

    #[error("Phase '{0}' needs a pass ceiling of at least 1")]
    ZeroCeiling(String),

    #[error("Metadata column prefix must not be empty")]
    EmptyPrefix,

    #[error("Invalid analyzer config: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        PXL0600
    }
}

/// Tunables for one [`Analyzer`](crate::Analyzer).
///
/// ```json
/// { "max_iterations": { "IntermediateResolution": 200 }, "metadata_column_prefix": "_attr_" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Pass ceiling overrides keyed by phase name
    pub max_iterations: IndexMap<String, usize>,
    /// Reserved prefix of materialized metadata columns
    pub metadata_column_prefix: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_iterations: IndexMap::new(),
            metadata_column_prefix: METADATA_COLUMN_PREFIX.to_string(),
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the pass ceiling of one phase
    pub fn with_max_iterations(mut self, phase: impl Into<String>, max_iterations: usize) -> Self {
        self.max_iterations.insert(phase.into(), max_iterations);
        self
    }

    pub fn with_metadata_column_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_column_prefix = prefix.into();
        self
    }

    /// Effective pass ceiling of a phase
    pub fn max_iterations_for(&self, phase: Phase) -> usize {
        self.max_iterations
            .get(phase.name())
            .copied()
            .unwrap_or_else(|| phase.default_max_iterations())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, &ceiling) in &self.max_iterations {
            if Phase::from_name(name).is_none() {
                return Err(ConfigError::UnknownPhase(name.clone()));
            }
            if ceiling == 0 {
                return Err(ConfigError::ZeroCeiling(name.clone()));
            }
        }
        if self.metadata_column_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxl_diagnostics::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.metadata_column_prefix, "_attr_");
        assert_eq!(config.max_iterations_for(Phase::IntermediateResolution), 100);
        assert_eq!(config.max_iterations_for(Phase::VerifyUserDefinedColumns), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_override() {
        let config = AnalyzerConfig::from_json(r#"{"max_iterations": {"IntermediateResolution": 250}}"#).unwrap();
        assert_eq!(config.max_iterations_for(Phase::IntermediateResolution), 250);
        assert_eq!(config.max_iterations_for(Phase::RangeArgFolding), 100);
        assert_eq!(config.metadata_column_prefix, "_attr_");
    }

    #[rstest]
    #[case(r#"{"max_iterations": {"Typing": 3}}"#, "Unknown analyzer phase 'Typing'")]
    #[case(r#"{"max_iterations": {"PostResolution": 0}}"#, "needs a pass ceiling")]
    #[case(r#"{"metadata_column_prefix": ""}"#, "must not be empty")]
    #[case(r#"{"ceiling": 3}"#, "Invalid analyzer config")]
    fn test_rejects_bad_config(#[case] json: &str, #[case] expected: &str) {
        let err = AnalyzerConfig::from_json(json).unwrap_err();
        assert!(err.to_string().contains(expected), "{}", err);
        assert_eq!(err.code(), PXL0600);
        assert_eq!(err.code().kind(), ErrorKind::Configuration);
    }
}
