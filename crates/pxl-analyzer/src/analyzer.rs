//! The standard analyzer pipeline
//!
//! Phases run strictly in this order; rule order inside a phase matters and
//! is spelled out here rather than left to registration side effects.
//!
//! | Phase | Ceiling | Rules |
//! |---|---|---|
//! | `TableAndMetadataResolution` | 2 | source relation, metadata, metadata literal format, join type |
//! | `VerifyUserDefinedColumns` | 1 | metadata column naming |
//! | `RangeArgFolding` | 100 | range bound folding |
//! | `IntermediateResolution` | 100 | data types, operator relations |
//! | `ResolutionVerification` | 1 | filter predicate, operator relations |
//! | `PostResolution` | 2 | group-by merge |
//! | `RemoveIROnlyNodes` | 2 | metadata resolver conversion, range merge, group-by removal |

use pxl_diagnostics::CompilerErrorGroup;
use pxl_ir::IrGraph;
use std::fmt;

use crate::rules::{
    CheckMetadataColumnNamingRule, DataTypeRule, MergeGroupByIntoGroupAcceptorRule, MergeRangeOperatorRule,
    MetadataFunctionFormatRule, MetadataResolverConversionRule, OperatorRelationRule, RangeArgExpressionRule,
    RemoveGroupByRule, ResolveMetadataRule, SetupJoinTypeRule, SourceRelationRule, VerifyFilterExpressionRule,
    VerifyOperatorRelationRule,
};
use crate::{AnalyzerConfig, CompileTimeFolder, CompilerState, ConfigError, RuleBatch, RuleExecutor, TimeArithmeticFolder};

/// Analyzer phases in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    TableAndMetadataResolution,
    VerifyUserDefinedColumns,
    RangeArgFolding,
    IntermediateResolution,
    ResolutionVerification,
    PostResolution,
    RemoveIrOnlyNodes,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Self::TableAndMetadataResolution,
        Self::VerifyUserDefinedColumns,
        Self::RangeArgFolding,
        Self::IntermediateResolution,
        Self::ResolutionVerification,
        Self::PostResolution,
        Self::RemoveIrOnlyNodes,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TableAndMetadataResolution => "TableAndMetadataResolution",
            Self::VerifyUserDefinedColumns => "VerifyUserDefinedColumns",
            Self::RangeArgFolding => "RangeArgFolding",
            Self::IntermediateResolution => "IntermediateResolution",
            Self::ResolutionVerification => "ResolutionVerification",
            Self::PostResolution => "PostResolution",
            Self::RemoveIrOnlyNodes => "RemoveIROnlyNodes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.name() == name)
    }

    /// Pass ceiling used when the config does not override it.
    ///
    /// One-shot rewrites get 2 (one pass to rewrite, one to confirm), pure
    /// checks get 1, and propagation phases get 100, which must stay above
    /// the longest dependency chain in any query.
    pub fn default_max_iterations(&self) -> usize {
        match self {
            Self::VerifyUserDefinedColumns | Self::ResolutionVerification => 1,
            Self::RangeArgFolding | Self::IntermediateResolution => 100,
            Self::TableAndMetadataResolution | Self::PostResolution | Self::RemoveIrOnlyNodes => 2,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The semantic analyzer: a [`RuleExecutor`] wired with the standard phases
#[derive(Debug)]
pub struct Analyzer {
    executor: RuleExecutor,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::build(&AnalyzerConfig::default(), TimeArithmeticFolder)
    }
}

impl Analyzer {
    /// Build the pipeline from a validated config
    pub fn new(config: &AnalyzerConfig) -> Result<Self, ConfigError> {
        Self::with_folder(config, TimeArithmeticFolder)
    }

    /// Build the pipeline with a custom range-bound folder
    pub fn with_folder<F: CompileTimeFolder + 'static>(config: &AnalyzerConfig, folder: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, folder))
    }

    fn build<F: CompileTimeFolder + 'static>(config: &AnalyzerConfig, folder: F) -> Self {
        let prefix = config.metadata_column_prefix.as_str();
        let batch = |phase: Phase| RuleBatch::new(phase.name(), config.max_iterations_for(phase));

        let executor = RuleExecutor::new()
            .with_batch(
                batch(Phase::TableAndMetadataResolution)
                    .with_rule(SourceRelationRule)
                    .with_rule(ResolveMetadataRule)
                    .with_rule(MetadataFunctionFormatRule)
                    .with_rule(SetupJoinTypeRule),
            )
            .with_batch(batch(Phase::VerifyUserDefinedColumns).with_rule(CheckMetadataColumnNamingRule::new(prefix)))
            .with_batch(batch(Phase::RangeArgFolding).with_rule(RangeArgExpressionRule::new(folder)))
            .with_batch(
                batch(Phase::IntermediateResolution)
                    .with_rule(DataTypeRule::new(prefix))
                    .with_rule(OperatorRelationRule::new(prefix)),
            )
            .with_batch(
                batch(Phase::ResolutionVerification)
                    .with_rule(VerifyFilterExpressionRule)
                    .with_rule(VerifyOperatorRelationRule),
            )
            .with_batch(batch(Phase::PostResolution).with_rule(MergeGroupByIntoGroupAcceptorRule))
            .with_batch(
                batch(Phase::RemoveIrOnlyNodes)
                    .with_rule(MetadataResolverConversionRule::new(prefix))
                    .with_rule(MergeRangeOperatorRule)
                    .with_rule(RemoveGroupByRule),
            );
        Self { executor }
    }

    pub fn executor(&self) -> &RuleExecutor {
        &self.executor
    }

    /// Resolve and simplify the graph in place
    pub fn execute(&self, graph: &mut IrGraph, state: &CompilerState<'_>) -> Result<(), CompilerErrorGroup> {
        self.executor.execute(graph, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phase_order_and_ceilings() {
        let analyzer = Analyzer::default();
        let phases: Vec<(&str, usize)> = analyzer
            .executor()
            .batches()
            .iter()
            .map(|b| (b.name(), b.max_iterations()))
            .collect();

        assert_eq!(
            phases,
            vec![
                ("TableAndMetadataResolution", 2),
                ("VerifyUserDefinedColumns", 1),
                ("RangeArgFolding", 100),
                ("IntermediateResolution", 100),
                ("ResolutionVerification", 1),
                ("PostResolution", 2),
                ("RemoveIROnlyNodes", 2),
            ]
        );
    }

    #[test]
    fn test_rule_order_is_explicit() {
        let analyzer = Analyzer::default();
        let batches = analyzer.executor().batches();
        assert_eq!(
            batches[0].rule_names(),
            vec![
                "SourceRelationRule",
                "ResolveMetadataRule",
                "MetadataFunctionFormatRule",
                "SetupJoinTypeRule"
            ]
        );
        assert_eq!(
            batches[6].rule_names(),
            vec![
                "MetadataResolverConversionRule",
                "MergeRangeOperatorRule",
                "RemoveGroupByRule"
            ]
        );
    }

    #[test]
    fn test_config_overrides_and_validation() {
        let config = AnalyzerConfig::new().with_max_iterations("IntermediateResolution", 7);
        let analyzer = Analyzer::new(&config).unwrap();
        assert_eq!(analyzer.executor().batches()[3].max_iterations(), 7);

        let bad = AnalyzerConfig::new().with_max_iterations("Resolution", 7);
        assert!(matches!(Analyzer::new(&bad), Err(ConfigError::UnknownPhase(_))));
    }

    #[test]
    fn test_phase_names_round_trip() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_name(phase.name()), Some(phase));
        }
        assert_eq!(Phase::from_name("RemoveIrOnlyNodes"), None);
    }
}
