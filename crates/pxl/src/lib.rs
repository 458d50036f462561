//! Semantic analysis for the PxL query language
//!
//! This crate bundles the analyzer stage of the PxL compiler:
//! - [`ir`]: the IR graph produced by the front end and its pattern DSL
//! - [`types`]: data types, relations and the registries the analyzer reads
//! - [`analyzer`]: rules, batches and the phase pipeline
//! - [`diagnostics`]: error codes and the aggregated error report
//!
//! # Example
//!
//! ```ignore
//! use pxl::{CompilerState, analyze};
//!
//! let state = CompilerState::new(&relations, &functions, &metadata);
//! if let Err(report) = analyze(&mut graph, &state) {
//!     eprintln!("{}", report.render(Some(query)));
//! }
//! ```

// Re-export all public APIs from internal crates
pub use pxl_analyzer as analyzer;
pub use pxl_diagnostics as diagnostics;
pub use pxl_ir as ir;
pub use pxl_types as types;

// Convenience re-exports
pub use pxl_analyzer::{Analyzer, AnalyzerConfig, CompilerState, ConfigError, Phase};
pub use pxl_diagnostics::{CompilerError, CompilerErrorGroup, LineColError};
pub use pxl_ir::IrGraph;

/// Resolve and simplify `graph` in place with the standard pipeline
pub fn analyze(graph: &mut IrGraph, state: &CompilerState<'_>) -> Result<(), CompilerErrorGroup> {
    Analyzer::default().execute(graph, state)
}

/// Like [`analyze`], with phase ceilings and the metadata column prefix
/// taken from `config`. An invalid config is reported as a single
/// diagnostic.
pub fn analyze_with_config(
    graph: &mut IrGraph,
    state: &CompilerState<'_>,
    config: &AnalyzerConfig,
) -> Result<(), CompilerErrorGroup> {
    let analyzer = Analyzer::new(config).map_err(|e| {
        CompilerErrorGroup::from_iter([diagnostics::Diagnostic::new(e.code(), e.to_string())])
    })?;
    analyzer.execute(graph, state)
}
