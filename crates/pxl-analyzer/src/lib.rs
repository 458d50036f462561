//! PxL semantic analyzer
//!
//! Takes the unresolved IR graph produced by the front end and, through an
//! ordered list of rule batches, resolves every relation and data type,
//! normalizes joins and metadata access, folds compile-time range bounds
//! and finally removes the IR-only marker operators.
//!
//! # Example
//!
//! ```ignore
//! use pxl_analyzer::{Analyzer, CompilerState};
//!
//! let state = CompilerState::new(&relations, &functions, &metadata);
//! Analyzer::default().execute(&mut graph, &state)?;
//! ```
//!
//! # Architecture
//!
//! - `Rule`: one pattern plus one local edit, applied to every node
//! - `RuleBatch`: a named list of rules run to a fixed point under a pass ceiling
//! - `RuleExecutor`: runs batches in order, stopping at the first failure
//! - `Analyzer`: the executor wired with the standard phases
//! - `CompileTimeFolder`: evaluates the compile-time subset of expressions

mod analyzer;
mod batch;
mod config;
mod executor;
mod folding;
mod rule;
pub mod rules;
mod state;

#[cfg(test)]
pub(crate) mod test_utils;

pub use analyzer::*;
pub use batch::*;
pub use config::*;
pub use executor::*;
pub use folding::*;
pub use rule::*;
pub use state::*;
