//! PxL analyzer diagnostics
//!
//! This crate provides the error handling infrastructure shared by the IR
//! graph and the semantic analyzer: error codes grouped by taxonomy, source
//! positions, single compiler errors and the aggregated error report handed
//! back to the caller.

mod error;
mod error_code;
mod position;
mod report;

pub use error::*;
pub use error_code::*;
pub use position::*;
pub use report::*;

/// Result type for analyzer operations
pub type Result<T> = std::result::Result<T, CompilerError>;
