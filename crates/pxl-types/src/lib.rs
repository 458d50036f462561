//! PxL type system and registries
//!
//! This crate defines what the analyzer consults but never owns:
//! - Column data types and literal values
//! - Relations (ordered column schemas) and the table-name → relation map
//! - Function, aggregate and table-function signatures
//! - Metadata keys and the properties they resolve to

mod data_type;
mod metadata;
mod registry;
mod relation;
mod value;

pub use data_type::*;
pub use metadata::*;
pub use registry::*;
pub use relation::*;
pub use value::*;
