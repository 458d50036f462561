//! The rule library
//!
//! Each rule is a unit of the pipeline in [`Analyzer`](crate::Analyzer):
//! it matches the nodes it cares about with a pattern and edits them in
//! place. Rules that depend on the reserved metadata column prefix take it
//! at construction.

mod data_type;
mod group_by;
mod join_type;
mod metadata;
mod metadata_conversion;
mod naming;
mod operator_relation;
mod range;
mod source_relation;
mod verify;

pub use data_type::*;
pub use group_by::*;
pub use join_type::*;
pub use metadata::*;
pub use metadata_conversion::*;
pub use naming::*;
pub use operator_relation::*;
pub use range::*;
pub use source_relation::*;
pub use verify::*;

use pxl_diagnostics::{CompilerError, PXL0502};
use pxl_ir::{IrGraph, NodeId};
use pxl_types::Relation;

/// Parent `idx` of operator `op`
pub(crate) fn parent_at(graph: &IrGraph, op: NodeId, idx: usize) -> Result<NodeId, CompilerError> {
    let parents = graph.operator(op)?.parents();
    parents.get(idx).copied().ok_or_else(|| {
        CompilerError::structural(
            PXL0502,
            format!(
                "Operator {} has {} parent(s), no parent at index {}",
                op,
                parents.len(),
                idx
            ),
        )
    })
}

/// Relation of parent `idx` of `op`, `None` while it is unresolved
pub(crate) fn parent_relation(graph: &IrGraph, op: NodeId, idx: usize) -> Result<Option<&Relation>, CompilerError> {
    let parent = parent_at(graph, op, idx)?;
    Ok(graph.operator(parent)?.relation())
}
