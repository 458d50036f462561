//! Graph invariant violations

use pxl_diagnostics::{CompilerError, ErrorCode, PXL0500, PXL0501, PXL0502, PXL0503};
use thiserror::Error;

use crate::node::{IrNodeType, NodeId};

/// Errors raised by graph edits that would break an invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("Node {0} does not exist")]
    MissingNode(NodeId),

    #[error("Expected {id} to be an operator, found {found}")]
    NotAnOperator { id: NodeId, found: IrNodeType },

    #[error("Expected {id} to be an expression, found {found}")]
    NotAnExpression { id: NodeId, found: IrNodeType },

    #[error("Edge {parent} -> {child} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("{parent} is not a parent of {child}")]
    MissingEdge { parent: NodeId, child: NodeId },

    #[error("Expression {expr} already belongs to operator {owner}")]
    AlreadyOwned { expr: NodeId, owner: NodeId },

    #[error("No operator or expression refers to {0}")]
    DanglingExpression(NodeId),

    #[error("{node} has {actual} parents, expected {expected}")]
    ParentCount {
        node: NodeId,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot delete {node} while it still has {children} children")]
    HasChildren { node: NodeId, children: usize },
}

impl GraphError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Cycle { .. } => PXL0500,
            Self::ParentCount { .. } => PXL0502,
            Self::HasChildren { .. } => PXL0501,
            Self::MissingNode(_)
            | Self::NotAnOperator { .. }
            | Self::NotAnExpression { .. }
            | Self::MissingEdge { .. }
            | Self::AlreadyOwned { .. }
            | Self::DanglingExpression(_) => PXL0503,
        }
    }
}

impl From<GraphError> for CompilerError {
    fn from(err: GraphError) -> Self {
        CompilerError::structural(err.code(), err.to_string())
    }
}
