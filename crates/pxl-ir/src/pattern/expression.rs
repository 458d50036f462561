//! Expression patterns: resolution state, types, columns and functions

use pxl_types::{DataType, MetadataType};

use super::Pattern;
use crate::expression::ExpressionKind;
use crate::{IrGraph, IrNode, IrNodeType};

/// Expression whose type is (or is not yet) resolved
#[derive(Debug, Clone, Copy)]
pub struct ResolvedExpressionMatch {
    resolved: bool,
}

impl Pattern for ResolvedExpressionMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.as_expression()
            .is_some_and(|expr| expr.is_resolved() == self.resolved)
    }
}

pub fn resolved_expression() -> ResolvedExpressionMatch {
    ResolvedExpressionMatch { resolved: true }
}

pub fn unresolved_expression() -> ResolvedExpressionMatch {
    ResolvedExpressionMatch { resolved: false }
}

/// Expression of one kind in a given resolution state
#[derive(Debug, Clone, Copy)]
pub struct SpecificExpressionMatch {
    node_type: IrNodeType,
    resolved: bool,
}

impl Pattern for SpecificExpressionMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.node_type() == self.node_type
            && node
                .as_expression()
                .is_some_and(|expr| expr.is_resolved() == self.resolved)
    }
}

pub fn resolved_column() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Column,
        resolved: true,
    }
}

pub fn unresolved_column() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Column,
        resolved: false,
    }
}

pub fn resolved_func() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Func,
        resolved: true,
    }
}

pub fn unresolved_func() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Func,
        resolved: false,
    }
}

pub fn resolved_metadata() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Metadata,
        resolved: true,
    }
}

pub fn unresolved_metadata() -> SpecificExpressionMatch {
    SpecificExpressionMatch {
        node_type: IrNodeType::Metadata,
        resolved: false,
    }
}

/// Resolved expression of a specific data type
#[derive(Debug, Clone, Copy)]
pub struct ExpressionOfType(DataType);

impl Pattern for ExpressionOfType {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        node.as_expression()
            .is_some_and(|expr| expr.data_type() == Some(self.0))
    }
}

pub fn expression_of_type(data_type: DataType) -> ExpressionOfType {
    ExpressionOfType(data_type)
}

/// Metadata expression annotated with a registry property
#[derive(Debug, Clone, Copy)]
pub struct MetadataExpressionMatch(Option<MetadataType>);

impl Pattern for MetadataExpressionMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        let Some(ExpressionKind::Metadata(md)) = node.expression_kind() else {
            return false;
        };
        match (md.metadata_type(), self.0) {
            (Some(_), None) => true,
            (Some(actual), Some(expected)) => actual == expected,
            (None, _) => false,
        }
    }
}

/// Any annotated metadata expression
pub fn metadata_expression() -> MetadataExpressionMatch {
    MetadataExpressionMatch(None)
}

/// Annotated metadata expression of one metadata type
pub fn metadata_expression_of(metadata_type: MetadataType) -> MetadataExpressionMatch {
    MetadataExpressionMatch(Some(metadata_type))
}

/// Column reference, optionally by name and parent index
#[derive(Debug, Clone, Default)]
pub struct ColumnMatch {
    name: Option<String>,
    parent_op_idx: Option<usize>,
}

impl Pattern for ColumnMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        let Some(ExpressionKind::Column(col)) = node.expression_kind() else {
            return false;
        };
        self.name.as_ref().is_none_or(|name| *name == col.name)
            && self.parent_op_idx.is_none_or(|idx| idx == col.parent_op_idx)
    }
}

pub fn column() -> ColumnMatch {
    ColumnMatch::default()
}

pub fn column_named(name: impl Into<String>) -> ColumnMatch {
    ColumnMatch {
        name: Some(name.into()),
        parent_op_idx: None,
    }
}

pub fn column_at(name: impl Into<String>, parent_op_idx: usize) -> ColumnMatch {
    ColumnMatch {
        name: Some(name.into()),
        parent_op_idx: Some(parent_op_idx),
    }
}

/// Literal of any kind, or of one data type
#[derive(Debug, Clone, Copy, Default)]
pub struct DataMatch(Option<DataType>);

impl Pattern for DataMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        let Some(ExpressionKind::Data(value)) = node.expression_kind() else {
            return false;
        };
        self.0.is_none_or(|ty| ty == value.data_type())
    }
}

pub fn data() -> DataMatch {
    DataMatch(None)
}

pub fn data_of_type(data_type: DataType) -> DataMatch {
    DataMatch(Some(data_type))
}

/// Function call that can be split into partial and finalize stages
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialUdaMatch;

impl Pattern for PartialUdaMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        matches!(node.expression_kind(), Some(ExpressionKind::Func(f)) if f.supports_partial)
    }
}

pub fn partial_uda() -> PartialUdaMatch {
    PartialUdaMatch
}

/// Function call resolved to an aggregate
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateFuncMatch;

impl Pattern for AggregateFuncMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        matches!(node.expression_kind(), Some(ExpressionKind::Func(f)) if f.is_aggregate())
    }
}

pub fn aggregate_func() -> AggregateFuncMatch {
    AggregateFuncMatch
}
