//! Post-resolution checks

use pxl_diagnostics::{CompilerError, PXL0201, PXL0505};
use pxl_ir::{IrGraph, IrNode, NodeId, OperatorKind};
use pxl_types::DataType;

use crate::{CompilerState, Rule, RuleResult};

/// Filter predicates must be boolean
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyFilterExpressionRule;

impl Rule for VerifyFilterExpressionRule {
    fn name(&self) -> &'static str {
        "VerifyFilterExpressionRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        let Some(OperatorKind::Filter(filter)) = graph.node(node).and_then(IrNode::operator_kind) else {
            return Ok(false);
        };
        match graph.expression(filter.predicate)?.data_type() {
            Some(DataType::Boolean) | None => Ok(false),
            Some(other) => Err(CompilerError::type_error(
                PXL0201,
                format!("Expected Boolean for Filter expression, got {}.", other),
            )
            .at(graph.position(filter.predicate))),
        }
    }
}

/// Every operator must have a relation once resolution is over
#[derive(Debug, Clone, Copy, Default)]
pub struct VerifyOperatorRelationRule;

impl Rule for VerifyOperatorRelationRule {
    fn name(&self) -> &'static str {
        "VerifyOperatorRelationRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        let Some(op) = graph.node(node).and_then(IrNode::as_operator) else {
            return Ok(false);
        };
        if op.is_relation_init() {
            return Ok(false);
        }
        Err(CompilerError::structural(
            PXL0505,
            format!("{} operator {} could not be resolved.", op.node_type(), node),
        ))
    }
}
