//! GroupBy marker handling

use pxl_diagnostics::{CompilerError, PXL0501};
use pxl_ir::pattern::{Pattern, blocking_agg, group_by, operator_chain, rolling};
use pxl_ir::{IrGraph, IrNode, NodeId, OperatorKind};

use crate::{CompilerState, Rule, RuleResult};

/// Hands the groups of a GroupBy to the single BlockingAgg or Rolling
/// consuming it and takes the GroupBy out of the data path
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeGroupByIntoGroupAcceptorRule;

impl Rule for MergeGroupByIntoGroupAcceptorRule {
    fn name(&self) -> &'static str {
        "MergeGroupByIntoGroupAcceptorRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        let pattern = operator_chain(group_by(), blocking_agg().or(rolling()));
        if !graph.node(node).is_some_and(|n| pattern.matches(graph, n)) {
            return Ok(false);
        }
        let op = graph.operator_mut(node)?;
        let &[child] = op.children() else {
            return Ok(false);
        };
        let groups = match op.kind_mut() {
            OperatorKind::GroupBy(group_by) => std::mem::take(&mut group_by.groups),
            _ => return Ok(false),
        };

        match graph.operator_mut(child)?.kind_mut() {
            OperatorKind::BlockingAgg(agg) => agg.groups.extend(groups.iter().copied()),
            OperatorKind::Rolling(rolling) => rolling.groups.extend(groups.iter().copied()),
            _ => {}
        }
        for group in groups {
            graph.adopt_expression(child, group)?;
        }
        graph.bypass(node)?;
        Ok(true)
    }
}

/// Deletes GroupBy markers left childless by the merge
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveGroupByRule;

impl Rule for RemoveGroupByRule {
    fn name(&self) -> &'static str {
        "RemoveGroupByRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        let Some(op) = graph.node(node).and_then(IrNode::as_operator) else {
            return Ok(false);
        };
        if !matches!(op.kind(), OperatorKind::GroupBy(_)) {
            return Ok(false);
        }
        if !op.children().is_empty() {
            return Err(CompilerError::structural(
                PXL0501,
                format!(
                    "GroupBy must feed a single aggregate or rolling window, found {} consumer(s).",
                    op.children().len()
                ),
            ));
        }
        graph.delete_node(node)?;
        Ok(true)
    }
}
