//! Range bounds: compile-time folding and merging into the source

use pxl_diagnostics::{CompilerError, PXL0203, PXL0306, PXL0504, PXL0505};
use pxl_ir::{ExpressionKind, IrGraph, IrNode, NodeId, OperatorKind};
use pxl_types::ScalarValue;

use super::parent_at;
use crate::{CompileTimeFolder, CompilerState, Rule, RuleResult, TimeArithmeticFolder};

fn range_bounds(graph: &IrGraph, node: NodeId) -> Option<[NodeId; 2]> {
    match graph.node(node).and_then(IrNode::operator_kind) {
        Some(OperatorKind::Range(range)) => Some([range.start, range.stop]),
        _ => None,
    }
}

/// Replaces every compile-time function under a Range with its value.
///
/// Bounds must end up as integer, time or duration literals; anything that
/// depends on a column is rejected.
#[derive(Debug, Clone, Default)]
pub struct RangeArgExpressionRule<F = TimeArithmeticFolder> {
    folder: F,
}

impl<F: CompileTimeFolder> RangeArgExpressionRule<F> {
    pub fn new(folder: F) -> Self {
        Self { folder }
    }

    fn fold_bound(&self, graph: &mut IrGraph, bound: NodeId, state: &CompilerState<'_>) -> RuleResult {
        let position = graph.position(bound);
        match graph.expression(bound)?.kind() {
            ExpressionKind::Data(ScalarValue::Int64(_) | ScalarValue::Time64ns(_) | ScalarValue::Duration64ns(_)) => {
                return Ok(false);
            }
            ExpressionKind::Data(other) => {
                return Err(CompilerError::type_error(
                    PXL0203,
                    format!(
                        "Expected integer or time for range bound, received {}.",
                        other.data_type()
                    ),
                )
                .at(position));
            }
            _ => {}
        }
        if !self.folder.can_fold(graph, bound) {
            return Err(CompilerError::argument(
                PXL0306,
                "Range bound must be evaluable at compile time, e.g. now() - minutes(5).",
            )
            .at(position));
        }

        let value = self
            .folder
            .fold(graph, bound, state)
            .map_err(|e| e.at(position))?;
        let folded = graph.add_data(position, value);
        graph.replace_expression(bound, folded)?;
        graph.delete_expression_tree(bound);
        Ok(true)
    }
}

impl<F: CompileTimeFolder> Rule for RangeArgExpressionRule<F> {
    fn name(&self) -> &'static str {
        "RangeArgExpressionRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        let Some(bounds) = range_bounds(graph, node) else {
            return Ok(false);
        };
        let mut changed = false;
        for bound in bounds {
            changed |= self.fold_bound(graph, bound, state)?;
        }
        Ok(changed)
    }
}

/// Copies folded Range bounds into the memory source feeding the Range and
/// removes the Range.
///
/// Duration bounds are relative to the reference time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeRangeOperatorRule;

impl MergeRangeOperatorRule {
    fn bound_ns(graph: &IrGraph, bound: NodeId, state: &CompilerState<'_>) -> Result<i64, CompilerError> {
        match graph.expression(bound)?.as_data() {
            Some(ScalarValue::Int64(ns) | ScalarValue::Time64ns(ns)) => Ok(*ns),
            Some(ScalarValue::Duration64ns(offset)) => state.time_now_ns().checked_add(*offset).ok_or_else(|| {
                CompilerError::argument(PXL0306, "Overflow while offsetting range bound from now.")
            }),
            _ => Err(CompilerError::structural(
                PXL0505,
                format!("Range bound {} was not folded to a literal", bound),
            )),
        }
    }
}

impl Rule for MergeRangeOperatorRule {
    fn name(&self) -> &'static str {
        "MergeRangeOperatorRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        let Some([start, stop]) = range_bounds(graph, node) else {
            return Ok(false);
        };
        let start = Self::bound_ns(graph, start, state)?;
        let stop = Self::bound_ns(graph, stop, state)?;

        let parent = parent_at(graph, node, 0)?;
        match graph.operator_mut(parent)?.kind_mut() {
            OperatorKind::MemorySource(src) => {
                src.time_start = Some(start);
                src.time_stop = Some(stop);
            }
            other => {
                return Err(CompilerError::structural(
                    PXL0504,
                    format!("Range must follow a memory source, found {}.", other.node_type()),
                ));
            }
        }
        graph.bypass(node)?;
        graph.delete_node(node)?;
        Ok(true)
    }
}
