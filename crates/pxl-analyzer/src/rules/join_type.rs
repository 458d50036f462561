//! Join type normalization

use pxl_diagnostics::{CompilerError, PXL0303};
use pxl_ir::pattern::{Pattern, unnormalized_join};
use pxl_ir::{ExpressionKind, IrGraph, JoinType, NodeId, OperatorKind};

use crate::{CompilerState, Rule, RuleResult};

/// Parses the declared join type. Right joins are rewritten into left
/// joins with swapped inputs, so later stages only see inner, left and
/// outer joins.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetupJoinTypeRule;

impl SetupJoinTypeRule {
    /// Swap the join inputs along with everything that refers to them
    /// by position
    fn convert_right_to_left(graph: &mut IrGraph, node: NodeId) -> Result<(), CompilerError> {
        graph.swap_parents(node)?;
        for id in graph.owned_expressions(node)? {
            match graph.expression_mut(id)?.kind_mut() {
                ExpressionKind::Column(col) => col.parent_op_idx = 1 - col.parent_op_idx.min(1),
                ExpressionKind::Metadata(md) => md.parent_op_idx = 1 - md.parent_op_idx.min(1),
                _ => {}
            }
        }
        if let OperatorKind::Join(join) = graph.operator_mut(node)?.kind_mut() {
            std::mem::swap(&mut join.left_on, &mut join.right_on);
            join.join_type = Some(JoinType::Left);
        }
        Ok(())
    }
}

impl Rule for SetupJoinTypeRule {
    fn name(&self) -> &'static str {
        "SetupJoinTypeRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        if !graph.node(node).is_some_and(|n| unnormalized_join().matches(graph, n)) {
            return Ok(false);
        }
        let OperatorKind::Join(join) = graph.operator(node)?.kind() else {
            return Ok(false);
        };
        let join_type = JoinType::parse(&join.declared_type).ok_or_else(|| {
            CompilerError::argument(
                PXL0303,
                format!(
                    "'{}' join type not supported. Only {{inner, left, outer, right}} are supported.",
                    join.declared_type
                ),
            )
        })?;

        if join_type == JoinType::Right {
            Self::convert_right_to_left(graph, node)?;
        } else if let OperatorKind::Join(join) = graph.operator_mut(node)?.kind_mut() {
            join.join_type = Some(join_type);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, cpu_relation, http_relation, pos, resolved_source};
    use pretty_assertions::assert_eq;
    use pxl_diagnostics::CompilerErrorGroup;
    use pxl_ir::ColumnExpression;
    use pxl_ir::operator::Join;
    use rstest::rstest;

    struct JoinGraph {
        graph: IrGraph,
        left: NodeId,
        right: NodeId,
        join: NodeId,
        left_key: NodeId,
        right_key: NodeId,
        out: NodeId,
    }

    fn join_graph(declared: &str) -> JoinGraph {
        let mut graph = IrGraph::new();
        let left = resolved_source(&mut graph, "cpu", cpu_relation());
        let right = resolved_source(&mut graph, "http_events", http_relation());
        let left_key = graph.add_column(pos(2, 1), "upid", 0);
        let right_key = graph.add_column(pos(2, 1), "upid", 1);
        let out = graph.add_column(pos(2, 1), "resp_latency_ns", 1);
        let join = graph
            .add_operator(
                pos(2, 1),
                OperatorKind::Join(Join {
                    declared_type: declared.into(),
                    join_type: None,
                    left_on: vec![left_key],
                    right_on: vec![right_key],
                    output_columns: vec![ColumnExpression::new("latency", out)],
                }),
                &[left, right],
            )
            .unwrap();
        JoinGraph {
            graph,
            left,
            right,
            join,
            left_key,
            right_key,
            out,
        }
    }

    fn join_of(g: &IrGraph, id: NodeId) -> &Join {
        match g.operator(id).unwrap().kind() {
            OperatorKind::Join(join) => join,
            other => panic!("expected a join, found {:?}", other),
        }
    }

    #[rstest]
    #[case("inner", JoinType::Inner)]
    #[case("left", JoinType::Left)]
    #[case("outer", JoinType::Outer)]
    fn test_plain_join_types(#[case] declared: &str, #[case] expected: JoinType) {
        let fx = Fixture::new();
        let mut jg = join_graph(declared);
        let mut errors = CompilerErrorGroup::new();
        assert!(SetupJoinTypeRule.execute(&mut jg.graph, &fx.state(), &mut errors));
        assert!(errors.is_empty());
        assert_eq!(join_of(&jg.graph, jg.join).join_type, Some(expected));
        assert_eq!(jg.graph.operator(jg.join).unwrap().parents(), &[jg.left, jg.right]);
    }

    #[test]
    fn test_right_join_becomes_left_with_swapped_inputs() {
        let fx = Fixture::new();
        let mut jg = join_graph("right");
        let mut errors = CompilerErrorGroup::new();
        SetupJoinTypeRule.execute(&mut jg.graph, &fx.state(), &mut errors);
        assert!(errors.is_empty());

        let g = &jg.graph;
        let join = join_of(g, jg.join);
        assert_eq!(join.join_type, Some(JoinType::Left));
        assert_eq!(g.operator(jg.join).unwrap().parents(), &[jg.right, jg.left]);
        assert_eq!(join.left_on, vec![jg.right_key]);
        assert_eq!(join.right_on, vec![jg.left_key]);

        let idx = |id| g.expression(id).unwrap().as_column().unwrap().parent_op_idx;
        assert_eq!(idx(jg.left_key), 1);
        assert_eq!(idx(jg.right_key), 0);
        assert_eq!(idx(jg.out), 0);
    }

    #[test]
    fn test_unsupported_join_type() {
        let fx = Fixture::new();
        let mut jg = join_graph("cross");
        let mut errors = CompilerErrorGroup::new();
        assert!(!SetupJoinTypeRule.execute(&mut jg.graph, &fx.state(), &mut errors));
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.errors()[0].message,
            "'cross' join type not supported. Only {inner, left, outer, right} are supported."
        );
    }
}
