//! Reserved column names

use pxl_diagnostics::{CompilerError, PXL0304};
use pxl_ir::{IrGraph, NodeId, OperatorKind};

use crate::{CompilerState, Rule, RuleResult};

/// Rejects Map and BlockingAgg output columns whose name starts with the
/// prefix reserved for materialized metadata
#[derive(Debug, Clone)]
pub struct CheckMetadataColumnNamingRule {
    prefix: String,
}

impl CheckMetadataColumnNamingRule {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Rule for CheckMetadataColumnNamingRule {
    fn name(&self) -> &'static str {
        "CheckMetadataColumnNamingRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        let Some(op) = graph.node(node).and_then(|n| n.as_operator()) else {
            return Ok(false);
        };
        let outputs = match op.kind() {
            OperatorKind::Map(map) => &map.col_exprs,
            OperatorKind::BlockingAgg(agg) => &agg.aggregate_exprs,
            _ => return Ok(false),
        };
        match outputs.iter().find(|c| c.name.starts_with(&self.prefix)) {
            Some(bad) => Err(CompilerError::argument(
                PXL0304,
                format!(
                    "Column name '{}' violates naming rules. The '{}' prefix is reserved for internal use.",
                    bad.name, self.prefix
                ),
            )
            .at(graph.position(bad.expr))),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, cpu_relation, pos, resolved_source};
    use pxl_diagnostics::{CompilerErrorGroup, ErrorKind, SourcePosition};
    use pxl_ir::ColumnExpression;
    use pxl_ir::operator::{BlockingAgg, Map};

    fn check(kind: impl FnOnce(NodeId) -> OperatorKind, prefix: &str) -> CompilerErrorGroup {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = resolved_source(&mut g, "cpu", cpu_relation());
        let expr = g.add_column(pos(5, 12), "cpu0", 0);
        g.add_operator(pos(5, 1), kind(expr), &[src]).unwrap();

        let mut errors = CompilerErrorGroup::new();
        assert!(!CheckMetadataColumnNamingRule::new(prefix).execute(&mut g, &fx.state(), &mut errors));
        errors
    }

    fn map_named(name: &'static str) -> impl FnOnce(NodeId) -> OperatorKind {
        move |expr| {
            OperatorKind::Map(Map {
                col_exprs: vec![ColumnExpression::new(name, expr)],
                keep_input_columns: true,
            })
        }
    }

    #[test]
    fn test_reserved_prefix_in_map() {
        let errors = check(map_named("_attr_pod_name"), "_attr_");
        assert_eq!(errors.len(), 1);
        assert!(errors.has_kind(ErrorKind::Argument));
        assert_eq!(errors.errors()[0].position, Some(SourcePosition::new(5, 12)));
        assert!(errors.errors()[0].message.contains("'_attr_pod_name'"));
    }

    #[test]
    fn test_reserved_prefix_in_aggregate() {
        let errors = check(
            |expr| OperatorKind::BlockingAgg(BlockingAgg::new(vec![ColumnExpression::new("_attr_x", expr)])),
            "_attr_",
        );
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_ordinary_names_and_custom_prefix() {
        assert!(check(map_named("pod_name"), "_attr_").is_empty());
        assert!(check(map_named("_attr_pod_name"), "__md_").is_empty());
        assert_eq!(check(map_named("__md_pod"), "__md_").len(), 1);
    }
}
