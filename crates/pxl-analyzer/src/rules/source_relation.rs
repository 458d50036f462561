//! Source relations from the schema and table-function registries

use pxl_diagnostics::{CompilerError, PXL0100, PXL0101, PXL0105, PXL0505};
use pxl_ir::pattern::{Pattern, unresolved_source};
use pxl_ir::{IrGraph, NodeId, OperatorKind};
use pxl_types::Relation;

use crate::{CompilerState, Rule, RuleResult};

/// Attaches a relation to every source operator.
///
/// Memory sources take their table's relation, projected onto the select
/// list when there is one; UDTF sources take the relation registered for
/// the function. Remote sources are created with their relation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceRelationRule;

impl Rule for SourceRelationRule {
    fn name(&self) -> &'static str {
        "SourceRelationRule"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, state: &CompilerState<'_>) -> RuleResult {
        if !graph.node(node).is_some_and(|n| unresolved_source().matches(graph, n)) {
            return Ok(false);
        }

        let (relation, column_index_map) = match graph.operator(node)?.kind() {
            OperatorKind::MemorySource(src) => {
                let table = state
                    .relations
                    .get(&src.table)
                    .ok_or_else(|| CompilerError::lookup(PXL0100, format!("Table '{}' not found.", src.table)))?;
                select_columns(table, &src.table, src.select.as_deref())?
            }
            OperatorKind::UdtfSource(udtf) => {
                let relation = state
                    .functions
                    .table_function(&udtf.function)
                    .map_err(|e| CompilerError::lookup(PXL0105, e.to_string()))?;
                (relation.clone(), None)
            }
            OperatorKind::RemoteSource(remote) => {
                return Err(CompilerError::structural(
                    PXL0505,
                    format!("Remote source '{}' was created without a relation", remote.source_id),
                ));
            }
            _ => return Ok(false),
        };

        let op = graph.operator_mut(node)?;
        if let OperatorKind::MemorySource(src) = op.kind_mut() {
            src.column_index_map = column_index_map;
        }
        Ok(op.set_relation(relation))
    }
}

/// Project a table onto the select list, recording where each selected
/// column sits in the table
fn select_columns(
    table: &Relation,
    table_name: &str,
    select: Option<&[String]>,
) -> Result<(Relation, Option<Vec<usize>>), CompilerError> {
    let Some(select) = select else {
        return Ok((table.clone(), Some((0..table.len()).collect())));
    };
    let relation = table.select(select).map_err(|missing| {
        CompilerError::lookup(
            PXL0101,
            format!(
                "Columns {{{}}} are missing in table '{}'.",
                missing.join(", "),
                table_name
            ),
        )
    })?;
    let index_map = select.iter().filter_map(|name| table.column_index(name)).collect();
    Ok((relation, Some(index_map)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Fixture, cpu_relation, pos};
    use pretty_assertions::assert_eq;
    use pxl_diagnostics::{CompilerErrorGroup, ErrorKind, SourcePosition};
    use pxl_ir::operator::{MemorySource, RemoteSource, UdtfSource};
    use pxl_types::DataType;

    fn run(graph: &mut IrGraph, fx: &Fixture) -> CompilerErrorGroup {
        let mut errors = CompilerErrorGroup::new();
        SourceRelationRule.execute(graph, &fx.state(), &mut errors);
        errors
    }

    #[test]
    fn test_memory_source_full_table() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = g
            .add_operator(pos(1, 1), OperatorKind::MemorySource(MemorySource::new("cpu")), &[])
            .unwrap();

        assert!(run(&mut g, &fx).is_empty());
        let op = g.operator(src).unwrap();
        assert_eq!(op.relation(), Some(&cpu_relation()));
        let OperatorKind::MemorySource(ms) = op.kind() else {
            unreachable!()
        };
        assert_eq!(ms.column_index_map, Some(vec![0, 1, 2, 3, 4, 5]));
    }

    #[test]
    fn test_memory_source_select_keeps_select_order() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let src = g
            .add_operator(
                pos(1, 1),
                OperatorKind::MemorySource(MemorySource::new("cpu").with_select(["upid", "cpu0"])),
                &[],
            )
            .unwrap();

        assert!(run(&mut g, &fx).is_empty());
        let op = g.operator(src).unwrap();
        assert_eq!(
            op.relation(),
            Some(&Relation::from_columns([("upid", DataType::Uint128), ("cpu0", DataType::Float64)]))
        );
        let OperatorKind::MemorySource(ms) = op.kind() else {
            unreachable!()
        };
        assert_eq!(ms.column_index_map, Some(vec![3, 1]));
    }

    #[test]
    fn test_unknown_table_and_missing_columns() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        g.add_operator(pos(2, 5), OperatorKind::MemorySource(MemorySource::new("nope")), &[])
            .unwrap();
        g.add_operator(
            pos(3, 5),
            OperatorKind::MemorySource(MemorySource::new("cpu").with_select(["cpu0", "gpu", "disk"])),
            &[],
        )
        .unwrap();

        let errors = run(&mut g, &fx);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.count_kind(ErrorKind::Lookup), 2);
        assert_eq!(errors.errors()[0].message, "Table 'nope' not found.");
        assert_eq!(errors.errors()[0].position, Some(SourcePosition::new(2, 5)));
        assert_eq!(errors.errors()[1].message, "Columns {gpu, disk} are missing in table 'cpu'.");
    }

    #[test]
    fn test_udtf_and_remote_sources() {
        let fx = Fixture::new();
        let mut g = IrGraph::new();
        let udtf = g
            .add_operator(
                pos(1, 1),
                OperatorKind::UdtfSource(UdtfSource {
                    function: "GetAgentStatus".into(),
                }),
                &[],
            )
            .unwrap();
        g.add_operator(
            pos(4, 1),
            OperatorKind::UdtfSource(UdtfSource {
                function: "GetNothing".into(),
            }),
            &[],
        )
        .unwrap();
        let remote = g
            .add_operator_with_relation(
                pos(1, 1),
                OperatorKind::RemoteSource(RemoteSource {
                    source_id: "agent-1".into(),
                }),
                &[],
                cpu_relation(),
            )
            .unwrap();

        let errors = run(&mut g, &fx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.errors()[0].code, PXL0105);
        assert_eq!(g.operator(udtf).unwrap().relation().map(Relation::len), Some(2));
        assert_eq!(g.operator(remote).unwrap().relation(), Some(&cpu_relation()));
    }
}
