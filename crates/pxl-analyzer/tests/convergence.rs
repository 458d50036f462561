//! Fixed-point properties of rule batches and the full pipeline
//!
//! - resolution along a chain of length L converges within L + 1 passes
//! - a rule that never stops changing the graph ends in a convergence error
//! - identical inputs produce identical graphs and identical reports
//! - resolved types and relations are never unset by a later phase

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{Registries, increment_map, pos, reversed_chain, sink, source};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pxl_analyzer::rules::{DataTypeRule, OperatorRelationRule};
use pxl_analyzer::{Analyzer, CompilerState, Rule, RuleBatch, RuleResult};
use pxl_diagnostics::{CompilerErrorGroup, ErrorKind, PXL0400};
use pxl_ir::operator::{Filter, Limit};
use pxl_ir::pattern::any_operator;
use pxl_ir::{IrGraph, NodeId, Opcode, OperatorKind};

fn resolution_batch() -> RuleBatch {
    RuleBatch::new("IntermediateResolution", 100)
        .with_rule(DataTypeRule::new("_attr_"))
        .with_rule(OperatorRelationRule::new("_attr_"))
}

/// Bumps the limit of every Limit operator on every pass
struct NeverSettles {
    passes: Rc<Cell<usize>>,
}

impl Rule for NeverSettles {
    fn name(&self) -> &'static str {
        "NeverSettles"
    }

    fn apply(&self, graph: &mut IrGraph, node: NodeId, _state: &CompilerState<'_>) -> RuleResult {
        if node.index() == 0 {
            self.passes.set(self.passes.get() + 1);
        }
        let Ok(op) = graph.operator_mut(node) else {
            return Ok(false);
        };
        match op.kind_mut() {
            OperatorKind::Limit(limit) => {
                limit.limit += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// `process_stats | filter(cpu_ns > threshold) | map | sink`, or with a
/// non-boolean predicate when `broken`
fn pipeline_graph(maps: usize, threshold: i64, broken: bool) -> IrGraph {
    let mut g = IrGraph::new();
    let mut parent = source(&mut g, "process_stats");
    let col = g.add_column(pos(2, 8), "cpu_ns", 0);
    let predicate = if broken {
        col
    } else {
        let lit = g.add_int(pos(2, 17), threshold);
        g.add_opcode_func(pos(2, 8), Opcode::GreaterThan, &[col, lit]).unwrap()
    };
    parent = g
        .add_operator(pos(2, 1), OperatorKind::Filter(Filter { predicate }), &[parent])
        .unwrap();
    for i in 0..maps {
        let kind = increment_map(&mut g, i + 3, &format!("c{}", i), threshold);
        parent = g.add_operator(pos(i + 3, 1), kind, &[parent]).unwrap();
    }
    sink(&mut g, parent);
    g
}

#[test]
fn test_reversed_chain_needs_one_pass_per_link() {
    let reg = Registries::new();
    let relation = reg.relations.get("process_stats").cloned().unwrap();
    let mut g = IrGraph::new();
    let (_, out) = reversed_chain(&mut g, relation, 3);

    // 3 maps and the sink resolve one per pass, plus the confirming pass
    let passes = resolution_batch().execute(&mut g, &reg.state()).unwrap();
    assert_eq!(passes, 5);
    assert_eq!(g.operator(out).unwrap().relation().map(|r| r.len()), Some(7));
}

#[test]
fn test_runaway_rule_hits_default_ceiling() {
    let reg = Registries::new();
    let mut g = IrGraph::new();
    let src = source(&mut g, "process_stats");
    g.add_operator(pos(2, 1), OperatorKind::Limit(Limit { limit: 0 }), &[src])
        .unwrap();

    let passes = Rc::new(Cell::new(0));
    let batch = RuleBatch::new("IntermediateResolution", 100).with_rule(NeverSettles {
        passes: Rc::clone(&passes),
    });
    let errors = batch.execute(&mut g, &reg.state()).unwrap_err();

    assert_eq!(passes.get(), 100);
    assert_eq!(errors.len(), 1);
    assert!(errors.has_kind(ErrorKind::Convergence));
    assert_eq!(errors.errors()[0].code, PXL0400);
    assert_eq!(
        errors.errors()[0].message,
        "Reached max iterations (100) for rule batch 'IntermediateResolution'"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_chain_converges_within_length_plus_one(maps in 0usize..40) {
        let reg = Registries::new();
        let relation = reg.relations.get("process_stats").cloned().unwrap();
        let mut g = IrGraph::new();
        let (_, out) = reversed_chain(&mut g, relation, maps);

        let chain = maps + 1;
        let passes = resolution_batch().execute(&mut g, &reg.state()).unwrap();
        prop_assert!(passes <= chain + 1, "{} passes for a chain of {}", passes, chain);
        prop_assert_eq!(g.operator(out).unwrap().relation().map(|r| r.len()), Some(4 + maps));
    }

    #[test]
    fn prop_runaway_rule_stops_at_ceiling(ceiling in 1usize..=100) {
        let reg = Registries::new();
        let mut g = IrGraph::new();
        let src = source(&mut g, "process_stats");
        g.add_operator(pos(2, 1), OperatorKind::Limit(Limit { limit: 0 }), &[src])
            .unwrap();

        let passes = Rc::new(Cell::new(0));
        let batch = RuleBatch::new("runaway", ceiling).with_rule(NeverSettles { passes: Rc::clone(&passes) });
        let errors = batch.execute(&mut g, &reg.state()).unwrap_err();
        prop_assert_eq!(passes.get(), ceiling);
        prop_assert!(errors.has_kind(ErrorKind::Convergence));
    }

    #[test]
    fn prop_pipeline_is_deterministic(maps in 0usize..6, threshold in -1000i64..1000, broken in any::<bool>()) {
        let reg = Registries::new();
        let analyzer = Analyzer::default();

        let mut first = pipeline_graph(maps, threshold, broken);
        let mut second = pipeline_graph(maps, threshold, broken);
        let a: Result<(), CompilerErrorGroup> = analyzer.execute(&mut first, &reg.state());
        let b = analyzer.execute(&mut second, &reg.state());

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(a.is_err(), broken);
    }

    #[test]
    fn prop_resolution_is_monotonic(maps in 1usize..8) {
        let reg = Registries::new();
        let analyzer = Analyzer::default();
        let mut g = pipeline_graph(maps, 0, false);
        analyzer.execute(&mut g, &reg.state()).unwrap();

        // Every surviving operator and expression is still resolved at the end
        for id in g.find_all(&any_operator()) {
            prop_assert!(g.operator(id).unwrap().is_relation_init());
        }
        for id in g.expression_ids() {
            let expr = g.expression(id).unwrap();
            prop_assert!(expr.owner().is_none() || expr.is_resolved(), "{} unresolved", id);
        }
    }
}
