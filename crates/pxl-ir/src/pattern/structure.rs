//! Structural patterns: binary operators, argument quantifiers and
//! operator chains

use super::Pattern;
use crate::expression::{ExpressionKind, Func};
use crate::{IrGraph, IrNode, NodeId, Opcode};

fn as_func(node: &IrNode) -> Option<&Func> {
    match node.expression_kind() {
        Some(ExpressionKind::Func(func)) => Some(func),
        _ => None,
    }
}

/// Two-argument function with an optional opcode
///
/// The left pattern is always tried against the first argument first.
/// A commutative matcher then tries the swapped assignment once.
#[derive(Debug, Clone, Copy)]
pub struct BinaryOpMatch<L, R> {
    opcode: Option<Opcode>,
    commutative: bool,
    left: L,
    right: R,
}

impl<L: Pattern, R: Pattern> Pattern for BinaryOpMatch<L, R> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(func) = as_func(node) else {
            return false;
        };
        if self.opcode.is_some() && func.opcode != self.opcode {
            return false;
        }
        let [a0, a1] = func.args.as_slice() else {
            return false;
        };
        let (Some(a0), Some(a1)) = (graph.node(*a0), graph.node(*a1)) else {
            return false;
        };

        (self.left.matches(graph, a0) && self.right.matches(graph, a1))
            || (self.commutative && self.left.matches(graph, a1) && self.right.matches(graph, a0))
    }
}

fn binary<L: Pattern, R: Pattern>(opcode: Opcode, commutative: bool, left: L, right: R) -> BinaryOpMatch<L, R> {
    BinaryOpMatch {
        opcode: Some(opcode),
        commutative,
        left,
        right,
    }
}

/// `left == right` in either order
pub fn equals<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::Equal, true, left, right)
}

/// `left + right` in either order
pub fn add<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::Add, true, left, right)
}

/// `left * right` in either order
pub fn multiply<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::Multiply, true, left, right)
}

/// `left and right` in either order
pub fn logical_and<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::LogicalAnd, true, left, right)
}

/// `left or right` in either order
pub fn logical_or<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::LogicalOr, true, left, right)
}

/// `left - right`
pub fn subtract<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::Subtract, false, left, right)
}

/// `left < right`
pub fn less_than<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::LessThan, false, left, right)
}

/// `left % right`
pub fn modulo<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    binary(Opcode::Modulo, false, left, right)
}

/// Any two-argument function, arguments in order
pub fn bin_op<L: Pattern, R: Pattern>(left: L, right: R) -> BinaryOpMatch<L, R> {
    BinaryOpMatch {
        opcode: None,
        commutative: false,
        left,
        right,
    }
}

/// How many arguments must satisfy the argument pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// At least one
    Any,
    /// Every argument; vacuously true without arguments
    All,
}

/// Function whose arguments satisfy a pattern, optionally filtered by the
/// function's name, opcode, resolution state and compile-time-ness
#[derive(Debug, Clone)]
pub struct FuncArgsMatch<P> {
    quantifier: Quantifier,
    arg: P,
    name: Option<String>,
    opcode: Option<Opcode>,
    resolved: Option<bool>,
    compile_time: Option<bool>,
}

impl<P> FuncArgsMatch<P> {
    fn new(quantifier: Quantifier, arg: P) -> Self {
        Self {
            quantifier,
            arg,
            name: None,
            opcode: None,
            resolved: None,
            compile_time: None,
        }
    }

    /// Only functions with this registry name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only functions written with this operator
    pub fn with_opcode(mut self, opcode: Opcode) -> Self {
        self.opcode = Some(opcode);
        self
    }

    /// Only functions in this resolution state
    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = Some(resolved);
        self
    }

    /// Only compile-time (`true`) or run-time (`false`) functions
    pub fn compile_time(mut self, compile_time: bool) -> Self {
        self.compile_time = Some(compile_time);
        self
    }
}

impl<P: Pattern> Pattern for FuncArgsMatch<P> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(func) = as_func(node) else {
            return false;
        };
        if self.name.as_ref().is_some_and(|name| *name != func.name) {
            return false;
        }
        if self.opcode.is_some() && func.opcode != self.opcode {
            return false;
        }
        if let Some(resolved) = self.resolved {
            let is_resolved = node.as_expression().is_some_and(|e| e.is_resolved());
            if is_resolved != resolved {
                return false;
            }
        }
        if let Some(compile_time) = self.compile_time {
            if super::compile_time_func().matches(graph, node) != compile_time {
                return false;
            }
        }

        let arg_matches = |id: &NodeId| graph.node(*id).is_some_and(|arg| self.arg.matches(graph, arg));
        match self.quantifier {
            Quantifier::Any => func.args.iter().any(arg_matches),
            Quantifier::All => func.args.iter().all(arg_matches),
        }
    }
}

/// Any function all of whose arguments match
pub fn func_all_args<P: Pattern>(arg: P) -> FuncArgsMatch<P> {
    FuncArgsMatch::new(Quantifier::All, arg)
}

/// Run-time function with at least one matching argument
pub fn func_any_arg<P: Pattern>(arg: P) -> FuncArgsMatch<P> {
    FuncArgsMatch::new(Quantifier::Any, arg).compile_time(false)
}

/// Function `name` all of whose arguments match
pub fn func_named_all_args<P: Pattern>(name: impl Into<String>, arg: P) -> FuncArgsMatch<P> {
    func_all_args(arg).named(name)
}

/// Unresolved run-time function all of whose arguments match
pub fn unresolved_rt_func_all_args<P: Pattern>(arg: P) -> FuncArgsMatch<P> {
    func_all_args(arg).resolved(false).compile_time(false)
}

/// `and` call all of whose arguments match
pub fn logical_and_all_args<P: Pattern>(arg: P) -> FuncArgsMatch<P> {
    func_all_args(arg).with_opcode(Opcode::LogicalAnd)
}

/// Operator with exactly one child, where the operator matches `parent`
/// and that child matches `child`
#[derive(Debug, Clone, Copy)]
pub struct OperatorChainMatch<P, C> {
    parent: P,
    child: C,
}

impl<P: Pattern, C: Pattern> Pattern for OperatorChainMatch<P, C> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(op) = node.as_operator() else {
            return false;
        };
        let [child] = op.children() else {
            return false;
        };
        self.parent.matches(graph, node)
            && graph
                .node(*child)
                .is_some_and(|child| self.child.matches(graph, child))
    }
}

pub fn operator_chain<P: Pattern, C: Pattern>(parent: P, child: C) -> OperatorChainMatch<P, C> {
    OperatorChainMatch { parent, child }
}

/// Operator matching `op` whose parents all match `parent`
#[derive(Debug, Clone, Copy)]
pub struct OperatorWithParentsMatch<O, P> {
    op: O,
    parent: P,
}

impl<O: Pattern, P: Pattern> Pattern for OperatorWithParentsMatch<O, P> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(op) = node.as_operator() else {
            return false;
        };
        self.op.matches(graph, node)
            && op
                .parents()
                .iter()
                .all(|&p| graph.node(p).is_some_and(|parent| self.parent.matches(graph, parent)))
    }
}

pub fn operator_with_parents<O: Pattern, P: Pattern>(op: O, parent: P) -> OperatorWithParentsMatch<O, P> {
    OperatorWithParentsMatch { op, parent }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{BlockingAgg, GroupBy, MemorySource, OperatorKind};
    use crate::pattern::{blocking_agg, column, column_named, group_by, int, int_value, string, value};
    use pxl_diagnostics::SourcePosition;

    fn pos() -> SourcePosition {
        SourcePosition::default()
    }

    #[test]
    fn test_commutative_equal_matches_both_orders() {
        let mut g = IrGraph::new();
        let col = g.add_column(pos(), "service", 0);
        let lit = g.add_string(pos(), "pl/vizier");
        let forward = g.add_opcode_func(pos(), Opcode::Equal, &[col, lit]).unwrap();
        let col2 = g.add_column(pos(), "service", 0);
        let lit2 = g.add_string(pos(), "pl/vizier");
        let backward = g.add_opcode_func(pos(), Opcode::Equal, &[lit2, col2]).unwrap();

        let p = equals(column(), string());
        assert!(p.matches(&g, g.node(forward).unwrap()));
        assert!(p.matches(&g, g.node(backward).unwrap()));
        assert!(!equals(int(), string()).matches(&g, g.node(forward).unwrap()));
    }

    #[test]
    fn test_ordered_ops_do_not_swap() {
        let mut g = IrGraph::new();
        let a = g.add_int(pos(), 1);
        let b = g.add_column(pos(), "x", 0);
        let sub = g.add_opcode_func(pos(), Opcode::Subtract, &[a, b]).unwrap();
        let node = g.node(sub).unwrap();

        assert!(subtract(int(), column()).matches(&g, node));
        assert!(!subtract(column(), int()).matches(&g, node));
        assert!(bin_op(int_value(1), column_named("x")).matches(&g, node));
        assert!(!equals(int(), column()).matches(&g, node));
    }

    #[test]
    fn test_argument_quantifiers() {
        let mut g = IrGraph::new();
        let a = g.add_int(pos(), 1);
        let b = g.add_int(pos(), 2);
        let c = g.add_column(pos(), "x", 0);
        let all_ints = g.add_func(pos(), "max", &[a, b]).unwrap();
        let mixed = g.add_func(pos(), "max", &[c]).unwrap();
        let nullary = g.add_func(pos(), "pi", &[]).unwrap();

        let node = |id| g.node(id).unwrap();
        assert!(func_all_args(int()).matches(&g, node(all_ints)));
        assert!(!func_all_args(int()).matches(&g, node(mixed)));
        assert!(func_all_args(int()).matches(&g, node(nullary)));
        assert!(!func_any_arg(int()).matches(&g, node(nullary)));
        assert!(func_any_arg(column()).matches(&g, node(mixed)));
        assert!(func_named_all_args("max", value()).matches(&g, node(mixed)));
        assert!(!func_named_all_args("min", value()).matches(&g, node(mixed)));
        assert!(unresolved_rt_func_all_args(int()).matches(&g, node(all_ints)));
        assert!(!logical_and_all_args(value()).matches(&g, node(all_ints)));
    }

    #[test]
    fn test_operator_chain_requires_single_child() {
        let mut g = IrGraph::new();
        let src = g
            .add_operator(pos(), OperatorKind::MemorySource(MemorySource::new("cpu")), &[])
            .unwrap();
        let group = g.add_column(pos(), "service", 0);
        let gb = g
            .add_operator(pos(), OperatorKind::GroupBy(GroupBy { groups: vec![group] }), &[src])
            .unwrap();
        let agg = g
            .add_operator(pos(), OperatorKind::BlockingAgg(BlockingAgg::default()), &[gb])
            .unwrap();

        let p = operator_chain(group_by(), blocking_agg());
        assert!(p.matches(&g, g.node(gb).unwrap()));
        assert!(!p.matches(&g, g.node(src).unwrap()));
        assert!(operator_with_parents(blocking_agg(), group_by()).matches(&g, g.node(agg).unwrap()));
        assert!(!operator_with_parents(group_by(), group_by()).matches(&g, g.node(gb).unwrap()));

        g.add_operator(pos(), OperatorKind::BlockingAgg(BlockingAgg::default()), &[gb])
            .unwrap();
        assert!(!p.matches(&g, g.node(gb).unwrap()));
    }
}
