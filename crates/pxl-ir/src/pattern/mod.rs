//! Structural pattern matching over IR nodes
//!
//! Patterns are small, pure predicates that recognize a node's kind, value,
//! resolution state or surrounding shape. They compose with [`Pattern::and`],
//! [`Pattern::or`] and [`Pattern::not`], which short-circuit left to right,
//! so a rule can state what it is looking for instead of switching on node
//! types by hand:
//!
//! ```
//! use pxl_ir::pattern::{equals, metadata_expression, string, Pattern};
//!
//! // `metadata == "literal"` in either operand order
//! let p = equals(metadata_expression(), string());
//! # let _ = p;
//! ```
//!
//! Every pattern borrows the node and graph only for the duration of the
//! call and never mutates them.
//!
//! Pattern families:
//! - [`kind`]: node-kind equality and named unions of kinds
//! - [`literal`]: literal kinds, optionally with a specific value
//! - [`expression`]: resolution state, data types, columns and functions
//! - [`structure`]: binary operators, argument quantifiers, operator chains
//! - [`operator`]: operator state such as relation readiness or join type
//! - [`compile_time`]: the compile-time-evaluable classifier

pub mod compile_time;
pub mod expression;
pub mod kind;
pub mod literal;
pub mod operator;
pub mod structure;

pub use compile_time::*;
pub use expression::*;
pub use kind::*;
pub use literal::*;
pub use operator::*;
pub use structure::*;

use crate::{IrGraph, IrNode, NodeId};

/// A pure predicate over a node in its graph
pub trait Pattern {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool;

    /// Both patterns match
    fn and<P: Pattern>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And(self, other)
    }

    /// Either pattern matches, `self` tried first
    fn or<P: Pattern>(self, other: P) -> Or<Self, P>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    /// The pattern does not match
    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

impl<P: Pattern + ?Sized> Pattern for &P {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        (**self).matches(graph, node)
    }
}

impl<P: Pattern + ?Sized> Pattern for Box<P> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        (**self).matches(graph, node)
    }
}

/// Check `node` against `pattern`
pub fn matches<P: Pattern + ?Sized>(graph: &IrGraph, node: &IrNode, pattern: &P) -> bool {
    pattern.matches(graph, node)
}

/// Check the node with id `id` against `pattern`; false if the node is gone
pub fn matches_id<P: Pattern + ?Sized>(graph: &IrGraph, id: NodeId, pattern: &P) -> bool {
    graph.node(id).is_some_and(|node| pattern.matches(graph, node))
}

/// Conjunction
#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(pub A, pub B);

impl<A: Pattern, B: Pattern> Pattern for And<A, B> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        self.0.matches(graph, node) && self.1.matches(graph, node)
    }
}

/// Disjunction
#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(pub A, pub B);

impl<A: Pattern, B: Pattern> Pattern for Or<A, B> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        self.0.matches(graph, node) || self.1.matches(graph, node)
    }
}

/// Negation
#[derive(Debug, Clone, Copy)]
pub struct Not<A>(pub A);

impl<A: Pattern> Pattern for Not<A> {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        !self.0.matches(graph, node)
    }
}

/// Matches every node
#[derive(Debug, Clone, Copy, Default)]
pub struct Value;

impl Pattern for Value {
    fn matches(&self, _graph: &IrGraph, _node: &IrNode) -> bool {
        true
    }
}

/// Matches any node
pub fn value() -> Value {
    Value
}

/// Pattern backed by a closure
#[derive(Debug, Clone, Copy)]
pub struct FnPattern<F>(F);

impl<F> Pattern for FnPattern<F>
where
    F: Fn(&IrGraph, &IrNode) -> bool,
{
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        (self.0)(graph, node)
    }
}

/// Lift a closure into a pattern
pub fn pattern_fn<F>(f: F) -> FnPattern<F>
where
    F: Fn(&IrGraph, &IrNode) -> bool,
{
    FnPattern(f)
}
