//! Compile-time-evaluable classifier
//!
//! A deliberately narrow heuristic, not constant folding: a function call
//! is compile-time evaluable when it is
//! - `now()` with no arguments
//! - a unit-time constructor such as `minutes(2)` taking one integer
//! - `add`, `subtract` or `multiply` over integer, time and duration
//!   literals or other compile-time calls
//!
//! Anything touching a column is run-time.

use pxl_types::ScalarValue;

use super::Pattern;
use crate::expression::{ExpressionKind, Func};
use crate::{IrGraph, IrNode, Opcode};

/// Name of the current-time function
pub const TIME_NOW_FN: &str = "now";

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;

/// Unit-time constructors and the span of one unit in nanoseconds
pub const UNIT_TIME_FNS: [(&str, i64); 6] = [
    ("days", 24 * NANOS_PER_HOUR),
    ("hours", NANOS_PER_HOUR),
    ("minutes", NANOS_PER_MINUTE),
    ("seconds", NANOS_PER_SECOND),
    ("milliseconds", NANOS_PER_MILLI),
    ("microseconds", NANOS_PER_MICRO),
];

/// Nanoseconds in one unit of a unit-time constructor
pub fn unit_duration_ns(name: &str) -> Option<i64> {
    UNIT_TIME_FNS
        .iter()
        .find(|(unit, _)| *unit == name)
        .map(|(_, nanos)| *nanos)
}

const INTEGER_ARITHMETIC: [Opcode; 3] = [Opcode::Add, Opcode::Subtract, Opcode::Multiply];

/// Whether `name` is one of the integer arithmetic functions
pub fn is_integer_arithmetic(name: &str) -> bool {
    INTEGER_ARITHMETIC.iter().any(|op| op.registry_name() == name)
}

fn as_func(node: &IrNode) -> Option<&Func> {
    match node.expression_kind() {
        Some(ExpressionKind::Func(func)) => Some(func),
        _ => None,
    }
}

fn integral_literal(node: &IrNode) -> bool {
    matches!(
        node.expression_kind(),
        Some(ExpressionKind::Data(
            ScalarValue::Int64(_) | ScalarValue::Time64ns(_) | ScalarValue::Duration64ns(_)
        ))
    )
}

/// `now()`
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileTimeNow;

impl Pattern for CompileTimeNow {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        as_func(node).is_some_and(|f| f.name == TIME_NOW_FN && f.args.is_empty())
    }
}

/// `minutes(2)` and friends
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileTimeUnitTime;

impl Pattern for CompileTimeUnitTime {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(func) = as_func(node) else {
            return false;
        };
        if unit_duration_ns(&func.name).is_none() {
            return false;
        }
        let [arg] = func.args.as_slice() else {
            return false;
        };
        graph.node(*arg).is_some_and(|arg| {
            matches!(arg.expression_kind(), Some(ExpressionKind::Data(ScalarValue::Int64(_))))
                || CompileTimeFunc { compile_time: true }.matches(graph, arg)
        })
    }
}

/// `add`, `subtract` or `multiply` over compile-time operands
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileTimeIntegerArithmetic;

impl Pattern for CompileTimeIntegerArithmetic {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(func) = as_func(node) else {
            return false;
        };
        if !is_integer_arithmetic(&func.name) || func.args.is_empty() {
            return false;
        }
        func.args.iter().all(|&id| {
            graph.node(id).is_some_and(|arg| {
                integral_literal(arg) || CompileTimeFunc { compile_time: true }.matches(graph, arg)
            })
        })
    }
}

/// Function call that is (or is not) compile-time evaluable
#[derive(Debug, Clone, Copy)]
pub struct CompileTimeFunc {
    compile_time: bool,
}

impl Pattern for CompileTimeFunc {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        if as_func(node).is_none() {
            return false;
        }
        let is_compile_time = CompileTimeNow.matches(graph, node)
            || CompileTimeUnitTime.matches(graph, node)
            || CompileTimeIntegerArithmetic.matches(graph, node);
        is_compile_time == self.compile_time
    }
}

/// Function with a compile-time call somewhere among its arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainsCompileTimeFunc;

impl Pattern for ContainsCompileTimeFunc {
    fn matches(&self, graph: &IrGraph, node: &IrNode) -> bool {
        let Some(func) = as_func(node) else {
            return false;
        };
        func.args.iter().any(|&id| {
            graph.node(id).is_some_and(|arg| {
                CompileTimeFunc { compile_time: true }.matches(graph, arg) || self.matches(graph, arg)
            })
        })
    }
}

pub fn compile_time_now() -> CompileTimeNow {
    CompileTimeNow
}

pub fn compile_time_unit_time() -> CompileTimeUnitTime {
    CompileTimeUnitTime
}

pub fn compile_time_integer_arithmetic() -> CompileTimeIntegerArithmetic {
    CompileTimeIntegerArithmetic
}

pub fn compile_time_func() -> CompileTimeFunc {
    CompileTimeFunc { compile_time: true }
}

pub fn run_time_func() -> CompileTimeFunc {
    CompileTimeFunc { compile_time: false }
}

pub fn contains_compile_time_func() -> ContainsCompileTimeFunc {
    ContainsCompileTimeFunc
}

/// Whether the node can be folded to a constant before planning
pub fn is_compile_time_evaluable(graph: &IrGraph, node: &IrNode) -> bool {
    compile_time_func().matches(graph, node)
}
