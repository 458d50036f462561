//! Compile-time evaluation of time arithmetic
//!
//! Only the narrow subset recognized by
//! [`is_compile_time_evaluable`](pxl_ir::pattern::is_compile_time_evaluable)
//! is folded: `now()`, unit-time constructors and integer arithmetic over
//! them. Everything else is left to the execution engine.

use pxl_diagnostics::{CompilerError, PXL0306};
use pxl_ir::pattern::{TIME_NOW_FN, is_compile_time_evaluable, unit_duration_ns};
use pxl_ir::{ExpressionKind, IrGraph, NodeId, Opcode};
use pxl_types::ScalarValue;

use crate::CompilerState;

/// Evaluates expressions that do not depend on any row
pub trait CompileTimeFolder {
    /// Whether [`fold`](Self::fold) can evaluate the expression
    fn can_fold(&self, graph: &IrGraph, expr: NodeId) -> bool {
        graph
            .node(expr)
            .is_some_and(|node| is_compile_time_evaluable(graph, node))
    }

    /// Evaluate the expression tree rooted at `expr` to a single value
    fn fold(&self, graph: &IrGraph, expr: NodeId, state: &CompilerState<'_>) -> Result<ScalarValue, CompilerError>;
}

/// Folds `now()`, unit-time constructors and add/subtract/multiply
///
/// Result types follow the operands: anything involving a time is a time,
/// otherwise anything involving a duration is a duration, otherwise an
/// integer. `time - time` is a duration.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeArithmeticFolder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Int,
    Duration,
    Time,
}

impl Unit {
    fn of(value: &ScalarValue) -> Option<Self> {
        match value {
            ScalarValue::Int64(_) => Some(Self::Int),
            ScalarValue::Duration64ns(_) => Some(Self::Duration),
            ScalarValue::Time64ns(_) => Some(Self::Time),
            _ => None,
        }
    }

    fn wrap(self, v: i64) -> ScalarValue {
        match self {
            Self::Int => ScalarValue::Int64(v),
            Self::Duration => ScalarValue::Duration64ns(v),
            Self::Time => ScalarValue::Time64ns(v),
        }
    }
}

fn not_foldable(what: impl std::fmt::Display) -> CompilerError {
    CompilerError::argument(PXL0306, format!("{} cannot be evaluated at compile time", what))
}

fn overflow(name: &str) -> CompilerError {
    CompilerError::argument(PXL0306, format!("Overflow while evaluating '{}' at compile time", name))
}

impl TimeArithmeticFolder {
    fn eval(&self, graph: &IrGraph, expr: NodeId, state: &CompilerState<'_>) -> Result<(Unit, i64), CompilerError> {
        let node = graph.expression(expr)?;
        let func = match node.kind() {
            ExpressionKind::Data(value) => {
                return match (Unit::of(value), value.as_i64()) {
                    (Some(unit), Some(v)) => Ok((unit, v)),
                    _ => Err(not_foldable(format!("Literal {}", value))),
                };
            }
            ExpressionKind::Func(func) => func,
            other => return Err(not_foldable(other.node_type())),
        };

        if func.name == TIME_NOW_FN {
            if !func.args.is_empty() {
                return Err(not_foldable(format!("'{}' with arguments", TIME_NOW_FN)));
            }
            return Ok((Unit::Time, state.time_now_ns()));
        }

        if let Some(unit_ns) = unit_duration_ns(&func.name) {
            let [arg] = func.args.as_slice() else {
                return Err(not_foldable(format!("'{}' without exactly one argument", func.name)));
            };
            let (_, count) = self.eval(graph, *arg, state)?;
            let nanos = count.checked_mul(unit_ns).ok_or_else(|| overflow(&func.name))?;
            return Ok((Unit::Duration, nanos));
        }

        let opcode = Opcode::from_registry_name(&func.name)
            .filter(|op| matches!(op, Opcode::Add | Opcode::Subtract | Opcode::Multiply))
            .ok_or_else(|| not_foldable(format!("Function '{}'", func.name)))?;

        let mut operands = func.args.iter();
        let first = operands
            .next()
            .ok_or_else(|| not_foldable(format!("'{}' without arguments", func.name)))?;
        let (mut unit, mut acc) = self.eval(graph, *first, state)?;
        for &arg in operands {
            let (rhs_unit, rhs) = self.eval(graph, arg, state)?;
            acc = match opcode {
                Opcode::Add => acc.checked_add(rhs),
                Opcode::Subtract => acc.checked_sub(rhs),
                _ => acc.checked_mul(rhs),
            }
            .ok_or_else(|| overflow(&func.name))?;
            unit = if opcode == Opcode::Subtract && unit == Unit::Time && rhs_unit == Unit::Time {
                Unit::Duration
            } else {
                unit.max(rhs_unit)
            };
        }
        Ok((unit, acc))
    }
}

impl CompileTimeFolder for TimeArithmeticFolder {
    fn fold(&self, graph: &IrGraph, expr: NodeId, state: &CompilerState<'_>) -> Result<ScalarValue, CompilerError> {
        let (unit, value) = self.eval(graph, expr, state)?;
        Ok(unit.wrap(value))
    }
}
