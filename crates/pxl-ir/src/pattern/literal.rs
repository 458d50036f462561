//! Literal patterns
//!
//! Each matcher accepts any literal of its kind, or only one value when
//! built with the `*_value` constructor. Floats compare within
//! `f64::EPSILON`.

use pxl_types::ScalarValue;

use super::Pattern;
use crate::{IrGraph, IrNode};

fn literal(node: &IrNode) -> Option<&ScalarValue> {
    node.as_expression().and_then(|expr| expr.as_data())
}

/// Integer literal
#[derive(Debug, Clone, Copy, Default)]
pub struct IntMatch(Option<i64>);

impl Pattern for IntMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::Int64(v)) => self.0.is_none_or(|expected| *v == expected),
            _ => false,
        }
    }
}

/// String literal
#[derive(Debug, Clone, Default)]
pub struct StringMatch(Option<String>);

impl Pattern for StringMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::String(v)) => self.0.as_ref().is_none_or(|expected| v == expected),
            _ => false,
        }
    }
}

/// Boolean literal
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolMatch(Option<bool>);

impl Pattern for BoolMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::Boolean(v)) => self.0.is_none_or(|expected| *v == expected),
            _ => false,
        }
    }
}

/// Float literal
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatMatch(Option<f64>);

impl Pattern for FloatMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::Float64(v)) => self
                .0
                .is_none_or(|expected| (v - expected).abs() < f64::EPSILON),
            _ => false,
        }
    }
}

/// Timestamp literal
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeMatch(Option<i64>);

impl Pattern for TimeMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::Time64ns(v)) => self.0.is_none_or(|expected| *v == expected),
            _ => false,
        }
    }
}

/// Duration literal
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationMatch(Option<i64>);

impl Pattern for DurationMatch {
    fn matches(&self, _graph: &IrGraph, node: &IrNode) -> bool {
        match literal(node) {
            Some(ScalarValue::Duration64ns(v)) => self.0.is_none_or(|expected| *v == expected),
            _ => false,
        }
    }
}

pub fn int() -> IntMatch {
    IntMatch(None)
}

pub fn int_value(value: i64) -> IntMatch {
    IntMatch(Some(value))
}

pub fn string() -> StringMatch {
    StringMatch(None)
}

pub fn string_value(value: impl Into<String>) -> StringMatch {
    StringMatch(Some(value.into()))
}

pub fn boolean() -> BoolMatch {
    BoolMatch(None)
}

pub fn bool_value(value: bool) -> BoolMatch {
    BoolMatch(Some(value))
}

pub fn float() -> FloatMatch {
    FloatMatch(None)
}

pub fn float_value(value: f64) -> FloatMatch {
    FloatMatch(Some(value))
}

pub fn time() -> TimeMatch {
    TimeMatch(None)
}

pub fn time_value(nanos: i64) -> TimeMatch {
    TimeMatch(Some(nanos))
}

pub fn duration() -> DurationMatch {
    DurationMatch(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pxl_diagnostics::SourcePosition;
    use rstest::rstest;

    #[rstest]
    #[case(0.1 + 0.2, 0.3, true)]
    #[case(1.0, 1.0 + 1e-9, false)]
    #[case(-2.5, -2.5, true)]
    fn test_float_value_uses_epsilon(#[case] literal: f64, #[case] expected: f64, #[case] hit: bool) {
        let mut g = IrGraph::new();
        let id = g.add_float(SourcePosition::default(), literal);
        assert_eq!(float_value(expected).matches(&g, g.node(id).unwrap()), hit);
    }

    #[test]
    fn test_value_and_kind_matchers() {
        let mut g = IrGraph::new();
        let p = SourcePosition::default();
        let five = g.add_int(p, 5);
        let name = g.add_string(p, "pl/agent");
        let yes = g.add_bool(p, true);

        let node = |id| g.node(id).unwrap();
        assert!(int().matches(&g, node(five)));
        assert!(int_value(5).matches(&g, node(five)));
        assert!(!int_value(6).matches(&g, node(five)));
        assert!(!int().matches(&g, node(name)));
        assert!(string_value("pl/agent").matches(&g, node(name)));
        assert!(!string_value("pl").matches(&g, node(name)));
        assert!(bool_value(true).matches(&g, node(yes)));
        assert!(!boolean().matches(&g, node(five)));
        assert!(!float().matches(&g, node(five)));
    }
}
