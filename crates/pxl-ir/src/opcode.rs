//! Operator opcodes carried by function expressions

use std::fmt;

/// Built-in operator an expression function was written with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,

    // Comparison
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanEqual,

    // Logical
    /// `and`
    LogicalAnd,
    /// `or`
    LogicalOr,
    /// `not`
    LogicalNot,

    // Unary arithmetic
    /// `-x`
    Negate,
}

impl Opcode {
    /// Name the function registry knows this operator by
    pub const fn registry_name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
            Self::Modulo => "modulo",
            Self::Equal => "equal",
            Self::NotEqual => "notEqual",
            Self::LessThan => "lessThan",
            Self::LessThanEqual => "lessThanEqual",
            Self::GreaterThan => "greaterThan",
            Self::GreaterThanEqual => "greaterThanEqual",
            Self::LogicalAnd => "logicalAnd",
            Self::LogicalOr => "logicalOr",
            Self::LogicalNot => "logicalNot",
            Self::Negate => "negate",
        }
    }

    /// Source-level spelling
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract | Self::Negate => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanEqual => ">=",
            Self::LogicalAnd => "and",
            Self::LogicalOr => "or",
            Self::LogicalNot => "not",
        }
    }

    /// Number of operands
    pub const fn arity(&self) -> usize {
        match self {
            Self::LogicalNot | Self::Negate => 1,
            _ => 2,
        }
    }

    /// Check if this is a comparison operator
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::LessThan
                | Self::LessThanEqual
                | Self::GreaterThan
                | Self::GreaterThanEqual
        )
    }

    /// Check if this is a logical operator
    pub const fn is_logical(&self) -> bool {
        matches!(self, Self::LogicalAnd | Self::LogicalOr | Self::LogicalNot)
    }

    /// Reverse lookup of [`Opcode::registry_name`]
    pub fn from_registry_name(name: &str) -> Option<Self> {
        ALL_OPCODES.iter().copied().find(|op| op.registry_name() == name)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

const ALL_OPCODES: [Opcode; 15] = [
    Opcode::Add,
    Opcode::Subtract,
    Opcode::Multiply,
    Opcode::Divide,
    Opcode::Modulo,
    Opcode::Equal,
    Opcode::NotEqual,
    Opcode::LessThan,
    Opcode::LessThanEqual,
    Opcode::GreaterThan,
    Opcode::GreaterThanEqual,
    Opcode::LogicalAnd,
    Opcode::LogicalOr,
    Opcode::LogicalNot,
    Opcode::Negate,
];
