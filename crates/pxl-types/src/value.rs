//! Literal scalar values

use crate::DataType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete scalar carried by a Data node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum ScalarValue {
    Boolean(bool),
    Int64(i64),
    Uint128(u128),
    Float64(f64),
    String(String),
    /// Nanoseconds since the Unix epoch
    Time64ns(i64),
    /// Span in nanoseconds
    Duration64ns(i64),
}

impl ScalarValue {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// The data type this value is pre-typed with
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int64(_) => DataType::Int64,
            Self::Uint128(_) => DataType::Uint128,
            Self::Float64(_) => DataType::Float64,
            Self::String(_) => DataType::String,
            Self::Time64ns(_) => DataType::Time64ns,
            Self::Duration64ns(_) => DataType::Duration64ns,
        }
    }

    /// Integer payload of Int64, Time64ns and Duration64ns values
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(v) | Self::Time64ns(v) | Self::Duration64ns(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Int64(v) => write!(f, "{}", v),
            Self::Uint128(v) => write!(f, "{}", v),
            Self::Float64(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "'{}'", v),
            Self::Time64ns(v) => write!(f, "{}ns", v),
            Self::Duration64ns(v) => write!(f, "{}ns", v),
        }
    }
}
