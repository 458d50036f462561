//! Column data types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type of a column or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Boolean,
    Int64,
    Uint128,
    Float64,
    String,
    /// Nanoseconds since the Unix epoch
    Time64ns,
    /// Signed span of nanoseconds
    Duration64ns,
}

impl DataType {
    /// Int64, Uint128 or Float64
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Uint128 | Self::Float64)
    }

    /// Time64ns or Duration64ns
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Time64ns | Self::Duration64ns)
    }

    /// Upper-case name used in messages and serialized schemas
    pub fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Int64 => "INT64",
            Self::Uint128 => "UINT128",
            Self::Float64 => "FLOAT64",
            Self::String => "STRING",
            Self::Time64ns => "TIME64NS",
            Self::Duration64ns => "DURATION64NS",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_names_match_display() {
        for ty in [DataType::Boolean, DataType::Time64ns, DataType::Uint128] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty));
        }
    }

    #[test]
    fn test_categories() {
        assert!(DataType::Float64.is_numeric());
        assert!(!DataType::String.is_numeric());
        assert!(DataType::Duration64ns.is_temporal());
        assert!(!DataType::Int64.is_temporal());
    }
}
