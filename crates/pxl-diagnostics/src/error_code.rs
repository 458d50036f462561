//! Analyzer error codes following a structured numbering system
//!
//! Error code ranges:
//! - PXL0100-PXL0199: Lookup errors (unknown table, column, metadata key, function)
//! - PXL0200-PXL0299: Type errors (operand/result mismatch, non-boolean predicate)
//! - PXL0300-PXL0399: Argument errors (missing, unexpected or malformed arguments)
//! - PXL0400-PXL0499: Convergence errors (rule batch exceeded its pass ceiling)
//! - PXL0500-PXL0599: Structural errors (violated graph invariants)
//! - PXL0600-PXL0699: Configuration errors (invalid analyzer settings)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error taxonomy of the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Unknown table, column, metadata key or function signature
    Lookup,
    /// Operand/result mismatch, non-boolean predicate, wrong literal type
    Type,
    /// Missing, unexpected or malformed argument
    Argument,
    /// A phase failed to reach a fixed point within its ceiling
    Convergence,
    /// Violated graph invariant
    Structural,
    /// Invalid analyzer settings, raised before any rule runs
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lookup => write!(f, "lookup error"),
            ErrorKind::Type => write!(f, "type error"),
            ErrorKind::Argument => write!(f, "argument error"),
            ErrorKind::Convergence => write!(f, "convergence error"),
            ErrorKind::Structural => write!(f, "structural error"),
            ErrorKind::Configuration => write!(f, "configuration error"),
        }
    }
}

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Taxonomy bucket of this code
    pub const fn kind(&self) -> ErrorKind {
        match self.0 {
            100..200 => ErrorKind::Lookup,
            200..300 => ErrorKind::Type,
            300..400 => ErrorKind::Argument,
            400..500 => ErrorKind::Convergence,
            600..700 => ErrorKind::Configuration,
            _ => ErrorKind::Structural,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PXL{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

// Lookup errors
pub const PXL0100: ErrorCode = ErrorCode::new(100);
pub const PXL0101: ErrorCode = ErrorCode::new(101);
pub const PXL0102: ErrorCode = ErrorCode::new(102);
pub const PXL0103: ErrorCode = ErrorCode::new(103);
pub const PXL0104: ErrorCode = ErrorCode::new(104);
pub const PXL0105: ErrorCode = ErrorCode::new(105);
pub const PXL0106: ErrorCode = ErrorCode::new(106);

// Type errors
pub const PXL0200: ErrorCode = ErrorCode::new(200);
pub const PXL0201: ErrorCode = ErrorCode::new(201);
pub const PXL0202: ErrorCode = ErrorCode::new(202);
pub const PXL0203: ErrorCode = ErrorCode::new(203);
pub const PXL0204: ErrorCode = ErrorCode::new(204);
pub const PXL0205: ErrorCode = ErrorCode::new(205);

// Argument errors
pub const PXL0300: ErrorCode = ErrorCode::new(300);
pub const PXL0301: ErrorCode = ErrorCode::new(301);
pub const PXL0302: ErrorCode = ErrorCode::new(302);
pub const PXL0303: ErrorCode = ErrorCode::new(303);
pub const PXL0304: ErrorCode = ErrorCode::new(304);
pub const PXL0305: ErrorCode = ErrorCode::new(305);
pub const PXL0306: ErrorCode = ErrorCode::new(306);
pub const PXL0307: ErrorCode = ErrorCode::new(307);

// Convergence errors
pub const PXL0400: ErrorCode = ErrorCode::new(400);

// Structural errors
pub const PXL0500: ErrorCode = ErrorCode::new(500);
pub const PXL0501: ErrorCode = ErrorCode::new(501);
pub const PXL0502: ErrorCode = ErrorCode::new(502);
pub const PXL0503: ErrorCode = ErrorCode::new(503);
pub const PXL0504: ErrorCode = ErrorCode::new(504);
pub const PXL0505: ErrorCode = ErrorCode::new(505);

// Configuration errors
pub const PXL0600: ErrorCode = ErrorCode::new(600);

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Lookup errors (0100-0199)
    map.insert(100, ErrorInfo::new("Table not found")
        .with_help("Check the table name against the schemas available to the query"));
    map.insert(101, ErrorInfo::new("Selected column missing from table"));
    map.insert(102, ErrorInfo::new("Column not found in parent dataframe"));
    map.insert(103, ErrorInfo::new("Unknown metadata key"));
    map.insert(104, ErrorInfo::new("Unknown function"));
    map.insert(105, ErrorInfo::new("Unknown table function"));
    map.insert(106, ErrorInfo::new("Metadata cannot be derived from parent columns")
        .with_help("The parent dataframe needs one of the metadata key columns, e.g. 'upid'"));

    // Type errors (0200-0299)
    map.insert(200, ErrorInfo::new("Type mismatch"));
    map.insert(201, ErrorInfo::new("Filter predicate is not boolean"));
    map.insert(202, ErrorInfo::new("No matching function overload"));
    map.insert(203, ErrorInfo::new("Wrong literal type for argument"));
    map.insert(204, ErrorInfo::new("Schema disagreement between parents"));
    map.insert(205, ErrorInfo::new("Expected aggregate function"));

    // Argument errors (0300-0399)
    map.insert(300, ErrorInfo::new("Missing required argument"));
    map.insert(301, ErrorInfo::new("Unexpected argument"));
    map.insert(302, ErrorInfo::new("Wrong number of arguments"));
    map.insert(303, ErrorInfo::new("Unsupported join type"));
    map.insert(304, ErrorInfo::new("Reserved column name")
        .with_help("Column names starting with the metadata prefix are reserved"));
    map.insert(305, ErrorInfo::new("Malformed metadata value"));
    map.insert(306, ErrorInfo::new("Expression cannot be evaluated at compile time"));
    map.insert(307, ErrorInfo::new("Duplicate output column name")
        .with_help("Every output column of an operator needs a distinct name"));

    // Convergence errors (0400-0499)
    map.insert(400, ErrorInfo::new("Rule batch exceeded its pass ceiling"));

    // Structural errors (0500-0599)
    map.insert(500, ErrorInfo::new("Operator cycle"));
    map.insert(501, ErrorInfo::new("Unexpected number of children"));
    map.insert(502, ErrorInfo::new("Unexpected number of parents"));
    map.insert(503, ErrorInfo::new("Dangling node reference"));
    map.insert(504, ErrorInfo::new("Unexpected operator"));
    map.insert(505, ErrorInfo::new("Operator could not be resolved"));

    // Configuration errors (0600-0699)
    map.insert(600, ErrorInfo::new("Invalid analyzer configuration")
        .with_help("Phase names must match the analyzer phases and ceilings must be at least 1"));

    map
});
