//! Source positions attached to IR nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Line/column position of the query text an IR node was built from.
///
/// Lines and columns are 1-based. The front end assigns a position to every
/// node it creates; nodes synthesized by rules inherit the position of the
/// node that triggered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl SourcePosition {
    /// Create a new position
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of a byte offset inside `source`
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let (line, column) = offset_to_line_col(source, offset);
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<(usize, usize)> for SourcePosition {
    fn from((line, column): (usize, usize)) -> Self {
        Self::new(line, column)
    }
}

/// Convert a byte offset to line and column numbers
pub fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}
