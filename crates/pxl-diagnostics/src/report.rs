//! Aggregated error report returned by the analyzer

use crate::{CompilerError, Diagnostic, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(line, column, message)` triple as displayed to the query author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineColError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Every problem found during one analyzer run, in the order it was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerErrorGroup {
    errors: Vec<Diagnostic>,
}

impl CompilerErrorGroup {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.errors.push(diagnostic.into());
    }

    /// Append every diagnostic of another report
    pub fn extend(&mut self, other: CompilerErrorGroup) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter()
    }

    /// Whether any diagnostic belongs to the given taxonomy bucket
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// Number of diagnostics in the given taxonomy bucket
    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind == kind).count()
    }

    /// Flatten into `(line, column, message)` triples
    pub fn line_col_errors(&self) -> Vec<LineColError> {
        self.errors
            .iter()
            .map(|e| LineColError {
                line: e.line(),
                column: e.column(),
                message: e.message.clone(),
            })
            .collect()
    }

    /// Render the report for a terminal.
    ///
    /// When `source` is given, each positioned diagnostic is followed by the
    /// offending line and a caret under the column.
    pub fn render(&self, source: Option<&str>) -> String {
        let lines: Vec<&str> = source.map(|s| s.lines().collect()).unwrap_or_default();
        let mut out = String::new();
        for diag in &self.errors {
            out.push_str(&header(diag));
            out.push('\n');
            if let Some(pos) = diag.position {
                out.push_str(&format!("  --> {}\n", pos));
                if let Some(text) = pos.line.checked_sub(1).and_then(|i| lines.get(i)) {
                    out.push_str(&format!("   | {}\n", text));
                    let pad = " ".repeat(pos.column.saturating_sub(1));
                    out.push_str(&format!("   | {}^\n", pad));
                }
            }
            if let Some(help) = &diag.help {
                out.push_str(&format!("   = help: {}\n", help));
            }
        }
        out
    }
}

#[cfg(feature = "colored")]
fn header(diag: &Diagnostic) -> String {
    use colored::Colorize;
    format!(
        "{}[{}]: {}",
        diag.kind.to_string().red().bold(),
        diag.code.to_string().yellow(),
        diag.message.bold()
    )
}

#[cfg(not(feature = "colored"))]
fn header(diag: &Diagnostic) -> String {
    format!("{}[{}]: {}", diag.kind, diag.code, diag.message)
}

impl fmt::Display for CompilerErrorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} compiler error(s)", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n  {}:{} {}", err.line(), err.column(), err.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerErrorGroup {}

impl From<CompilerError> for CompilerErrorGroup {
    fn from(err: CompilerError) -> Self {
        Self {
            errors: vec![err.to_diagnostic()],
        }
    }
}

impl FromIterator<Diagnostic> for CompilerErrorGroup {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a CompilerErrorGroup {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
