//! Analyzer error types

use crate::{ErrorCode, ErrorKind, SourcePosition};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A diagnostic message with location and context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Taxonomy bucket
    pub kind: ErrorKind,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Source position of the node that triggered the diagnostic
    pub position: Option<SourcePosition>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic; the kind follows from the code range
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind: code.kind(),
            code,
            message: message.into(),
            position: None,
            help: None,
        }
    }

    /// Set the position
    pub fn with_position(mut self, position: SourcePosition) -> Self {
        self.position = Some(position);
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Line of the diagnostic, 0 when it has no position
    pub fn line(&self) -> usize {
        self.position.map(|p| p.line).unwrap_or(0)
    }

    /// Column of the diagnostic, 0 when it has no position
    pub fn column(&self) -> usize {
        self.position.map(|p| p.column).unwrap_or(0)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.kind, self.code, self.message)?;
        if let Some(pos) = &self.position {
            write!(f, " at {}", pos)?;
        }
        Ok(())
    }
}

/// A single compiler error raised while analyzing one node
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompilerError {
    /// Unknown table, column, metadata key or function signature
    #[error("{code}: {message}")]
    Lookup {
        code: ErrorCode,
        message: String,
        position: Option<SourcePosition>,
    },

    /// Operand/result mismatch, non-boolean predicate, wrong literal type
    #[error("{code}: {message}")]
    Type {
        code: ErrorCode,
        message: String,
        position: Option<SourcePosition>,
    },

    /// Missing, unexpected or malformed argument
    #[error("{code}: {message}")]
    Argument {
        code: ErrorCode,
        message: String,
        position: Option<SourcePosition>,
    },

    /// A rule batch did not converge within its pass ceiling
    #[error("{code}: {message}")]
    Convergence {
        code: ErrorCode,
        message: String,
        batch: String,
        max_iterations: usize,
    },

    /// Violated graph invariant
    #[error("{code}: {message}")]
    Structural {
        code: ErrorCode,
        message: String,
        position: Option<SourcePosition>,
    },
}

impl CompilerError {
    /// Create a lookup error
    pub fn lookup(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Lookup {
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Create a type error
    pub fn type_error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Type {
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Create an argument error
    pub fn argument(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Argument {
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Create a convergence error for a rule batch
    pub fn convergence(batch: impl Into<String>, max_iterations: usize) -> Self {
        let batch = batch.into();
        Self::Convergence {
            code: crate::PXL0400,
            message: format!(
                "Reached max iterations ({}) for rule batch '{}'",
                max_iterations, batch
            ),
            batch,
            max_iterations,
        }
    }

    /// Create a structural error
    pub fn structural(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Structural {
            code,
            message: message.into(),
            position: None,
        }
    }

    /// Attach the position of the triggering node.
    ///
    /// Keeps an existing position so errors raised deep inside a rule keep
    /// pointing at the most specific node.
    pub fn at(mut self, pos: SourcePosition) -> Self {
        match &mut self {
            Self::Lookup { position, .. }
            | Self::Type { position, .. }
            | Self::Argument { position, .. }
            | Self::Structural { position, .. } => {
                position.get_or_insert(pos);
            }
            Self::Convergence { .. } => {}
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Lookup { code, .. }
            | Self::Type { code, .. }
            | Self::Argument { code, .. }
            | Self::Convergence { code, .. }
            | Self::Structural { code, .. } => *code,
        }
    }

    /// Get the taxonomy bucket
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lookup { .. } => ErrorKind::Lookup,
            Self::Type { .. } => ErrorKind::Type,
            Self::Argument { .. } => ErrorKind::Argument,
            Self::Convergence { .. } => ErrorKind::Convergence,
            Self::Structural { .. } => ErrorKind::Structural,
        }
    }

    /// Get the message without the code prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Lookup { message, .. }
            | Self::Type { message, .. }
            | Self::Argument { message, .. }
            | Self::Convergence { message, .. }
            | Self::Structural { message, .. } => message,
        }
    }

    /// Get the position if available
    pub fn position(&self) -> Option<SourcePosition> {
        match self {
            Self::Lookup { position, .. }
            | Self::Type { position, .. }
            | Self::Argument { position, .. }
            | Self::Structural { position, .. } => *position,
            Self::Convergence { .. } => None,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic {
            kind: self.kind(),
            code: self.code(),
            message: self.message().to_string(),
            position: self.position(),
            help: None,
        };
        if let Some(help) = self.code().info().help {
            diag = diag.with_help(help);
        }
        diag
    }
}

impl From<CompilerError> for Diagnostic {
    fn from(err: CompilerError) -> Self {
        err.to_diagnostic()
    }
}
