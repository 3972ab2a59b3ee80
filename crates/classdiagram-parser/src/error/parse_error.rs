//! The ParseError type for wrapping parsing diagnostics.
//!
//! [`ParseError`] wraps every [`Diagnostic`] raised while parsing, together
//! with the best-effort diagram assembled from the statements that did parse.

use std::fmt;

use crate::{ast::ClassDiagram, error::Diagnostic};

/// Error type for a parse.
///
/// Wraps one or more diagnostics. When the failures were recovered from
/// statement by statement, [`ParseError::partial`] holds the diagram built
/// from everything else. A fatal failure carries no partial diagram.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
    partial: Option<ClassDiagram>,
}

impl ParseError {
    /// Create a new parse error from diagnostics.
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            partial: None,
        }
    }

    /// Create a parse error that keeps the diagram recovered around the failures.
    pub fn with_partial(diagnostics: Vec<Diagnostic>, partial: ClassDiagram) -> Self {
        Self {
            diagnostics,
            partial: Some(partial),
        }
    }

    /// Get all diagnostics in this error, in source order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagram built from the statements that parsed, if any recovery happened.
    pub fn partial(&self) -> Option<&ClassDiagram> {
        self.partial.as_ref()
    }

    /// Consume the error, returning the diagnostics and partial diagram.
    pub fn into_parts(self) -> (Vec<Diagnostic>, Option<ClassDiagram>) {
        (self.diagnostics, self.partial)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.diagnostics.first() {
            write!(f, "{}", first)?;
            if self.diagnostics.len() > 1 {
                write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}
