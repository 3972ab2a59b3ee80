//! Collector for accumulating diagnostics during a parse.
//!
//! The [`DiagnosticCollector`] lets the statement loop report every failed
//! statement instead of stopping at the first one.

use crate::{
    ast::ClassDiagram,
    error::{Diagnostic, ParseError},
};

#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Finish collection and return a result.
    ///
    /// - With no diagnostics, returns `Ok(diagram)`.
    /// - Otherwise returns `Err(ParseError)` with every diagnostic and the
    ///   diagram as its partial result.
    pub fn finish(self, diagram: ClassDiagram) -> Result<ClassDiagram, ParseError> {
        if self.diagnostics.is_empty() {
            Ok(diagram)
        } else {
            Err(ParseError::with_partial(self.diagnostics, diagram))
        }
    }
}
