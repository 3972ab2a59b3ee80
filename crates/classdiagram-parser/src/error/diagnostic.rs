//! The core diagnostic type.
//!
//! A [`Diagnostic`] is one failed statement: a message, an optional error
//! code, labelled source spans, optional help text and the position of the
//! offending token.

use std::fmt;

use crate::{
    error::{error_code::ErrorCode, label::Label},
    span::{Position, Span},
};

/// A diagnostic message with source location information.
///
/// # Example
///
/// ```text
/// error[E100]: expected class name, found newline
///   --> diagram.mmd:2:6
///    |
///  2 | class
///    |      ^ expected class name
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    position: Option<Position>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use classdiagram_parser::error::{Diagnostic, ErrorCode};
    /// # use classdiagram_parser::Span;
    ///
    /// let diag = Diagnostic::error("expected class name")
    ///     .with_code(ErrorCode::E100)
    ///     .with_label(Span::new(6..7), "expected class name")
    ///     .with_help("write a name after `class`");
    /// assert_eq!(diag.to_string(), "error[E100]: expected class name");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            position: None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Position of the token the diagnostic was raised at, if known.
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E100]: message" or "error: message"
        f.write_str("error")?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}
