//! Error and diagnostic system for the class-diagram parser.
//!
//! This module provides:
//! - Error codes for documentation and searchability
//! - Labeled spans and token positions for error context
//! - A collector that accumulates one diagnostic per failed statement
//!
//! # Overview
//!
//! Tokenization never fails. Parsing recovers from a malformed statement by
//! recording a [`Diagnostic`] and skipping ahead to the next statement, so a
//! single [`ParseError`] can hold several diagnostics along with the partial
//! diagram built from the statements that did parse.
//!
//! # Example
//!
//! ```
//! # use classdiagram_parser::error::{Diagnostic, ErrorCode};
//! # use classdiagram_parser::Span;
//!
//! let diag = Diagnostic::error("unterminated class body")
//!     .with_code(ErrorCode::E102)
//!     .with_label(Span::new(40..40), "expected `}`")
//!     .with_secondary_label(Span::new(8..9), "class body opened here")
//!     .with_help("close the body with `}`");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
