//! # Class Diagram Parser
//!
//! Lexer and parser for Mermaid-style class diagrams. Source text is split
//! into [`Token`]s by [`tokenize`], and the token stream is turned into an
//! [`ast::ClassDiagram`] by [`parse`].
//!
//! Tokenizing never fails. Parsing recovers from malformed statements: every
//! failure becomes a [`Diagnostic`] and the remaining statements are still
//! parsed, so a single call reports all errors at once.
//!
//! ## Usage
//!
//! ```
//! # use classdiagram_parser::{parse, tokenize, ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//! classDiagram
//!     class Animal {
//!         +String name
//!         +eat(food) bool
//!     }
//!     Animal <|-- Duck
//! "#;
//!
//!     let tokens = tokenize(source);
//!     let diagram = parse(&tokens)?;
//!     assert_eq!(diagram.statements.len(), 2);
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod error;
mod lexer;
mod parser;
#[cfg(test)]
mod parser_tests;
mod span;
mod tokens;

pub use error::{Diagnostic, ParseError};
pub use lexer::tokenize;
pub use parser::ParserConfig;
pub use span::{Position, Span, Spanned};
pub use tokens::{Token, TokenKind};

use ast::ClassDiagram;

/// Outcome of a parse: the diagram, or every diagnostic plus the partial diagram.
pub type ParseResult = Result<ClassDiagram, ParseError>;

/// Parse a token stream into a class diagram with the default configuration.
///
/// # Arguments
///
/// * `tokens` - Tokens produced by [`tokenize`], ending with an end-of-input token
///
/// # Returns
///
/// Returns the [`ClassDiagram`] when every statement parsed. Otherwise returns
/// a [`ParseError`] holding one [`Diagnostic`] per failed statement and the
/// diagram built from the statements that did parse.
///
/// # Example
///
/// ```
/// # use classdiagram_parser::{parse, tokenize};
///
/// let result = parse(&tokenize("class A\nclass %%%\nclass B"));
///
/// let err = result.unwrap_err();
/// assert_eq!(err.diagnostics().len(), 1);
/// assert_eq!(err.partial().map(|d| d.classes().count()), Some(2));
/// ```
pub fn parse(tokens: &[Token]) -> ParseResult {
    parse_with_config(tokens, &ParserConfig::default())
}

/// Parse a token stream into a class diagram.
///
/// Same as [`parse`], with the strictness options in `config` applied.
pub fn parse_with_config(tokens: &[Token], config: &ParserConfig) -> ParseResult {
    parser::build_diagram(tokens, config)
}
