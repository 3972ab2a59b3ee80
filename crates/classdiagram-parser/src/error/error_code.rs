//! Error codes for class-diagram diagnostics.
//!
//! All codes belong to the parser (`E1xx`); the lexer never fails.

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ErrorCode {
    /// Unexpected token.
    ///
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// Unexpected end of input.
    ///
    /// The input ended before a statement was complete.
    E101,

    /// Unterminated block.
    ///
    /// A class body or namespace opened with `{` was never closed.
    E102,

    /// Missing diagram header.
    ///
    /// The `classDiagram` keyword is absent while the parser is configured to
    /// require it.
    E103,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E100 => "E100",
            Self::E101 => "E101",
            Self::E102 => "E102",
            Self::E103 => "E103",
        }
    }

    /// Get a short description of this error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::E100 => "unexpected token",
            Self::E101 => "unexpected end of input",
            Self::E102 => "unterminated block",
            Self::E103 => "missing diagram header",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::E100.as_str(), "E100");
        assert_eq!(ErrorCode::E103.as_str(), "E103");
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::E102), "E102");
    }

    #[test]
    fn test_error_code_description() {
        assert_eq!(ErrorCode::E101.description(), "unexpected end of input");
        assert_eq!(ErrorCode::E102.description(), "unterminated block");
    }
}
