//! Source locations for tokens, AST nodes and diagnostics.

use std::{fmt, ops::Range};

/// A half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Where a construct starts: the line and column of its first token, that
/// token's index in the token sequence, and its byte span.
///
/// Lines and columns are 1-based; columns count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    line: usize,
    column: usize,
    token_index: usize,
    span: Span,
}

impl Position {
    pub fn new(line: usize, column: usize, token_index: usize, span: Span) -> Self {
        Self {
            line,
            column,
            token_index,
            span,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn token_index(&self) -> usize {
        self.token_index
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A generic wrapper for AST nodes that tracks where they started.
///
/// `Spanned<T>` wraps any type `T` with a [`Position`], allowing consumers
/// such as editor integrations to map nodes back to the source.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Spanned<T> {
    /// The wrapped value
    value: T,
    /// Where the value starts in the source
    position: Position,
}

impl<T> Spanned<T> {
    /// Create a new spanned value from a value and its position
    pub fn new(value: T, position: Position) -> Self {
        Self { value, position }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn span(&self) -> Span {
        self.position.span()
    }

    /// Convert from one spanned type to another using the provided function
    ///
    /// This maintains the same position while transforming the value.
    pub fn map<F, U>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned {
            value: f(self.value),
            position: self.position,
        }
    }

    /// Get a reference to the underlying value
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Consume the Spanned wrapper and return just the inner value
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> std::ops::Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T: fmt::Display> fmt::Display for Spanned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

// PartialEq compares only the inner values, ignoring position information
impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value.eq(&other.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic_functionality() {
        let span = Span::new(5..10);
        assert_eq!(span.start(), 5);
        assert_eq!(span.end(), 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_empty() {
        let span = Span::new(5..5);
        assert_eq!(span.len(), 0);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_inverted_range_is_empty() {
        let span = Span::new(9..4);
        assert_eq!(span.start(), 9);
        assert!(span.is_empty());
    }

    #[test]
    fn test_span_union() {
        let span1 = Span::new(5..10);
        let span2 = Span::new(15..20);
        let union = span1.union(span2);
        assert_eq!(union.start(), 5);
        assert_eq!(union.end(), 20);
    }

    #[test]
    fn test_position_display() {
        let position = Position::new(3, 7, 12, Span::new(20..25));
        assert_eq!(position.to_string(), "3:7");
        assert_eq!(position.token_index(), 12);
    }

    #[test]
    fn test_spanned_equality_ignores_position() {
        let a = Spanned::new("Shape", Position::new(1, 1, 0, Span::new(0..5)));
        let b = Spanned::new("Shape", Position::new(9, 4, 30, Span::new(80..85)));
        assert_eq!(a, b);
        assert_eq!(*a.inner(), "Shape");
        assert_eq!(a.span().start(), 0);
    }
}
