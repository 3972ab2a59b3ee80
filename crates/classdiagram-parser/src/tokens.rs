//! Token definitions produced by the [`lexer`](crate::lexer).

use std::fmt;

use crate::span::Span;

/// The kind of a lexical token.
///
/// Most kinds carry their text in [`Token::value`]; punctuation kinds carry
/// the punctuation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    Eof,

    // Literals
    String,
    BackquoteString,
    GenericType,
    Number,
    Alpha,
    Member,
    Label,

    // Structure
    StructStart,  // {
    StructStop,   // }
    SquareStart,  // [
    SquareStop,   // ]
    Colon,        // :
    Comma,        // ,
    Dot,          // .
    Newline,

    // Relations
    Extension,   // <| or |>
    Dependency,  // < or >
    Composition, // *
    Aggregation, // o
    Lollipop,    // ()
    Line,        // --
    DottedLine,  // ..

    // Annotations and styles
    AnnotationStart, // <<
    AnnotationEnd,   // >>
    StyleSeparator,  // :::

    // Keywords
    ClassDiagram,
    Class,
    Namespace,
    Note,
    NoteFor,
    Style,
    ClassDef,
    Callback,
    Call,
    Link,
    Click,
    Href,
    CssClass,
    AccTitle,
    AccDescr,
    DirectionTb,
    DirectionBt,
    DirectionRl,
    DirectionLr,
    LinkTarget,

    // Values produced inside dedicated lexer states
    CallbackName,
    CallbackArgs,
    AccTitleValue,
    AccDescrValue,
    AccDescrMultilineValue,

    /// Any punctuation character without a dedicated kind.
    Punctuation,
}

impl TokenKind {
    /// Relation end markers: the arrowheads and decorations around a line.
    pub fn is_relation_type(self) -> bool {
        matches!(
            self,
            TokenKind::Extension
                | TokenKind::Dependency
                | TokenKind::Composition
                | TokenKind::Aggregation
                | TokenKind::Lollipop
        )
    }

    /// The line of a relation, solid or dotted.
    pub fn is_line_type(self) -> bool {
        matches!(self, TokenKind::Line | TokenKind::DottedLine)
    }

    pub fn is_direction(self) -> bool {
        matches!(
            self,
            TokenKind::DirectionTb
                | TokenKind::DirectionBt
                | TokenKind::DirectionRl
                | TokenKind::DirectionLr
        )
    }

    /// Tokens that end a statement.
    pub fn is_terminator(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Eof)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Eof => "end of input",
            TokenKind::String => "string",
            TokenKind::BackquoteString => "backquoted name",
            TokenKind::GenericType => "generic type",
            TokenKind::Number => "number",
            TokenKind::Alpha => "identifier",
            TokenKind::Member => "member",
            TokenKind::Label => "label",
            TokenKind::StructStart => "`{`",
            TokenKind::StructStop => "`}`",
            TokenKind::SquareStart => "`[`",
            TokenKind::SquareStop => "`]`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Dot => "`.`",
            TokenKind::Newline => "newline",
            TokenKind::Extension => "extension arrow",
            TokenKind::Dependency => "dependency arrow",
            TokenKind::Composition => "composition marker",
            TokenKind::Aggregation => "aggregation marker",
            TokenKind::Lollipop => "lollipop marker",
            TokenKind::Line => "`--`",
            TokenKind::DottedLine => "`..`",
            TokenKind::AnnotationStart => "`<<`",
            TokenKind::AnnotationEnd => "`>>`",
            TokenKind::StyleSeparator => "`:::`",
            TokenKind::ClassDiagram => "`classDiagram`",
            TokenKind::Class => "`class`",
            TokenKind::Namespace => "`namespace`",
            TokenKind::Note => "`note`",
            TokenKind::NoteFor => "`note for`",
            TokenKind::Style => "`style`",
            TokenKind::ClassDef => "`classDef`",
            TokenKind::Callback => "`callback`",
            TokenKind::Call => "`call`",
            TokenKind::Link => "`link`",
            TokenKind::Click => "`click`",
            TokenKind::Href => "`href`",
            TokenKind::CssClass => "`cssClass`",
            TokenKind::AccTitle => "`accTitle`",
            TokenKind::AccDescr => "`accDescr`",
            TokenKind::DirectionTb
            | TokenKind::DirectionBt
            | TokenKind::DirectionRl
            | TokenKind::DirectionLr => "direction",
            TokenKind::LinkTarget => "link target",
            TokenKind::CallbackName => "callback name",
            TokenKind::CallbackArgs => "callback arguments",
            TokenKind::AccTitleValue => "title",
            TokenKind::AccDescrValue | TokenKind::AccDescrMultilineValue => "description",
            TokenKind::Punctuation => "punctuation",
        };
        f.write_str(text)
    }
}

/// A token with its text and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character, in characters.
    pub column: usize,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        value: impl Into<String>,
        line: usize,
        column: usize,
        span: Span,
    ) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof | TokenKind::Newline => write!(f, "{}", self.kind),
            _ => write!(f, "`{}`", self.value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_classification() {
        assert!(TokenKind::Extension.is_relation_type());
        assert!(TokenKind::Lollipop.is_relation_type());
        assert!(!TokenKind::Line.is_relation_type());
        assert!(TokenKind::Line.is_line_type());
        assert!(TokenKind::DottedLine.is_line_type());
        assert!(!TokenKind::Alpha.is_line_type());
    }

    #[test]
    fn test_token_display() {
        let ident = Token::new(TokenKind::Alpha, "Shape", 1, 1, Span::new(0..5));
        assert_eq!(ident.to_string(), "`Shape`");

        let eof = Token::new(TokenKind::Eof, "", 1, 6, Span::new(5..5));
        assert_eq!(eof.to_string(), "end of input");
    }
}
