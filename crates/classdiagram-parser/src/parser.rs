//! Parser for class-diagram tokens.
//!
//! This module turns the token stream from the [`lexer`](super::lexer) into a
//! [`ClassDiagram`]. Statements are parsed one at a time by small winnow
//! parsers; the statement kind is picked from the next token, or for
//! relations and member definitions by a speculative lookahead that always
//! restores the input.
//!
//! A statement that fails to parse becomes one [`Diagnostic`]. The parser then
//! synchronizes (skips to the end of the line or the next statement keyword)
//! and carries on, so one malformed line never hides the rest of the diagram.
//! The public entry point is [`build_diagram`].

use log::{debug, trace};
use winnow::{
    Parser as _,
    combinator::{alt, opt, peek, preceded, repeat},
    error::{ContextError, ErrMode},
    stream::{Stateful, Stream, TokenSlice},
    token::any,
};

use crate::{
    ast::{
        AccessibilityKind, AccessibilityStatement, AnnotationStatement, ClassDefStatement,
        ClassDiagram, ClassStatement, ClickAction, ClickStatement, Direction, LineStyle, Member,
        MemberStatement, NamespaceStatement, NoteStatement, Relation, RelationStatement,
        RelationType, Statement, Style, StyleStatement,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::{Position, Spanned},
    tokens::{Token, TokenKind},
};

/// Options that change how strictly a token stream is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct ParserConfig {
    /// Reject input that has no `classDiagram` header.
    ///
    /// By default a missing header is tolerated so embedded snippets parse.
    pub require_header: bool,
}

impl ParserConfig {
    pub fn with_require_header(mut self, require_header: bool) -> Self {
        self.require_header = require_header;
        self
    }
}

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at a `{` that was never closed
    Unclosed(usize),
}

/// Total number of tokens, carried along so positions can report token indices.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TokenCount(usize);

type Input<'src> = Stateful<TokenSlice<'src, Token>, TokenCount>;
type Error = ErrMode<ContextError<Context>>;
type IResult<O> = std::result::Result<O, Error>;

fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    match f(input) {
        Err(ErrMode::Backtrack(e)) => Err(ErrMode::Cut(e)),
        result => result,
    }
}

/// Helper to create a Backtrack error that names what was expected
fn expected(label: &'static str) -> Error {
    let mut e = ContextError::new();
    e.push(Context::Label(label));
    ErrMode::Backtrack(e)
}

fn unclosed_block(open_remaining: usize) -> Error {
    let mut e = ContextError::new();
    e.push(Context::Label("`}`"));
    e.push(Context::Unclosed(open_remaining));
    ErrMode::Cut(e)
}

/// Kind of the next token without consuming it; `Eof` past the end.
fn peek_kind(input: &mut Input<'_>) -> TokenKind {
    peek(any::<_, Error>)
        .parse_next(input)
        .map_or(TokenKind::Eof, |token: &Token| token.kind)
}

/// Consume one token, whatever it is.
fn bump(input: &mut Input<'_>) -> Option<Token> {
    any::<_, Error>.parse_next(input).ok().cloned()
}

/// Parse a single token of the given kind
fn token<'src>(
    kind: TokenKind,
    label: &'static str,
) -> impl winnow::Parser<Input<'src>, &'src Token, Error> {
    any.verify(move |token: &Token| token.kind == kind)
        .context(Context::Label(label))
}

/// Parse a single token of the given kind and keep its text
fn text<'src>(kind: TokenKind, label: &'static str) -> impl winnow::Parser<Input<'src>, String, Error> {
    token(kind, label).map(|token: &Token| token.value.clone())
}

/// Run a parser speculatively. The input is restored whatever the outcome.
fn lookahead<'src, O>(
    input: &mut Input<'src>,
    f: impl FnOnce(&mut Input<'src>) -> IResult<O>,
) -> bool {
    let checkpoint = input.checkpoint();
    let matched = f(input).is_ok();
    input.reset(&checkpoint);
    matched
}

fn position_of(taken: &[Token], token_index: usize) -> Position {
    match (taken.first(), taken.last()) {
        (Some(first), Some(last)) => Position::new(
            first.line,
            first.column,
            token_index,
            first.span.union(last.span),
        ),
        _ => Position::default(),
    }
}

/// Wrap a parser's output with the position of the tokens it consumed
fn spanned<'src, O, P>(mut parser: P) -> impl winnow::Parser<Input<'src>, Spanned<O>, Error>
where
    P: winnow::Parser<Input<'src>, O, Error>,
{
    move |input: &mut Input<'src>| {
        let token_index = input.state.0 - input.eof_offset();
        let (value, taken) = parser.by_ref().with_taken().parse_next(input)?;
        Ok(Spanned::new(value, position_of(taken, token_index)))
    }
}

/// Parse the name a class is declared with: an identifier or backquoted name
fn class_name(input: &mut Input<'_>) -> IResult<String> {
    any.verify_map(|token: &Token| match token.kind {
        TokenKind::Alpha | TokenKind::BackquoteString => Some(token.value.clone()),
        _ => None,
    })
    .context(Context::Label("class name"))
    .parse_next(input)
}

/// Parse a reference to a class; a generic suffix is accepted and dropped
fn class_ref(input: &mut Input<'_>) -> IResult<String> {
    let name = class_name(input)?;
    opt(token(TokenKind::GenericType, "generic type")).parse_next(input)?;
    Ok(name)
}

/// Strip the leading `:` the lexer keeps on label tokens
fn label_text(value: &str) -> &str {
    value.strip_prefix(':').unwrap_or(value).trim()
}

/// The raw text of the rest of the line.
///
/// Token values are joined with a single space wherever the source had a gap
/// between them.
fn rest_of_line(input: &mut Input<'_>) -> IResult<String> {
    let tokens: Vec<&Token> = repeat(
        0..,
        any.verify(|token: &Token| !token.kind.is_terminator()),
    )
    .parse_next(input)?;

    let mut text = String::new();
    let mut previous_end = None;
    for token in tokens {
        if previous_end.is_some_and(|end| end < token.span.start()) {
            text.push(' ');
        }
        text.push_str(&token.value);
        previous_end = Some(token.span.end());
    }
    Ok(text)
}

/// Split `fill:#f9f,stroke:#333` into styles. Blank entries are dropped.
fn parse_styles(text: &str) -> Vec<Style> {
    text.split(',')
        .filter_map(|entry| {
            let entry = entry.trim().trim_end_matches(';').trim_end();
            if entry.is_empty() {
                return None;
            }
            Some(match entry.split_once(':') {
                Some((property, value)) => Style::new(property.trim(), value.trim()),
                None => Style::new(entry, ""),
            })
        })
        .collect()
}

fn style_list(input: &mut Input<'_>) -> IResult<Vec<Style>> {
    let styles = parse_styles(&rest_of_line(input)?);
    if styles.is_empty() {
        return Err(expected("style list"));
    }
    Ok(styles)
}

/// `<<interface>>` written as a class body line
fn body_annotation(text: &str) -> Option<String> {
    text.strip_prefix("<<")
        .and_then(|rest| rest.strip_suffix(">>"))
        .map(|annotation| annotation.trim().to_string())
}

/// Parse `["label"]` or `[some label]` after a class name
fn class_label(input: &mut Input<'_>) -> IResult<String> {
    token(TokenKind::SquareStart, "`[`").parse_next(input)?;
    cut_err(input, |input| {
        let label = alt((
            text(TokenKind::String, "class label"),
            repeat(
                1..,
                any.verify_map(|token: &Token| {
                    matches!(token.kind, TokenKind::Alpha | TokenKind::Number)
                        .then(|| token.value.clone())
                }),
            )
            .map(|words: Vec<String>| words.join(" ")),
        ))
        .context(Context::Label("class label"))
        .parse_next(input)?;
        token(TokenKind::SquareStop, "`]`").parse_next(input)?;
        Ok(label)
    })
}

/// Parse a class body, from `{` through the matching `}`
fn class_body(input: &mut Input<'_>, class: &mut ClassStatement) -> IResult<()> {
    let open = input.eof_offset();
    token(TokenKind::StructStart, "`{`").parse_next(input)?;

    loop {
        match peek_kind(input) {
            TokenKind::StructStop => {
                bump(input);
                return Ok(());
            }
            TokenKind::Eof => return Err(unclosed_block(open)),
            TokenKind::Member => {
                let Some(line) = bump(input) else {
                    return Err(unclosed_block(open));
                };
                match body_annotation(&line.value) {
                    Some(annotation) => class.annotations.push(annotation),
                    None => class.members.push(Member::parse(&line.value)),
                }
            }
            _ => {
                if let Some(skipped) = bump(input) {
                    trace!(token:% = skipped, line = skipped.line; "Skipping token in class body");
                }
            }
        }
    }
}

/// Parse `class Name~T~["label"]:::css { ... }`
fn class_statement(input: &mut Input<'_>) -> IResult<ClassStatement> {
    token(TokenKind::Class, "`class`").parse_next(input)?;
    cut_err(input, |input| {
        let mut class = ClassStatement::new(class_name(input)?);
        class.generic = opt(text(TokenKind::GenericType, "generic type")).parse_next(input)?;
        class.label = opt(class_label).parse_next(input)?;
        if opt(token(TokenKind::StyleSeparator, "`:::`"))
            .parse_next(input)?
            .is_some()
        {
            class.css_class = Some(text(TokenKind::Alpha, "css class name").parse_next(input)?);
        }
        if peek_kind(input) == TokenKind::StructStart {
            class_body(input, &mut class)?;
        }
        Ok(class)
    })
}

/// Parse `namespace A.B { class ... }`
fn namespace_statement(input: &mut Input<'_>) -> IResult<NamespaceStatement> {
    token(TokenKind::Namespace, "`namespace`").parse_next(input)?;
    cut_err(input, |input| {
        let first = text(TokenKind::Alpha, "namespace name").parse_next(input)?;
        let rest: Vec<String> = repeat(
            0..,
            preceded(
                token(TokenKind::Dot, "`.`"),
                text(TokenKind::Alpha, "namespace name"),
            ),
        )
        .parse_next(input)?;
        let name = std::iter::once(first)
            .chain(rest)
            .collect::<Vec<_>>()
            .join(".");

        let open = input.eof_offset();
        token(TokenKind::StructStart, "`{`").parse_next(input)?;

        let mut classes = Vec::new();
        loop {
            match peek_kind(input) {
                TokenKind::StructStop => {
                    bump(input);
                    break;
                }
                TokenKind::Eof => return Err(unclosed_block(open)),
                TokenKind::Class => classes.push(spanned(class_statement).parse_next(input)?),
                _ => {
                    if let Some(skipped) = bump(input) {
                        if !skipped.is(TokenKind::Newline) {
                            trace!(token:% = skipped, line = skipped.line; "Skipping token in namespace");
                        }
                    }
                }
            }
        }

        Ok(NamespaceStatement { name, classes })
    })
}

fn relation_type(input: &mut Input<'_>) -> IResult<RelationType> {
    any.verify_map(|token: &Token| match token.kind {
        TokenKind::Extension => Some(RelationType::Extension),
        TokenKind::Dependency => Some(RelationType::Dependency),
        TokenKind::Composition => Some(RelationType::Composition),
        TokenKind::Aggregation => Some(RelationType::Aggregation),
        TokenKind::Lollipop => Some(RelationType::Lollipop),
        _ => None,
    })
    .context(Context::Label("relation type"))
    .parse_next(input)
}

fn line_style(input: &mut Input<'_>) -> IResult<LineStyle> {
    any.verify_map(|token: &Token| match token.kind {
        TokenKind::Line => Some(LineStyle::Solid),
        TokenKind::DottedLine => Some(LineStyle::Dotted),
        _ => None,
    })
    .context(Context::Label("relation line"))
    .parse_next(input)
}

/// A relation label: `: text` (one `LABEL` token) or `: word`
fn relation_label(input: &mut Input<'_>) -> IResult<String> {
    alt((
        token(TokenKind::Label, "label").map(|token: &Token| label_text(&token.value).to_string()),
        preceded(
            token(TokenKind::Colon, "`:`"),
            any.verify_map(|token: &Token| {
                matches!(token.kind, TokenKind::Alpha | TokenKind::Member)
                    .then(|| token.value.clone())
            }),
        ),
    ))
    .context(Context::Label("relation label"))
    .parse_next(input)
}

/// Lookahead: class, optional cardinality, then a relation marker or line
fn relation_start(input: &mut Input<'_>) -> IResult<()> {
    (
        class_ref,
        opt(token(TokenKind::String, "cardinality")),
        any.verify(|token: &Token| token.kind.is_relation_type() || token.kind.is_line_type()),
    )
        .void()
        .parse_next(input)
}

/// Parse `A "1" <|-- "many" B : label`
fn relation_statement(input: &mut Input<'_>) -> IResult<RelationStatement> {
    let source_class = class_ref(input)?;
    cut_err(input, |input| {
        let source_label = opt(text(TokenKind::String, "cardinality")).parse_next(input)?;
        let start = opt(relation_type).parse_next(input)?.unwrap_or_default();
        let line_style = opt(line_style).parse_next(input)?.unwrap_or_default();
        let end = opt(relation_type).parse_next(input)?.unwrap_or_default();
        let target_label = opt(text(TokenKind::String, "cardinality")).parse_next(input)?;
        let target_class = class_ref(input)?;
        let relation_label = opt(relation_label).parse_next(input)?;

        Ok(RelationStatement {
            source_class,
            target_class,
            relation: Relation {
                start,
                end,
                line_style,
            },
            source_label,
            target_label,
            relation_label,
        })
    })
}

/// Lookahead: class immediately followed by `:` or a label
fn member_start(input: &mut Input<'_>) -> IResult<()> {
    (
        class_ref,
        any.verify(|token: &Token| matches!(token.kind, TokenKind::Colon | TokenKind::Label)),
    )
        .void()
        .parse_next(input)
}

/// Parse `A : +member`, or the `A : Annotation` shorthand
fn member_statement(input: &mut Input<'_>) -> IResult<Statement> {
    let class_name = class_ref(input)?;
    cut_err(input, |input| {
        let separator = any
            .verify(|token: &Token| matches!(token.kind, TokenKind::Colon | TokenKind::Label))
            .context(Context::Label("`:`"))
            .parse_next(input)?;

        if separator.is(TokenKind::Label) {
            if label_text(&separator.value).is_empty() {
                return Err(expected("member definition"));
            }
            let member = Member::parse(&separator.value);
            return Ok(Statement::Member(MemberStatement { class_name, member }));
        }

        let body = any
            .verify(|token: &Token| matches!(token.kind, TokenKind::Member | TokenKind::Alpha))
            .context(Context::Label("member definition"))
            .parse_next(input)?;
        Ok(match body.kind {
            TokenKind::Alpha => Statement::Annotation(AnnotationStatement {
                class_name,
                annotation: body.value.clone(),
            }),
            _ => Statement::Member(MemberStatement {
                class_name,
                member: Member::parse(&body.value),
            }),
        })
    })
}

/// Parse `note "text"` or `note for Class "text"`
fn note_statement(input: &mut Input<'_>) -> IResult<NoteStatement> {
    let keyword = any
        .verify(|token: &Token| matches!(token.kind, TokenKind::Note | TokenKind::NoteFor))
        .context(Context::Label("`note`"))
        .parse_next(input)?;
    cut_err(input, |input| {
        let target_class = match keyword.kind {
            TokenKind::NoteFor => Some(class_ref(input)?),
            _ => None,
        };
        let text = text(TokenKind::String, "note text").parse_next(input)?;
        Ok(NoteStatement { text, target_class })
    })
}

/// Parse `style Class fill:#f9f,stroke:#333`
fn style_statement(input: &mut Input<'_>) -> IResult<StyleStatement> {
    token(TokenKind::Style, "`style`").parse_next(input)?;
    cut_err(input, |input| {
        let class_name = class_ref(input)?;
        let styles = style_list(input)?;
        Ok(StyleStatement { class_name, styles })
    })
}

/// Parse `classDef a,b fill:#f9f`
fn class_def_statement(input: &mut Input<'_>) -> IResult<ClassDefStatement> {
    token(TokenKind::ClassDef, "`classDef`").parse_next(input)?;
    cut_err(input, |input| {
        let first = class_ref(input)?;
        let rest: Vec<String> =
            repeat(0.., preceded(token(TokenKind::Comma, "`,`"), class_ref)).parse_next(input)?;
        let class_names = std::iter::once(first).chain(rest).collect();
        let styles = style_list(input)?;
        Ok(ClassDefStatement {
            class_names,
            styles,
        })
    })
}

/// Parse `cssClass "A" highlight`; it becomes a single `cssClass` style
fn css_class_statement(input: &mut Input<'_>) -> IResult<StyleStatement> {
    token(TokenKind::CssClass, "`cssClass`").parse_next(input)?;
    cut_err(input, |input| {
        let class_name = any
            .verify_map(|token: &Token| match token.kind {
                TokenKind::Alpha | TokenKind::BackquoteString | TokenKind::String => {
                    Some(token.value.clone())
                }
                _ => None,
            })
            .context(Context::Label("class name"))
            .parse_next(input)?;
        let css_class = text(TokenKind::Alpha, "css class name").parse_next(input)?;
        Ok(StyleStatement {
            class_name,
            styles: vec![Style::new("cssClass", css_class)],
        })
    })
}

/// URL, then target and tooltip in either order
fn link_action(input: &mut Input<'_>) -> IResult<ClickAction> {
    let url = text(TokenKind::String, "link url").parse_next(input)?;
    let mut target = None;
    let mut tooltip = None;
    loop {
        match peek_kind(input) {
            TokenKind::LinkTarget if target.is_none() => {
                target = bump(input).map(|token| token.value);
            }
            TokenKind::String if tooltip.is_none() => {
                tooltip = bump(input).map(|token| token.value);
            }
            _ => break,
        }
    }
    Ok(ClickAction::Link {
        url,
        target,
        tooltip,
    })
}

/// `name(args) "tooltip"` after `click Class call`
fn call_action(input: &mut Input<'_>) -> IResult<ClickAction> {
    let name = text(TokenKind::CallbackName, "callback name").parse_next(input)?;
    let args = opt(text(TokenKind::CallbackArgs, "callback arguments")).parse_next(input)?;
    let tooltip = opt(text(TokenKind::String, "tooltip")).parse_next(input)?;
    Ok(ClickAction::Callback {
        name,
        args,
        tooltip,
    })
}

/// Parse `click Class call f()`, `click Class href "url"`, `click Class "url"`
/// or `click Class f`
fn click_statement(input: &mut Input<'_>) -> IResult<ClickStatement> {
    token(TokenKind::Click, "`click`").parse_next(input)?;
    cut_err(input, |input| {
        let class_name = class_ref(input)?;
        let action = match peek_kind(input) {
            TokenKind::Call => {
                bump(input);
                call_action(input)?
            }
            TokenKind::Href => {
                bump(input);
                link_action(input)?
            }
            TokenKind::String => link_action(input)?,
            TokenKind::Alpha => {
                let name = text(TokenKind::Alpha, "callback name").parse_next(input)?;
                let tooltip = opt(text(TokenKind::String, "tooltip")).parse_next(input)?;
                ClickAction::Callback {
                    name,
                    args: None,
                    tooltip,
                }
            }
            _ => return Err(expected("`call`, `href` or a link")),
        };
        Ok(ClickStatement { class_name, action })
    })
}

/// Parse `callback Class name "tooltip"`
fn callback_statement(input: &mut Input<'_>) -> IResult<ClickStatement> {
    token(TokenKind::Callback, "`callback`").parse_next(input)?;
    cut_err(input, |input| {
        let class_name = class_ref(input)?;
        let name = any
            .verify_map(|token: &Token| {
                matches!(token.kind, TokenKind::Alpha | TokenKind::String)
                    .then(|| token.value.clone())
            })
            .context(Context::Label("callback name"))
            .parse_next(input)?;
        let tooltip = opt(text(TokenKind::String, "tooltip")).parse_next(input)?;
        Ok(ClickStatement {
            class_name,
            action: ClickAction::Callback {
                name,
                args: None,
                tooltip,
            },
        })
    })
}

/// Parse `link Class "url" _blank "tooltip"`
fn link_statement(input: &mut Input<'_>) -> IResult<ClickStatement> {
    token(TokenKind::Link, "`link`").parse_next(input)?;
    cut_err(input, |input| {
        let class_name = class_ref(input)?;
        let action = link_action(input)?;
        Ok(ClickStatement { class_name, action })
    })
}

/// Parse `<<interface>> Shape`
fn annotation_statement(input: &mut Input<'_>) -> IResult<AnnotationStatement> {
    token(TokenKind::AnnotationStart, "`<<`").parse_next(input)?;
    cut_err(input, |input| {
        let words: Vec<String> =
            repeat(1.., text(TokenKind::Alpha, "annotation")).parse_next(input)?;
        token(TokenKind::AnnotationEnd, "`>>`").parse_next(input)?;
        let class_name = class_ref(input)?;
        Ok(AnnotationStatement {
            class_name,
            annotation: words.join(" "),
        })
    })
}

fn direction_statement(input: &mut Input<'_>) -> IResult<Direction> {
    any.verify_map(|token: &Token| match token.kind {
        TokenKind::DirectionTb => Some(Direction::TopToBottom),
        TokenKind::DirectionBt => Some(Direction::BottomToTop),
        TokenKind::DirectionRl => Some(Direction::RightToLeft),
        TokenKind::DirectionLr => Some(Direction::LeftToRight),
        _ => None,
    })
    .context(Context::Label("direction"))
    .parse_next(input)
}

/// Parse `accTitle: ...`, `accDescr: ...` or `accDescr { ... }`
fn accessibility_statement(input: &mut Input<'_>) -> IResult<AccessibilityStatement> {
    let keyword = any
        .verify(|token: &Token| matches!(token.kind, TokenKind::AccTitle | TokenKind::AccDescr))
        .context(Context::Label("accessibility keyword"))
        .parse_next(input)?;
    cut_err(input, |input| {
        if keyword.is(TokenKind::AccTitle) {
            let value = text(TokenKind::AccTitleValue, "title").parse_next(input)?;
            return Ok(AccessibilityStatement {
                kind: AccessibilityKind::Title,
                value,
            });
        }
        let value = any
            .verify_map(|token: &Token| {
                matches!(
                    token.kind,
                    TokenKind::AccDescrValue | TokenKind::AccDescrMultilineValue
                )
                .then(|| token.value.clone())
            })
            .context(Context::Label("description"))
            .parse_next(input)?;
        Ok(AccessibilityStatement {
            kind: AccessibilityKind::Description,
            value,
        })
    })
}

/// Parse one statement, dispatching on the next token.
///
/// Returns `None` when the next token starts no statement; that token is
/// skipped.
fn statement(input: &mut Input<'_>) -> IResult<Option<Statement>> {
    let statement = match peek_kind(input) {
        TokenKind::Class => class_statement
            .context(Context::Label("class statement"))
            .map(Statement::Class)
            .parse_next(input)?,
        TokenKind::Namespace => namespace_statement
            .context(Context::Label("namespace"))
            .map(Statement::Namespace)
            .parse_next(input)?,
        TokenKind::Note | TokenKind::NoteFor => note_statement
            .context(Context::Label("note"))
            .map(Statement::Note)
            .parse_next(input)?,
        TokenKind::Style => style_statement
            .context(Context::Label("style statement"))
            .map(Statement::Style)
            .parse_next(input)?,
        TokenKind::ClassDef => class_def_statement
            .context(Context::Label("classDef statement"))
            .map(Statement::ClassDef)
            .parse_next(input)?,
        TokenKind::Click => click_statement
            .context(Context::Label("click statement"))
            .map(Statement::Click)
            .parse_next(input)?,
        TokenKind::Callback => callback_statement
            .context(Context::Label("callback statement"))
            .map(Statement::Click)
            .parse_next(input)?,
        TokenKind::Link => link_statement
            .context(Context::Label("link statement"))
            .map(Statement::Click)
            .parse_next(input)?,
        TokenKind::CssClass => css_class_statement
            .context(Context::Label("cssClass statement"))
            .map(Statement::Style)
            .parse_next(input)?,
        TokenKind::AnnotationStart => annotation_statement
            .context(Context::Label("annotation"))
            .map(Statement::Annotation)
            .parse_next(input)?,
        kind if kind.is_direction() => direction_statement
            .map(Statement::Direction)
            .parse_next(input)?,
        TokenKind::AccTitle | TokenKind::AccDescr => accessibility_statement
            .context(Context::Label("accessibility statement"))
            .map(Statement::Accessibility)
            .parse_next(input)?,
        _ if lookahead(input, relation_start) => relation_statement
            .context(Context::Label("relation"))
            .map(Statement::Relation)
            .parse_next(input)?,
        _ if lookahead(input, member_start) => member_statement
            .context(Context::Label("member statement"))
            .parse_next(input)?,
        _ => {
            if let Some(skipped) = bump(input) {
                trace!(token:% = skipped, line = skipped.line; "Skipping unrecognized token");
            }
            return Ok(None);
        }
    };
    Ok(Some(statement))
}

fn skip_newlines(input: &mut Input<'_>) {
    while token(TokenKind::Newline, "newline").parse_next(input).is_ok() {}
}

/// Skip everything up to and including the `classDiagram` header.
///
/// Returns `false`, leaving the input untouched, when there is no header.
fn skip_header(input: &mut Input<'_>) -> bool {
    let checkpoint = input.checkpoint();
    while let Some(token) = bump(input) {
        match token.kind {
            TokenKind::ClassDiagram => return true,
            TokenKind::Eof => break,
            _ => {}
        }
    }
    input.reset(&checkpoint);
    false
}

/// Panic-mode recovery after a failed statement.
///
/// Drops the offending token, then keeps dropping tokens until a newline has
/// been consumed or the next token starts a `class`, `namespace`, `note` or
/// `style` statement. End of input is never consumed.
fn synchronize(input: &mut Input<'_>) {
    match peek_kind(input) {
        TokenKind::Eof => return,
        TokenKind::Newline => {
            bump(input);
            return;
        }
        _ => {
            bump(input);
        }
    }

    loop {
        match peek_kind(input) {
            TokenKind::Eof
            | TokenKind::Class
            | TokenKind::Namespace
            | TokenKind::Note
            | TokenKind::NoteFor
            | TokenKind::Style => return,
            TokenKind::Newline => {
                bump(input);
                return;
            }
            _ => {
                bump(input);
            }
        }
    }
}

fn convert_error(error: Error, tokens: &[Token], current_remaining: usize) -> Diagnostic {
    let index = tokens.len().saturating_sub(current_remaining);
    let found = tokens.get(index).or_else(|| tokens.last());
    let found_span = found.map(|token| token.span).unwrap_or_default();

    let mut labels = Vec::new();
    let mut unclosed = None;
    if let ErrMode::Backtrack(e) | ErrMode::Cut(e) = &error {
        for context in e.context() {
            match context {
                Context::Label(label) => labels.push(*label),
                Context::Unclosed(remaining) => unclosed = Some(tokens.len() - remaining),
            }
        }
    }

    // The innermost label names the missing piece, the outermost the statement.
    let expected = labels.first().copied().unwrap_or("statement");
    let found_text = found.map_or_else(|| TokenKind::Eof.to_string(), Token::to_string);

    let diagnostic = if let Some(open) = unclosed.and_then(|open| tokens.get(open)) {
        Diagnostic::error(format!("unclosed `{{`, expected `}}` before {found_text}"))
            .with_code(ErrorCode::E102)
            .with_label(found_span, "expected `}`")
            .with_secondary_label(open.span, "block opened here")
            .with_help("close the block with `}`")
    } else if found.is_none_or(|token| token.is(TokenKind::Eof)) {
        Diagnostic::error(format!("unexpected end of input, expected {expected}"))
            .with_code(ErrorCode::E101)
            .with_label(found_span, format!("expected {expected}"))
    } else {
        Diagnostic::error(format!("expected {expected}, found {found_text}"))
            .with_code(ErrorCode::E100)
            .with_label(found_span, format!("expected {expected}"))
    };

    let diagnostic = match labels.last() {
        Some(statement) if labels.len() > 1 && unclosed.is_none() => {
            diagnostic.with_help(format!("while parsing {statement}"))
        }
        _ => diagnostic,
    };

    match found {
        Some(token) => diagnostic.with_position(Position::new(
            token.line,
            token.column,
            index.min(tokens.len() - 1),
            token.span,
        )),
        None => diagnostic,
    }
}

/// Parse a token stream into a class diagram.
///
/// Every statement that fails to parse adds one diagnostic; parsing then
/// resumes at the next statement. If any statement failed the result is an
/// error carrying all diagnostics and the diagram built from the rest.
///
/// With [`ParserConfig::require_header`] set, a missing `classDiagram` header
/// fails the whole parse with a single diagnostic and no partial diagram.
pub fn build_diagram(tokens: &[Token], config: &ParserConfig) -> Result<ClassDiagram, ParseError> {
    let mut input = Stateful {
        input: TokenSlice::new(tokens),
        state: TokenCount(tokens.len()),
    };

    if !skip_header(&mut input) && config.require_header {
        let mut diagnostic = Diagnostic::error("missing `classDiagram` header")
            .with_code(ErrorCode::E103)
            .with_help("start the diagram with `classDiagram`");
        if let Some(first) = tokens.first() {
            diagnostic = diagnostic
                .with_label(first.span, "expected `classDiagram` before this")
                .with_position(Position::new(first.line, first.column, 0, first.span));
        }
        debug!("Missing diagram header");
        return Err(diagnostic.into());
    }

    let mut statements = Vec::new();
    let mut collector = DiagnosticCollector::new();

    loop {
        skip_newlines(&mut input);
        if peek_kind(&mut input) == TokenKind::Eof {
            break;
        }

        match spanned(statement).parse_next(&mut input) {
            Ok(parsed) => {
                let position = parsed.position();
                if let Some(statement) = parsed.into_inner() {
                    statements.push(Spanned::new(statement, position));
                }
            }
            Err(error) => {
                let diagnostic = convert_error(error, tokens, input.eof_offset());
                debug!(
                    error:% = diagnostic,
                    position:? = diagnostic.position();
                    "Statement failed, synchronizing"
                );
                collector.emit(diagnostic);
                synchronize(&mut input);
            }
        }
    }

    debug!(statements = statements.len(), errors = collector.len(); "Parsing finished");
    collector.finish(ClassDiagram { statements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Result<ClassDiagram, ParseError> {
        build_diagram(&tokenize(source), &ParserConfig::default())
    }

    #[test]
    fn test_parse_styles() {
        let styles = parse_styles("fill:#f9f, stroke : #333,,stroke-width:4px;");
        assert_eq!(
            styles,
            vec![
                Style::new("fill", "#f9f"),
                Style::new("stroke", "#333"),
                Style::new("stroke-width", "4px"),
            ]
        );
        assert!(parse_styles(" , ").is_empty());
    }

    #[test]
    fn test_body_annotation() {
        assert_eq!(body_annotation("<<interface>>"), Some("interface".to_string()));
        assert_eq!(body_annotation("+int x"), None);
    }

    #[test]
    fn test_lookahead_restores_input() {
        let tokens = tokenize("A : +x");
        let mut input = Stateful {
            input: TokenSlice::new(&tokens),
            state: TokenCount(tokens.len()),
        };
        let before = input.eof_offset();

        assert!(!lookahead(&mut input, relation_start));
        assert_eq!(input.eof_offset(), before);
        assert!(lookahead(&mut input, member_start));
        assert_eq!(input.eof_offset(), before);
    }

    #[test]
    fn test_synchronize_stops_after_newline() {
        let tokens = tokenize("A B C\nclass D");
        let mut input = Stateful {
            input: TokenSlice::new(&tokens),
            state: TokenCount(tokens.len()),
        };

        synchronize(&mut input);
        assert_eq!(peek_kind(&mut input), TokenKind::Class);
    }

    #[test]
    fn test_synchronize_stops_before_keyword() {
        let tokens = tokenize("A B note \"x\"");
        let mut input = Stateful {
            input: TokenSlice::new(&tokens),
            state: TokenCount(tokens.len()),
        };

        synchronize(&mut input);
        assert_eq!(peek_kind(&mut input), TokenKind::Note);
    }

    #[test]
    fn test_statement_positions() {
        let diagram = parse_source("classDiagram\n  class Shape\n  A --> B").expect("valid diagram");

        let first = diagram.statements[0].position();
        assert_eq!((first.line(), first.column()), (2, 3));
        assert_eq!(first.token_index(), 2);

        let second = diagram.statements[1].position();
        assert_eq!((second.line(), second.column()), (3, 3));
        assert_eq!(second.span().start(), 29);
        assert_eq!(second.span().end(), 36);
    }

    #[test]
    fn test_empty_token_stream() {
        let diagram = build_diagram(&[], &ParserConfig::default()).expect("nothing to parse");
        assert!(diagram.statements.is_empty());
    }
}
