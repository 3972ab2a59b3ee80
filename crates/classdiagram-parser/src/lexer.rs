//! Lexical analyzer for class-diagram source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! It is context sensitive: a small state machine decides how the next
//! characters are read (class headers, class bodies, quoted strings, callback
//! arguments, accessibility values and so on). Each state has one scan
//! function built from winnow recognizers; the driver loop dispatches on the
//! current state and skips one character whenever the scan fails.
//!
//! The public entry point is [`tokenize`]. It never fails: characters that
//! cannot be scanned are dropped (and logged at `trace` level), and the
//! returned sequence always ends with exactly one [`TokenKind::Eof`].

use log::{debug, trace};
use winnow::{
    Parser,
    ascii::Caseless,
    combinator::{alt, delimited, not, peek, preceded, terminated},
    error::{ContextError, ErrMode},
    stream::Stream,
    token::{literal, one_of, take_till, take_while},
};

use crate::{
    span::Span,
    tokens::{Token, TokenKind},
};

type Input<'src> = &'src str;
type LexResult<O> = Result<O, ErrMode<ContextError>>;

/// Leading characters that mark a member's visibility.
pub(crate) const VISIBILITY_SIGILS: [char; 4] = ['+', '-', '#', '~'];

/// The scanning mode of the lexer. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexerState {
    Initial,
    String,
    BackquoteString,
    Generic,
    /// After `class`, before the body or the end of the line.
    Class,
    ClassBody,
    /// After `namespace`, before `{` or the end of the line.
    Namespace,
    NamespaceBody,
    CallbackName,
    CallbackArgs,
    AccTitle,
    AccDescr,
    AccDescrMultiline,
}

/// Running scan position. Lines and columns are 1-based.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    column: usize,
}

/// What an operator recognizer matched.
#[derive(Debug, Clone, Copy)]
enum Operator {
    Single(TokenKind),
    /// Two tokens sharing one lexeme, split after `usize` bytes.
    Pair(TokenKind, TokenKind, usize),
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Ensure the next character does not continue a word.
fn word_boundary(input: &mut Input<'_>) -> LexResult<()> {
    peek(not(one_of(is_word_char))).parse_next(input)
}

/// Byte length of the identifier at the start of `text`, or 0.
///
/// Identifiers start with a letter or `_` and continue with letters, digits,
/// `_`, and `-` when the hyphen is followed by another word character, so
/// `classDiagram-v2` is one identifier while `A--B` is not.
fn identifier_len(text: &str) -> usize {
    let mut chars = text.char_indices().peekable();
    match chars.next() {
        Some((_, c)) if c.is_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    let mut end = text.chars().next().map_or(0, char::len_utf8);
    while let Some((idx, c)) = chars.next() {
        if is_word_char(c) {
            end = idx + c.len_utf8();
        } else if c == '-' && chars.peek().is_some_and(|&(_, next)| is_word_char(next)) {
            end = idx + 1;
        } else {
            break;
        }
    }
    end
}

/// Whether `text` is exactly one identifier.
pub(crate) fn is_identifier(text: &str) -> bool {
    !text.is_empty() && identifier_len(text) == text.len()
}

/// Parse an identifier run
fn word<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    match identifier_len(input) {
        0 => Err(backtrack()),
        len => Ok(input.next_slice(len)),
    }
}

fn number<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)
}

/// Whitespace other than newlines
fn whitespace<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n').parse_next(input)
}

/// Parse line comment starting with '%%'
fn line_comment<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    preceded("%%", take_till(0.., '\n')).parse_next(input)
}

/// Body of a double-quoted string up to (not including) the closing quote.
///
/// A backslash skips the following character; escapes are kept verbatim.
fn string_body<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    let end = {
        let mut chars = input.char_indices();
        let mut end = None;
        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => {
                    end = Some(idx);
                    break;
                }
                _ => {}
            }
        }
        end
    };
    match end {
        Some(len) => Ok(input.next_slice(len)),
        None => Err(backtrack()),
    }
}

fn string_literal<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    delimited('"', string_body, '"').parse_next(input)
}

fn backquote_string<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    delimited('`', take_till(0.., ['`', '\n']), '`').parse_next(input)
}

fn generic_type<'src>(input: &mut Input<'src>) -> LexResult<&'src str> {
    delimited('~', take_till(0.., ['~', '\n']), '~').parse_next(input)
}

/// Parse multi-character operators (order matters - longest first)
fn multi_char_operator(input: &mut Input<'_>) -> LexResult<Operator> {
    alt((
        literal("<|--").value(Operator::Pair(TokenKind::Extension, TokenKind::Line, 2)),
        literal("-->").value(Operator::Pair(TokenKind::Line, TokenKind::Dependency, 2)),
        literal("--").value(Operator::Single(TokenKind::Line)),
        literal("..").value(Operator::Single(TokenKind::DottedLine)),
        literal("<<").value(Operator::Single(TokenKind::AnnotationStart)),
        literal(">>").value(Operator::Single(TokenKind::AnnotationEnd)),
        literal(":::").value(Operator::Single(TokenKind::StyleSeparator)),
        alt((
            literal("<|").value(Operator::Single(TokenKind::Extension)),
            literal("|>").value(Operator::Single(TokenKind::Extension)),
            literal("()").value(Operator::Single(TokenKind::Lollipop)),
        )),
    ))
    .parse_next(input)
}

/// A bare `o` that does not start a word is an aggregation marker.
fn aggregation(input: &mut Input<'_>) -> LexResult<Operator> {
    terminated('o', word_boundary)
        .value(Operator::Single(TokenKind::Aggregation))
        .parse_next(input)
}

/// Parse single character tokens
fn single_char_token(input: &mut Input<'_>) -> LexResult<Operator> {
    alt((
        '{'.value(TokenKind::StructStart),
        '}'.value(TokenKind::StructStop),
        '['.value(TokenKind::SquareStart),
        ']'.value(TokenKind::SquareStop),
        ':'.value(TokenKind::Colon),
        ','.value(TokenKind::Comma),
        '.'.value(TokenKind::Dot),
        alt((
            '*'.value(TokenKind::Composition),
            '<'.value(TokenKind::Dependency),
            '>'.value(TokenKind::Dependency),
            one_of(|c: char| c.is_ascii_punctuation()).value(TokenKind::Punctuation),
        )),
    ))
    .map(Operator::Single)
    .parse_next(input)
}

/// `for` after `note`, including the separating whitespace.
fn note_for_suffix(input: &mut Input<'_>) -> LexResult<()> {
    (whitespace, literal(Caseless("for")), word_boundary)
        .void()
        .parse_next(input)
}

/// The direction after `direction`, including the separating whitespace.
fn direction_suffix(input: &mut Input<'_>) -> LexResult<TokenKind> {
    preceded(
        whitespace,
        terminated(
            alt((
                literal(Caseless("TB")).value(TokenKind::DirectionTb),
                literal(Caseless("BT")).value(TokenKind::DirectionBt),
                literal(Caseless("RL")).value(TokenKind::DirectionRl),
                literal(Caseless("LR")).value(TokenKind::DirectionLr),
            )),
            word_boundary,
        ),
    )
    .parse_next(input)
}

/// `()` with optional whitespace inside.
fn empty_args(input: &mut Input<'_>) -> LexResult<()> {
    ('(', take_while(0.., [' ', '\t']), ')')
        .void()
        .parse_next(input)
}

/// Lexer that accumulates tokens while walking the source once.
struct Lexer<'src> {
    source: &'src str,
    cursor: Cursor,
    state: LexerState,
    /// State to return to once a string, backquote string or generic closes.
    resume: LexerState,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: Cursor {
                offset: 0,
                line: 1,
                column: 1,
            },
            state: LexerState::Initial,
            resume: LexerState::Initial,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the whole input.
    fn tokenize(mut self) -> Vec<Token> {
        while !self.rest().is_empty() {
            let scanned = match self.state {
                LexerState::Initial | LexerState::NamespaceBody => self.scan_initial(),
                LexerState::String => self.scan_string(),
                LexerState::BackquoteString => self.scan_backquote_string(),
                LexerState::Generic => self.scan_generic(),
                LexerState::Class => self.scan_class_header(),
                LexerState::ClassBody => self.scan_class_body(),
                LexerState::Namespace => self.scan_namespace_header(),
                LexerState::CallbackName => self.scan_callback_name(),
                LexerState::CallbackArgs => self.scan_callback_args(),
                LexerState::AccTitle => self.scan_acc_title(),
                LexerState::AccDescr => self.scan_acc_descr(),
                LexerState::AccDescrMultiline => self.scan_acc_descr_multiline(),
            };
            if !scanned {
                self.skip_unscannable();
            }
        }

        let end = self.cursor;
        self.emit(TokenKind::Eof, "", end);
        debug!(tokens = self.tokens.len(); "Tokenization finished");
        self.tokens
    }

    fn rest(&self) -> &'src str {
        &self.source[self.cursor.offset..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn slice_from(&self, start: Cursor) -> &'src str {
        &self.source[start.offset..self.cursor.offset]
    }

    /// Move the cursor forward by `len` bytes, tracking lines and columns.
    fn advance(&mut self, len: usize) {
        let end = self.cursor.offset + len;
        for c in self.source[self.cursor.offset..end].chars() {
            if c == '\n' {
                self.cursor.line += 1;
                self.cursor.column = 1;
            } else {
                self.cursor.column += 1;
            }
        }
        self.cursor.offset = end;
    }

    /// Run a recognizer at the cursor; on success consume what it matched.
    ///
    /// Returns the output together with the cursor from before the match.
    fn attempt<O, P>(&mut self, mut parser: P) -> Option<(O, Cursor)>
    where
        P: Parser<Input<'src>, O, ErrMode<ContextError>>,
    {
        let start = self.cursor;
        let mut input = self.rest();
        let output = parser.parse_next(&mut input).ok()?;
        let consumed = self.rest().len() - input.len();
        self.advance(consumed);
        Some((output, start))
    }

    fn emit(&mut self, kind: TokenKind, value: impl Into<String>, start: Cursor) {
        let span = Span::new(start.offset..self.cursor.offset);
        self.tokens
            .push(Token::new(kind, value, start.line, start.column, span));
    }

    /// Emit two tokens for one lexeme, such as `<|--`.
    fn emit_pair(&mut self, first: TokenKind, second: TokenKind, start: Cursor, split: usize) {
        let (head, tail) = self.slice_from(start).split_at(split);
        let middle = start.offset + split;
        self.tokens.push(Token::new(
            first,
            head,
            start.line,
            start.column,
            Span::new(start.offset..middle),
        ));
        self.tokens.push(Token::new(
            second,
            tail,
            start.line,
            start.column + head.chars().count(),
            Span::new(middle..self.cursor.offset),
        ));
    }

    fn emit_operator(&mut self, operator: Operator, start: Cursor) {
        match operator {
            Operator::Single(kind) => {
                let text = self.slice_from(start);
                self.emit(kind, text, start);
                if kind == TokenKind::StructStop {
                    self.state = LexerState::Initial;
                }
            }
            Operator::Pair(first, second, split) => self.emit_pair(first, second, start, split),
        }
    }

    /// Drop one character and fall back to the initial state.
    fn skip_unscannable(&mut self) {
        if let Some(c) = self.peek_char() {
            trace!(
                character:? = c,
                line = self.cursor.line,
                column = self.cursor.column,
                state:? = self.state;
                "Skipping unscannable character"
            );
            self.advance(c.len_utf8());
        }
        self.state = LexerState::Initial;
    }

    fn skip_whitespace(&mut self) -> bool {
        self.attempt(whitespace).is_some()
    }

    fn skip_comment(&mut self) -> bool {
        self.attempt(line_comment).is_some()
    }

    fn scan_newline(&mut self) -> bool {
        match self.attempt('\n') {
            Some((_, start)) => {
                self.emit(TokenKind::Newline, "\n", start);
                true
            }
            None => false,
        }
    }

    /// Enter a delimited sub-lexer and scan it immediately.
    ///
    /// The sub-lexer returns to the current state once its closer is seen.
    fn enter_delimited(&mut self, state: LexerState) -> bool {
        self.resume = self.state;
        self.state = state;
        match state {
            LexerState::String => self.scan_string(),
            LexerState::BackquoteString => self.scan_backquote_string(),
            _ => self.scan_generic(),
        }
    }

    fn scan_string(&mut self) -> bool {
        self.scan_literal(string_literal, TokenKind::String)
    }

    fn scan_backquote_string(&mut self) -> bool {
        self.scan_literal(backquote_string, TokenKind::BackquoteString)
    }

    fn scan_generic(&mut self) -> bool {
        self.scan_literal(generic_type, TokenKind::GenericType)
    }

    fn scan_literal(
        &mut self,
        parser: fn(&mut Input<'src>) -> LexResult<&'src str>,
        kind: TokenKind,
    ) -> bool {
        match self.attempt(parser) {
            Some((content, start)) => {
                self.emit(kind, content, start);
                self.state = self.resume;
                true
            }
            None => false,
        }
    }

    fn scan_initial(&mut self) -> bool {
        if self.skip_whitespace() || self.skip_comment() {
            return true;
        }
        match self.peek_char() {
            Some('\n') => self.scan_newline(),
            Some('"') => self.enter_delimited(LexerState::String),
            Some('`') => self.enter_delimited(LexerState::BackquoteString),
            Some('~') => self.enter_delimited(LexerState::Generic),
            Some(':') if !self.rest().starts_with(":::") => self.scan_colon(),
            Some(_) => {
                self.scan_operator()
                    || self.scan_number()
                    || self.scan_word()
                    || self.scan_punctuation()
            }
            None => false,
        }
    }

    fn scan_operator(&mut self) -> bool {
        match self.attempt(alt((multi_char_operator, aggregation))) {
            Some((operator, start)) => {
                self.emit_operator(operator, start);
                true
            }
            None => false,
        }
    }

    fn scan_punctuation(&mut self) -> bool {
        match self.attempt(single_char_token) {
            Some((operator, start)) => {
                self.emit_operator(operator, start);
                true
            }
            None => false,
        }
    }

    fn scan_number(&mut self) -> bool {
        match self.attempt(number) {
            Some((digits, start)) => {
                self.emit(TokenKind::Number, digits, start);
                true
            }
            None => false,
        }
    }

    /// Scan an identifier and classify keywords.
    fn scan_word(&mut self) -> bool {
        let Some((text, start)) = self.attempt(word) else {
            return false;
        };

        let kind = match text.to_ascii_lowercase().as_str() {
            "classdiagram" | "classdiagram-v2" => TokenKind::ClassDiagram,
            "class" => {
                self.state = LexerState::Class;
                TokenKind::Class
            }
            "namespace" => {
                self.state = LexerState::Namespace;
                TokenKind::Namespace
            }
            "note" => {
                if self.attempt(note_for_suffix).is_some() {
                    TokenKind::NoteFor
                } else {
                    TokenKind::Note
                }
            }
            "style" => TokenKind::Style,
            "classdef" => TokenKind::ClassDef,
            "callback" => TokenKind::Callback,
            "call" if self.follows_click_target() => {
                self.state = LexerState::CallbackName;
                TokenKind::Call
            }
            "link" => TokenKind::Link,
            "click" => TokenKind::Click,
            "href" => TokenKind::Href,
            "cssclass" => TokenKind::CssClass,
            "acctitle" => {
                self.state = LexerState::AccTitle;
                TokenKind::AccTitle
            }
            "accdescr" => {
                self.state = LexerState::AccDescr;
                TokenKind::AccDescr
            }
            "direction" => match self.attempt(direction_suffix) {
                Some((direction, _)) => direction,
                None => TokenKind::Alpha,
            },
            "_self" | "_blank" | "_parent" | "_top" => TokenKind::LinkTarget,
            _ => TokenKind::Alpha,
        };

        let value = self.slice_from(start);
        self.emit(kind, value, start);
        true
    }

    /// `call` is only a keyword right after `click <class>`.
    fn follows_click_target(&self) -> bool {
        match self.tokens.as_slice() {
            [.., click, target] => {
                click.kind == TokenKind::Click
                    && matches!(target.kind, TokenKind::Alpha | TokenKind::BackquoteString)
            }
            _ => false,
        }
    }

    /// Disambiguate a bare `:` by looking at the rest of its line.
    ///
    /// - a visibility sigil or a `(` makes it a member definition: `COLON`
    ///   followed by the rest of the line as `MEMBER`;
    /// - a single identifier is the annotation shorthand: only `COLON` is
    ///   emitted and the word is scanned normally;
    /// - anything else is a relation label: one `LABEL` token holding `:`
    ///   and the trimmed remainder.
    fn scan_colon(&mut self) -> bool {
        let Some((_, start)) = self.attempt(':') else {
            return false;
        };
        let rest = self.rest();
        let line = &rest[..rest.find('\n').unwrap_or(rest.len())];
        let remainder = line.trim();

        if remainder.starts_with(VISIBILITY_SIGILS) || line.contains('(') {
            self.emit(TokenKind::Colon, ":", start);
            self.skip_whitespace();
            let member_start = self.cursor;
            self.advance(remainder.len());
            self.emit(TokenKind::Member, remainder, member_start);
        } else if is_identifier(remainder) {
            // The word is a label or annotation name even when it spells a keyword.
            self.emit(TokenKind::Colon, ":", start);
            self.skip_whitespace();
            self.scan_plain_word();
        } else {
            self.advance(line.trim_end().len());
            self.emit(TokenKind::Label, format!(":{remainder}"), start);
        }
        true
    }

    fn scan_class_header(&mut self) -> bool {
        if self.skip_whitespace() || self.skip_comment() {
            return true;
        }
        match self.peek_char() {
            Some('\n') => {
                self.state = LexerState::Initial;
                self.scan_newline()
            }
            Some('{') => {
                let Some((_, start)) = self.attempt('{') else {
                    return false;
                };
                self.emit(TokenKind::StructStart, "{", start);
                self.state = LexerState::ClassBody;
                true
            }
            Some('"') => self.enter_delimited(LexerState::String),
            Some('`') => self.enter_delimited(LexerState::BackquoteString),
            Some('~') => self.enter_delimited(LexerState::Generic),
            Some(':') if self.rest().starts_with(":::") => self.scan_operator(),
            Some(_) => self.scan_plain_word() || self.scan_punctuation(),
            None => false,
        }
    }

    fn scan_namespace_header(&mut self) -> bool {
        if self.skip_whitespace() || self.skip_comment() {
            return true;
        }
        match self.peek_char() {
            Some('\n') => {
                self.state = LexerState::Initial;
                self.scan_newline()
            }
            Some('{') => {
                let Some((_, start)) = self.attempt('{') else {
                    return false;
                };
                self.emit(TokenKind::StructStart, "{", start);
                self.state = LexerState::NamespaceBody;
                true
            }
            Some('`') => self.enter_delimited(LexerState::BackquoteString),
            Some(_) => self.scan_plain_word() || self.scan_punctuation(),
            None => false,
        }
    }

    /// An identifier without keyword classification.
    fn scan_plain_word(&mut self) -> bool {
        match self.attempt(word) {
            Some((text, start)) => {
                self.emit(TokenKind::Alpha, text, start);
                true
            }
            None => false,
        }
    }

    fn scan_class_body(&mut self) -> bool {
        if self.skip_whitespace() || self.skip_comment() {
            return true;
        }
        match self.peek_char() {
            Some('\n') => self.scan_newline(),
            Some('{') | Some('}') => self.scan_punctuation(),
            Some(_) => {
                let Some((text, start)) = self.attempt(take_till(1.., ['\n', '{', '}'])) else {
                    return false;
                };
                let member = text.trim_end();
                if !member.is_empty() {
                    let end = self.cursor;
                    self.cursor = start;
                    self.advance(member.len());
                    self.emit(TokenKind::Member, member, start);
                    self.advance(end.offset - self.cursor.offset);
                }
                true
            }
            None => false,
        }
    }

    fn scan_callback_name(&mut self) -> bool {
        if self.skip_whitespace() {
            return true;
        }
        if self.peek_char() == Some('\n') {
            self.state = LexerState::Initial;
            return self.scan_newline();
        }

        let name = take_while(1.., |c: char| !c.is_whitespace() && c != '(');
        if let Some((name, start)) = self.attempt(name) {
            self.emit(TokenKind::CallbackName, name, start);
        }

        if self.attempt(empty_args).is_some() {
            self.state = LexerState::Initial;
        } else if self.attempt('(').is_some() {
            self.state = LexerState::CallbackArgs;
        } else if self.tokens.last().is_some_and(|t| t.is(TokenKind::CallbackName)) {
            self.state = LexerState::Initial;
        } else {
            return false;
        }
        true
    }

    fn scan_callback_args(&mut self) -> bool {
        let args = terminated(take_till(0.., [')', '\n']), ')');
        let Some((args, start)) = self.attempt(args) else {
            return false;
        };
        let trimmed = args.trim();
        if !trimmed.is_empty() {
            self.tokens.push(Token::new(
                TokenKind::CallbackArgs,
                trimmed,
                start.line,
                start.column,
                Span::new(start.offset..start.offset + args.len()),
            ));
        }
        self.state = LexerState::Initial;
        true
    }

    /// Capture the rest of the line after `:` as a single value token.
    fn scan_line_value(&mut self, kind: TokenKind) -> bool {
        let value = preceded(
            (take_while(0.., [' ', '\t']), ':', take_while(0.., [' ', '\t'])),
            take_till(0.., '\n'),
        );
        match self.attempt(value) {
            Some((text, start)) => {
                self.emit(kind, text.trim(), start);
                self.state = LexerState::Initial;
                true
            }
            None => false,
        }
    }

    /// A newline before the value ends the accessibility statement.
    fn abandon_at_newline(&mut self) -> bool {
        self.state = LexerState::Initial;
        self.scan_newline()
    }

    fn scan_acc_title(&mut self) -> bool {
        if self.skip_whitespace() {
            return true;
        }
        if self.peek_char() == Some('\n') {
            return self.abandon_at_newline();
        }
        self.scan_line_value(TokenKind::AccTitleValue)
    }

    fn scan_acc_descr(&mut self) -> bool {
        if self.skip_whitespace() {
            return true;
        }
        if self.peek_char() == Some('\n') {
            return self.abandon_at_newline();
        }
        if self.attempt('{').is_some() {
            self.state = LexerState::AccDescrMultiline;
            return true;
        }
        self.scan_line_value(TokenKind::AccDescrValue)
    }

    fn scan_acc_descr_multiline(&mut self) -> bool {
        let Some((text, start)) = self.attempt(terminated(take_till(0.., '}'), '}')) else {
            return false;
        };
        self.emit(TokenKind::AccDescrMultilineValue, text.trim(), start);
        self.state = LexerState::Initial;
        true
    }
}

/// Convert class-diagram source text into tokens.
///
/// Tokenization never fails. The returned sequence preserves source order
/// and always ends with exactly one [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}
