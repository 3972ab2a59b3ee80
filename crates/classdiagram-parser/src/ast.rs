//! Parser AST types
//!
//! This module defines the data structures representing a parsed class
//! diagram. These types form the output of the parser and are never mutated
//! after a parse returns.
//!
//! ## Source Location Tracking
//!
//! Every top-level statement and every class nested in a namespace is wrapped
//! in [`Spanned<T>`] so consumers can map it back to the source.

use std::fmt;

use crate::{lexer::VISIBILITY_SIGILS, span::Spanned};

/// A parsed class diagram: statements in source order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassDiagram {
    pub statements: Vec<Spanned<Statement>>,
}

impl ClassDiagram {
    /// Top-level class statements, in source order.
    ///
    /// Classes nested in namespaces are not included.
    pub fn classes(&self) -> impl Iterator<Item = &ClassStatement> {
        self.statements
            .iter()
            .filter_map(|statement| match statement.inner() {
                Statement::Class(class) => Some(class),
                _ => None,
            })
    }
}

/// One statement of a class diagram.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Statement {
    Class(ClassStatement),
    Namespace(NamespaceStatement),
    Relation(RelationStatement),
    Member(MemberStatement),
    Note(NoteStatement),
    Annotation(AnnotationStatement),
    Style(StyleStatement),
    ClassDef(ClassDefStatement),
    Click(ClickStatement),
    Direction(Direction),
    Accessibility(AccessibilityStatement),
}

/// `class Name~T~["label"]:::css { members }`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassStatement {
    pub name: String,
    pub label: Option<String>,
    pub members: Vec<Member>,
    pub css_class: Option<String>,
    /// Payload of a `~T~` suffix on the class name.
    pub generic: Option<String>,
    /// `<<annotation>>` lines written inside the class body.
    pub annotations: Vec<String>,
}

impl ClassStatement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NamespaceStatement {
    /// Dotted namespace path, e.g. `Geo.Shapes`.
    pub name: String,
    pub classes: Vec<Spanned<ClassStatement>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RelationStatement {
    pub source_class: String,
    pub target_class: String,
    pub relation: Relation,
    /// Cardinality or role written next to the source class.
    pub source_label: Option<String>,
    pub target_label: Option<String>,
    /// Text after the trailing `:`.
    pub relation_label: Option<String>,
}

/// `Class : +member`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MemberStatement {
    pub class_name: String,
    pub member: Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NoteStatement {
    pub text: String,
    pub target_class: Option<String>,
}

/// `<<annotation>> Class` or the `Class : Annotation` shorthand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AnnotationStatement {
    pub class_name: String,
    pub annotation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StyleStatement {
    pub class_name: String,
    pub styles: Vec<Style>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClassDefStatement {
    pub class_names: Vec<String>,
    pub styles: Vec<Style>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClickStatement {
    pub class_name: String,
    pub action: ClickAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AccessibilityKind {
    Title,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AccessibilityStatement {
    pub kind: AccessibilityKind,
    pub value: String,
}

/// Layout direction of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Direction {
    TopToBottom,
    BottomToTop,
    RightToLeft,
    LeftToRight,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Direction::TopToBottom => "TB",
            Direction::BottomToTop => "BT",
            Direction::RightToLeft => "RL",
            Direction::LeftToRight => "LR",
        };
        f.write_str(code)
    }
}

/// What happens when a class is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClickAction {
    Callback {
        name: String,
        args: Option<String>,
        tooltip: Option<String>,
    },
    Link {
        url: String,
        /// `_self`, `_blank`, `_parent` or `_top`.
        target: Option<String>,
        tooltip: Option<String>,
    },
}

/// A single `property:value` entry of a style list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Style {
    pub property: String,
    pub value: String,
}

impl Style {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.property, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
    Package,
}

impl Visibility {
    /// Visibility marked by a leading sigil character.
    pub fn from_sigil(sigil: char) -> Option<Self> {
        match sigil {
            '+' => Some(Visibility::Public),
            '-' => Some(Visibility::Private),
            '#' => Some(Visibility::Protected),
            '~' => Some(Visibility::Package),
            _ => None,
        }
    }

    pub fn sigil(self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Private => '-',
            Visibility::Protected => '#',
            Visibility::Package => '~',
        }
    }
}

/// Method classifier written as a trailing `$` or `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Classifier {
    Static,
    Abstract,
}

/// Type tag of every method member.
pub const METHOD_TYPE: &str = "method";

/// An attribute or method of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Member {
    pub name: String,
    /// Declared type of an attribute; always [`METHOD_TYPE`] for methods.
    pub member_type: Option<String>,
    pub visibility: Visibility,
    pub is_method: bool,
    /// Raw text between the parentheses of a method.
    pub parameters: Option<String>,
    pub return_type: Option<String>,
    pub classifier: Option<Classifier>,
}

impl Member {
    /// Build a member from the raw text of a member line.
    ///
    /// A leading `:` is dropped, then one visibility sigil. Text containing
    /// `(` is a method; anything else is `type name` or a bare `name`.
    ///
    /// ```
    /// # use classdiagram_parser::ast::{Member, Visibility};
    /// let member = Member::parse("-bar(x)");
    /// assert_eq!(member.name, "bar");
    /// assert_eq!(member.visibility, Visibility::Private);
    /// assert!(member.is_method);
    /// ```
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let text = text.strip_prefix(':').unwrap_or(text).trim_start();

        let (visibility, rest) = match text.strip_prefix(VISIBILITY_SIGILS) {
            Some(rest) => (
                text.chars()
                    .next()
                    .and_then(Visibility::from_sigil)
                    .unwrap_or_default(),
                rest.trim_start(),
            ),
            None => (Visibility::Public, text),
        };

        match rest.find('(') {
            Some(open) => Self::method(visibility, rest, open),
            None => Self::attribute(visibility, rest),
        }
    }

    fn method(visibility: Visibility, text: &str, open: usize) -> Self {
        let name = text[..open].trim();
        let (parameters, tail) = match text.rfind(')').filter(|&close| close > open) {
            Some(close) => (&text[open + 1..close], &text[close + 1..]),
            None => (&text[open + 1..], ""),
        };

        let mut tail = tail.trim();
        let classifier = if let Some(stripped) = tail.strip_suffix('$') {
            tail = stripped.trim_end();
            Some(Classifier::Static)
        } else if let Some(stripped) = tail.strip_suffix('*') {
            tail = stripped.trim_end();
            Some(Classifier::Abstract)
        } else {
            None
        };

        let parameters = parameters.trim();
        Self {
            name: name.to_string(),
            member_type: Some(METHOD_TYPE.to_string()),
            visibility,
            is_method: true,
            parameters: (!parameters.is_empty()).then(|| parameters.to_string()),
            return_type: (!tail.is_empty()).then(|| tail.to_string()),
            classifier,
        }
    }

    fn attribute(visibility: Visibility, text: &str) -> Self {
        let (member_type, name) = match text.split_once(char::is_whitespace) {
            Some((member_type, name)) => (Some(member_type.to_string()), name.trim()),
            None => (None, text),
        };
        Self {
            name: name.to_string(),
            member_type,
            visibility,
            is_method: false,
            parameters: None,
            return_type: None,
            classifier: None,
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.visibility.sigil())?;
        if self.is_method {
            write!(
                f,
                "{}({})",
                self.name,
                self.parameters.as_deref().unwrap_or_default()
            )?;
            if let Some(return_type) = &self.return_type {
                write!(f, " {return_type}")?;
            }
            match self.classifier {
                Some(Classifier::Static) => f.write_str("$"),
                Some(Classifier::Abstract) => f.write_str("*"),
                None => Ok(()),
            }
        } else {
            match &self.member_type {
                Some(member_type) => write!(f, "{member_type} {}", self.name),
                None => write!(f, "{}", self.name),
            }
        }
    }
}

/// Arrowhead or decoration at one end of a relation line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RelationType {
    #[default]
    None,
    Extension,
    Dependency,
    Composition,
    Aggregation,
    Lollipop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
}

/// The line of a relation and the markers at its ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Relation {
    /// Marker at the source-class end.
    pub start: RelationType,
    /// Marker at the target-class end.
    pub end: RelationType,
    pub line_style: LineStyle,
}
