//! Integration tests for the public `tokenize` + `parse` pipeline.

use classdiagram_parser::{
    ParserConfig, TokenKind,
    ast::Statement,
    error::ErrorCode,
    parse, parse_with_config, tokenize,
};

const LIBRARY: &str = r#"classDiagram
    accTitle: Library model
    direction TB

    namespace Catalog {
        class Book {
            +String isbn
            +String title
            +checkout(Member member) bool
        }
        class Author
    }

    class Member["Library member"] {
        <<entity>>
        -int id
        +borrowed() List~Book~
    }

    Author "1..*" --> "*" Book : writes
    Member o-- Book
    Book : +int pages
    click Book href "https://example.com/books" "Open catalogue" _blank
    classDef highlight fill:#ffd,stroke:#333
    cssClass "Member" highlight
"#;

#[test]
fn parses_library_model() {
    let tokens = tokenize(LIBRARY);
    assert_eq!(tokens.last().map(|token| token.kind), Some(TokenKind::Eof));

    let diagram = parse(&tokens).expect("library model parses");
    assert_eq!(diagram.statements.len(), 10);

    let Statement::Namespace(catalog) = diagram.statements[2].inner() else {
        panic!("expected the catalog namespace");
    };
    assert_eq!(catalog.classes.len(), 2);
    assert_eq!(catalog.classes[0].members.len(), 3);

    let member = diagram
        .classes()
        .find(|class| class.name == "Member")
        .expect("member class");
    assert_eq!(member.label.as_deref(), Some("Library member"));
    assert_eq!(member.annotations, vec!["entity".to_string()]);
    assert_eq!(member.members[1].return_type.as_deref(), Some("List~Book~"));
}

#[test]
fn statement_positions_point_at_source() {
    let diagram = parse(&tokenize(LIBRARY)).expect("library model parses");

    for statement in &diagram.statements {
        let position = statement.position();
        let first_line = LIBRARY.lines().nth(position.line() - 1).unwrap_or_default();
        assert!(
            LIBRARY[position.span().start()..].starts_with(first_line.trim_start()),
            "statement at {position} does not start its line"
        );
    }
}

#[test]
fn recovers_and_reports_every_failure() {
    let source = "classDiagram\nclass A\nclass\nA --> B\nnote for\nclass C\n";
    let err = parse(&tokenize(source)).expect_err("two statements are malformed");

    assert_eq!(err.diagnostics().len(), 2);
    assert!(err.to_string().ends_with("(+1 more)"));

    let (diagnostics, partial) = err.into_parts();
    assert!(diagnostics.iter().all(|diagnostic| diagnostic.position().is_some()));

    let partial = partial.expect("recoverable errors keep the partial diagram");
    assert_eq!(partial.statements.len(), 3);
    assert!(matches!(
        partial.statements[1].inner(),
        Statement::Relation(relation) if relation.target_class == "B"
    ));
}

#[test]
fn header_can_be_required() {
    let config = ParserConfig::default().with_require_header(true);

    let err = parse_with_config(&tokenize("class A"), &config).expect_err("no header");
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E103));
    assert!(err.partial().is_none());

    assert!(parse_with_config(&tokenize("classDiagram\nclass A"), &config).is_ok());
}

#[test]
fn unscannable_characters_do_not_fail() {
    let diagram =
        parse(&tokenize("class A \u{00a7}\u{00a7}\nclass B")).expect("unscannable input is dropped");
    assert_eq!(diagram.classes().count(), 2);
}
