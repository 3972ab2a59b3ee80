//! Source-level tests for the class-diagram parser
//!
//! These tests run the lexer and parser together over small diagrams and check
//! the resulting statements, or the diagnostics for malformed input.

use crate::{
    ast::{
        AccessibilityKind, ClassDiagram, ClassStatement, ClickAction, Direction, LineStyle,
        RelationType, Statement, Style, Visibility,
    },
    error::{ErrorCode, ParseError},
    lexer, parser,
};

/// Helper function to tokenize and parse a source string
fn parse_source(source: &str) -> Result<ClassDiagram, ParseError> {
    let tokens = lexer::tokenize(source);
    parser::build_diagram(&tokens, &parser::ParserConfig::default())
}

/// Helper function to parse a source string and assert success
fn assert_parses_successfully(source: &str) -> ClassDiagram {
    match parse_source(source) {
        Ok(diagram) => diagram,
        Err(e) => panic!("Expected parsing to succeed, but got error: {}", e),
    }
}

/// Helper function to parse a source string and assert failure
fn assert_parse_fails(source: &str) -> ParseError {
    match parse_source(source) {
        Ok(diagram) => panic!("Expected parsing to fail, but got {:?}", diagram),
        Err(e) => e,
    }
}

/// Helper to parse a diagram holding exactly one statement
fn single_statement(source: &str) -> Statement {
    let diagram = assert_parses_successfully(source);
    assert_eq!(
        diagram.statements.len(),
        1,
        "expected one statement in {:?}",
        diagram.statements
    );
    diagram.statements[0].inner().clone()
}

fn class_names(diagram: &ClassDiagram) -> Vec<&str> {
    diagram.classes().map(|class| class.name.as_str()).collect()
}

#[test]
fn test_empty_diagram() {
    assert!(assert_parses_successfully("").statements.is_empty());
    assert!(assert_parses_successfully("classDiagram\n").statements.is_empty());
    assert!(
        assert_parses_successfully("classDiagram\n%% nothing here\n\n")
            .statements
            .is_empty()
    );
}

#[test]
fn test_header_variants() {
    for source in [
        "classDiagram\nclass A",
        "classDiagram-v2\nclass A",
        "%% leading comment\nclassDiagram\nclass A",
        "class A",
    ] {
        let diagram = assert_parses_successfully(source);
        assert_eq!(class_names(&diagram), vec!["A"], "source: {source:?}");
    }
}

#[test]
fn test_simple_class() {
    let Statement::Class(class) = single_statement("classDiagram\nclass Animal") else {
        panic!("expected a class statement");
    };
    assert_eq!(class, ClassStatement::new("Animal"));
}

#[test]
fn test_class_with_body() {
    let source = r#"classDiagram
class Animal {
    +String name
    -int age
    +isMammal() bool
    +mate()$
}"#;
    let Statement::Class(class) = single_statement(source) else {
        panic!("expected a class statement");
    };

    assert_eq!(class.name, "Animal");
    assert_eq!(class.members.len(), 4);

    assert_eq!(class.members[0].name, "name");
    assert_eq!(class.members[0].member_type.as_deref(), Some("String"));
    assert_eq!(class.members[0].visibility, Visibility::Public);
    assert!(!class.members[0].is_method);

    assert_eq!(class.members[1].visibility, Visibility::Private);

    assert!(class.members[2].is_method);
    assert_eq!(class.members[2].name, "isMammal");
    assert_eq!(class.members[2].return_type.as_deref(), Some("bool"));

    assert!(class.members[3].classifier.is_some());
}

#[test]
fn test_member_visibility_defaults() {
    let Statement::Class(class) = single_statement("class A {\n  foo\n  -bar(x)\n}") else {
        panic!("expected a class statement");
    };

    let foo = &class.members[0];
    assert_eq!(foo.name, "foo");
    assert_eq!(foo.visibility, Visibility::Public);
    assert!(!foo.is_method);

    let bar = &class.members[1];
    assert_eq!(bar.name, "bar");
    assert_eq!(bar.visibility, Visibility::Private);
    assert!(bar.is_method);
    assert_eq!(bar.parameters.as_deref(), Some("x"));
}

#[test]
fn test_class_body_annotation() {
    let Statement::Class(class) = single_statement("class Shape {\n  <<interface>>\n  +draw()\n}")
    else {
        panic!("expected a class statement");
    };
    assert_eq!(class.annotations, vec!["interface".to_string()]);
    assert_eq!(class.members.len(), 1);
    assert_eq!(class.members[0].name, "draw");
}

#[test]
fn test_empty_class_body() {
    let Statement::Class(class) = single_statement("class Empty {\n}") else {
        panic!("expected a class statement");
    };
    assert!(class.members.is_empty());
}

#[test]
fn test_class_header_extras() {
    let Statement::Class(class) =
        single_statement("class Square~Shape~[\"A square\"]:::big")
    else {
        panic!("expected a class statement");
    };
    assert_eq!(class.name, "Square");
    assert_eq!(class.generic.as_deref(), Some("Shape"));
    assert_eq!(class.label.as_deref(), Some("A square"));
    assert_eq!(class.css_class.as_deref(), Some("big"));
}

#[test]
fn test_backquoted_class_name() {
    let Statement::Class(class) = single_statement("class `Big Shape`") else {
        panic!("expected a class statement");
    };
    assert_eq!(class.name, "Big Shape");
}

#[test]
fn test_extension_relation() {
    let Statement::Relation(relation) = single_statement("A <|-- B") else {
        panic!("expected a relation statement");
    };
    assert_eq!(relation.source_class, "A");
    assert_eq!(relation.target_class, "B");
    assert_eq!(relation.relation.start, RelationType::Extension);
    assert_eq!(relation.relation.end, RelationType::None);
    assert_eq!(relation.relation.line_style, LineStyle::Solid);
}

#[test]
fn test_relation_kinds() {
    let cases = [
        ("A --> B", RelationType::None, RelationType::Dependency, LineStyle::Solid),
        ("A --|> B", RelationType::None, RelationType::Extension, LineStyle::Solid),
        ("A ..|> B", RelationType::None, RelationType::Extension, LineStyle::Dotted),
        ("A *-- B", RelationType::Composition, RelationType::None, LineStyle::Solid),
        ("A o-- B", RelationType::Aggregation, RelationType::None, LineStyle::Solid),
        ("A --o B", RelationType::None, RelationType::Aggregation, LineStyle::Solid),
        ("A ()-- B", RelationType::Lollipop, RelationType::None, LineStyle::Solid),
        ("A <.. B", RelationType::Dependency, RelationType::None, LineStyle::Dotted),
        ("A .. B", RelationType::None, RelationType::None, LineStyle::Dotted),
        ("A -- B", RelationType::None, RelationType::None, LineStyle::Solid),
    ];

    for (source, start, end, line_style) in cases {
        let Statement::Relation(relation) = single_statement(source) else {
            panic!("expected a relation statement for {source:?}");
        };
        assert_eq!(relation.relation.start, start, "start of {source:?}");
        assert_eq!(relation.relation.end, end, "end of {source:?}");
        assert_eq!(relation.relation.line_style, line_style, "line of {source:?}");
    }
}

#[test]
fn test_relation_cardinality_and_label() {
    let Statement::Relation(relation) =
        single_statement("Customer \"1\" --> \"*\" Ticket : buys")
    else {
        panic!("expected a relation statement");
    };
    assert_eq!(relation.source_label.as_deref(), Some("1"));
    assert_eq!(relation.target_label.as_deref(), Some("*"));
    assert_eq!(relation.relation_label.as_deref(), Some("buys"));
}

#[test]
fn test_relation_multi_word_label() {
    let Statement::Relation(relation) = single_statement("A --> B : has many") else {
        panic!("expected a relation statement");
    };
    assert_eq!(relation.relation_label.as_deref(), Some("has many"));
}

#[test]
fn test_relation_keyword_label() {
    for (source, label) in [
        ("Page --> Anchor : link", "link"),
        ("Doc --> Sheet : style", "style"),
        ("A --> B : note", "note"),
    ] {
        let Statement::Relation(relation) = single_statement(source) else {
            panic!("expected a relation statement in {source:?}");
        };
        assert_eq!(relation.relation_label.as_deref(), Some(label));
    }
}

#[test]
fn test_relation_label_class_keyword_leaves_next_line_intact() {
    let diagram = assert_parses_successfully("A --> B : class\nclass C");

    assert_eq!(diagram.statements.len(), 2);
    let Statement::Relation(relation) = diagram.statements[0].inner() else {
        panic!("expected a relation statement");
    };
    assert_eq!(relation.relation_label.as_deref(), Some("class"));
    assert_eq!(class_names(&diagram), vec!["C"]);
}

#[test]
fn test_relation_with_generic_classes() {
    let Statement::Relation(relation) = single_statement("List~int~ <|-- IntList") else {
        panic!("expected a relation statement");
    };
    assert_eq!(relation.source_class, "List");
    assert_eq!(relation.target_class, "IntList");
}

#[test]
fn test_member_statements() {
    let Statement::Member(member) = single_statement("Animal : +int age") else {
        panic!("expected a member statement");
    };
    assert_eq!(member.class_name, "Animal");
    assert_eq!(member.member.name, "age");
    assert_eq!(member.member.member_type.as_deref(), Some("int"));

    let Statement::Member(member) = single_statement("Animal : isMammal()") else {
        panic!("expected a member statement");
    };
    assert!(member.member.is_method);
    assert_eq!(member.member.name, "isMammal");

    let Statement::Member(member) = single_statement("Animal : String nickname") else {
        panic!("expected a member statement");
    };
    assert_eq!(member.member.name, "nickname");
    assert_eq!(member.member.member_type.as_deref(), Some("String"));
}

#[test]
fn test_annotation_shorthand() {
    let Statement::Annotation(annotation) = single_statement("Shape : Interface") else {
        panic!("expected an annotation statement");
    };
    assert_eq!(annotation.class_name, "Shape");
    assert_eq!(annotation.annotation, "Interface");
}

#[test]
fn test_annotation_shorthand_keyword_name() {
    for name in ["note", "class", "link"] {
        let source = format!("Shape : {name}");
        let Statement::Annotation(annotation) = single_statement(&source) else {
            panic!("expected an annotation statement in {source:?}");
        };
        assert_eq!(annotation.class_name, "Shape");
        assert_eq!(annotation.annotation, name);
    }
}

#[test]
fn test_annotation_statement() {
    let Statement::Annotation(annotation) = single_statement("<<interface>> Shape") else {
        panic!("expected an annotation statement");
    };
    assert_eq!(annotation.class_name, "Shape");
    assert_eq!(annotation.annotation, "interface");
}

#[test]
fn test_namespace_nesting() {
    let source = "namespace Shapes {\n  class Circle\n  class Square\n}";
    let Statement::Namespace(namespace) = single_statement(source) else {
        panic!("expected a namespace statement");
    };
    assert_eq!(namespace.name, "Shapes");

    let names: Vec<_> = namespace
        .classes
        .iter()
        .map(|class| class.name.as_str())
        .collect();
    assert_eq!(names, vec!["Circle", "Square"]);
    assert_eq!(namespace.classes[1].position().line(), 3);
}

#[test]
fn test_namespace_dotted_name_and_class_body() {
    let source = "namespace Geo.Shapes {\n  class Circle {\n    +double radius\n  }\n}\nclass Outside";
    let diagram = assert_parses_successfully(source);
    assert_eq!(diagram.statements.len(), 2);

    let Statement::Namespace(namespace) = diagram.statements[0].inner() else {
        panic!("expected a namespace statement");
    };
    assert_eq!(namespace.name, "Geo.Shapes");
    assert_eq!(namespace.classes[0].members[0].name, "radius");

    assert_eq!(class_names(&diagram), vec!["Outside"]);
}

#[test]
fn test_notes() {
    let Statement::Note(note) = single_statement("note \"General note\"") else {
        panic!("expected a note statement");
    };
    assert_eq!(note.text, "General note");
    assert_eq!(note.target_class, None);

    let Statement::Note(note) = single_statement("note for Shape \"Draws itself\"") else {
        panic!("expected a note statement");
    };
    assert_eq!(note.text, "Draws itself");
    assert_eq!(note.target_class.as_deref(), Some("Shape"));
}

#[test]
fn test_style_statement() {
    let Statement::Style(style) =
        single_statement("style Shape fill:#f9f,stroke:#333,stroke-width:4px")
    else {
        panic!("expected a style statement");
    };
    assert_eq!(style.class_name, "Shape");
    assert_eq!(
        style.styles,
        vec![
            Style::new("fill", "#f9f"),
            Style::new("stroke", "#333"),
            Style::new("stroke-width", "4px"),
        ]
    );
}

#[test]
fn test_class_def_statement() {
    let Statement::ClassDef(class_def) = single_statement("classDef foo,bar fill:#f00,color:red")
    else {
        panic!("expected a classDef statement");
    };
    assert_eq!(class_def.class_names, vec!["foo".to_string(), "bar".to_string()]);
    assert_eq!(
        class_def.styles,
        vec![Style::new("fill", "#f00"), Style::new("color", "red")]
    );
}

#[test]
fn test_css_class_statement() {
    let Statement::Style(style) = single_statement("cssClass \"Shape\" highlight") else {
        panic!("expected a style statement");
    };
    assert_eq!(style.class_name, "Shape");
    assert_eq!(style.styles, vec![Style::new("cssClass", "highlight")]);
}

#[test]
fn test_click_callback() {
    let Statement::Click(click) = single_statement("click Shape call draw(ctx) \"Draw it\"") else {
        panic!("expected a click statement");
    };
    assert_eq!(click.class_name, "Shape");
    assert_eq!(
        click.action,
        ClickAction::Callback {
            name: "draw".to_string(),
            args: Some("ctx".to_string()),
            tooltip: Some("Draw it".to_string()),
        }
    );

    let Statement::Click(click) = single_statement("click Shape call draw()") else {
        panic!("expected a click statement");
    };
    assert_eq!(
        click.action,
        ClickAction::Callback {
            name: "draw".to_string(),
            args: None,
            tooltip: None,
        }
    );
}

#[test]
fn test_click_links() {
    let expected = ClickAction::Link {
        url: "https://example.com".to_string(),
        target: Some("_blank".to_string()),
        tooltip: Some("Docs".to_string()),
    };

    for source in [
        "click Shape href \"https://example.com\" \"Docs\" _blank",
        "click Shape href \"https://example.com\" _blank \"Docs\"",
        "click Shape \"https://example.com\" \"Docs\" _blank",
        "link Shape \"https://example.com\" _blank \"Docs\"",
    ] {
        let Statement::Click(click) = single_statement(source) else {
            panic!("expected a click statement for {source:?}");
        };
        assert_eq!(click.class_name, "Shape");
        assert_eq!(click.action, expected, "source: {source:?}");
    }
}

#[test]
fn test_click_and_callback_without_call() {
    let Statement::Click(click) = single_statement("click Shape showInfo \"Tip\"") else {
        panic!("expected a click statement");
    };
    assert_eq!(
        click.action,
        ClickAction::Callback {
            name: "showInfo".to_string(),
            args: None,
            tooltip: Some("Tip".to_string()),
        }
    );

    let Statement::Click(click) = single_statement("callback Shape \"showInfo\" \"Tip\"") else {
        panic!("expected a click statement");
    };
    assert!(matches!(
        click.action,
        ClickAction::Callback { ref name, .. } if name == "showInfo"
    ));
}

#[test]
fn test_direction() {
    for (source, expected) in [
        ("direction TB", Direction::TopToBottom),
        ("direction BT", Direction::BottomToTop),
        ("direction RL", Direction::RightToLeft),
        ("direction LR", Direction::LeftToRight),
    ] {
        assert_eq!(single_statement(source), Statement::Direction(expected));
    }
}

#[test]
fn test_accessibility() {
    let diagram = assert_parses_successfully(
        "accTitle: Shapes overview\naccDescr: All the shapes\naccDescr {\n  more\n  detail\n}",
    );
    let values: Vec<_> = diagram
        .statements
        .iter()
        .map(|statement| match statement.inner() {
            Statement::Accessibility(accessibility) => {
                (accessibility.kind, accessibility.value.as_str())
            }
            other => panic!("expected accessibility, got {other:?}"),
        })
        .collect();

    assert_eq!(
        values,
        vec![
            (AccessibilityKind::Title, "Shapes overview"),
            (AccessibilityKind::Description, "All the shapes"),
            (AccessibilityKind::Description, "more\n  detail"),
        ]
    );
}

#[test]
fn test_full_diagram() {
    let source = r#"classDiagram
    direction LR
    %% Animals
    class Animal {
        <<abstract>>
        +String name
        +makeSound()*
    }
    class Duck
    Animal <|-- Duck
    Animal "1" *-- "many" Leg : has
    Duck : +swim()
    note for Duck "Can swim"
    style Duck fill:#ff0
"#;
    let diagram = assert_parses_successfully(source);
    assert_eq!(diagram.statements.len(), 8);
    assert_eq!(class_names(&diagram), vec!["Animal", "Duck"]);
}

#[test]
fn test_unknown_tokens_are_skipped() {
    let diagram = assert_parses_successfully("A B C\nclass D");
    assert_eq!(class_names(&diagram), vec!["D"]);
}

#[test]
fn test_error_isolation() {
    let err = assert_parse_fails("class A\nclass %%%\nclass B");

    assert_eq!(err.diagnostics().len(), 1);
    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
    assert!(diagnostic.message().contains("expected class name"));
    assert_eq!(diagnostic.position().map(|p| p.line()), Some(2));

    let partial = err.partial().expect("recoverable errors keep the partial diagram");
    assert_eq!(class_names(partial), vec!["A", "B"]);
}

#[test]
fn test_multiple_errors_are_collected() {
    let err = assert_parse_fails("class A\nclass\nnote\nclass B\nnote for \"x\"");

    assert_eq!(err.diagnostics().len(), 3);
    let lines: Vec<_> = err
        .diagnostics()
        .iter()
        .filter_map(|diagnostic| diagnostic.position().map(|p| p.line()))
        .collect();
    assert_eq!(lines, vec![2, 3, 5]);

    let partial = err.partial().expect("partial diagram");
    assert_eq!(class_names(partial), vec!["A", "B"]);
}

#[test]
fn test_error_help_names_statement() {
    let err = assert_parse_fails("note for \"x\"");
    let diagnostic = &err.diagnostics()[0];

    assert_eq!(diagnostic.code(), Some(ErrorCode::E100));
    assert_eq!(diagnostic.message(), "expected class name, found `x`");
    assert_eq!(diagnostic.help(), Some("while parsing note"));
    assert_eq!(diagnostic.labels().len(), 1);
}

#[test]
fn test_unexpected_end_of_input() {
    let err = assert_parse_fails("note for Shape");
    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E101));
    assert!(diagnostic.message().contains("note text"));

    let err = assert_parse_fails("A -->");
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E101));
}

#[test]
fn test_unterminated_class_body() {
    let source = "class A {\n  +int x\n";
    let err = assert_parse_fails(source);

    assert_eq!(err.diagnostics().len(), 1);
    let diagnostic = &err.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E102));

    let labels = diagnostic.labels();
    assert_eq!(labels.len(), 2);
    assert!(labels[0].is_primary());
    assert!(labels[1].is_secondary());
    assert_eq!(labels[1].span().start(), source.find('{').unwrap_or_default());
}

#[test]
fn test_unterminated_namespace() {
    let err = assert_parse_fails("namespace Shapes {\n  class Circle\n");
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E102));
}

#[test]
fn test_missing_label_bracket() {
    let err = assert_parse_fails("class A[\"label\"\nclass B");
    assert_eq!(err.diagnostics().len(), 1);
    assert!(err.diagnostics()[0].message().contains("`]`"));
}

#[test]
fn test_click_without_action_fails() {
    let err = assert_parse_fails("click Shape\nclass A");
    assert_eq!(err.diagnostics().len(), 1);
    let partial = err.partial().expect("partial diagram");
    assert_eq!(class_names(partial), vec!["A"]);
}

#[test]
fn test_style_without_styles_fails() {
    let err = assert_parse_fails("style Shape\n");
    assert!(err.diagnostics()[0].message().contains("style list"));
}

#[test]
fn test_require_header() {
    let config = parser::ParserConfig::default().with_require_header(true);

    let tokens = lexer::tokenize("class A\nclass B");
    let err = parser::build_diagram(&tokens, &config).expect_err("header is required");
    assert_eq!(err.diagnostics().len(), 1);
    assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E103));
    assert!(err.partial().is_none());

    let tokens = lexer::tokenize("classDiagram\nclass A");
    let diagram = parser::build_diagram(&tokens, &config).expect("header present");
    assert_eq!(class_names(&diagram), vec!["A"]);
}

#[test]
fn test_text_before_header_is_ignored() {
    let diagram = assert_parses_successfully("title Shapes\nclassDiagram\nclass A");
    assert_eq!(diagram.statements.len(), 1);
}
