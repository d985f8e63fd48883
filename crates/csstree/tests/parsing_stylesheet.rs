//! Integration tests for block-level stylesheet parsing and printing.

use csstree::{CssError, Node, parse_stylesheet};

// ============================================================================
// STRUCTURE
// ============================================================================

#[test]
fn test_rule_with_declarations() {
    let sheet = parse_stylesheet(".a { color: red; background: blue }").unwrap();
    let Node::Rule(rule) = &sheet.nodes[0] else {
        panic!("expected rule");
    };
    let decls: Vec<_> = rule.declarations().map(|d| (d.prop.as_str(), d.value.as_str())).collect();
    assert_eq!(decls, vec![("color", "red"), ("background", "blue")]);
}

#[test]
fn test_statement_and_block_at_rules() {
    let source = r#"
        @st-import Button from "./button.st.css";
        @media screen {
            .a { color: red; }
        }
    "#;
    let sheet = parse_stylesheet(source).unwrap();
    assert_eq!(sheet.nodes.len(), 2);

    let Node::AtRule(import) = &sheet.nodes[0] else {
        panic!("expected at-rule");
    };
    assert_eq!(import.name, "st-import");
    assert_eq!(import.params, "Button from \"./button.st.css\"");
    assert!(import.nodes.is_none());

    let Node::AtRule(media) = &sheet.nodes[1] else {
        panic!("expected at-rule");
    };
    assert_eq!(media.nodes.as_ref().map(Vec::len), Some(1));
}

#[test]
fn test_nested_rules() {
    let sheet = parse_stylesheet(".a { color: red; &:hover { color: blue; } }").unwrap();
    let Node::Rule(rule) = &sheet.nodes[0] else {
        panic!("expected rule");
    };
    assert_eq!(rule.nodes.len(), 2);
    assert!(matches!(&rule.nodes[1], Node::Rule(nested) if nested.selector == "&:hover"));
}

#[test]
fn test_pseudo_selector_is_not_a_declaration() {
    let sheet = parse_stylesheet(".a:hover { color: red; }").unwrap();
    assert!(matches!(&sheet.nodes[0], Node::Rule(rule) if rule.selector == ".a:hover"));
}

#[test]
fn test_important_flag() {
    let sheet = parse_stylesheet(".a { color: red !important; }").unwrap();
    let Node::Rule(rule) = &sheet.nodes[0] else {
        panic!("expected rule");
    };
    let decl = rule.declarations().next().unwrap();
    assert_eq!(decl.value, "red");
    assert!(decl.important);
}

#[test]
fn test_strings_and_parens_protect_terminators() {
    let sheet = parse_stylesheet(".a { content: \"a;b}\"; background: url(x;y.png); }").unwrap();
    let Node::Rule(rule) = &sheet.nodes[0] else {
        panic!("expected rule");
    };
    let values: Vec<_> = rule.declarations().map(|d| d.value.as_str()).collect();
    assert_eq!(values, vec!["\"a;b}\"", "url(x;y.png)"]);
}

#[test]
fn test_comments_are_nodes() {
    let sheet = parse_stylesheet("/* head */ .a { /* inner */ color: red; }").unwrap();
    assert!(matches!(&sheet.nodes[0], Node::Comment(c) if c.text == " head "));
}

#[test]
fn test_spans_point_into_source() {
    let source = ".a { color: red; }\n.b {}";
    let sheet = parse_stylesheet(source).unwrap();
    let span = sheet.nodes[1].span();
    assert_eq!(&source[span.start..span.end], ".b {}");
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_unclosed_block() {
    let err = parse_stylesheet(".a { color: red;").unwrap_err();
    assert!(matches!(err, CssError::InvalidSyntax { .. }));
}

#[test]
fn test_unexpected_close_brace() {
    assert!(parse_stylesheet("}").is_err());
}

#[test]
fn test_unknown_word() {
    assert!(parse_stylesheet(".a { oops; }").is_err());
}

// ============================================================================
// PRINTING
// ============================================================================

#[test]
fn test_print_normalized() {
    let sheet = parse_stylesheet(
        "@media screen{.a{color:red;&:hover{color:blue}}}@layer x;.empty{}",
    )
    .unwrap();
    insta::assert_snapshot!(sheet.to_string(), @r"
    @media screen {
        .a {
            color: red;
            &:hover {
                color: blue;
            }
        }
    }
    @layer x;
    .empty {}
    ");
}
