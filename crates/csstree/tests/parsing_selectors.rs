//! Integration tests for selector parsing.
//!
//! - Type, class, ID, universal, nesting and attribute selectors
//! - Pseudo-classes and pseudo-elements, with and without arguments
//! - Combinators: descendant (space), child (`>`), siblings (`+`, `~`)
//! - Selector lists and relative selectors

use csstree::selector::{
    Combinator, PseudoArgs, Selector, SelectorList, parse_selector_list,
};

// ============================================================================
// SIMPLE SELECTORS
// ============================================================================

#[test]
fn test_type_selector_simple() {
    let (remaining, list) = parse_selector_list("Button").unwrap();
    assert!(remaining.is_empty());

    assert_eq!(list.selectors.len(), 1);
    let complex = &list.selectors[0];
    assert_eq!(complex.parts.len(), 1);
    assert_eq!(
        complex.parts[0].compound.selectors[0],
        Selector::Type("Button".to_string())
    );
}

#[test]
fn test_class_with_hyphen_and_underscore() {
    let list = SelectorList::parse(".my-widget_part").unwrap();
    assert_eq!(
        list.selectors[0].as_simple(),
        Some(&Selector::Class("my-widget_part".to_string()))
    );
}

#[test]
fn test_compound_selector() {
    let list = SelectorList::parse("Button.primary#submit").unwrap();
    let compound = &list.selectors[0].parts[0].compound;
    assert_eq!(
        compound.selectors,
        vec![
            Selector::Type("Button".into()),
            Selector::Class("primary".into()),
            Selector::Id("submit".into()),
        ]
    );
}

#[test]
fn test_nesting_and_universal() {
    let list = SelectorList::parse("&.active > *").unwrap();
    let parts = &list.selectors[0].parts;
    assert_eq!(parts[0].compound.selectors[0], Selector::Parent);
    assert_eq!(parts[0].combinator, Combinator::Child);
    assert_eq!(parts[1].compound.selectors[0], Selector::Universal);
}

#[test]
fn test_attribute_selector_keeps_raw_text() {
    let list = SelectorList::parse("input[type=\"text\" i]").unwrap();
    assert_eq!(
        list.selectors[0].parts[0].compound.selectors[1],
        Selector::Attribute("type=\"text\" i".into())
    );
}

// ============================================================================
// PSEUDO SELECTORS
// ============================================================================

#[test]
fn test_pseudo_class_and_element() {
    let list = SelectorList::parse(".root:hover::label").unwrap();
    let compound = &list.selectors[0].parts[0].compound;
    assert_eq!(compound.selectors[1], Selector::PseudoClass("hover".into(), None));
    assert_eq!(compound.selectors[2], Selector::PseudoElement("label".into(), None));
}

#[test]
fn test_state_with_raw_argument() {
    let list = SelectorList::parse(".grid:col(3)").unwrap();
    assert_eq!(
        list.selectors[0].parts[0].compound.selectors[1],
        Selector::PseudoClass("col".into(), Some(PseudoArgs::Raw("3".into())))
    );
}

#[test]
fn test_global_takes_selector_arguments() {
    let list = SelectorList::parse(":global(.a .b)").unwrap();
    let Selector::PseudoClass(name, Some(PseudoArgs::Selectors(inner))) =
        &list.selectors[0].parts[0].compound.selectors[0]
    else {
        panic!("expected :global with selector arguments");
    };
    assert_eq!(name, "global");
    assert_eq!(inner.selectors[0].parts.len(), 2);
}

#[test]
fn test_not_with_selector_list() {
    let list = SelectorList::parse("a:not(.x, .y)").unwrap();
    assert_eq!(list.to_string(), "a:not(.x, .y)");
}

// ============================================================================
// COMBINATORS AND LISTS
// ============================================================================

#[test]
fn test_all_combinators() {
    let list = SelectorList::parse("a b > c + d ~ e").unwrap();
    let combinators: Vec<_> = list.selectors[0].parts.iter().map(|p| p.combinator).collect();
    assert_eq!(
        combinators,
        vec![
            Combinator::Descendant,
            Combinator::Child,
            Combinator::AdjacentSibling,
            Combinator::GeneralSibling,
            Combinator::None,
        ]
    );
    assert_eq!(list.to_string(), "a b > c + d ~ e");
}

#[test]
fn test_selector_list_with_newlines() {
    let list = SelectorList::parse(".a,\n    .b").unwrap();
    assert_eq!(list.selectors.len(), 2);
    assert_eq!(list.to_string(), ".a, .b");
}

#[test]
fn test_relative_selector() {
    let list = SelectorList::parse("> .child").unwrap();
    let parts = &list.selectors[0].parts;
    assert!(parts[0].compound.is_empty());
    assert_eq!(parts[0].combinator, Combinator::Child);
    assert_eq!(list.to_string(), "> .child");
}

#[test]
fn test_trailing_garbage_is_error() {
    assert!(SelectorList::parse(".a )").is_err());
    assert!(SelectorList::parse("").is_err());
}
