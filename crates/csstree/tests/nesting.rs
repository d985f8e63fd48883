use csstree::selector::{SelectorList, nest_selectors, replace_parent};

fn nest(parent: &str, child: &str) -> String {
    let parents = SelectorList::parse(parent).unwrap();
    let children = SelectorList::parse(child).unwrap();
    nest_selectors(&parents, &children).to_string()
}

#[test]
fn test_parent_reference_merges_into_last_compound() {
    assert_eq!(nest(".btn", "&:hover"), ".btn:hover");
    assert_eq!(nest(".a .b", "&.active"), ".a .b.active");
}

#[test]
fn test_implicit_descendant() {
    assert_eq!(nest(".btn", ".label"), ".btn .label");
}

#[test]
fn test_leading_combinator() {
    assert_eq!(nest(".btn", "> .icon"), ".btn > .icon");
}

#[test]
fn test_cross_product_keeps_parent_order() {
    assert_eq!(nest(".a, .b", ".x, .y"), ".a .x, .a .y, .b .x, .b .y");
}

#[test]
fn test_parent_in_later_compound() {
    assert_eq!(nest(".theme", ".dark &"), ".dark .theme");
}

#[test]
fn test_replace_parent_with_complex_replacement() {
    let selector = SelectorList::parse("&:hover > .x").unwrap();
    let replacement = SelectorList::parse(".a > .b").unwrap();
    let replaced = replace_parent(&selector.selectors[0], &replacement.selectors[0]);
    assert_eq!(replaced.to_string(), ".a > .b:hover > .x");
}
