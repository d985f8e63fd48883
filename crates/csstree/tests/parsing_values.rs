use csstree::value::{ValueNode, parse_value, split_by_comma, stringify, trim_nodes};

#[test]
fn test_words_and_spaces() {
    let nodes = parse_value("1px solid red");
    assert_eq!(
        nodes,
        vec![
            ValueNode::word("1px"),
            ValueNode::Space(" ".into()),
            ValueNode::word("solid"),
            ValueNode::Space(" ".into()),
            ValueNode::word("red"),
        ]
    );
}

#[test]
fn test_function_arguments() {
    let nodes = parse_value("st-map(a red, b value(x))");
    let ValueNode::Function { name, nodes: args } = &nodes[0] else {
        panic!("expected function");
    };
    assert_eq!(name, "st-map");
    let groups = split_by_comma(args);
    assert_eq!(groups.len(), 2);
    assert_eq!(stringify(trim_nodes(&groups[1])), "b value(x)");
}

#[test]
fn test_strings() {
    let nodes = parse_value("\"a, b\" 'c'");
    assert_eq!(
        nodes[0],
        ValueNode::Str {
            quote: '"',
            value: "a, b".into()
        }
    );
}

#[test]
fn test_var_with_fallback() {
    let nodes = parse_value("var(--color, blue)");
    let ValueNode::Function { nodes: args, .. } = &nodes[0] else {
        panic!("expected function");
    };
    assert_eq!(args[0], ValueNode::word("--color"));
    assert_eq!(args[1], ValueNode::Div(','));
}

#[test]
fn test_unquoted_url_is_single_word() {
    let nodes = parse_value("url(a/b.png)");
    let ValueNode::Function { nodes: args, .. } = &nodes[0] else {
        panic!("expected function");
    };
    assert_eq!(args, &vec![ValueNode::word("a/b.png")]);
}

#[test]
fn test_roundtrip() {
    for source in [
        "calc(100% - value(gap) * 2)",
        "a ,b/ c",
        "linear-gradient(to right, rgba(0,0,0,.5) 0%, red)",
        "  padded  ",
    ] {
        assert_eq!(stringify(&parse_value(source)), source);
    }
}
