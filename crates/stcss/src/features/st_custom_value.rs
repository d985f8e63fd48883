//! Built-in structured value types: `st-map(key value, ...)` and
//! `st-array(a, b, ...)`.

use csstree::value::{ValueNode, split_by_comma, stringify, trim_nodes};
use indexmap::IndexMap;

use crate::boxed::{ARRAY_TYPE, Boxed, MAP_TYPE};

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn invalid_custom_value(type_name: &str, detail: &str) -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_CUSTOM_VALUE",
            format!("invalid {type_name}: {detail}"),
        )
    }
}

pub fn is_custom_value_function(name: &str) -> bool {
    name == MAP_TYPE || name == ARRAY_TYPE
}

/// Parses the arguments of a custom value function. Each item's text is
/// handed to `evaluate`, which may produce nested boxed values.
pub fn parse_custom_value<F>(name: &str, args: &[ValueNode], mut evaluate: F) -> Result<Boxed, String>
where
    F: FnMut(&str) -> Boxed,
{
    let groups = split_by_comma(args);
    match name {
        ARRAY_TYPE => {
            let mut items = Vec::with_capacity(groups.len());
            for group in &groups {
                let text = stringify(trim_nodes(group));
                if text.is_empty() {
                    return Err("empty array item".to_string());
                }
                items.push(evaluate(&text));
            }
            Ok(Boxed::list(items))
        }
        MAP_TYPE => {
            let mut entries = IndexMap::new();
            for group in &groups {
                let trimmed = trim_nodes(group);
                let Some((ValueNode::Word(key), rest)) = trimmed.split_first() else {
                    return Err(format!("invalid map entry \"{}\"", stringify(trimmed)));
                };
                let value = stringify(trim_nodes(rest));
                if value.is_empty() {
                    return Err(format!("map key \"{key}\" is missing a value"));
                }
                entries.insert(key.clone(), evaluate(&value));
            }
            Ok(Boxed::map(entries))
        }
        other => Err(format!("unknown custom value type \"{other}\"")),
    }
}

#[cfg(test)]
mod tests {
    use csstree::value::parse_value;

    use super::*;

    fn evaluate(text: &str) -> Boxed {
        let nodes = parse_value(text);
        match nodes.as_slice() {
            [ValueNode::Function { name, nodes: args }] if is_custom_value_function(name) => {
                parse_custom_value(name, args, evaluate).unwrap()
            }
            _ => Boxed::text(text),
        }
    }

    fn parse(source: &str) -> Result<Boxed, String> {
        let nodes = parse_value(source);
        let ValueNode::Function { name, nodes: args } = &nodes[0] else {
            panic!("expected function");
        };
        parse_custom_value(name, args, evaluate)
    }

    #[test]
    fn test_map_with_nested_array() {
        let value = parse("st-map(bg red, sizes st-array(1px, 2px))").unwrap();
        assert_eq!(value.get("bg").and_then(Boxed::as_text), Some("red"));
        assert_eq!(value.get_path(&["sizes", "1"]).and_then(Boxed::as_text), Some("2px"));
    }

    #[test]
    fn test_map_value_keeps_spaces() {
        let value = parse("st-map(border 1px solid red)").unwrap();
        assert_eq!(value.get("border").and_then(Boxed::as_text), Some("1px solid red"));
    }

    #[test]
    fn test_map_entry_without_value() {
        assert!(parse("st-map(a)").is_err());
    }

    #[test]
    fn test_empty_array_item() {
        assert!(parse("st-array(a, , b)").is_err());
    }
}
