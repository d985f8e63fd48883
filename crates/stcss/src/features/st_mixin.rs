//! `-st-mixin` / `-st-partial-mixin` declarations.
//!
//! Parsing and validation live here; expansion needs the whole rule tree
//! and is done by the transformer (`transformer::mixins`).

use csstree::value::{ValueNode, parse_value, split_by_comma, stringify, trim_nodes};
use csstree::{Declaration, Node};

use super::{Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, parent_rule};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-mixin",
    interest: NodeInterest::DECLARATION,
    analyze_declaration,
    transform_declaration,
    ..FeatureHooks::NOOP
};

pub const MIXIN_PROP: &str = "-st-mixin";
pub const PARTIAL_MIXIN_PROP: &str = "-st-partial-mixin";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn invalid_mixin_value(detail: &str) -> DiagnosticType {
        DiagnosticType::error("INVALID_MIXIN_VALUE", format!("invalid mixin value: {detail}"))
    }

    pub fn mixin_outside_rule() -> DiagnosticType {
        DiagnosticType::error(
            "MIXIN_OUTSIDE_RULE",
            "mixins can only be applied directly inside a rule",
        )
    }

    pub fn unknown_mixin(name: &str) -> DiagnosticType {
        DiagnosticType::error("UNKNOWN_MIXIN", format!("unknown mixin: \"{name}\""))
    }

    pub fn circular_mixin(name: &str) -> DiagnosticType {
        DiagnosticType::error("CIRCULAR_MIXIN", format!("circular mixin found: \"{name}\""))
    }

    pub fn script_mixin_failed(name: &str, message: &str) -> DiagnosticType {
        DiagnosticType::error(
            "FAILED_SCRIPT_MIXIN",
            format!("script mixin \"{name}\" has failed with error \"{message}\""),
        )
    }

    pub fn partial_mixin_missing_arguments(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "PARTIAL_MIXIN_MISSING_ARGUMENTS",
            format!("\"-st-partial-mixin\" of \"{name}\" must be called with at least one override"),
        )
    }

    pub fn invalid_mixin_override(arg: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "INVALID_MIXIN_OVERRIDE",
            format!("mixin override \"{arg}\" must be \"<var name> <value>\""),
        )
    }
}

/// One entry of a mixin declaration: `name` or `name(arg, ...)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixinCall {
    pub name: String,
    /// Raw argument texts.
    pub args: Vec<String>,
}

pub fn is_mixin_prop(prop: &str) -> bool {
    prop == MIXIN_PROP || prop == PARTIAL_MIXIN_PROP
}

pub fn parse_mixin_calls(value: &str) -> Result<Vec<MixinCall>, String> {
    let mut calls = Vec::new();
    for group in split_by_comma(&parse_value(value)) {
        match trim_nodes(&group) {
            [ValueNode::Word(name)] => calls.push(MixinCall {
                name: name.clone(),
                args: Vec::new(),
            }),
            [ValueNode::Function { name, nodes }] => calls.push(MixinCall {
                name: name.clone(),
                args: split_by_comma(nodes)
                    .iter()
                    .map(|arg| stringify(trim_nodes(arg)))
                    .collect(),
            }),
            [] => return Err("empty mixin".to_string()),
            other => return Err(format!("unexpected \"{}\"", stringify(other))),
        }
    }
    if calls.is_empty() {
        return Err("missing mixin name".to_string());
    }
    Ok(calls)
}

/// Splits a CSS mixin override `name value...`.
pub fn split_override(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = arg.trim().split_once(char::is_whitespace)?;
    let value = value.trim();
    (!value.is_empty()).then_some((name, value))
}

fn analyze_declaration(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, parents: &[&Node]) {
    if !is_mixin_prop(&decl.prop) {
        return;
    }
    if parent_rule(parents).is_none() {
        ctx.report(diagnostics::mixin_outside_rule(), decl);
        return;
    }
    match parse_mixin_calls(&decl.value) {
        Ok(calls) => {
            if decl.prop == PARTIAL_MIXIN_PROP {
                for call in calls.iter().filter(|call| call.args.is_empty()) {
                    ctx.report_word(
                        diagnostics::partial_mixin_missing_arguments(&call.name),
                        decl,
                        &call.name,
                    );
                }
            }
        }
        Err(detail) => ctx.report(diagnostics::invalid_mixin_value(&detail), decl),
    }
}

/// Mixins are expanded by the rule transformer; declarations that reach
/// this hook sit outside a rule and are dropped.
fn transform_declaration(_ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if is_mixin_prop(&decl.prop) {
        Action::Remove
    } else {
        Action::Keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixin_calls() {
        let calls = parse_mixin_calls("a, grid(2, \"10px\"), theme(color red, size value(s))").unwrap();
        assert_eq!(calls[0], MixinCall { name: "a".into(), args: vec![] });
        assert_eq!(calls[1].args, vec!["2", "\"10px\""]);
        assert_eq!(calls[2].args, vec!["color red", "size value(s)"]);
    }

    #[test]
    fn test_parse_mixin_errors() {
        assert!(parse_mixin_calls("").is_err());
        assert!(parse_mixin_calls("a b").is_err());
    }

    #[test]
    fn test_split_override() {
        assert_eq!(split_override(" color  red blue "), Some(("color", "red blue")));
        assert_eq!(split_override("color"), None);
    }
}
