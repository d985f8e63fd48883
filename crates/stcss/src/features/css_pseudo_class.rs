//! Custom pseudo-states declared with `-st-states`.
//!
//! ```css
//! .entry {
//!     -st-states: on, col(number(min(1))), size(enum(s, m, l)) m, open(".is-open");
//! }
//! .entry:on {}          /* .entry__ns.ns--on */
//! .entry:col(3) {}      /* .ns__entry.ns---col-1-3 */
//! ```
//!
//! A boolean state compiles to `{ns}--{name}`; a parameterized state to
//! `{ns}---{name}-{length}-{param}` where the parameter has whitespace
//! replaced by `_` and is CSS-escaped. Mapped states emit their selector.

use csstree::selector::{Selector, SelectorList};
use csstree::value::{ValueNode, parse_value, split_by_comma, stringify, trim_nodes};
use csstree::{Declaration, Node};
use indexmap::IndexMap;
use phf::phf_set;

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, parent_rule,
    simple_rule_target,
};
use crate::diagnostics::DiagnosticType;
use crate::resolver::CssResolve;
use crate::symbols::Symbol;

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-pseudo-class",
    interest: NodeInterest::DECLARATION,
    analyze_declaration,
    transform_declaration,
    ..FeatureHooks::NOOP
};

pub const STATES_PROP: &str = "-st-states";

static NATIVE_PSEUDO_CLASSES: phf::Set<&'static str> = phf_set! {
    "active", "any-link", "autofill", "blank", "checked", "current", "default",
    "defined", "dir", "disabled", "empty", "enabled", "first", "first-child",
    "first-of-type", "focus", "focus-visible", "focus-within", "fullscreen",
    "future", "has", "host", "host-context", "hover", "in-range",
    "indeterminate", "invalid", "is", "lang", "last-child", "last-of-type",
    "left", "link", "local-link", "modal", "not", "nth-child", "nth-col",
    "nth-last-child", "nth-last-col", "nth-last-of-type", "nth-of-type",
    "only-child", "only-of-type", "optional", "out-of-range", "past", "paused",
    "picture-in-picture", "placeholder-shown", "playing", "popover-open",
    "read-only", "read-write", "required", "right", "root", "scope", "state",
    "target", "target-within", "user-invalid", "user-valid", "valid",
    "visited", "where",
};

pub fn is_native_pseudo_class(name: &str) -> bool {
    name.starts_with('-') || NATIVE_PSEUDO_CLASSES.contains(name.to_ascii_lowercase().as_str())
}

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn state_definition_in_element() -> DiagnosticType {
        DiagnosticType::error(
            "STATE_DEFINITION_IN_ELEMENT",
            "cannot define pseudo-states inside a type selector",
        )
    }

    pub fn state_definition_in_complex() -> DiagnosticType {
        DiagnosticType::error(
            "STATE_DEFINITION_IN_COMPLEX",
            "cannot define pseudo-states inside complex selectors",
        )
    }

    pub fn invalid_state_definition(detail: &str) -> DiagnosticType {
        DiagnosticType::error("INVALID_STATE_DEFINITION", format!("invalid -st-states: {detail}"))
    }

    pub fn reserved_native_state(name: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "RESERVED_NATIVE_STATE",
            format!("state \"{name}\" overrides a native pseudo-class"),
        )
    }

    pub fn unknown_pseudo_class(name: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "UNKNOWN_PSEUDO_CLASS",
            format!("unknown pseudo-class \"{name}\""),
        )
    }

    pub fn missing_state_param(name: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "MISSING_STATE_PARAM",
            format!("state \"{name}\" expects a parameter and has no default"),
        )
    }

    pub fn state_validation_failed(name: &str, value: &str, reason: &str) -> DiagnosticType {
        DiagnosticType::error(
            "STATE_VALIDATION_FAILED",
            format!("pseudo-state \"{name}\" with parameter \"{value}\" failed validation: {reason}"),
        )
    }
}

// ============================================================================
// State definitions
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Validator {
    pub name: String,
    pub args: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamType {
    String(Vec<Validator>),
    Number(Vec<Validator>),
    Enum(Vec<String>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StateDef {
    Boolean,
    Parameterized {
        param: ParamType,
        default: Option<String>,
    },
    /// `open(".is-open")`: emits the quoted compound selector.
    Mapped(String),
}

impl ParamType {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamType::String(_) => "string",
            ParamType::Number(_) => "number",
            ParamType::Enum(_) => "enum",
        }
    }

    /// Validation failures for `value`; empty when valid.
    pub fn validate(&self, value: &str) -> Vec<String> {
        match self {
            ParamType::String(validators) => validators
                .iter()
                .filter_map(|v| validate_string(v, value).err())
                .collect(),
            ParamType::Number(validators) => match value.trim().parse::<f64>() {
                Ok(number) => validators
                    .iter()
                    .filter_map(|v| validate_number(v, number).err())
                    .collect(),
                Err(_) => vec![format!("\"{value}\" is not a number")],
            },
            ParamType::Enum(options) => {
                if options.iter().any(|option| option == value) {
                    Vec::new()
                } else {
                    vec![format!("\"{value}\" is not one of: {}", options.join(", "))]
                }
            }
        }
    }
}

fn numeric_arg(validator: &Validator) -> Result<f64, String> {
    validator
        .args
        .first()
        .and_then(|arg| arg.parse::<f64>().ok())
        .ok_or_else(|| format!("{}() expects a number", validator.name))
}

fn validate_string(validator: &Validator, value: &str) -> Result<(), String> {
    let length = value.chars().count() as f64;
    match validator.name.as_str() {
        "minLength" => {
            let min = numeric_arg(validator)?;
            if length < min {
                return Err(format!("\"{value}\" is shorter than {min}"));
            }
        }
        "maxLength" => {
            let max = numeric_arg(validator)?;
            if length > max {
                return Err(format!("\"{value}\" is longer than {max}"));
            }
        }
        "contains" => {
            let needle = validator.args.first().map_or("", String::as_str);
            if !value.contains(needle) {
                return Err(format!("\"{value}\" does not contain \"{needle}\""));
            }
        }
        other => return Err(format!("unknown string validator \"{other}\"")),
    }
    Ok(())
}

fn validate_number(validator: &Validator, value: f64) -> Result<(), String> {
    let arg = numeric_arg(validator)?;
    let ok = match validator.name.as_str() {
        "min" => value >= arg,
        "max" => value <= arg,
        "multipleOf" => arg != 0.0 && (value % arg).abs() < f64::EPSILON,
        other => return Err(format!("unknown number validator \"{other}\"")),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("{value} does not satisfy {}({arg})", validator.name))
    }
}

fn argument_text(nodes: &[ValueNode]) -> String {
    match trim_nodes(nodes) {
        [ValueNode::Str { value, .. }] => value.clone(),
        trimmed => stringify(trimmed),
    }
}

fn parse_validators(args: &[ValueNode]) -> Result<Vec<Validator>, String> {
    split_by_comma(args)
        .iter()
        .map(|group| match trim_nodes(group) {
            [ValueNode::Function { name, nodes }] => Ok(Validator {
                name: name.clone(),
                args: split_by_comma(nodes).iter().map(|a| argument_text(a)).collect(),
            }),
            other => Err(format!("invalid validator \"{}\"", stringify(other))),
        })
        .collect()
}

fn parse_param_type(node: &ValueNode) -> Result<ParamType, String> {
    match node {
        ValueNode::Word(word) if word == "string" => Ok(ParamType::String(Vec::new())),
        ValueNode::Word(word) if word == "number" => Ok(ParamType::Number(Vec::new())),
        ValueNode::Function { name, nodes } => match name.as_str() {
            "string" => parse_validators(nodes).map(ParamType::String),
            "number" => parse_validators(nodes).map(ParamType::Number),
            "enum" => {
                let options: Vec<String> = split_by_comma(nodes)
                    .iter()
                    .map(|option| argument_text(option))
                    .filter(|option| !option.is_empty())
                    .collect();
                if options.is_empty() {
                    Err("enum() expects at least one option".to_string())
                } else {
                    Ok(ParamType::Enum(options))
                }
            }
            other => Err(format!("unknown state parameter type \"{other}\"")),
        },
        other => Err(format!(
            "unknown state parameter type \"{}\"",
            csstree::value::stringify_node(other)
        )),
    }
}

fn parse_state_entry(nodes: &[ValueNode]) -> Result<Option<(String, StateDef)>, String> {
    let nodes = trim_nodes(nodes);
    match nodes.split_first() {
        None => Ok(None),
        Some((ValueNode::Word(name), [])) => Ok(Some((name.clone(), StateDef::Boolean))),
        Some((ValueNode::Function { name, nodes: args }, rest)) => {
            let default = stringify(trim_nodes(rest));
            let def = match trim_nodes(args) {
                [ValueNode::Str { value, .. }] if default.is_empty() => {
                    validate_mapping(value)?;
                    StateDef::Mapped(value.clone())
                }
                [param] => StateDef::Parameterized {
                    param: parse_param_type(param)?,
                    default: (!default.is_empty()).then_some(default),
                },
                [] => return Err(format!("state \"{name}\" is missing a parameter type")),
                _ => return Err(format!("state \"{name}\" has an invalid parameter type")),
            };
            Ok(Some((name.clone(), def)))
        }
        _ => Err(format!("invalid state \"{}\"", stringify(nodes))),
    }
}

fn validate_mapping(selector: &str) -> Result<(), String> {
    match mapped_selectors(selector) {
        Some(_) => Ok(()),
        None => Err(format!("state mapping \"{selector}\" must be a compound selector")),
    }
}

fn mapped_selectors(selector: &str) -> Option<Vec<Selector>> {
    let list = SelectorList::parse(selector).ok()?;
    match list.selectors.as_slice() {
        [complex] => match complex.parts.as_slice() {
            [part] => Some(part.compound.selectors.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Parses an `-st-states` value. Invalid entries are returned as errors
/// next to the valid ones.
pub fn parse_states(value: &str) -> (IndexMap<String, StateDef>, Vec<String>) {
    let mut states = IndexMap::new();
    let mut errors = Vec::new();
    for group in split_by_comma(&parse_value(value)) {
        match parse_state_entry(&group) {
            Ok(Some((name, def))) => {
                states.insert(name, def);
            }
            Ok(None) => {}
            Err(error) => errors.push(error),
        }
    }
    (states, errors)
}

// ============================================================================
// Analysis
// ============================================================================

fn analyze_declaration(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, parents: &[&Node]) {
    if decl.prop != STATES_PROP {
        return;
    }
    let class_name = match parent_rule(parents).and_then(simple_rule_target) {
        Some(Selector::Class(name)) => name,
        Some(_) => {
            ctx.report(diagnostics::state_definition_in_element(), decl);
            return;
        }
        None => {
            ctx.report(diagnostics::state_definition_in_complex(), decl);
            return;
        }
    };
    let (states, errors) = parse_states(&decl.value);
    for error in errors {
        ctx.report(diagnostics::invalid_state_definition(&error), decl);
    }
    for name in states.keys() {
        if NATIVE_PSEUDO_CLASSES.contains(name.as_str()) {
            ctx.report_word(diagnostics::reserved_native_state(name), decl, name);
        }
    }
    if let Some(class) = ctx.meta.symbols.get_class_mut(&class_name) {
        class.states.get_or_insert_with(IndexMap::new).extend(states);
    }
}

fn transform_declaration(_ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if decl.prop == STATES_PROP {
        Action::Remove
    } else {
        Action::Keep
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// The closest entry of an extends chain that defines state `name`.
pub fn find_state<'c>(chain: &'c [CssResolve], name: &str) -> Option<(&'c CssResolve, &'c StateDef)> {
    chain.iter().find_map(|entry| match &entry.symbol {
        Symbol::Class(class) => class
            .states
            .as_ref()
            .and_then(|states| states.get(name))
            .map(|def| (entry, def)),
        _ => None,
    })
}

pub fn boolean_state_class(namespace: &str, name: &str) -> String {
    format!("{namespace}--{name}")
}

pub fn param_state_class(namespace: &str, name: &str, param: &str) -> String {
    let sanitized: String = param
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!(
        "{namespace}---{name}-{}-{}",
        param.chars().count(),
        escape_identifier(&sanitized)
    )
}

/// Backslash-escapes characters that are not valid in a class name.
pub fn escape_identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Simple selectors a state usage compiles to. `namespace` is the namespace
/// of the stylesheet defining the state.
pub fn state_selectors(
    namespace: &str,
    name: &str,
    def: &StateDef,
    arg: Option<&str>,
    report: &mut dyn FnMut(DiagnosticType),
) -> Vec<Selector> {
    match def {
        StateDef::Boolean => vec![Selector::Class(boolean_state_class(namespace, name))],
        StateDef::Mapped(selector) => mapped_selectors(selector).unwrap_or_default(),
        StateDef::Parameterized { param, default } => {
            let value = arg
                .map(str::trim)
                .filter(|arg| !arg.is_empty())
                .map(str::to_string)
                .or_else(|| default.clone());
            let Some(value) = value else {
                report(diagnostics::missing_state_param(name));
                return vec![Selector::Class(boolean_state_class(namespace, name))];
            };
            for reason in param.validate(&value) {
                report(diagnostics::state_validation_failed(name, &value, &reason));
            }
            vec![Selector::Class(param_state_class(namespace, name, &value))]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_states() {
        let (states, errors) = parse_states(
            "on, col(number(min(1))), size(enum(s, m, l)) m, open(\".is-open\"), name(string)",
        );
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(states["on"], StateDef::Boolean);
        assert_eq!(states["open"], StateDef::Mapped(".is-open".into()));
        assert_eq!(
            states["size"],
            StateDef::Parameterized {
                param: ParamType::Enum(vec!["s".into(), "m".into(), "l".into()]),
                default: Some("m".into()),
            }
        );
        assert!(matches!(
            &states["col"],
            StateDef::Parameterized { param: ParamType::Number(v), default: None } if v[0].name == "min"
        ));
        assert_eq!(states["name"].clone(), StateDef::Parameterized {
            param: ParamType::String(vec![]),
            default: None,
        });
    }

    #[test]
    fn test_invalid_entries_are_reported() {
        let (states, errors) = parse_states("on, bad(color), x(\".a .b\")");
        assert_eq!(states.len(), 1);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(boolean_state_class("entry", "on"), "entry--on");
        assert_eq!(param_state_class("entry", "col", "3"), "entry---col-1-3");
        assert_eq!(param_state_class("x", "label", "a b"), "x---label-3-a_b");
        assert_eq!(param_state_class("x", "sel", "a.b"), "x---sel-3-a\\.b");
    }

    #[test]
    fn test_validators() {
        let string = ParamType::String(vec![
            Validator { name: "minLength".into(), args: vec!["2".into()] },
            Validator { name: "contains".into(), args: vec!["x".into()] },
        ]);
        assert!(string.validate("axe").is_empty());
        assert_eq!(string.validate("a").len(), 2);

        let number = ParamType::Number(vec![
            Validator { name: "max".into(), args: vec!["10".into()] },
            Validator { name: "multipleOf".into(), args: vec!["2".into()] },
        ]);
        assert!(number.validate("4").is_empty());
        assert_eq!(number.validate("11").len(), 2);
        assert_eq!(number.validate("abc").len(), 1);
    }

    #[test]
    fn test_missing_param_falls_back_to_boolean() {
        let def = StateDef::Parameterized {
            param: ParamType::String(vec![]),
            default: None,
        };
        let mut reports = Vec::new();
        let selectors = state_selectors("ns", "size", &def, None, &mut |d| reports.push(d.code));
        assert_eq!(selectors, vec![Selector::Class("ns--size".into())]);
        assert_eq!(reports, vec!["MISSING_STATE_PARAM"]);
    }
}
