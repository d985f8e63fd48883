//! `value()` evaluation.
//!
//! Variables evaluate in the stylesheet that defines them: custom
//! properties inside a var's text are scoped with the defining file's
//! namespace, and formatters are looked up in the defining file's imports.
//! Diagnostics are only reported for problems in the stylesheet being
//! transformed; errors inside imported definitions were already reported
//! when that stylesheet was transformed.

use std::path::PathBuf;
use std::sync::Arc;

use csstree::value::{ValueNode, parse_value, split_by_comma, stringify, stringify_node, trim_nodes};
use indexmap::IndexMap;

use crate::boxed::Boxed;
use crate::diagnostics::{DiagnosticType, Diagnostics, NodeRef};
use crate::features::css_custom_property;
use crate::features::st_custom_value::{self, is_custom_value_function, parse_custom_value};
use crate::features::st_var::diagnostics;
use crate::meta::Meta;
use crate::resolver::script::{FormatterFn, ScriptExport, call_formatter};
use crate::resolver::{CssResolve, Resolved, StylableResolver};
use crate::symbols::Symbol;

pub const VALUE_FUNCTION: &str = "value";

pub struct ValueEvaluator<'a> {
    resolver: &'a StylableResolver,
    origin: &'a Arc<Meta>,
    overrides: Option<&'a IndexMap<String, String>>,
}

struct EvalState<'d> {
    /// Vars currently being evaluated, by defining file.
    visited: Vec<(PathBuf, String)>,
    diagnostics: &'d mut Diagnostics,
    node: NodeRef,
}

impl<'a> ValueEvaluator<'a> {
    pub fn new(
        resolver: &'a StylableResolver,
        origin: &'a Arc<Meta>,
        overrides: Option<&'a IndexMap<String, String>>,
    ) -> Self {
        Self {
            resolver,
            origin,
            overrides,
        }
    }

    /// Evaluates a declaration value. Calls that cannot be resolved keep
    /// their source text.
    pub fn evaluate_declaration(&self, value: &str, diagnostics: &mut Diagnostics, node: NodeRef) -> String {
        let mut state = EvalState {
            visited: Vec::new(),
            diagnostics,
            node,
        };
        self.eval_inline(self.origin, &parse_value(value), &mut state)
    }

    /// Evaluates an expression that may produce a structured value.
    pub fn evaluate(&self, text: &str, diagnostics: &mut Diagnostics, node: NodeRef) -> Boxed {
        let mut state = EvalState {
            visited: Vec::new(),
            diagnostics,
            node,
        };
        self.eval_text(self.origin, text, &mut state)
    }

    /// Evaluates the var `name` of the origin stylesheet.
    pub fn evaluate_var(&self, name: &str, diagnostics: &mut Diagnostics, node: NodeRef) -> Option<Boxed> {
        let mut state = EvalState {
            visited: Vec::new(),
            diagnostics,
            node,
        };
        self.resolve_var(self.origin, name, &mut state)
    }

    fn report(&self, meta: &Arc<Meta>, state: &mut EvalState<'_>, kind: DiagnosticType, word: &str) {
        if Arc::ptr_eq(meta, self.origin) {
            state.diagnostics.report_word(kind, state.node, word);
        }
    }

    fn eval_text(&self, meta: &Arc<Meta>, text: &str, state: &mut EvalState<'_>) -> Boxed {
        let nodes = parse_value(text);
        match trim_nodes(&nodes) {
            [ValueNode::Function { name, nodes: args }] if is_custom_value_function(name) => {
                let parsed = parse_custom_value(name, args, |item| self.eval_text(meta, item, state));
                match parsed {
                    Ok(boxed) => boxed,
                    Err(detail) => {
                        self.report(
                            meta,
                            state,
                            st_custom_value::diagnostics::invalid_custom_value(name, &detail),
                            name,
                        );
                        Boxed::text(text.trim())
                    }
                }
            }
            [ValueNode::Function { name, nodes: args }] if name == VALUE_FUNCTION => self
                .eval_value_call(meta, args, state)
                .unwrap_or_else(|| Boxed::text(text.trim())),
            _ => Boxed::text(self.eval_inline(meta, &nodes, state).trim()),
        }
    }

    fn eval_inline(&self, meta: &Arc<Meta>, nodes: &[ValueNode], state: &mut EvalState<'_>) -> String {
        let mut out = String::new();
        for node in nodes {
            let ValueNode::Function { name, nodes: args } = node else {
                out.push_str(&stringify_node(node));
                continue;
            };
            if name == VALUE_FUNCTION {
                match self.eval_value_call(meta, args, state) {
                    Some(boxed) if !boxed.is_structured() => out.push_str(&boxed.to_string()),
                    Some(boxed) => {
                        let var_name = stringify(trim_nodes(args));
                        self.report(
                            meta,
                            state,
                            diagnostics::cannot_use_as_value(&boxed.type_name, &var_name),
                            &var_name,
                        );
                        out.push_str(&stringify_node(node));
                    }
                    None => out.push_str(&stringify_node(node)),
                }
            } else if is_custom_value_function(name) {
                out.push_str(&stringify_node(node));
            } else if let Some(formatter) = self.formatter(meta, name) {
                let formatted = self.call_formatter(meta, name, &formatter, args, state);
                out.push_str(&formatted.unwrap_or_else(|| stringify_node(node)));
            } else {
                out.push_str(name);
                out.push('(');
                out.push_str(&self.eval_inline(meta, args, state));
                out.push(')');
            }
        }
        out
    }

    fn call_formatter(
        &self,
        meta: &Arc<Meta>,
        name: &str,
        formatter: &FormatterFn,
        args: &[ValueNode],
        state: &mut EvalState<'_>,
    ) -> Option<String> {
        let values: Vec<String> = split_by_comma(args)
            .iter()
            .map(|arg| self.eval_inline(meta, arg, state).trim().to_string())
            .collect();
        match call_formatter(formatter, &values) {
            Ok(formatted) => Some(formatted),
            Err(message) => {
                self.report(meta, state, diagnostics::formatter_failed(name, &message), name);
                None
            }
        }
    }

    fn formatter(&self, meta: &Arc<Meta>, name: &str) -> Option<FormatterFn> {
        let symbol = meta.symbols.get_main(name)?;
        if !matches!(symbol, Symbol::Import(_)) {
            return None;
        }
        match self.resolver.deep_resolve(meta, symbol) {
            Ok(Resolved::Script {
                export: ScriptExport::Formatter(formatter),
                ..
            }) => Some(formatter),
            _ => None,
        }
    }

    /// `value(name, ...path)`. `None` leaves the call unresolved.
    fn eval_value_call(&self, meta: &Arc<Meta>, args: &[ValueNode], state: &mut EvalState<'_>) -> Option<Boxed> {
        let groups = split_by_comma(args);
        let name = groups
            .first()
            .map(|first| stringify(trim_nodes(first)))
            .unwrap_or_default();
        if name.is_empty() {
            self.report(meta, state, diagnostics::missing_var_name(), VALUE_FUNCTION);
            return None;
        }
        let path = &groups[1..];
        let path: Vec<String> = path
            .iter()
            .map(|segment| self.eval_inline(meta, segment, state).trim().to_string())
            .collect();
        let value = self.resolve_var(meta, &name, state)?;
        if path.is_empty() {
            return Some(value);
        }
        match value.get_path(&path) {
            Some(found) => Some(found.clone()),
            None => {
                self.report(meta, state, diagnostics::unknown_var_path(&name, &path.join(", ")), &name);
                None
            }
        }
    }

    fn resolve_var(&self, meta: &Arc<Meta>, name: &str, state: &mut EvalState<'_>) -> Option<Boxed> {
        if Arc::ptr_eq(meta, self.origin) {
            if let Some(value) = self.overrides.and_then(|overrides| overrides.get(name)) {
                return Some(Boxed::text(value.clone()));
            }
        }
        let key = (meta.path.clone(), name.to_string());
        if state.visited.contains(&key) {
            log::trace!("cyclic value({name}) in {}", meta.path.display());
            return None;
        }
        match meta.symbols.get_main(name) {
            Some(Symbol::Var(var)) => {
                let text = css_custom_property::scope_value(self.resolver, meta, &var.text);
                state.visited.push(key);
                let value = self.eval_text(meta, &text, state);
                state.visited.pop();
                Some(value)
            }
            Some(symbol @ Symbol::Import(_)) => match self.resolver.deep_resolve(meta, symbol) {
                Ok(Resolved::Css(CssResolve {
                    meta: origin,
                    symbol: Symbol::Var(var),
                })) => {
                    state.visited.push(key);
                    let value = self.resolve_var(&origin, &var.name, state);
                    state.visited.pop();
                    value
                }
                _ => {
                    self.report(meta, state, diagnostics::unknown_var(name), name);
                    None
                }
            },
            _ => {
                self.report(meta, state, diagnostics::unknown_var(name), name);
                None
            }
        }
    }
}
