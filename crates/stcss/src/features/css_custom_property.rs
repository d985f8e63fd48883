//! Custom property (`--name`) scoping.
//!
//! Every custom property is namespaced as `--{namespace}-{name}` unless it
//! is declared global with `@property st-global(--name)` (or the deprecated
//! `@st-global-custom-property`). Imported properties follow the decision of
//! the file that defines them.

use std::sync::Arc;

use csstree::value::{ValueNode, parse_value, stringify};
use csstree::{AtRule, Declaration, Node, Span};

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, parse_global_wrapper,
};
use crate::diagnostics::NodeRef;
use crate::meta::{Exports, Meta};
use crate::resolver::{CssResolve, Resolved, StylableResolver};
use crate::symbols::{CssVarSymbol, Symbol, SymbolNamespace, redeclare_symbol};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-custom-property",
    interest: NodeInterest::AT_RULE.union(NodeInterest::DECLARATION),
    analyze_at_rule,
    analyze_declaration,
    transform_at_rule,
    transform_declaration,
    transform_exports,
    ..FeatureHooks::NOOP
};

pub const PROPERTY_AT_RULE: &str = "property";
pub const GLOBAL_CUSTOM_PROPERTY_AT_RULE: &str = "st-global-custom-property";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn deprecated_global_custom_property() -> DiagnosticType {
        DiagnosticType::warning(
            "DEPRECATED_ST_GLOBAL_CUSTOM_PROPERTY",
            "@st-global-custom-property is deprecated, use \"@property st-global(--name)\"",
        )
    }

    pub fn global_css_var_missing_comma(entry: &str) -> DiagnosticType {
        DiagnosticType::error(
            "GLOBAL_CSS_VAR_MISSING_COMMA",
            format!("@st-global-custom-property is missing a comma in \"{entry}\""),
        )
    }

    pub fn illegal_custom_property_name(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "ILLEGAL_CUSTOM_PROPERTY_NAME",
            format!("custom property \"{name}\" must start with \"--\""),
        )
    }
}

pub fn is_custom_property(name: &str) -> bool {
    name.len() > 2 && name.starts_with("--")
}

// ============================================================================
// Analysis
// ============================================================================

fn declare_explicit(ctx: &mut AnalyzeContext<'_>, name: &str, global: bool, node: NodeRef) {
    let symbol = Symbol::CssVar(CssVarSymbol {
        name: name.to_string(),
        global,
        alias: None,
        explicit: true,
        span: node.span,
    });
    match ctx.meta.symbols.get_main(name) {
        None => {
            ctx.meta.symbols.insert(symbol);
        }
        Some(Symbol::CssVar(existing)) if !existing.explicit => {
            ctx.meta.symbols.insert(symbol);
        }
        Some(_) => ctx.report_word(redeclare_symbol(name), node, name),
    }
}

fn declare_implicit(ctx: &mut AnalyzeContext<'_>, name: &str, span: Span) {
    if ctx.meta.symbols.contains(SymbolNamespace::Main, name) {
        return;
    }
    ctx.meta.symbols.insert(Symbol::CssVar(CssVarSymbol {
        name: name.to_string(),
        global: false,
        alias: None,
        explicit: false,
        span,
    }));
}

/// Custom property names referenced through `var(--name)`, nested included.
pub fn collect_var_usages(nodes: &[ValueNode], out: &mut Vec<String>) {
    for node in nodes {
        if let ValueNode::Function { name, nodes } = node {
            if name == "var" {
                if let Some(ValueNode::Word(word)) = nodes.iter().find(|n| !n.is_space()) {
                    if is_custom_property(word) {
                        out.push(word.clone());
                    }
                }
            }
            collect_var_usages(nodes, out);
        }
    }
}

fn analyze_declaration(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, _parents: &[&Node]) {
    if is_custom_property(&decl.prop) {
        declare_implicit(ctx, &decl.prop, decl.span);
    }
    if decl.value.contains("var(") {
        let mut usages = Vec::new();
        collect_var_usages(&parse_value(&decl.value), &mut usages);
        for name in usages {
            declare_implicit(ctx, &name, decl.span);
        }
    }
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, _parents: &[&Node]) {
    match at_rule.name.as_str() {
        PROPERTY_AT_RULE => {
            let (name, global) = parse_global_wrapper(&at_rule.params);
            if !is_custom_property(&name) {
                ctx.report_word(diagnostics::illegal_custom_property_name(&name), at_rule, &name);
                return;
            }
            declare_explicit(ctx, &name, global, NodeRef::from(at_rule));
        }
        GLOBAL_CUSTOM_PROPERTY_AT_RULE => {
            ctx.report(diagnostics::deprecated_global_custom_property(), at_rule);
            for entry in at_rule.params.split(',') {
                let entry = entry.trim();
                if entry.is_empty() {
                    continue;
                }
                if entry.contains(char::is_whitespace) {
                    ctx.report_word(diagnostics::global_css_var_missing_comma(entry), at_rule, entry);
                    continue;
                }
                if !is_custom_property(entry) {
                    ctx.report_word(diagnostics::illegal_custom_property_name(entry), at_rule, entry);
                    continue;
                }
                declare_explicit(ctx, entry, true, NodeRef::from(at_rule));
            }
        }
        _ => {}
    }
}

// ============================================================================
// Transformation
// ============================================================================

fn emitted_name(meta: &Meta, var: &CssVarSymbol) -> String {
    if var.global {
        var.name.clone()
    } else {
        local_name(meta, &var.name)
    }
}

fn local_name(meta: &Meta, name: &str) -> String {
    format!("--{}-{}", meta.namespace, name.strip_prefix("--").unwrap_or(name))
}

/// Emitted name of custom property `name` as seen from `meta`.
pub fn scoped_name(resolver: &StylableResolver, meta: &Arc<Meta>, name: &str) -> String {
    match meta.symbols.get_main(name) {
        Some(symbol @ Symbol::CssVar(var)) => {
            if var.alias.is_some() {
                if let Ok(Resolved::Css(CssResolve {
                    meta: origin,
                    symbol: Symbol::CssVar(origin_var),
                })) = resolver.deep_resolve(meta, symbol)
                {
                    return emitted_name(&origin, &origin_var);
                }
            }
            emitted_name(meta, var)
        }
        _ => local_name(meta, name),
    }
}

fn scope_value_nodes(resolver: &StylableResolver, meta: &Arc<Meta>, nodes: &mut [ValueNode]) {
    for node in nodes {
        if let ValueNode::Function { name, nodes } = node {
            if name == "var" {
                if let Some(ValueNode::Word(word)) = nodes.iter_mut().find(|n| !n.is_space()) {
                    if is_custom_property(word) {
                        *word = scoped_name(resolver, meta, word);
                    }
                }
            }
            scope_value_nodes(resolver, meta, nodes);
        }
    }
}

/// Rewrites every `var(--name)` reference in `value`.
pub fn scope_value(resolver: &StylableResolver, meta: &Arc<Meta>, value: &str) -> String {
    if !value.contains("var(") {
        return value.to_string();
    }
    let mut nodes = parse_value(value);
    scope_value_nodes(resolver, meta, &mut nodes);
    stringify(&nodes)
}

fn transform_declaration(ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if is_custom_property(&decl.prop) {
        decl.prop = scoped_name(ctx.resolver, ctx.meta, &decl.prop);
    }
    decl.value = scope_value(ctx.resolver, ctx.meta, &decl.value);
    Action::Keep
}

fn transform_at_rule(ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    match at_rule.name.as_str() {
        // Bodiless `@property` only declares the name.
        PROPERTY_AT_RULE if at_rule.nodes.is_none() => Action::Remove,
        PROPERTY_AT_RULE => {
            let (name, _) = parse_global_wrapper(&at_rule.params);
            if is_custom_property(&name) {
                at_rule.params = scoped_name(ctx.resolver, ctx.meta, &name);
            }
            Action::Keep
        }
        GLOBAL_CUSTOM_PROPERTY_AT_RULE => Action::Remove,
        _ => Action::Keep,
    }
}

fn transform_exports(ctx: &mut TransformContext<'_>, exports: &mut Exports) {
    for var in ctx.meta.css_vars() {
        let scoped = scoped_name(ctx.resolver, ctx.meta, &var.name);
        exports.vars.insert(var.name.clone(), scoped);
    }
}
