//! `@keyframes` namespacing and `animation` / `animation-name` references.

use std::sync::Arc;

use csstree::value::{ValueNode, parse_value, stringify};
use csstree::{AtRule, Declaration, Node};
use phf::phf_set;

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, inside_at_rule,
    inside_rule, parse_global_wrapper,
};
use crate::meta::{Exports, Meta};
use crate::resolver::{CssResolve, Resolved, StylableResolver};
use crate::symbols::{ScopedNameSymbol, Symbol, SymbolNamespace};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-keyframes",
    interest: NodeInterest::AT_RULE,
    analyze_at_rule,
    transform_at_rule,
    transform_declaration,
    transform_exports,
    ..FeatureHooks::NOOP
};

/// Names that can never be keyframes identifiers.
static RESERVED_NAMES: phf::Set<&'static str> = phf_set! {
    "none", "initial", "inherit", "unset", "revert", "revert-layer", "default",
};

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn missing_keyframes_name() -> DiagnosticType {
        DiagnosticType::error("MISSING_KEYFRAMES_NAME", "keyframes missing name")
    }

    pub fn illegal_keyframes_nesting() -> DiagnosticType {
        DiagnosticType::error(
            "ILLEGAL_KEYFRAMES_NESTING",
            "illegal nested \"@keyframes\"",
        )
    }

    pub fn keyframes_name_reserved(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "KEYFRAME_NAME_RESERVED",
            format!("keyframes \"{name}\" is reserved"),
        )
    }
}

pub fn is_keyframes_at_rule(name: &str) -> bool {
    name == "keyframes" || (name.starts_with('-') && name.ends_with("-keyframes"))
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, parents: &[&Node]) {
    if !is_keyframes_at_rule(&at_rule.name) {
        return;
    }
    if inside_at_rule(parents, super::st_scope::SCOPE_AT_RULE) {
        // reported and stripped by st-scope
        return;
    }
    if inside_rule(parents) {
        ctx.report(diagnostics::illegal_keyframes_nesting(), at_rule);
        return;
    }
    let (name, global) = parse_global_wrapper(&at_rule.params);
    if name.is_empty() {
        ctx.report(diagnostics::missing_keyframes_name(), at_rule);
        return;
    }
    if RESERVED_NAMES.contains(name.as_str()) {
        ctx.report_word(diagnostics::keyframes_name_reserved(&name), at_rule, &name);
        return;
    }
    let existing = ctx.meta.symbols.get(SymbolNamespace::Keyframes, &name);
    // Several @keyframes with the same name are allowed; an import is not
    // overridden.
    let safe = matches!(existing, Some(Symbol::Keyframes(k)) if k.alias.is_none());
    ctx.add_symbol(
        Symbol::Keyframes(ScopedNameSymbol {
            name,
            global,
            alias: None,
            span: at_rule.span,
        }),
        at_rule,
        safe,
    );
}

fn emitted_name(meta: &Meta, symbol: &ScopedNameSymbol) -> String {
    if symbol.global {
        symbol.name.clone()
    } else {
        meta.scoped_class(&symbol.name)
    }
}

/// Emitted keyframes name for `name` as seen from `meta`, or `None` when
/// `meta` knows no such keyframes.
pub fn scoped_name(resolver: &StylableResolver, meta: &Arc<Meta>, name: &str) -> Option<String> {
    let symbol = meta.symbols.get(SymbolNamespace::Keyframes, name)?;
    let Symbol::Keyframes(keyframes) = symbol else {
        return None;
    };
    if keyframes.alias.is_some() {
        return match resolver.deep_resolve(meta, symbol) {
            Ok(Resolved::Css(CssResolve {
                meta: origin,
                symbol: Symbol::Keyframes(origin_keyframes),
            })) => Some(emitted_name(&origin, &origin_keyframes)),
            _ => Some(name.to_string()),
        };
    }
    Some(emitted_name(meta, keyframes))
}

fn transform_at_rule(ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    if !is_keyframes_at_rule(&at_rule.name) {
        return Action::Keep;
    }
    let (name, global) = parse_global_wrapper(&at_rule.params);
    at_rule.params = if global {
        name
    } else {
        scoped_name(ctx.resolver, ctx.meta, &name).unwrap_or(name)
    };
    Action::Keep
}

/// Rewrites keyframes names in an `animation`/`animation-name` value.
pub fn scope_animation_value(resolver: &StylableResolver, meta: &Arc<Meta>, value: &str) -> String {
    let mut nodes = parse_value(value);
    let mut changed = false;
    for node in nodes.iter_mut() {
        if let ValueNode::Word(word) = node {
            if let Some(scoped) = scoped_name(resolver, meta, word) {
                *word = scoped;
                changed = true;
            }
        }
    }
    if changed {
        stringify(&nodes)
    } else {
        value.to_string()
    }
}

fn transform_declaration(ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if matches!(decl.prop.as_str(), "animation" | "animation-name") {
        decl.value = scope_animation_value(ctx.resolver, ctx.meta, &decl.value);
    }
    Action::Keep
}

fn transform_exports(ctx: &mut TransformContext<'_>, exports: &mut Exports) {
    for symbol in ctx.meta.keyframes() {
        let name = symbol.name();
        let scoped = scoped_name(ctx.resolver, ctx.meta, name).unwrap_or_else(|| name.to_string());
        exports.keyframes.insert(name.to_string(), scoped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframes_at_rule_names() {
        assert!(is_keyframes_at_rule("keyframes"));
        assert!(is_keyframes_at_rule("-webkit-keyframes"));
        assert!(!is_keyframes_at_rule("keyframe"));
    }
}
