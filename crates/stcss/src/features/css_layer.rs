//! `@layer` namespacing. Dotted names (`@layer theme.dark`) are scoped per
//! segment.

use std::sync::Arc;

use csstree::{AtRule, Node};

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, parse_global_wrapper,
};
use crate::meta::{Exports, Meta};
use crate::resolver::{CssResolve, Resolved, StylableResolver};
use crate::symbols::{ScopedNameSymbol, Symbol, SymbolNamespace};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-layer",
    interest: NodeInterest::AT_RULE,
    analyze_at_rule,
    transform_at_rule,
    transform_exports,
    ..FeatureHooks::NOOP
};

pub const LAYER_AT_RULE: &str = "layer";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn invalid_layer_name(name: &str) -> DiagnosticType {
        DiagnosticType::error("INVALID_LAYER_NAME", format!("invalid layer name \"{name}\""))
    }
}

fn is_valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, _parents: &[&Node]) {
    if at_rule.name != LAYER_AT_RULE || at_rule.params.trim().is_empty() {
        return;
    }
    for entry in at_rule.params.split(',') {
        let (name, global) = parse_global_wrapper(entry);
        for segment in name.split('.') {
            if !is_valid_segment(segment) {
                ctx.report_word(diagnostics::invalid_layer_name(&name), at_rule, &name);
                break;
            }
            let safe = matches!(
                ctx.meta.symbols.get(SymbolNamespace::Layer, segment),
                Some(Symbol::Layer(layer)) if layer.alias.is_none()
            );
            ctx.add_symbol(
                Symbol::Layer(ScopedNameSymbol {
                    name: segment.to_string(),
                    global,
                    alias: None,
                    span: at_rule.span,
                }),
                at_rule,
                safe,
            );
        }
    }
}

fn emitted_name(meta: &Meta, symbol: &ScopedNameSymbol) -> String {
    if symbol.global {
        symbol.name.clone()
    } else {
        meta.scoped_class(&symbol.name)
    }
}

/// Emitted name of one layer segment as seen from `meta`.
pub fn scoped_name(resolver: &StylableResolver, meta: &Arc<Meta>, name: &str) -> String {
    let Some(symbol) = meta.symbols.get(SymbolNamespace::Layer, name) else {
        return meta.scoped_class(name);
    };
    let Symbol::Layer(layer) = symbol else {
        return meta.scoped_class(name);
    };
    if layer.alias.is_some() {
        return match resolver.deep_resolve(meta, symbol) {
            Ok(Resolved::Css(CssResolve {
                meta: origin,
                symbol: Symbol::Layer(origin_layer),
            })) => emitted_name(&origin, &origin_layer),
            _ => name.to_string(),
        };
    }
    emitted_name(meta, layer)
}

fn scope_layer_params(resolver: &StylableResolver, meta: &Arc<Meta>, params: &str) -> String {
    params
        .split(',')
        .map(|entry| {
            let (name, global) = parse_global_wrapper(entry);
            if global {
                return name;
            }
            name.split('.')
                .map(|segment| scoped_name(resolver, meta, segment))
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn transform_at_rule(ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    if at_rule.name == LAYER_AT_RULE && !at_rule.params.trim().is_empty() {
        at_rule.params = scope_layer_params(ctx.resolver, ctx.meta, &at_rule.params);
    }
    Action::Keep
}

fn transform_exports(ctx: &mut TransformContext<'_>, exports: &mut Exports) {
    for symbol in ctx.meta.layers() {
        let name = symbol.name();
        exports
            .layers
            .insert(name.to_string(), scoped_name(ctx.resolver, ctx.meta, name));
    }
}
