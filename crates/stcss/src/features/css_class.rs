//! Class symbols, `-st-extends` and class exports.

use std::sync::Arc;

use csstree::selector::{Combinator, ComplexSelector, CompoundSelector, Selector, SelectorPart};
use csstree::{Declaration, Node, NodeKind};

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, SelectorNode, TransformContext,
    parent_rule, simple_rule_target,
};
use crate::diagnostics::NodeRef;
use crate::meta::{Exports, Meta};
use crate::resolver::{CssResolve, Resolved, StylableResolver};
use crate::symbols::{ClassSymbol, Extends, Symbol, redeclare_symbol};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-class",
    interest: NodeInterest::SELECTOR.union(NodeInterest::DECLARATION),
    analyze_selector_node,
    analyze_declaration,
    analyze_done,
    transform_init,
    transform_declaration,
    transform_exports,
    ..FeatureHooks::NOOP
};

pub const EXTENDS_PROP: &str = "-st-extends";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn cannot_extend_in_complex() -> DiagnosticType {
        DiagnosticType::error(
            "CANNOT_EXTEND_IN_COMPLEX",
            "cannot define \"-st-extends\" inside a complex selector",
        )
    }

    pub fn cannot_extend_unknown_symbol(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "CANNOT_EXTEND_UNKNOWN_SYMBOL",
            format!("cannot extend unknown symbol \"{name}\""),
        )
    }

    pub fn cannot_extend_js(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "CANNOT_EXTEND_JS",
            format!("cannot extend \"{name}\": it resolves to a script export"),
        )
    }

    pub fn circular_extends(name: &str) -> DiagnosticType {
        DiagnosticType::error(
            "CIRCULAR_EXTENDS",
            format!("circular extends through \"{name}\""),
        )
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Registers `name` as a class. A class named like an import becomes an
/// alias of it.
pub(crate) fn declare_class(ctx: &mut AnalyzeContext<'_>, name: &str, node: NodeRef) {
    match ctx.meta.symbols.get_main(name) {
        Some(Symbol::Class(_)) => {}
        Some(Symbol::Import(import)) => {
            let mut class = ClassSymbol::new(name).with_alias(import.clone());
            class.span = node.span;
            ctx.add_symbol(Symbol::Class(class), node, true);
        }
        Some(_) => ctx.report_word(redeclare_symbol(name), node, name),
        None => {
            let mut class = ClassSymbol::new(name);
            class.span = node.span;
            ctx.add_symbol(Symbol::Class(class), node, false);
        }
    }
}

fn analyze_selector_node(ctx: &mut AnalyzeContext<'_>, node: &SelectorNode<'_>) {
    if let Selector::Class(name) = node.selector {
        if !node.in_global {
            declare_class(ctx, name, NodeRef::from(node.rule));
        }
    }
}

fn analyze_declaration(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, parents: &[&Node]) {
    if decl.prop != EXTENDS_PROP {
        return;
    }
    let Some(Selector::Class(class_name)) = parent_rule(parents).and_then(simple_rule_target) else {
        ctx.report(diagnostics::cannot_extend_in_complex(), decl);
        return;
    };
    let base = decl.value.trim();
    if base.is_empty() || base.contains(char::is_whitespace) {
        ctx.report_word(diagnostics::cannot_extend_unknown_symbol(base), decl, base);
        return;
    }
    if let Some(class) = ctx.meta.symbols.get_class_mut(&class_name) {
        class.extends = Some(Extends {
            name: base.to_string(),
            span: decl.span,
        });
    }
}

/// Extends targets may be declared after their first use, so they are
/// checked once the whole sheet is known.
fn analyze_done(ctx: &mut AnalyzeContext<'_>) {
    let unknown: Vec<Extends> = ctx
        .meta
        .symbols
        .classes()
        .filter_map(|class| class.extends.clone())
        .filter(|extends| {
            !matches!(
                ctx.meta.symbols.get_main(&extends.name),
                Some(Symbol::Class(_) | Symbol::Element(_) | Symbol::Import(_))
            )
        })
        .collect();
    for extends in unknown {
        ctx.report_word(
            diagnostics::cannot_extend_unknown_symbol(&extends.name),
            NodeRef::new(NodeKind::Declaration, extends.span),
            &extends.name,
        );
    }
}

// ============================================================================
// Transformation
// ============================================================================

fn transform_init(ctx: &mut TransformContext<'_>) {
    let (meta, resolver) = (ctx.meta, ctx.resolver);
    let extending: Vec<(String, Extends)> = meta
        .symbols
        .classes()
        .filter_map(|class| class.extends.clone().map(|e| (class.name.clone(), e)))
        .collect();
    for (name, extends) in extending {
        let node = NodeRef::new(NodeKind::Declaration, extends.span);
        if let Some(base) = meta.symbols.get_main(&extends.name) {
            if let Ok(Resolved::Script { .. }) = resolver.deep_resolve(meta, base) {
                ctx.report_word(diagnostics::cannot_extend_js(&extends.name), node, &extends.name);
                continue;
            }
        }
        let chain = resolver.resolve_class_chain(meta, &name);
        if chain.circular {
            ctx.report_word(diagnostics::circular_extends(&name), node, &extends.name);
        }
    }
}

fn transform_declaration(_ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if decl.prop == EXTENDS_PROP {
        Action::Remove
    } else {
        Action::Keep
    }
}

pub(crate) fn single_class(name: String) -> ComplexSelector {
    ComplexSelector::new(vec![SelectorPart::new(
        CompoundSelector::new(vec![Selector::Class(name)]),
        Combinator::None,
    )])
}

pub(crate) fn local_emit(meta: &Meta, class: &ClassSymbol) -> ComplexSelector {
    match &class.global_selector {
        Some(global) => global.clone(),
        None => single_class(meta.scoped_class(&class.name)),
    }
}

/// Selector emitted for class `name` of `meta`: the namespaced class, the
/// `-st-global` mapping, or the imported class it aliases.
pub fn emitted_class(resolver: &StylableResolver, meta: &Arc<Meta>, name: &str) -> ComplexSelector {
    match meta.symbols.get_main(name) {
        Some(Symbol::Class(class)) if class.alias.is_none() => local_emit(meta, class),
        Some(symbol @ (Symbol::Class(_) | Symbol::Import(_))) => {
            match resolver.deep_resolve(meta, symbol) {
                Ok(Resolved::Css(CssResolve {
                    meta: origin,
                    symbol: Symbol::Class(origin_class),
                })) => local_emit(&origin, &origin_class),
                _ => single_class(meta.scoped_class(name)),
            }
        }
        _ => single_class(meta.scoped_class(name)),
    }
}

/// Space-separated class names of an emitted selector, for exports.
pub fn class_names(selector: &ComplexSelector) -> String {
    selector
        .parts
        .iter()
        .flat_map(|part| part.compound.selectors.iter())
        .filter_map(|simple| match simple {
            Selector::Class(name) => Some(name.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn transform_exports(ctx: &mut TransformContext<'_>, exports: &mut Exports) {
    for class in ctx.meta.symbols.classes() {
        let emitted = emitted_class(ctx.resolver, ctx.meta, &class.name);
        exports.classes.insert(class.name.clone(), class_names(&emitted));
    }
}

#[cfg(test)]
mod tests {
    use csstree::selector::SelectorList;

    use super::*;

    #[test]
    fn test_class_names_of_global_mapping() {
        let list = SelectorList::parse(".a.b > .c[x]").unwrap();
        assert_eq!(class_names(&list.selectors[0]), "a b c");
    }
}
