//! Element (component) selectors: capitalized type selectors such as
//! `Button` that refer to an imported stylesheet's root.

use std::sync::Arc;

use csstree::selector::{ComplexSelector, Selector};

use super::{AnalyzeContext, FeatureHooks, NodeInterest, SelectorNode};
use crate::diagnostics::NodeRef;
use crate::meta::Meta;
use crate::resolver::StylableResolver;
use crate::symbols::{ElementSymbol, Symbol};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "css-type",
    interest: NodeInterest::SELECTOR,
    analyze_selector_node,
    ..FeatureHooks::NOOP
};

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn unknown_component(name: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "UNKNOWN_COMPONENT",
            format!("component \"{name}\" is not imported"),
        )
    }
}

pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn analyze_selector_node(ctx: &mut AnalyzeContext<'_>, node: &SelectorNode<'_>) {
    let Selector::Type(name) = node.selector else {
        return;
    };
    if node.in_global || !is_component_name(name) {
        return;
    }
    let rule = NodeRef::from(node.rule);
    let alias = match ctx.meta.symbols.get_main(name) {
        Some(Symbol::Element(_)) => return,
        Some(Symbol::Import(import)) => Some(import.clone()),
        _ => None,
    };
    if alias.is_none() {
        ctx.report_word(diagnostics::unknown_component(name), rule, name);
    }
    let safe = alias.is_some();
    ctx.add_symbol(
        Symbol::Element(ElementSymbol {
            name: name.clone(),
            alias,
            span: rule.span,
        }),
        rule,
        safe,
    );
}

/// Selector emitted for a component type selector, or `None` when the type
/// stays as written.
pub fn emitted_element(
    resolver: &StylableResolver,
    meta: &Arc<Meta>,
    name: &str,
) -> Option<ComplexSelector> {
    let chain = resolver.resolve_element_chain(meta, name);
    let origin = chain.origin_definition()?;
    match &origin.symbol {
        Symbol::Class(class) if class.alias.is_none() => {
            Some(super::css_class::local_emit(&origin.meta, class))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_names() {
        assert!(is_component_name("Button"));
        assert!(!is_component_name("button"));
        assert!(!is_component_name(""));
    }
}
