//! Global escapes: `:global(...)` in selectors and the `-st-global` class
//! mapping.

use csstree::selector::{PseudoArgs, Selector, SelectorList};
use csstree::{Declaration, Node};

use super::{
    Action, AnalyzeContext, FeatureHooks, NodeInterest, SelectorNode, TransformContext,
    parent_rule, simple_rule_target, unquote,
};

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-global",
    interest: NodeInterest::SELECTOR.union(NodeInterest::DECLARATION),
    analyze_selector_node,
    analyze_declaration,
    transform_declaration,
    ..FeatureHooks::NOOP
};

pub const GLOBAL_PSEUDO: &str = "global";
pub const GLOBAL_PROP: &str = "-st-global";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn unsupported_multi_selectors_in_global() -> DiagnosticType {
        DiagnosticType::warning(
            "UNSUPPORTED_MULTI_SELECTORS_IN_GLOBAL",
            "unsupported multi selector in :global()",
        )
    }

    pub fn global_mapping_in_complex() -> DiagnosticType {
        DiagnosticType::error(
            "GLOBAL_MAPPING_IN_COMPLEX",
            "-st-global can only be used on a simple class selector",
        )
    }

    pub fn invalid_global_mapping(value: &str) -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_GLOBAL_MAPPING",
            format!("-st-global must be a quoted single selector, got {value}"),
        )
    }
}

/// The selectors inside `:global(...)`.
pub fn global_selectors(selector: &Selector) -> Option<&SelectorList> {
    match selector {
        Selector::PseudoClass(name, Some(PseudoArgs::Selectors(list))) if name == GLOBAL_PSEUDO => {
            Some(list)
        }
        _ => None,
    }
}

fn analyze_selector_node(ctx: &mut AnalyzeContext<'_>, node: &SelectorNode<'_>) {
    if let Some(list) = global_selectors(node.selector) {
        if list.selectors.len() > 1 {
            ctx.report(diagnostics::unsupported_multi_selectors_in_global(), node.rule);
        }
    }
}

fn analyze_declaration(ctx: &mut AnalyzeContext<'_>, decl: &Declaration, parents: &[&Node]) {
    if decl.prop != GLOBAL_PROP {
        return;
    }
    let class_name = match parent_rule(parents).and_then(simple_rule_target) {
        Some(Selector::Class(name)) => name,
        _ => {
            ctx.report(diagnostics::global_mapping_in_complex(), decl);
            return;
        }
    };
    let parsed = unquote(&decl.value).and_then(|inner| SelectorList::parse(inner).ok());
    let complex = match parsed {
        Some(list) if list.selectors.len() == 1 => list.selectors.into_iter().next(),
        _ => None,
    };
    let Some(complex) = complex else {
        ctx.report_word(diagnostics::invalid_global_mapping(&decl.value), decl, &decl.value);
        return;
    };
    if let Some(class) = ctx.meta.symbols.get_class_mut(&class_name) {
        class.global_selector = Some(complex);
    }
}

fn transform_declaration(_ctx: &mut TransformContext<'_>, decl: &mut Declaration) -> Action {
    if decl.prop == GLOBAL_PROP {
        Action::Remove
    } else {
        Action::Keep
    }
}
