//! `@st-scope <selector> { ... }`: prefixes every nested rule with the
//! scope selector.
//!
//! ```css
//! @st-scope .a, .b {
//!     .part {}
//! }
//! /* .a .part {} .b .part {} */
//! ```

use csstree::selector::{Selector, SelectorList, nest_selectors};
use csstree::{AtRule, Node, Rule};

use super::css_keyframes::is_keyframes_at_rule;
use super::st_import::{IMPORT_AT_RULE, IMPORT_RULE};
use super::st_var::VARS_RULE;
use super::{Action, AnalyzeContext, FeatureHooks, NodeInterest, TransformContext, inside_at_rule};
use crate::diagnostics::NodeRef;
use crate::meta::ScopeBlock;

pub static HOOKS: FeatureHooks = FeatureHooks {
    name: "st-scope",
    interest: NodeInterest::AT_RULE.union(NodeInterest::RULE),
    analyze_at_rule,
    analyze_rule,
    transform_at_rule,
    ..FeatureHooks::NOOP
};

pub const SCOPE_AT_RULE: &str = "st-scope";

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn missing_scoping_param() -> DiagnosticType {
        DiagnosticType::error(
            "MISSING_SCOPING_PARAM",
            "\"@st-scope\" must receive a simple selector or stylesheet \"root\" as its scoping parameter",
        )
    }

    pub fn invalid_scope_selector(selector: &str) -> DiagnosticType {
        DiagnosticType::error(
            "INVALID_SCOPE_SELECTOR",
            format!("invalid \"@st-scope\" selector \"{selector}\""),
        )
    }

    pub fn forbidden_def_in_scope(kind: &str) -> DiagnosticType {
        DiagnosticType::error(
            "FORBIDDEN_DEF_IN_SCOPE",
            format!("cannot define {kind} inside \"@st-scope\""),
        )
    }
}

fn is_forbidden_at_rule(at_rule: &AtRule) -> Option<&'static str> {
    if at_rule.name == IMPORT_AT_RULE {
        Some("\"@st-import\"")
    } else if is_keyframes_at_rule(&at_rule.name) {
        Some("\"@keyframes\"")
    } else {
        None
    }
}

fn is_forbidden_rule(rule: &Rule) -> Option<&'static str> {
    match rule.selector.trim() {
        IMPORT_RULE => Some("\":import\""),
        VARS_RULE => Some("\":vars\""),
        _ => None,
    }
}

fn declare_scope_classes(ctx: &mut AnalyzeContext<'_>, list: &SelectorList, node: NodeRef) {
    for complex in &list.selectors {
        for part in &complex.parts {
            for simple in &part.compound.selectors {
                if let Selector::Class(name) = simple {
                    super::css_class::declare_class(ctx, name, node);
                }
            }
        }
    }
}

fn analyze_at_rule(ctx: &mut AnalyzeContext<'_>, at_rule: &AtRule, parents: &[&Node]) {
    if at_rule.name == SCOPE_AT_RULE {
        let params = at_rule.params.trim();
        if params.is_empty() {
            ctx.report(diagnostics::missing_scoping_param(), at_rule);
            return;
        }
        match SelectorList::parse(params) {
            Ok(list) => declare_scope_classes(ctx, &list, NodeRef::from(at_rule)),
            Err(_) => {
                ctx.report_word(diagnostics::invalid_scope_selector(params), at_rule, params);
                return;
            }
        }
        ctx.meta.scopes.push(ScopeBlock {
            selector: params.to_string(),
            span: at_rule.span,
        });
        return;
    }
    if inside_at_rule(parents, SCOPE_AT_RULE) {
        if let Some(kind) = is_forbidden_at_rule(at_rule) {
            ctx.report(diagnostics::forbidden_def_in_scope(kind), at_rule);
        }
    }
}

fn analyze_rule(
    ctx: &mut AnalyzeContext<'_>,
    rule: &Rule,
    _selectors: Option<&SelectorList>,
    parents: &[&Node],
) {
    if inside_at_rule(parents, SCOPE_AT_RULE) {
        if let Some(kind) = is_forbidden_rule(rule) {
            ctx.report(diagnostics::forbidden_def_in_scope(kind), rule);
        }
    }
}

fn transform_at_rule(_ctx: &mut TransformContext<'_>, at_rule: &mut AtRule) -> Action {
    if at_rule.name == SCOPE_AT_RULE {
        Action::Remove
    } else {
        Action::Keep
    }
}

fn scoped_selector(scope: &SelectorList, selector: &str) -> String {
    match SelectorList::parse(selector) {
        Ok(children) => nest_selectors(scope, &children).to_string(),
        Err(_) => format!("{scope} {}", selector.trim()),
    }
}

fn expand_scope_children(scope: &SelectorList, nodes: Vec<Node>, out: &mut Vec<Node>) {
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                if is_forbidden_rule(&rule).is_some() {
                    continue;
                }
                for single in &scope.selectors {
                    let single = SelectorList::new(vec![single.clone()]);
                    let mut scoped = rule.clone();
                    scoped.selector = scoped_selector(&single, &rule.selector);
                    out.push(Node::Rule(scoped));
                }
            }
            Node::AtRule(mut at_rule) => {
                if is_forbidden_at_rule(&at_rule).is_some() {
                    continue;
                }
                if let Some(children) = at_rule.nodes.take() {
                    let mut scoped = Vec::new();
                    expand_scope_children(scope, children, &mut scoped);
                    at_rule.nodes = Some(scoped);
                }
                out.push(Node::AtRule(at_rule));
            }
            Node::Comment(_) => out.push(node),
            Node::Decl(_) => {}
        }
    }
}

/// Replaces every `@st-scope` block with its scoped children. Imports,
/// vars and keyframes inside a scope are dropped.
pub fn expand_scopes(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::AtRule(at_rule) if at_rule.name == SCOPE_AT_RULE => {
                let children = at_rule.nodes.unwrap_or_default();
                match SelectorList::parse(&at_rule.params) {
                    Ok(scope) => expand_scope_children(&scope, expand_scopes(children), &mut out),
                    Err(_) => log::trace!("dropping @st-scope with invalid selector {:?}", at_rule.params),
                }
            }
            Node::AtRule(mut at_rule) => {
                at_rule.nodes = at_rule.nodes.map(expand_scopes);
                out.push(Node::AtRule(at_rule));
            }
            other => out.push(other),
        }
    }
    out
}
