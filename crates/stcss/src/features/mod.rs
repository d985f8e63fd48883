//! Language features.
//!
//! Every feature is a record of plain function pointers ([`FeatureHooks`]).
//! The processor and transformer dispatch each node to the features in
//! [`FEATURES`] order; features that do not care about a hook leave the
//! no-op default in place.

pub mod css_class;
pub mod css_custom_property;
pub mod css_keyframes;
pub mod css_layer;
pub mod css_pseudo_class;
pub mod css_pseudo_element;
pub mod css_type;
pub mod st_custom_value;
pub mod st_global;
pub mod st_import;
pub mod st_mixin;
pub mod st_namespace;
pub mod st_scope;
pub mod st_var;

use std::sync::Arc;

use bitflags::bitflags;
use csstree::selector::{Selector, SelectorList};
use csstree::{AtRule, Declaration, Node, Rule, Stylesheet};
use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticType, Diagnostics, NodeRef};
use crate::meta::{Exports, Meta};
use crate::resolver::StylableResolver;
use crate::symbols::{Symbol, add_symbol};

bitflags! {
    /// Node types a feature wants to see during analysis.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NodeInterest: u8 {
        const AT_RULE = 1 << 0;
        const RULE = 1 << 1;
        const SELECTOR = 1 << 2;
        const DECLARATION = 1 << 3;
    }
}

/// Mutable state shared by features during analysis.
pub struct AnalyzeContext<'a> {
    pub meta: &'a mut Meta,
}

impl<'a> AnalyzeContext<'a> {
    pub fn new(meta: &'a mut Meta) -> Self {
        Self { meta }
    }

    pub fn report(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>) {
        self.meta.diagnostics.report(kind, node);
    }

    pub fn report_word(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>, word: &str) {
        self.meta.diagnostics.report_word(kind, node, word);
    }

    pub fn add_symbol(&mut self, symbol: Symbol, node: impl Into<NodeRef>, safe_redeclare: bool) {
        let meta = &mut *self.meta;
        add_symbol(
            &mut meta.symbols,
            &mut meta.diagnostics,
            symbol,
            node.into(),
            safe_redeclare,
        );
    }
}

/// A simple selector visited during analysis.
pub struct SelectorNode<'r> {
    pub rule: &'r Rule,
    pub selector: &'r Selector,
    /// Inside `:global(...)`.
    pub in_global: bool,
}

/// State shared by features while transforming one stylesheet.
pub struct TransformContext<'a> {
    pub resolver: &'a StylableResolver,
    pub meta: &'a Arc<Meta>,
    pub diagnostics: &'a mut Diagnostics,
    /// Variable overrides passed to a CSS mixin (`m(color red)`); they apply
    /// to `value()` lookups in `meta` only.
    pub overrides: Option<&'a IndexMap<String, String>>,
}

impl<'a> TransformContext<'a> {
    pub fn new(
        resolver: &'a StylableResolver,
        meta: &'a Arc<Meta>,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            resolver,
            meta,
            diagnostics,
            overrides: None,
        }
    }

    pub fn report(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>) {
        self.diagnostics.report(kind, node);
    }

    pub fn report_word(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>, word: &str) {
        self.diagnostics.report_word(kind, node, word);
    }
}

/// What to do with a node after a transform hook ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Keep,
    Remove,
}

pub type AnalyzeInitHook = fn(&mut AnalyzeContext<'_>, &Stylesheet);
pub type AnalyzeAtRuleHook = fn(&mut AnalyzeContext<'_>, &AtRule, &[&Node]);
pub type AnalyzeRuleHook = fn(&mut AnalyzeContext<'_>, &Rule, Option<&SelectorList>, &[&Node]);
pub type AnalyzeSelectorHook = fn(&mut AnalyzeContext<'_>, &SelectorNode<'_>);
pub type AnalyzeDeclarationHook = fn(&mut AnalyzeContext<'_>, &Declaration, &[&Node]);
pub type AnalyzeDoneHook = fn(&mut AnalyzeContext<'_>);
pub type TransformInitHook = fn(&mut TransformContext<'_>);
pub type TransformAtRuleHook = fn(&mut TransformContext<'_>, &mut AtRule) -> Action;
pub type TransformRuleHook = fn(&mut TransformContext<'_>, &Rule) -> Action;
pub type TransformDeclarationHook = fn(&mut TransformContext<'_>, &mut Declaration) -> Action;
pub type TransformExportsHook = fn(&mut TransformContext<'_>, &mut Exports);

pub struct FeatureHooks {
    pub name: &'static str,
    pub interest: NodeInterest,
    pub analyze_init: AnalyzeInitHook,
    pub analyze_at_rule: AnalyzeAtRuleHook,
    pub analyze_rule: AnalyzeRuleHook,
    pub analyze_selector_node: AnalyzeSelectorHook,
    pub analyze_declaration: AnalyzeDeclarationHook,
    pub analyze_done: AnalyzeDoneHook,
    pub transform_init: TransformInitHook,
    pub transform_at_rule: TransformAtRuleHook,
    pub transform_rule: TransformRuleHook,
    pub transform_declaration: TransformDeclarationHook,
    pub transform_exports: TransformExportsHook,
}

fn noop_analyze_init(_: &mut AnalyzeContext<'_>, _: &Stylesheet) {}
fn noop_analyze_at_rule(_: &mut AnalyzeContext<'_>, _: &AtRule, _: &[&Node]) {}
fn noop_analyze_rule(_: &mut AnalyzeContext<'_>, _: &Rule, _: Option<&SelectorList>, _: &[&Node]) {}
fn noop_analyze_selector(_: &mut AnalyzeContext<'_>, _: &SelectorNode<'_>) {}
fn noop_analyze_declaration(_: &mut AnalyzeContext<'_>, _: &Declaration, _: &[&Node]) {}
fn noop_analyze_done(_: &mut AnalyzeContext<'_>) {}
fn noop_transform_init(_: &mut TransformContext<'_>) {}
fn keep_at_rule(_: &mut TransformContext<'_>, _: &mut AtRule) -> Action {
    Action::Keep
}
fn keep_rule(_: &mut TransformContext<'_>, _: &Rule) -> Action {
    Action::Keep
}
fn keep_declaration(_: &mut TransformContext<'_>, _: &mut Declaration) -> Action {
    Action::Keep
}
fn noop_transform_exports(_: &mut TransformContext<'_>, _: &mut Exports) {}

impl FeatureHooks {
    pub const NOOP: FeatureHooks = FeatureHooks {
        name: "noop",
        interest: NodeInterest::empty(),
        analyze_init: noop_analyze_init,
        analyze_at_rule: noop_analyze_at_rule,
        analyze_rule: noop_analyze_rule,
        analyze_selector_node: noop_analyze_selector,
        analyze_declaration: noop_analyze_declaration,
        analyze_done: noop_analyze_done,
        transform_init: noop_transform_init,
        transform_at_rule: keep_at_rule,
        transform_rule: keep_rule,
        transform_declaration: keep_declaration,
        transform_exports: noop_transform_exports,
    };

    pub fn wants(&self, interest: NodeInterest) -> bool {
        self.interest.contains(interest)
    }
}

/// Dispatch order. Declaration transforms run in this order too: custom
/// properties and keyframes names are scoped before `value()` substitutes
/// text that was already scoped in its own stylesheet.
pub static FEATURES: &[&FeatureHooks] = &[
    &st_import::HOOKS,
    &st_namespace::HOOKS,
    &st_global::HOOKS,
    &css_custom_property::HOOKS,
    &css_keyframes::HOOKS,
    &css_layer::HOOKS,
    &st_var::HOOKS,
    &st_mixin::HOOKS,
    &css_class::HOOKS,
    &css_type::HOOKS,
    &css_pseudo_class::HOOKS,
    &st_scope::HOOKS,
];

// ============================================================================
// Shared helpers
// ============================================================================

/// The rule directly containing a declaration.
pub(crate) fn parent_rule<'n>(parents: &[&'n Node]) -> Option<&'n Rule> {
    match parents.last().copied() {
        Some(Node::Rule(rule)) => Some(rule),
        _ => None,
    }
}

/// True when any ancestor is an at-rule named `name`.
pub(crate) fn inside_at_rule(parents: &[&Node], name: &str) -> bool {
    parents
        .iter()
        .any(|node| matches!(node, Node::AtRule(at_rule) if at_rule.name == name))
}

/// True when any ancestor is a rule.
pub(crate) fn inside_rule(parents: &[&Node]) -> bool {
    parents.iter().any(|node| matches!(node, Node::Rule(_)))
}

/// Keyframes bodies hold percentages, not selectors.
pub(crate) fn inside_keyframes(parents: &[&Node]) -> bool {
    parents.iter().any(|node| {
        matches!(node, Node::AtRule(at_rule) if css_keyframes::is_keyframes_at_rule(&at_rule.name))
    })
}

/// The single class or type selector of a rule such as `.btn` or `Button`.
pub(crate) fn simple_rule_target(rule: &Rule) -> Option<Selector> {
    let list = SelectorList::parse(&rule.selector).ok()?;
    match list.selectors.as_slice() {
        [complex] => match complex.as_simple() {
            Some(simple @ (Selector::Class(_) | Selector::Type(_))) => Some(simple.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Strips one pair of matching quotes.
pub(crate) fn unquote(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let quote = trimmed.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    trimmed
        .strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
}

/// `st-global(name)` → `(name, true)`; `name` → `(name, false)`.
pub(crate) fn parse_global_wrapper(text: &str) -> (String, bool) {
    let trimmed = text.trim();
    match trimmed
        .strip_prefix("st-global(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim().to_string(), true),
        None => (trimmed.to_string(), false),
    }
}
