//! Mixin expansion.
//!
//! CSS mixins are the rules of a class (`.m`, `.m:hover`, `.m .x`, also
//! inside at-rules) with `.m` replaced by `&`. They are transformed in the
//! stylesheet that defines them, with any `name value` arguments overriding
//! that stylesheet's vars. Script mixins return a [`MixinTree`] that is
//! transformed in the host stylesheet.
//!
//! The transformed output is merged into the host rule: declarations of
//! `&` blocks replace the mixin declaration, every other block becomes a
//! sibling rule after the host.

use std::path::PathBuf;
use std::sync::Arc;

use csstree::selector::{Selector, SelectorList, nest_selectors};
use csstree::value::{ValueNode, parse_value, split_by_comma, stringify, trim_nodes};
use csstree::{AtRule, Declaration, Node, Rule};
use indexmap::IndexMap;

use super::Engine;
use crate::diagnostics::{Diagnostics, NodeRef};
use crate::evaluator::{VALUE_FUNCTION, ValueEvaluator};
use crate::features::css_custom_property::scope_value;
use crate::features::css_keyframes::is_keyframes_at_rule;
use crate::features::st_mixin::{
    MixinCall, PARTIAL_MIXIN_PROP, diagnostics, parse_mixin_calls, split_override,
};
use crate::features::{TransformContext, parse_global_wrapper, st_scope, unquote};
use crate::meta::Meta;
use crate::resolver::script::{MixinFn, MixinTree, MixinValue, ScriptExport, call_mixin};
use crate::resolver::{CssResolve, Resolved};
use crate::symbols::{Symbol, SymbolNamespace};

const NESTING_SELECTOR: &str = "&";

#[derive(Debug, Default)]
pub(super) struct MixinExpansion {
    /// Replace the mixin declaration.
    pub decls: Vec<Node>,
    /// Placed after the host rule.
    pub rules: Vec<Node>,
}

enum MixinTarget {
    Css { meta: Arc<Meta>, class: String },
    Script { path: PathBuf, name: String, mixin: MixinFn },
}

impl Engine {
    pub(super) fn expand_mixins(
        &mut self,
        ctx: &mut TransformContext<'_>,
        decl: &Declaration,
        host: Option<&SelectorList>,
        host_chain: Option<&[CssResolve]>,
    ) -> MixinExpansion {
        let mut expansion = MixinExpansion::default();
        // Reported during analysis.
        let Ok(calls) = parse_mixin_calls(&decl.value) else {
            return expansion;
        };
        let partial = decl.prop == PARTIAL_MIXIN_PROP;
        let node = NodeRef::from(decl);
        for call in &calls {
            let output = match resolve_mixin(ctx, &call.name) {
                Some(MixinTarget::Css { meta, class }) => {
                    self.apply_css_mixin(ctx, call, meta, &class, partial, node)
                }
                Some(MixinTarget::Script { path, name, mixin }) => {
                    self.apply_script_mixin(ctx, call, (path, name), &mixin, host_chain, node)
                }
                None => {
                    ctx.report_word(diagnostics::unknown_mixin(&call.name), node, &call.name);
                    continue;
                }
            };
            merge_output(host, output, &mut expansion);
        }
        expansion
    }

    fn apply_css_mixin(
        &mut self,
        ctx: &mut TransformContext<'_>,
        call: &MixinCall,
        meta: Arc<Meta>,
        class: &str,
        partial: bool,
        node: NodeRef,
    ) -> Vec<Node> {
        let key = (meta.path.clone(), class.to_string());
        if self.mixin_stack.contains(&key) {
            ctx.report_word(diagnostics::circular_mixin(&call.name), node, &call.name);
            return Vec::new();
        }
        let overrides = mixin_overrides(ctx, &call.args, node);
        if partial && overrides.is_empty() {
            return Vec::new();
        }

        let source = st_scope::expand_scopes(meta.source_ast.nodes.clone());
        let mut nodes = collect_mixin_rules(&source, class);
        if partial {
            nodes = filter_partial(nodes, &overrides);
        }
        log::trace!(
            "applying mixin {} from {} ({} blocks)",
            call.name,
            meta.path.display(),
            nodes.len()
        );

        let resolver = ctx.resolver;
        let chain = resolver.resolve_class_chain(&meta, class).chain;
        let mut scratch = Diagnostics::new();
        self.mixin_stack.push(key);
        let output = {
            let mut mixin_ctx = TransformContext {
                resolver,
                meta: &meta,
                diagnostics: &mut scratch,
                overrides: Some(&overrides),
            };
            self.transform_children(&mut mixin_ctx, nodes, Some(chain.as_slice()), false)
        };
        self.mixin_stack.pop();

        // Problems inside the mixin belong to its own stylesheet, but a
        // cycle only shows up from the applying side.
        if scratch.iter().any(|d| d.code == "CIRCULAR_MIXIN") {
            ctx.report_word(diagnostics::circular_mixin(&call.name), node, &call.name);
        }
        output
    }

    fn apply_script_mixin(
        &mut self,
        ctx: &mut TransformContext<'_>,
        call: &MixinCall,
        key: (PathBuf, String),
        mixin: &MixinFn,
        host_chain: Option<&[CssResolve]>,
        node: NodeRef,
    ) -> Vec<Node> {
        if self.mixin_stack.contains(&key) {
            ctx.report_word(diagnostics::circular_mixin(&call.name), node, &call.name);
            return Vec::new();
        }
        let args: Vec<String> = {
            let evaluator = ValueEvaluator::new(ctx.resolver, ctx.meta, ctx.overrides);
            call.args
                .iter()
                .map(|arg| {
                    let value = evaluator.evaluate_declaration(arg, ctx.diagnostics, node);
                    unquote(&value).map(str::to_string).unwrap_or(value)
                })
                .collect()
        };
        let tree = match call_mixin(mixin, &args) {
            Ok(tree) => tree,
            Err(message) => {
                ctx.report_word(diagnostics::script_mixin_failed(&call.name, &message), node, &call.name);
                return Vec::new();
            }
        };

        let mut nodes = Vec::new();
        for tree_node in tree_to_nodes(&tree, node) {
            match tree_node {
                Node::AtRule(at_rule) if is_keyframes_at_rule(&at_rule.name) => {
                    self.hoist_keyframes(ctx.meta, at_rule)
                }
                other => nodes.push(other),
            }
        }
        let mut host = Rule::new(NESTING_SELECTOR, nodes);
        host.span = node.span;

        self.mixin_stack.push(key);
        let output = self.transform_children(ctx, vec![Node::Rule(host)], host_chain, false);
        self.mixin_stack.pop();
        output
    }

    /// Lifts `@keyframes` to the stylesheet root. A name the stylesheet
    /// already defines keeps the stylesheet's keyframes.
    fn hoist_keyframes(&mut self, meta: &Meta, mut at_rule: AtRule) {
        let (name, global) = parse_global_wrapper(&at_rule.params);
        if global {
            at_rule.params = name;
        } else if meta.symbols.contains(SymbolNamespace::Keyframes, &name) {
            log::trace!("mixin keyframes {name} shadowed by {}", meta.path.display());
            return;
        } else {
            at_rule.params = meta.scoped_class(&name);
        }
        let duplicate = self.hoisted.iter().any(|hoisted| {
            matches!(hoisted, Node::AtRule(existing) if existing.params == at_rule.params)
        });
        if !duplicate {
            self.hoisted.push(Node::AtRule(at_rule));
        }
    }
}

fn resolve_mixin(ctx: &TransformContext<'_>, name: &str) -> Option<MixinTarget> {
    let symbol = ctx.meta.symbols.get_main(name)?;
    match symbol {
        Symbol::Class(class) if class.alias.is_none() => Some(MixinTarget::Css {
            meta: ctx.meta.clone(),
            class: class.name.clone(),
        }),
        Symbol::Class(_) | Symbol::Import(_) => match ctx.resolver.deep_resolve(ctx.meta, symbol).ok()? {
            Resolved::Css(CssResolve {
                meta,
                symbol: Symbol::Class(class),
            }) => Some(MixinTarget::Css {
                meta,
                class: class.name,
            }),
            Resolved::Script {
                path,
                export_name,
                export: ScriptExport::Mixin(mixin),
            } => Some(MixinTarget::Script {
                path,
                name: export_name,
                mixin,
            }),
            _ => None,
        },
        _ => None,
    }
}

/// `name value` overrides, evaluated in the applying stylesheet.
fn mixin_overrides(ctx: &mut TransformContext<'_>, args: &[String], node: NodeRef) -> IndexMap<String, String> {
    let mut overrides = IndexMap::new();
    let evaluator = ValueEvaluator::new(ctx.resolver, ctx.meta, ctx.overrides);
    for arg in args {
        let Some((name, value)) = split_override(arg) else {
            ctx.diagnostics
                .report_word(diagnostics::invalid_mixin_override(arg), node, arg);
            continue;
        };
        let scoped = scope_value(ctx.resolver, ctx.meta, value);
        let value = evaluator.evaluate_declaration(&scoped, ctx.diagnostics, node);
        overrides.insert(name.to_string(), value);
    }
    overrides
}

/// `.m .x` → `& .x` for every selector starting with `.m`; `None` when no
/// selector of the list applies.
fn mixin_selector(selector: &str, class: &str) -> Option<String> {
    let list = SelectorList::parse(selector).ok()?;
    let applied: Vec<_> = list
        .selectors
        .into_iter()
        .filter_map(|mut complex| {
            let first = complex.parts.first_mut()?.compound.selectors.first_mut()?;
            if !matches!(first, Selector::Class(name) if name == class) {
                return None;
            }
            *first = Selector::Parent;
            Some(complex)
        })
        .collect();
    (!applied.is_empty()).then(|| SelectorList::new(applied).to_string())
}

fn collect_mixin_rules(nodes: &[Node], class: &str) -> Vec<Node> {
    let mut out = Vec::new();
    for node in nodes {
        match node {
            Node::Rule(rule) => {
                if let Some(selector) = mixin_selector(&rule.selector, class) {
                    let mut applied = rule.clone();
                    applied.selector = selector;
                    out.push(Node::Rule(applied));
                }
            }
            Node::AtRule(at_rule) if !is_keyframes_at_rule(&at_rule.name) => {
                let Some(children) = &at_rule.nodes else {
                    continue;
                };
                let collected = collect_mixin_rules(children, class);
                if !collected.is_empty() {
                    let mut applied = at_rule.clone();
                    applied.nodes = Some(collected);
                    out.push(Node::AtRule(applied));
                }
            }
            _ => {}
        }
    }
    out
}

fn references_override(nodes: &[ValueNode], overrides: &IndexMap<String, String>) -> bool {
    nodes.iter().any(|node| match node {
        ValueNode::Function { name, nodes } if name == VALUE_FUNCTION => split_by_comma(nodes)
            .first()
            .is_some_and(|first| overrides.contains_key(&stringify(trim_nodes(first)))),
        ValueNode::Function { nodes, .. } => references_override(nodes, overrides),
        _ => false,
    })
}

/// Keeps the declarations that use an overridden var, and the blocks that
/// still hold any.
fn filter_partial(nodes: Vec<Node>, overrides: &IndexMap<String, String>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Decl(decl) => references_override(&parse_value(&decl.value), overrides)
                .then_some(Node::Decl(decl)),
            Node::Rule(mut rule) => {
                rule.nodes = filter_partial(rule.nodes, overrides);
                (!rule.nodes.is_empty()).then_some(Node::Rule(rule))
            }
            Node::AtRule(mut at_rule) => {
                let children = filter_partial(at_rule.nodes.take()?, overrides);
                at_rule.nodes = Some(children);
                at_rule
                    .nodes
                    .as_ref()
                    .is_some_and(|n| !n.is_empty())
                    .then_some(Node::AtRule(at_rule))
            }
            Node::Comment(_) => None,
        })
        .collect()
}

/// Converts a script mixin tree into CSS nodes attributed to `node`.
fn tree_to_nodes(tree: &MixinTree, node: NodeRef) -> Vec<Node> {
    tree.entries
        .iter()
        .map(|(key, value)| match value {
            MixinValue::Value(value) => {
                Node::Decl(Declaration::new(key.clone(), value.clone()).with_span(node.span))
            }
            MixinValue::Block(block) => {
                let children = tree_to_nodes(block, node);
                match key.strip_prefix('@') {
                    Some(prelude) => {
                        let (name, params) = prelude.split_once(char::is_whitespace).unwrap_or((prelude, ""));
                        let mut at_rule = AtRule::new(name, params.trim()).with_nodes(children);
                        at_rule.span = node.span;
                        Node::AtRule(at_rule)
                    }
                    None => {
                        let mut rule = Rule::new(key.clone(), children);
                        rule.span = node.span;
                        Node::Rule(rule)
                    }
                }
            }
        })
        .collect()
}

fn nest_under(host: Option<&SelectorList>, selector: &str) -> String {
    let Some(host) = host else {
        return selector.to_string();
    };
    match SelectorList::parse(selector) {
        Ok(list) => nest_selectors(host, &list).to_string(),
        Err(_) => format!("{host} {}", selector.trim()),
    }
}

/// Merges transformed mixin output into the host rule.
fn merge_output(host: Option<&SelectorList>, output: Vec<Node>, expansion: &mut MixinExpansion) {
    for node in output {
        match node {
            Node::Rule(rule) if rule.selector.trim() == NESTING_SELECTOR => {
                for child in rule.nodes {
                    match child {
                        Node::Decl(_) => expansion.decls.push(child),
                        Node::Comment(_) => {}
                        nested => merge_output(host, vec![nested], expansion),
                    }
                }
            }
            Node::Rule(mut rule) => {
                rule.selector = nest_under(host, &rule.selector);
                let Ok(parent) = SelectorList::parse(&rule.selector) else {
                    expansion.rules.push(Node::Rule(rule));
                    continue;
                };
                let (own, nested): (Vec<Node>, Vec<Node>) = std::mem::take(&mut rule.nodes)
                    .into_iter()
                    .partition(|child| matches!(child, Node::Decl(_) | Node::Comment(_)));
                let mut inner = MixinExpansion::default();
                merge_output(Some(&parent), nested, &mut inner);
                rule.nodes = own;
                rule.nodes.append(&mut inner.decls);
                if !rule.nodes.is_empty() || inner.rules.is_empty() {
                    expansion.rules.push(Node::Rule(rule));
                }
                expansion.rules.append(&mut inner.rules);
            }
            Node::AtRule(mut at_rule) => {
                if let Some(children) = at_rule.nodes.take() {
                    at_rule.nodes = Some(merge_at_rule_children(host, children));
                }
                expansion.rules.push(Node::AtRule(at_rule));
            }
            Node::Decl(_) => expansion.decls.push(node),
            Node::Comment(_) => {}
        }
    }
}

/// Inside an at-rule, loose declarations are wrapped in a host rule.
fn merge_at_rule_children(host: Option<&SelectorList>, children: Vec<Node>) -> Vec<Node> {
    let mut inner = MixinExpansion::default();
    merge_output(host, children, &mut inner);
    let mut nodes = Vec::with_capacity(inner.rules.len() + 1);
    if !inner.decls.is_empty() {
        let selector = host.map_or_else(|| NESTING_SELECTOR.to_string(), ToString::to_string);
        nodes.push(Node::Rule(Rule::new(selector, inner.decls)));
    }
    nodes.extend(inner.rules);
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixin_selector() {
        assert_eq!(mixin_selector(".m", "m").as_deref(), Some("&"));
        assert_eq!(mixin_selector(".m:hover .x", "m").as_deref(), Some("&:hover .x"));
        assert_eq!(mixin_selector(".a, .m", "m").as_deref(), Some("&"));
        assert_eq!(mixin_selector(".a .m", "m"), None);
    }

    #[test]
    fn test_merge_places_blocks_after_host() {
        let host = SelectorList::parse(".ns__container").unwrap();
        let output = vec![Node::Rule(Rule::new(
            "&",
            vec![
                Node::Decl(Declaration::new("color", "red")),
                Node::Rule(Rule::new(".ns__x", vec![])),
                Node::Rule(Rule::new("&:hover", vec![])),
            ],
        ))];
        let mut expansion = MixinExpansion::default();
        merge_output(Some(&host), output, &mut expansion);
        assert_eq!(expansion.decls.len(), 1);
        let selectors: Vec<_> = expansion
            .rules
            .iter()
            .map(|node| match node {
                Node::Rule(rule) => rule.selector.clone(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(selectors, vec![".ns__container .ns__x", ".ns__container:hover"]);
    }

    #[test]
    fn test_merge_flattens_deep_blocks() {
        let host = SelectorList::parse(".ns__a").unwrap();
        let output = vec![Node::Rule(Rule::new(
            "&",
            vec![Node::Rule(Rule::new(
                ".ns__x",
                vec![
                    Node::Decl(Declaration::new("color", "green")),
                    Node::Rule(Rule::new(
                        "&:hover",
                        vec![Node::Decl(Declaration::new("color", "gold"))],
                    )),
                ],
            ))],
        ))];
        let mut expansion = MixinExpansion::default();
        merge_output(Some(&host), output, &mut expansion);
        let rules: Vec<_> = expansion
            .rules
            .iter()
            .map(|node| match node {
                Node::Rule(rule) => (rule.selector.clone(), rule.nodes.len()),
                _ => (String::new(), 0),
            })
            .collect();
        assert_eq!(
            rules,
            vec![
                (".ns__a .ns__x".to_string(), 1),
                (".ns__a .ns__x:hover".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_partial_filter() {
        let overrides = IndexMap::from([("color".to_string(), "red".to_string())]);
        let nodes = vec![Node::Rule(Rule::new(
            "&",
            vec![
                Node::Decl(Declaration::new("color", "value(color)")),
                Node::Decl(Declaration::new("size", "value(size)")),
            ],
        ))];
        let filtered = filter_partial(nodes, &overrides);
        let Node::Rule(rule) = &filtered[0] else { panic!("expected rule") };
        assert_eq!(rule.nodes.len(), 1);
    }
}
