//! Second pass: rewrites the analyzed stylesheet into namespaced CSS and
//! computes its exports.
//!
//! Nested rules keep their relative (`&`) selectors; mixin output is placed
//! after the rule that applies it.

mod mixins;
mod selector;

use std::path::PathBuf;
use std::sync::Arc;

use csstree::selector::SelectorList;
use csstree::{AtRule, Declaration, Node, Rule, Stylesheet};

use crate::diagnostics::{Diagnostics, NodeRef};
use crate::error::Result;
use crate::features::css_keyframes::is_keyframes_at_rule;
use crate::features::st_mixin::is_mixin_prop;
use crate::features::{Action, FEATURES, TransformContext, st_scope};
use crate::meta::{Exports, Meta};
use crate::resolver::{CssResolve, StylableResolver};

pub struct TransformResult {
    /// Copy of the input meta with `output_ast`, `exports` and
    /// `transform_diagnostics` set.
    pub meta: Meta,
    pub exports: Exports,
}

pub struct Transformer {
    resolver: Arc<StylableResolver>,
}

impl Transformer {
    pub fn new(resolver: Arc<StylableResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<StylableResolver> {
        &self.resolver
    }

    /// Like [`Transformer::transform`], but fails when a stylesheet reachable
    /// through imports collides with another file's namespace.
    pub fn try_transform(&self, meta: &Arc<Meta>) -> Result<TransformResult> {
        self.resolver.check_dependencies(meta)?;
        Ok(self.transform(meta))
    }

    pub fn transform(&self, meta: &Arc<Meta>) -> TransformResult {
        log::debug!("transforming {} ({})", meta.path.display(), meta.namespace);
        let mut diagnostics = Diagnostics::new();
        let mut ctx = TransformContext::new(&self.resolver, meta, &mut diagnostics);
        for feature in FEATURES {
            (feature.transform_init)(&mut ctx);
        }

        let mut engine = Engine::default();
        let source = st_scope::expand_scopes(meta.source_ast.nodes.clone());
        let mut nodes = engine.transform_children(&mut ctx, source, None, false);
        nodes.append(&mut engine.hoisted);

        let mut exports = Exports::default();
        for feature in FEATURES {
            (feature.transform_exports)(&mut ctx, &mut exports);
        }

        let mut output = (**meta).clone();
        output.output_ast = Some(Stylesheet {
            nodes,
            input: meta.source_ast.input.clone(),
        });
        output.exports = Some(exports.clone());
        output.transform_diagnostics = Some(diagnostics);
        TransformResult {
            meta: output,
            exports,
        }
    }
}

/// Per-transform state shared across nested and mixin transforms.
#[derive(Default)]
pub(crate) struct Engine {
    /// Mixins being expanded, by defining file and name.
    mixin_stack: Vec<(PathBuf, String)>,
    /// `@keyframes` lifted out of script mixins.
    hoisted: Vec<Node>,
}

impl Engine {
    pub(crate) fn transform_children(
        &mut self,
        ctx: &mut TransformContext<'_>,
        nodes: Vec<Node>,
        parent_chain: Option<&[CssResolve]>,
        in_keyframes: bool,
    ) -> Vec<Node> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Rule(rule) => out.extend(self.transform_rule(ctx, rule, parent_chain, in_keyframes)),
                Node::AtRule(at_rule) => {
                    out.extend(self.transform_at_rule(ctx, at_rule, parent_chain, in_keyframes))
                }
                Node::Decl(decl) => out.extend(transform_declaration(ctx, decl).map(Node::Decl)),
                Node::Comment(_) => out.push(node),
            }
        }
        out
    }

    fn transform_rule(
        &mut self,
        ctx: &mut TransformContext<'_>,
        rule: Rule,
        parent_chain: Option<&[CssResolve]>,
        in_keyframes: bool,
    ) -> Vec<Node> {
        for feature in FEATURES {
            if (feature.transform_rule)(ctx, &rule) == Action::Remove {
                return Vec::new();
            }
        }
        let node = NodeRef::from(&rule);
        let scoped = match SelectorList::parse(&rule.selector) {
            Ok(list) if !in_keyframes => Some(selector::scope_selector_list(ctx, &list, parent_chain, node)),
            _ => None,
        };
        let (selector, host, chain) = match scoped {
            Some(scoped) => (scoped.list.to_string(), Some(scoped.list), scoped.chain),
            None => (rule.selector.clone(), None, None),
        };
        log::trace!("rule {:?} -> {:?}", rule.selector, selector);

        let mut body = Vec::with_capacity(rule.nodes.len());
        let mut after = Vec::new();
        for child in rule.nodes {
            match child {
                Node::Decl(decl) if is_mixin_prop(&decl.prop) && !in_keyframes => {
                    let expansion = self.expand_mixins(ctx, &decl, host.as_ref(), chain.as_deref());
                    body.extend(expansion.decls);
                    after.extend(expansion.rules);
                }
                Node::Decl(decl) => body.extend(transform_declaration(ctx, decl).map(Node::Decl)),
                Node::Rule(nested) => {
                    body.extend(self.transform_rule(ctx, nested, chain.as_deref(), in_keyframes))
                }
                Node::AtRule(at_rule) => {
                    body.extend(self.transform_at_rule(ctx, at_rule, chain.as_deref(), in_keyframes))
                }
                Node::Comment(_) => body.push(child),
            }
        }

        let mut out = vec![Node::Rule(Rule {
            selector,
            nodes: body,
            span: rule.span,
        })];
        out.append(&mut after);
        out
    }

    fn transform_at_rule(
        &mut self,
        ctx: &mut TransformContext<'_>,
        mut at_rule: AtRule,
        parent_chain: Option<&[CssResolve]>,
        in_keyframes: bool,
    ) -> Vec<Node> {
        let keyframes = is_keyframes_at_rule(&at_rule.name);
        for feature in FEATURES {
            if (feature.transform_at_rule)(ctx, &mut at_rule) == Action::Remove {
                return Vec::new();
            }
        }
        if let Some(children) = at_rule.nodes.take() {
            at_rule.nodes = Some(self.transform_children(
                ctx,
                children,
                parent_chain,
                in_keyframes || keyframes,
            ));
        }
        vec![Node::AtRule(at_rule)]
    }
}

/// Runs the declaration hooks in feature order; `None` when a feature
/// removed the declaration.
fn transform_declaration(ctx: &mut TransformContext<'_>, mut decl: Declaration) -> Option<Declaration> {
    for feature in FEATURES {
        if (feature.transform_declaration)(ctx, &mut decl) == Action::Remove {
            return None;
        }
    }
    Some(decl)
}
