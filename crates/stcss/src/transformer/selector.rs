//! Selector scoping.
//!
//! Walks a parsed selector compound by compound. Each class or component
//! contributes its emitted selector and an extends chain; pseudo-classes
//! and pseudo-elements that follow are resolved against that chain.

use std::mem;

use csstree::selector::{
    Combinator, ComplexSelector, CompoundSelector, PseudoArgs, Selector, SelectorList, SelectorPart,
};

use crate::diagnostics::NodeRef;
use crate::evaluator::ValueEvaluator;
use crate::features::css_class::emitted_class;
use crate::features::css_pseudo_class::{self, find_state, is_native_pseudo_class, state_selectors};
use crate::features::css_pseudo_element::{self, find_part, is_native_pseudo_element};
use crate::features::css_type::{emitted_element, is_component_name};
use crate::features::st_global::global_selectors;
use crate::features::TransformContext;
use crate::resolver::CssResolve;

/// Pseudo-classes whose arguments are selectors scoped like the outer one.
const NESTED_SELECTOR_PSEUDOS: &[&str] = &["not", "is", "where", "has", "matches"];

/// A scoped selector list and the extends chain of the first selector's
/// last compound, used to resolve `&` in nested rules.
pub(crate) struct ScopedSelector {
    pub list: SelectorList,
    pub chain: Option<Vec<CssResolve>>,
}

pub(crate) fn scope_selector_list(
    ctx: &mut TransformContext<'_>,
    list: &SelectorList,
    parent_chain: Option<&[CssResolve]>,
    node: NodeRef,
) -> ScopedSelector {
    let mut chain = None;
    let mut selectors = Vec::with_capacity(list.selectors.len());
    for (index, complex) in list.selectors.iter().enumerate() {
        let mut builder = ComplexBuilder::new(parent_chain);
        for part in &complex.parts {
            builder.scope_part(ctx, part, node);
        }
        let (scoped, last_chain) = builder.finish();
        if index == 0 {
            chain = last_chain;
        }
        selectors.push(scoped);
    }
    ScopedSelector {
        list: SelectorList::new(selectors),
        chain,
    }
}

struct ComplexBuilder<'p> {
    parent_chain: Option<&'p [CssResolve]>,
    parts: Vec<SelectorPart>,
    current: Vec<Selector>,
    chain: Option<Vec<CssResolve>>,
}

impl<'p> ComplexBuilder<'p> {
    fn new(parent_chain: Option<&'p [CssResolve]>) -> Self {
        Self {
            parent_chain,
            parts: Vec::new(),
            current: Vec::new(),
            chain: None,
        }
    }

    fn finish(self) -> (ComplexSelector, Option<Vec<CssResolve>>) {
        (ComplexSelector::new(self.parts), self.chain)
    }

    /// Appends an emitted selector to the compound being built. Leading
    /// parts of a complex replacement close the current compound.
    fn splice(&mut self, emitted: &ComplexSelector) {
        let Some((last, leading)) = emitted.parts.split_last() else {
            return;
        };
        for part in leading {
            self.current.extend(part.compound.selectors.iter().cloned());
            self.close(part.combinator);
        }
        self.current.extend(last.compound.selectors.iter().cloned());
    }

    fn close(&mut self, combinator: Combinator) {
        let compound = CompoundSelector::new(mem::take(&mut self.current));
        self.parts.push(SelectorPart::new(compound, combinator));
    }

    fn set_chain(&mut self, chain: Vec<CssResolve>) {
        self.chain = (!chain.is_empty()).then_some(chain);
    }

    fn scope_part(&mut self, ctx: &mut TransformContext<'_>, part: &SelectorPart, node: NodeRef) {
        self.chain = None;
        for simple in &part.compound.selectors {
            self.scope_simple(ctx, simple, node);
        }
        self.close(part.combinator);
    }

    fn scope_simple(&mut self, ctx: &mut TransformContext<'_>, simple: &Selector, node: NodeRef) {
        let (resolver, meta) = (ctx.resolver, ctx.meta);
        match simple {
            Selector::Class(name) => {
                self.splice(&emitted_class(resolver, meta, name));
                self.set_chain(resolver.resolve_class_chain(meta, name).chain);
            }
            Selector::Type(name) if is_component_name(name) => {
                match emitted_element(resolver, meta, name) {
                    Some(emitted) => self.splice(&emitted),
                    None => self.current.push(simple.clone()),
                }
                self.set_chain(resolver.resolve_element_chain(meta, name).chain);
            }
            Selector::Parent => {
                self.current.push(Selector::Parent);
                self.chain = self.parent_chain.map(<[CssResolve]>::to_vec);
            }
            Selector::PseudoClass(name, args) => {
                if let Some(list) = global_selectors(simple) {
                    if let Some(first) = list.selectors.first() {
                        self.splice(first);
                    }
                    self.chain = None;
                } else if let (true, Some(PseudoArgs::Selectors(list))) =
                    (NESTED_SELECTOR_PSEUDOS.contains(&name.as_str()), args)
                {
                    let scoped = scope_selector_list(ctx, list, self.parent_chain, node);
                    self.current.push(Selector::PseudoClass(
                        name.clone(),
                        Some(PseudoArgs::Selectors(scoped.list)),
                    ));
                } else {
                    self.scope_pseudo_class(ctx, simple, name, args.as_ref(), node);
                }
            }
            Selector::PseudoElement(name, _) => self.scope_pseudo_element(ctx, simple, name, node),
            other => self.current.push(other.clone()),
        }
    }

    fn scope_pseudo_class(
        &mut self,
        ctx: &mut TransformContext<'_>,
        simple: &Selector,
        name: &str,
        args: Option<&PseudoArgs>,
        node: NodeRef,
    ) {
        let state = self
            .chain
            .as_deref()
            .and_then(|chain| find_state(chain, name))
            .map(|(entry, def)| (entry.meta.namespace.clone(), def.clone()));
        let Some((namespace, def)) = state else {
            if !is_native_pseudo_class(name) {
                ctx.report_word(css_pseudo_class::diagnostics::unknown_pseudo_class(name), node, name);
            }
            self.current.push(simple.clone());
            return;
        };
        let arg = args.map(|args| match args {
            PseudoArgs::Raw(raw) => raw.clone(),
            PseudoArgs::Selectors(list) => list.to_string(),
        });
        let arg = arg.map(|arg| {
            if arg.contains('(') {
                let evaluator = ValueEvaluator::new(ctx.resolver, ctx.meta, ctx.overrides);
                evaluator.evaluate_declaration(&arg, ctx.diagnostics, node)
            } else {
                arg
            }
        });
        let mut reports = Vec::new();
        let selectors = state_selectors(&namespace, name, &def, arg.as_deref(), &mut |kind| {
            reports.push(kind)
        });
        for kind in reports {
            ctx.report_word(kind, node, name);
        }
        self.current.extend(selectors);
    }

    fn scope_pseudo_element(
        &mut self,
        ctx: &mut TransformContext<'_>,
        simple: &Selector,
        name: &str,
        node: NodeRef,
    ) {
        let part = self.chain.as_deref().and_then(|chain| find_part(chain, name));
        let Some(part) = part else {
            if !is_native_pseudo_element(name) {
                ctx.report_word(
                    css_pseudo_element::diagnostics::unknown_pseudo_element(name),
                    node,
                    name,
                );
            }
            self.current.push(simple.clone());
            return;
        };
        let resolver = ctx.resolver;
        self.close(Combinator::Descendant);
        self.splice(&emitted_class(resolver, &part.meta, name));
        self.set_chain(resolver.resolve_class_chain(&part.meta, name).chain);
    }
}
