//! First pass: analyzes a parsed stylesheet into a [`Meta`].
//!
//! The tree is walked once in document order. Every node is offered to the
//! features that registered interest in its kind; rule selectors are parsed
//! once here and their simple selectors dispatched one by one.

use std::path::Path;

use csstree::selector::{PseudoArgs, Selector, SelectorList};
use csstree::{Node, Rule, Stylesheet};

use crate::diagnostics::{DiagnosticType, Diagnostics};
use crate::error::Result;
use crate::features::st_global::GLOBAL_PSEUDO;
use crate::features::{AnalyzeContext, FEATURES, NodeInterest, SelectorNode, inside_keyframes};
use crate::meta::{Meta, ROOT_CLASS};
use crate::namespace::{NamespaceStrategy, PlainStrategy, namespace_from_path};
use crate::symbols::{ClassSymbol, Symbol};

pub mod diagnostics {
    use super::DiagnosticType;

    pub fn invalid_selector(selector: &str) -> DiagnosticType {
        DiagnosticType::warning("INVALID_SELECTOR", format!("cannot parse selector \"{selector}\""))
    }
}

/// Analyzes `ast` with the plain namespace strategy.
pub fn process(ast: Stylesheet, path: &Path) -> Result<Meta> {
    process_with(ast, path, None, &PlainStrategy)
}

/// Analyzes `ast`, appending to `diagnostics` when given.
///
/// Only the namespace strategy can fail; every problem in the stylesheet
/// itself is reported on `Meta::diagnostics`.
pub fn process_with(
    ast: Stylesheet,
    path: &Path,
    diagnostics: Option<Diagnostics>,
    strategy: &dyn NamespaceStrategy,
) -> Result<Meta> {
    let mut meta = Meta::new(path);
    if let Some(diagnostics) = diagnostics {
        meta.diagnostics = diagnostics;
    }
    meta.symbols.insert(Symbol::Class(ClassSymbol::new(ROOT_CLASS)));

    {
        let mut ctx = AnalyzeContext::new(&mut meta);
        for feature in FEATURES {
            (feature.analyze_init)(&mut ctx, &ast);
        }
        ast.walk(|node, parents| analyze_node(&mut ctx, node, parents));
        for feature in FEATURES {
            (feature.analyze_done)(&mut ctx);
        }
    }

    let declared = meta
        .declared_namespace
        .clone()
        .unwrap_or_else(|| namespace_from_path(path));
    meta.namespace = strategy.namespace(&declared, path, None)?;
    meta.source_ast = ast;

    log::debug!(
        "processed {} as {:?}: {} symbols, {} imports, {} diagnostics",
        path.display(),
        meta.namespace,
        meta.symbols.len(),
        meta.imports.len(),
        meta.diagnostics.len()
    );
    Ok(meta)
}

fn analyze_node(ctx: &mut AnalyzeContext<'_>, node: &Node, parents: &[&Node]) {
    match node {
        Node::AtRule(at_rule) => {
            for feature in FEATURES.iter().filter(|f| f.wants(NodeInterest::AT_RULE)) {
                (feature.analyze_at_rule)(ctx, at_rule, parents);
            }
        }
        Node::Rule(rule) => analyze_rule(ctx, rule, parents),
        Node::Decl(decl) => {
            for feature in FEATURES.iter().filter(|f| f.wants(NodeInterest::DECLARATION)) {
                (feature.analyze_declaration)(ctx, decl, parents);
            }
        }
        Node::Comment(_) => {}
    }
}

fn analyze_rule(ctx: &mut AnalyzeContext<'_>, rule: &Rule, parents: &[&Node]) {
    if inside_keyframes(parents) {
        return;
    }
    let selectors = match SelectorList::parse(&rule.selector) {
        Ok(list) => Some(list),
        Err(err) => {
            log::trace!("unparsable selector {:?}: {err}", rule.selector);
            ctx.report_word(diagnostics::invalid_selector(&rule.selector), rule, &rule.selector);
            None
        }
    };
    for feature in FEATURES.iter().filter(|f| f.wants(NodeInterest::RULE)) {
        (feature.analyze_rule)(ctx, rule, selectors.as_ref(), parents);
    }
    if let Some(list) = &selectors {
        dispatch_selectors(ctx, rule, list, false);
    }
}

fn dispatch_selectors(ctx: &mut AnalyzeContext<'_>, rule: &Rule, list: &SelectorList, in_global: bool) {
    let simples = list
        .selectors
        .iter()
        .flat_map(|complex| &complex.parts)
        .flat_map(|part| &part.compound.selectors);
    for simple in simples {
        let node = SelectorNode {
            rule,
            selector: simple,
            in_global,
        };
        for feature in FEATURES.iter().filter(|f| f.wants(NodeInterest::SELECTOR)) {
            (feature.analyze_selector_node)(ctx, &node);
        }
        if let Selector::PseudoClass(name, Some(PseudoArgs::Selectors(inner))) = simple {
            dispatch_selectors(ctx, rule, inner, in_global || name == GLOBAL_PSEUDO);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use csstree::parse_stylesheet;

    use super::*;
    use crate::symbols::SymbolKind;

    fn analyze(source: &str) -> Meta {
        let ast = parse_stylesheet(source).unwrap();
        process(ast, &PathBuf::from("/entry.st.css")).unwrap()
    }

    #[test]
    fn test_root_and_namespace_defaults() {
        let meta = analyze(".a {}");
        assert_eq!(meta.namespace, "entry");
        assert!(meta.root().is_some());
        assert_eq!(meta.symbols.get_main("a").map(Symbol::kind), Some(SymbolKind::Class));
    }

    #[test]
    fn test_declared_namespace() {
        let meta = analyze("@st-namespace \"comp\";\n.a {}");
        assert_eq!(meta.namespace, "comp");
        assert_eq!(meta.declared_namespace.as_deref(), Some("comp"));
    }

    #[test]
    fn test_global_classes_are_not_declared() {
        let meta = analyze(".a :global(.b) {}");
        assert!(meta.symbols.get_main("a").is_some());
        assert!(meta.symbols.get_main("b").is_none());
    }

    #[test]
    fn test_nested_pseudo_args_are_analyzed() {
        let meta = analyze(".a:not(.b) {}");
        assert!(meta.symbols.get_class("b").is_some());
    }

    #[test]
    fn test_keyframes_bodies_are_not_selectors() {
        let meta = analyze("@keyframes k { from {} 50% {} }");
        assert!(meta.symbols.get_main("from").is_none());
        assert!(meta.diagnostics.is_empty());
    }
}
