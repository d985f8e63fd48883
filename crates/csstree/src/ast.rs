//! Stylesheet tree data structures.
//!
//! The tree is deliberately small: a stylesheet is an ordered list of
//! [`Node`]s, where rules and block at-rules own their children. Every node
//! remembers the byte range it was parsed from so that tooling built on top
//! (diagnostics, editors) can point back to the source.

use std::path::PathBuf;
use std::sync::Arc;

/// A byte range in the original source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns true when the span does not point at any source text
    /// (nodes synthesized by a transformation).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The source a stylesheet was parsed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub path: Option<PathBuf>,
    pub text: String,
}

/// Kind tag for a [`Node`], used when a node is referenced without borrowing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Rule,
    AtRule,
    Declaration,
    Comment,
}

/// A CSS rule: `selector { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub selector: String,
    pub nodes: Vec<Node>,
    pub span: Span,
}

impl Rule {
    pub fn new(selector: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            selector: selector.into(),
            nodes,
            span: Span::default(),
        }
    }

    /// Iterates over the declarations directly inside this rule.
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.nodes.iter().filter_map(|node| match node {
            Node::Decl(decl) => Some(decl),
            _ => None,
        })
    }
}

/// An at-rule: `@name params;` or `@name params { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct AtRule {
    pub name: String,
    pub params: String,
    /// `None` for statement at-rules terminated by `;`.
    pub nodes: Option<Vec<Node>>,
    pub span: Span,
}

impl AtRule {
    pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            nodes: None,
            span: Span::default(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = Some(nodes);
        self
    }
}

/// A property-value pair like `color: red`.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    pub prop: String,
    pub value: String,
    pub important: bool,
    pub span: Span,
}

impl Declaration {
    pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            value: value.into(),
            important: false,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A `/* ... */` comment (text without the delimiters).
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Decl(Declaration),
    Comment(Comment),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Rule(rule) => rule.span,
            Node::AtRule(at_rule) => at_rule.span,
            Node::Decl(decl) => decl.span,
            Node::Comment(comment) => comment.span,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Rule(_) => NodeKind::Rule,
            Node::AtRule(_) => NodeKind::AtRule,
            Node::Decl(_) => NodeKind::Declaration,
            Node::Comment(_) => NodeKind::Comment,
        }
    }

    /// Child nodes for rules and block at-rules.
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Rule(rule) => Some(&rule.nodes),
            Node::AtRule(at_rule) => at_rule.nodes.as_deref(),
            _ => None,
        }
    }

    /// Overwrites the span of this node and all of its descendants.
    ///
    /// Used when nodes are synthesized from another source (mixins) and
    /// must be attributed to the node that produced them.
    pub fn set_span_deep(&mut self, span: Span) {
        match self {
            Node::Rule(rule) => {
                rule.span = span;
                rule.nodes.iter_mut().for_each(|n| n.set_span_deep(span));
            }
            Node::AtRule(at_rule) => {
                at_rule.span = span;
                if let Some(nodes) = &mut at_rule.nodes {
                    nodes.iter_mut().for_each(|n| n.set_span_deep(span));
                }
            }
            Node::Decl(decl) => decl.span = span,
            Node::Comment(comment) => comment.span = span,
        }
    }
}

/// A parsed stylesheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<Node>,
    pub input: Option<Arc<Input>>,
}

impl Stylesheet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes, input: None }
    }

    /// Visits every node depth-first in document order.
    ///
    /// The callback receives the node and the chain of its ancestors
    /// (outermost first).
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&'a Node, &[&'a Node]),
    {
        let mut ancestors = Vec::new();
        walk_nodes(&self.nodes, &mut ancestors, &mut visit);
    }

    /// Iterates over all rules, including nested ones, in document order.
    pub fn rules(&self) -> Vec<&Rule> {
        let mut rules = Vec::new();
        self.walk(|node, _| {
            if let Node::Rule(rule) = node {
                rules.push(rule);
            }
        });
        rules
    }
}

fn walk_nodes<'a, F>(nodes: &'a [Node], ancestors: &mut Vec<&'a Node>, visit: &mut F)
where
    F: FnMut(&'a Node, &[&'a Node]),
{
    for node in nodes {
        visit(node, ancestors);
        if let Some(children) = node.children() {
            ancestors.push(node);
            walk_nodes(children, ancestors, visit);
            ancestors.pop();
        }
    }
}
