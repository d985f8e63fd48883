//! Diagnostics collected while processing and transforming stylesheets.
//!
//! Diagnostics never abort processing. Each one carries a severity, a stable
//! code, a message, the node it is attached to and optionally the offending
//! word within that node.

use std::fmt;

use csstree::{AtRule, Declaration, Node, NodeKind, Position, Rule, Span, position_at};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic kind produced by a factory function: code, severity and the
/// rendered message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticType {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl DiagnosticType {
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn info(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

/// A reference to a source node by kind and span.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub kind: NodeKind,
    pub span: Span,
}

impl NodeRef {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn root() -> Self {
        Self::new(NodeKind::Root, Span::default())
    }
}

impl From<&Node> for NodeRef {
    fn from(node: &Node) -> Self {
        NodeRef::new(node.kind(), node.span())
    }
}

impl From<&Rule> for NodeRef {
    fn from(rule: &Rule) -> Self {
        NodeRef::new(NodeKind::Rule, rule.span)
    }
}

impl From<&AtRule> for NodeRef {
    fn from(at_rule: &AtRule) -> Self {
        NodeRef::new(NodeKind::AtRule, at_rule.span)
    }
}

impl From<&Declaration> for NodeRef {
    fn from(decl: &Declaration) -> Self {
        NodeRef::new(NodeKind::Declaration, decl.span)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub node: NodeRef,
    pub word: Option<String>,
}

impl Diagnostic {
    /// Line/column of the reported node (or of `word` inside it when it can
    /// be found) within `source`.
    pub fn location(&self, source: &str) -> Position {
        let span = self.node.span;
        let offset = self
            .word
            .as_deref()
            .and_then(|word| {
                source
                    .get(span.start..span.end)
                    .and_then(|text| text.find(word))
            })
            .map_or(span.start, |found| span.start + found);
        position_at(source, offset)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.severity, self.message, self.code)
    }
}

/// An ordered collection of reports.
///
/// Identical reports (same code, node and word) are recorded once; the
/// transformer may visit a node more than once while expanding scopes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub reports: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>) {
        self.push(kind, node.into(), None);
    }

    pub fn report_word(&mut self, kind: DiagnosticType, node: impl Into<NodeRef>, word: &str) {
        self.push(kind, node.into(), Some(word.to_string()));
    }

    fn push(&mut self, kind: DiagnosticType, node: NodeRef, word: Option<String>) {
        let duplicate = self
            .reports
            .iter()
            .any(|d| d.code == kind.code && d.node == node && d.word == word && d.message == kind.message);
        if duplicate {
            return;
        }
        log::debug!("{} [{}] {}", kind.severity, kind.code, kind.message);
        self.reports.push(Diagnostic {
            severity: kind.severity,
            code: kind.code,
            message: kind.message,
            node,
            word,
        });
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for d in other.reports {
            let kind = DiagnosticType {
                code: d.code,
                severity: d.severity,
                message: d.message,
            };
            self.push(kind, d.node, d.word);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports.iter().filter(|d| d.severity == severity).count()
    }

    /// Codes of all reports, in report order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.reports.iter().map(|d| d.code).collect()
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.reports.iter().filter(move |d| d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_reports_are_dropped() {
        let mut diagnostics = Diagnostics::new();
        let node = NodeRef::new(NodeKind::Rule, Span::new(0, 4));
        diagnostics.report(DiagnosticType::warning("X", "x"), node);
        diagnostics.report(DiagnosticType::warning("X", "x"), node);
        diagnostics.report_word(DiagnosticType::warning("X", "x"), node, "a");
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_location_finds_word() {
        let source = ".a {\n  color: value(x);\n}";
        let mut diagnostics = Diagnostics::new();
        let node = NodeRef::new(NodeKind::Declaration, Span::new(7, 22));
        diagnostics.report_word(DiagnosticType::error("E", "e"), node, "x");
        let location = diagnostics.reports[0].location(source);
        assert_eq!(location, Position { line: 2, column: 16 });
    }

    #[test]
    fn test_has_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(DiagnosticType::info("I", "i"), NodeRef::root());
        assert!(!diagnostics.has_errors());
        diagnostics.report(DiagnosticType::error("E", "e"), NodeRef::root());
        assert!(diagnostics.has_errors());
    }
}
