//! Analysis results for one stylesheet.

use std::path::{Path, PathBuf};

use csstree::{Span, Stylesheet};
use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::symbols::{ClassSymbol, CssVarSymbol, Symbol, SymbolNamespace, SymbolTable};

/// Name of the class every stylesheet implicitly declares.
pub const ROOT_CLASS: &str = "root";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportSyntax {
    /// `@st-import Name, [a, b as c] from "./x.st.css";`
    AtRule,
    /// `:import { -st-from: ...; -st-default: ...; -st-named: ...; }`
    PseudoRule,
}

/// One import statement, in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct ImportStatement {
    pub request: String,
    /// Directory of the importing file; requests resolve relative to it.
    pub context: PathBuf,
    pub default_export: Option<String>,
    /// Local name to imported name.
    pub named: IndexMap<String, String>,
    /// Typed named imports (`keyframes(...)`, `layer(...)`): local name to
    /// imported name, per symbol namespace.
    pub typed: IndexMap<SymbolNamespace, IndexMap<String, String>>,
    pub syntax: ImportSyntax,
    pub span: Span,
}

impl ImportStatement {
    pub fn new(request: impl Into<String>, context: impl Into<PathBuf>, syntax: ImportSyntax) -> Self {
        Self {
            request: request.into(),
            context: context.into(),
            default_export: None,
            named: IndexMap::new(),
            typed: IndexMap::new(),
            syntax,
            span: Span::default(),
        }
    }

    pub fn is_stylesheet_request(&self) -> bool {
        self.request.ends_with(".css")
    }
}

/// An `@st-scope` block.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopeBlock {
    pub selector: String,
    pub span: Span,
}

/// Public names of a transformed stylesheet. Each map goes from the local
/// name to the emitted one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Exports {
    pub classes: IndexMap<String, String>,
    pub keyframes: IndexMap<String, String>,
    /// Custom properties, keyed with their leading `--`.
    pub vars: IndexMap<String, String>,
    pub st_vars: IndexMap<String, String>,
    pub layers: IndexMap<String, String>,
}

/// Everything known about a processed stylesheet.
#[derive(Clone, Debug)]
pub struct Meta {
    pub path: PathBuf,
    pub source_ast: Stylesheet,
    /// Namespace requested by `@st-namespace`, if any.
    pub declared_namespace: Option<String>,
    pub namespace_span: Option<Span>,
    /// Final namespace after applying the namespace strategy.
    pub namespace: String,
    pub symbols: SymbolTable,
    pub imports: Vec<ImportStatement>,
    pub scopes: Vec<ScopeBlock>,
    pub diagnostics: Diagnostics,
    pub output_ast: Option<Stylesheet>,
    pub transform_diagnostics: Option<Diagnostics>,
    pub exports: Option<Exports>,
}

impl Meta {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_ast: Stylesheet::default(),
            declared_namespace: None,
            namespace_span: None,
            namespace: String::new(),
            symbols: SymbolTable::new(),
            imports: Vec::new(),
            scopes: Vec::new(),
            diagnostics: Diagnostics::new(),
            output_ast: None,
            transform_diagnostics: None,
            exports: None,
        }
    }

    /// Directory imports are resolved against.
    pub fn context(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn source(&self) -> &str {
        self.source_ast
            .input
            .as_ref()
            .map_or("", |input| input.text.as_str())
    }

    pub fn root(&self) -> Option<&ClassSymbol> {
        self.symbols.get_class(ROOT_CLASS)
    }

    pub fn root_symbol(&self) -> Symbol {
        match self.symbols.get_main(ROOT_CLASS) {
            Some(symbol @ Symbol::Class(_)) => symbol.clone(),
            _ => Symbol::Class(ClassSymbol::new(ROOT_CLASS)),
        }
    }

    /// Custom property symbols (local, global and imported).
    pub fn css_vars(&self) -> impl Iterator<Item = &CssVarSymbol> {
        self.symbols
            .iter(SymbolNamespace::Main)
            .filter_map(|symbol| match symbol {
                Symbol::CssVar(var) => Some(var),
                _ => None,
            })
    }

    pub fn keyframes(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter(SymbolNamespace::Keyframes)
    }

    pub fn layers(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter(SymbolNamespace::Layer)
    }

    pub fn get_symbol(&self, namespace: SymbolNamespace, name: &str) -> Option<&Symbol> {
        self.symbols.get(namespace, name)
    }

    /// Namespaced class name for a local class.
    pub fn scoped_class(&self, name: &str) -> String {
        format!("{}__{}", self.namespace, name)
    }
}
