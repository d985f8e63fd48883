//! Per-stylesheet symbol tables.
//!
//! Symbols live in one of three namespaces: `main` (classes, elements,
//! imports, variables and custom properties), `keyframes` and `layer`.
//! Names are unique within a namespace; redeclaring a name reports
//! `REDECLARE_SYMBOL` unless the redeclaration is marked safe, and the last
//! declaration wins.

use csstree::Span;
use csstree::selector::ComplexSelector;
use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticType, Diagnostics, NodeRef};
use crate::features::css_pseudo_class::StateDef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolNamespace {
    Main,
    Keyframes,
    Layer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Element,
    Import,
    CssVar,
    Keyframes,
    Var,
    Layer,
}

/// Which export of the imported module an import symbol refers to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImportedName {
    Default,
    Named(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportSymbol {
    /// Local name.
    pub name: String,
    /// Index into [`Meta::imports`](crate::meta::Meta::imports).
    pub import_index: usize,
    pub imported: ImportedName,
    /// Namespace the imported name is looked up in.
    pub namespace: SymbolNamespace,
    pub span: Span,
}

/// `-st-extends: Name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extends {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassSymbol {
    pub name: String,
    pub alias: Option<ImportSymbol>,
    pub extends: Option<Extends>,
    pub states: Option<IndexMap<String, StateDef>>,
    /// Replacement selector from `-st-global`.
    pub global_selector: Option<ComplexSelector>,
    pub span: Span,
}

impl ClassSymbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            extends: None,
            states: None,
            global_selector: None,
            span: Span::default(),
        }
    }

    pub fn with_alias(mut self, alias: ImportSymbol) -> Self {
        self.alias = Some(alias);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementSymbol {
    pub name: String,
    pub alias: Option<ImportSymbol>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarSymbol {
    pub name: String,
    /// Raw definition text.
    pub text: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CssVarSymbol {
    /// Name including the leading `--`.
    pub name: String,
    pub global: bool,
    pub alias: Option<ImportSymbol>,
    /// Declared by `@property`, a global statement or an import rather than
    /// discovered by usage.
    pub explicit: bool,
    pub span: Span,
}

/// Keyframes and layer symbols share this shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ScopedNameSymbol {
    pub name: String,
    pub global: bool,
    pub alias: Option<ImportSymbol>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    Class(ClassSymbol),
    Element(ElementSymbol),
    Import(ImportSymbol),
    CssVar(CssVarSymbol),
    Keyframes(ScopedNameSymbol),
    Var(VarSymbol),
    Layer(ScopedNameSymbol),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Class(s) => &s.name,
            Symbol::Element(s) => &s.name,
            Symbol::Import(s) => &s.name,
            Symbol::CssVar(s) => &s.name,
            Symbol::Keyframes(s) | Symbol::Layer(s) => &s.name,
            Symbol::Var(s) => &s.name,
        }
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Class(_) => SymbolKind::Class,
            Symbol::Element(_) => SymbolKind::Element,
            Symbol::Import(_) => SymbolKind::Import,
            Symbol::CssVar(_) => SymbolKind::CssVar,
            Symbol::Keyframes(_) => SymbolKind::Keyframes,
            Symbol::Var(_) => SymbolKind::Var,
            Symbol::Layer(_) => SymbolKind::Layer,
        }
    }

    pub fn namespace(&self) -> SymbolNamespace {
        match self {
            Symbol::Keyframes(_) => SymbolNamespace::Keyframes,
            Symbol::Layer(_) => SymbolNamespace::Layer,
            Symbol::Import(import) => import.namespace,
            _ => SymbolNamespace::Main,
        }
    }

    /// The import this symbol points to: an import symbol itself, or the
    /// alias of a class, element, custom property, keyframes or layer.
    pub fn import(&self) -> Option<&ImportSymbol> {
        match self {
            Symbol::Import(import) => Some(import),
            Symbol::Class(s) => s.alias.as_ref(),
            Symbol::Element(s) => s.alias.as_ref(),
            Symbol::CssVar(s) => s.alias.as_ref(),
            Symbol::Keyframes(s) | Symbol::Layer(s) => s.alias.as_ref(),
            Symbol::Var(_) => None,
        }
    }

    pub fn span(&self) -> csstree::Span {
        match self {
            Symbol::Class(s) => s.span,
            Symbol::Element(s) => s.span,
            Symbol::Import(s) => s.span,
            Symbol::CssVar(s) => s.span,
            Symbol::Keyframes(s) | Symbol::Layer(s) => s.span,
            Symbol::Var(s) => s.span,
        }
    }

    pub fn as_class(&self) -> Option<&ClassSymbol> {
        match self {
            Symbol::Class(class) => Some(class),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SymbolTable {
    main: IndexMap<String, Symbol>,
    keyframes: IndexMap<String, Symbol>,
    layer: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, namespace: SymbolNamespace) -> &IndexMap<String, Symbol> {
        match namespace {
            SymbolNamespace::Main => &self.main,
            SymbolNamespace::Keyframes => &self.keyframes,
            SymbolNamespace::Layer => &self.layer,
        }
    }

    fn table_mut(&mut self, namespace: SymbolNamespace) -> &mut IndexMap<String, Symbol> {
        match namespace {
            SymbolNamespace::Main => &mut self.main,
            SymbolNamespace::Keyframes => &mut self.keyframes,
            SymbolNamespace::Layer => &mut self.layer,
        }
    }

    pub fn get(&self, namespace: SymbolNamespace, name: &str) -> Option<&Symbol> {
        self.table(namespace).get(name)
    }

    pub fn get_mut(&mut self, namespace: SymbolNamespace, name: &str) -> Option<&mut Symbol> {
        self.table_mut(namespace).get_mut(name)
    }

    pub fn get_main(&self, name: &str) -> Option<&Symbol> {
        self.main.get(name)
    }

    pub fn get_class(&self, name: &str) -> Option<&ClassSymbol> {
        self.main.get(name).and_then(Symbol::as_class)
    }

    pub fn get_class_mut(&mut self, name: &str) -> Option<&mut ClassSymbol> {
        match self.main.get_mut(name) {
            Some(Symbol::Class(class)) => Some(class),
            _ => None,
        }
    }

    pub fn contains(&self, namespace: SymbolNamespace, name: &str) -> bool {
        self.table(namespace).contains_key(name)
    }

    /// Inserts without redeclaration checks; returns the replaced symbol.
    pub fn insert(&mut self, symbol: Symbol) -> Option<Symbol> {
        let name = symbol.name().to_string();
        self.table_mut(symbol.namespace()).insert(name, symbol)
    }

    /// Iterates over one namespace in declaration order.
    pub fn iter(&self, namespace: SymbolNamespace) -> impl Iterator<Item = &Symbol> {
        self.table(namespace).values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassSymbol> {
        self.main.values().filter_map(Symbol::as_class)
    }

    pub fn len(&self) -> usize {
        self.main.len() + self.keyframes.len() + self.layer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Adds a symbol, reporting `REDECLARE_SYMBOL` when the name is taken and
/// the redeclaration is not safe. The new symbol always wins.
pub fn add_symbol(
    table: &mut SymbolTable,
    diagnostics: &mut Diagnostics,
    symbol: Symbol,
    node: NodeRef,
    safe_redeclare: bool,
) {
    let name = symbol.name().to_string();
    if !safe_redeclare && table.contains(symbol.namespace(), &name) {
        diagnostics.report_word(redeclare_symbol(&name), node, &name);
    }
    table.insert(symbol);
}

pub fn redeclare_symbol(name: &str) -> DiagnosticType {
    DiagnosticType::warning("REDECLARE_SYMBOL", format!("redeclare symbol \"{name}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, text: &str) -> Symbol {
        Symbol::Var(VarSymbol {
            name: name.into(),
            text: text.into(),
            span: Span::default(),
        })
    }

    #[test]
    fn test_redeclare_reports_once_and_last_wins() {
        let mut table = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        add_symbol(&mut table, &mut diagnostics, var("a", "1"), NodeRef::root(), false);
        add_symbol(&mut table, &mut diagnostics, var("a", "2"), NodeRef::root(), false);
        assert_eq!(diagnostics.codes(), vec!["REDECLARE_SYMBOL"]);
        assert!(matches!(table.get_main("a"), Some(Symbol::Var(v)) if v.text == "2"));
    }

    #[test]
    fn test_safe_redeclare() {
        let mut table = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let class = Symbol::Class(ClassSymbol::new("a"));
        add_symbol(&mut table, &mut diagnostics, class.clone(), NodeRef::root(), false);
        add_symbol(&mut table, &mut diagnostics, class, NodeRef::root(), true);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_namespaces_are_separate() {
        let mut table = SymbolTable::new();
        let mut diagnostics = Diagnostics::new();
        let keyframes = Symbol::Keyframes(ScopedNameSymbol {
            name: "a".into(),
            global: false,
            alias: None,
            span: Span::default(),
        });
        add_symbol(&mut table, &mut diagnostics, var("a", "1"), NodeRef::root(), false);
        add_symbol(&mut table, &mut diagnostics, keyframes, NodeRef::root(), false);
        assert!(diagnostics.is_empty());
        assert_eq!(table.len(), 2);
    }
}
