//! Cross-file resolution.
//!
//! [`StylableResolver`] turns import statements into the [`Meta`] or script
//! module they point to, follows re-export and alias chains to the defining
//! stylesheet, and walks `-st-extends` inheritance. All traversals keep a
//! visited set, so cyclic import graphs terminate.

pub mod cache;
pub mod fs;
pub mod script;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use csstree::parse_stylesheet_with_path;

use crate::error::{Result, StcssError};
use crate::meta::{ImportStatement, Meta};
use crate::namespace::NamespaceStrategy;
use crate::processor;
use crate::symbols::{ImportSymbol, ImportedName, Symbol, SymbolNamespace};

use cache::{CachedMeta, MetaCache};
use fs::{FileSystem, ModuleResolver};
use script::{ScriptExport, ScriptModule, ScriptRegistry};

/// A symbol together with the stylesheet that defines it.
#[derive(Clone, Debug)]
pub struct CssResolve {
    pub meta: Arc<Meta>,
    pub symbol: Symbol,
}

impl CssResolve {
    pub fn new(meta: Arc<Meta>, symbol: Symbol) -> Self {
        Self { meta, symbol }
    }

    /// True for a class or element that only aliases an import.
    pub fn is_alias(&self) -> bool {
        match &self.symbol {
            Symbol::Class(class) => class.alias.is_some(),
            Symbol::Element(element) => element.alias.is_some(),
            Symbol::Import(_) => true,
            _ => false,
        }
    }

    pub fn has_extends(&self) -> bool {
        matches!(&self.symbol, Symbol::Class(class) if class.extends.is_some())
    }
}

#[derive(Clone)]
pub enum Resolved {
    Css(CssResolve),
    Script {
        path: PathBuf,
        export_name: String,
        export: ScriptExport,
    },
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Css(resolve) => f
                .debug_struct("Css")
                .field("path", &resolve.meta.path)
                .field("symbol", &resolve.symbol.name())
                .finish(),
            Resolved::Script {
                path, export_name, ..
            } => f
                .debug_struct("Script")
                .field("path", path)
                .field("export", export_name)
                .finish(),
        }
    }
}

/// What an import request points to.
#[derive(Clone)]
pub enum ResolvedModule {
    Stylesheet(Arc<Meta>),
    Script {
        path: PathBuf,
        module: Arc<dyn ScriptModule>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// The request could not be resolved, read or parsed.
    UnknownFile { request: String, reason: String },
    /// The module exists but does not export the name.
    UnknownSymbol { name: String, request: String },
    /// The alias chain loops back on itself.
    Cyclic { name: String },
    /// The imported file asked for a namespace another file already owns.
    Collision {
        request: String,
        namespace: String,
        path: PathBuf,
        existing: PathBuf,
    },
}

impl ResolveError {
    /// The build-stopping error behind this failure, if any.
    pub fn fatal(&self) -> Option<StcssError> {
        match self {
            ResolveError::Collision {
                namespace,
                path,
                existing,
                ..
            } => Some(StcssError::NamespaceCollision {
                namespace: namespace.clone(),
                path: path.clone(),
                existing: existing.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownFile { request, reason } => {
                write!(f, "cannot resolve imported file \"{request}\": {reason}")
            }
            ResolveError::UnknownSymbol { name, request } => {
                write!(f, "cannot resolve imported symbol \"{name}\" from \"{request}\"")
            }
            ResolveError::Cyclic { name } => write!(f, "circular import of \"{name}\""),
            ResolveError::Collision {
                request,
                namespace,
                existing,
                ..
            } => write!(
                f,
                "imported file \"{request}\" requests namespace \"{namespace}\" already used by \"{}\"",
                existing.display()
            ),
        }
    }
}

/// Result of walking an extends chain.
#[derive(Clone, Debug, Default)]
pub struct ExtendsChain {
    /// Closest first: the starting symbol, then aliases and base classes.
    pub chain: Vec<CssResolve>,
    pub error: Option<ResolveError>,
    pub circular: bool,
}

impl ExtendsChain {
    /// The definition that decides how the symbol is emitted: the first
    /// non-alias class or element, else the first alias carrying
    /// `-st-extends`, else the first entry.
    pub fn origin_definition(&self) -> Option<&CssResolve> {
        self.chain
            .iter()
            .find(|r| {
                matches!(r.symbol, Symbol::Class(_) | Symbol::Element(_)) && !r.is_alias()
            })
            .or_else(|| self.chain.iter().find(|r| r.is_alias() && r.has_extends()))
            .or_else(|| self.chain.first())
    }
}

pub struct StylableResolver {
    fs: Arc<dyn FileSystem>,
    module_resolver: Arc<dyn ModuleResolver>,
    namespace: Arc<dyn NamespaceStrategy>,
    scripts: ScriptRegistry,
    cache: Arc<MetaCache>,
}

impl StylableResolver {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        module_resolver: Arc<dyn ModuleResolver>,
        namespace: Arc<dyn NamespaceStrategy>,
    ) -> Self {
        Self {
            fs,
            module_resolver,
            namespace,
            scripts: ScriptRegistry::new(),
            cache: Arc::new(MetaCache::new()),
        }
    }

    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_cache(mut self, cache: Arc<MetaCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<MetaCache> {
        &self.cache
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    /// Reads, parses and analyzes `path`, memoized by content.
    pub fn process_file(&self, path: &Path) -> Result<Arc<Meta>> {
        let text = self
            .fs
            .read_to_string(path)
            .map_err(|source| StcssError::io(path, source))?;
        self.cache.get_or_process(path, &text, || {
            let ast = parse_stylesheet_with_path(&text, Some(path.to_path_buf())).map_err(
                |source| StcssError::Parse {
                    path: path.to_path_buf(),
                    source,
                },
            )?;
            let meta = processor::process_with(ast, path, None, self.namespace.as_ref())?;
            let dependencies = meta
                .imports
                .iter()
                .filter_map(|import| self.resolve_request(&import.context, &import.request).ok())
                .collect();
            Ok(CachedMeta {
                meta: Arc::new(meta),
                dependencies,
            })
        })
    }

    pub fn resolve_request(&self, context: &Path, request: &str) -> Result<PathBuf> {
        self.module_resolver.resolve(context, request)
    }

    pub fn resolve_import(
        &self,
        import: &ImportStatement,
    ) -> std::result::Result<ResolvedModule, ResolveError> {
        let unknown = |reason: String| ResolveError::UnknownFile {
            request: import.request.clone(),
            reason,
        };
        let path = self
            .resolve_request(&import.context, &import.request)
            .map_err(|e| unknown(e.to_string()))?;
        log::debug!("resolved {} to {}", import.request, path.display());
        if let Some(module) = self.scripts.get(&path) {
            return Ok(ResolvedModule::Script { path, module });
        }
        if !is_stylesheet(&path) {
            return Err(unknown("no script module is registered for this path".to_string()));
        }
        self.process_file(&path)
            .map(ResolvedModule::Stylesheet)
            .map_err(|e| match e {
                StcssError::NamespaceCollision {
                    namespace,
                    path,
                    existing,
                } => ResolveError::Collision {
                    request: import.request.clone(),
                    namespace,
                    path,
                    existing,
                },
                e => unknown(e.to_string()),
            })
    }

    /// One hop: resolves `name` from the module `import` points to.
    pub fn resolve_imported(
        &self,
        import: &ImportStatement,
        name: &ImportedName,
        namespace: SymbolNamespace,
    ) -> std::result::Result<Resolved, ResolveError> {
        match self.resolve_import(import)? {
            ResolvedModule::Stylesheet(meta) => {
                let symbol = match name {
                    ImportedName::Default => Some(meta.root_symbol()),
                    ImportedName::Named(remote) => meta.symbols.get(namespace, remote).cloned(),
                };
                match symbol {
                    Some(symbol) => Ok(Resolved::Css(CssResolve::new(meta, symbol))),
                    None => Err(ResolveError::UnknownSymbol {
                        name: imported_name(name).to_string(),
                        request: import.request.clone(),
                    }),
                }
            }
            ResolvedModule::Script { path, module } => {
                let export_name = imported_name(name).to_string();
                match module.export(&export_name) {
                    Some(export) => Ok(Resolved::Script {
                        path,
                        export_name,
                        export,
                    }),
                    None => Err(ResolveError::UnknownSymbol {
                        name: export_name,
                        request: import.request.clone(),
                    }),
                }
            }
        }
    }

    fn resolve_import_symbol(
        &self,
        meta: &Meta,
        import: &ImportSymbol,
    ) -> std::result::Result<Resolved, ResolveError> {
        let statement = meta
            .imports
            .get(import.import_index)
            .ok_or_else(|| ResolveError::UnknownSymbol {
                name: import.name.clone(),
                request: String::new(),
            })?;
        self.resolve_imported(statement, &import.imported, import.namespace)
    }

    /// Follows imports and aliases until a definition is reached.
    pub fn deep_resolve(
        &self,
        meta: &Arc<Meta>,
        symbol: &Symbol,
    ) -> std::result::Result<Resolved, ResolveError> {
        let mut current = CssResolve::new(meta.clone(), symbol.clone());
        let mut visited = HashSet::new();
        loop {
            let Some(import) = current.symbol.import().cloned() else {
                return Ok(Resolved::Css(current));
            };
            let key = (current.meta.path.clone(), current.symbol.name().to_string());
            if !visited.insert(key) {
                return Err(ResolveError::Cyclic {
                    name: symbol.name().to_string(),
                });
            }
            match self.resolve_import_symbol(&current.meta, &import)? {
                Resolved::Css(next) => current = next,
                script => return Ok(script),
            }
        }
    }

    /// Walks aliases and `-st-extends` links starting at `symbol`.
    pub fn resolve_extends(&self, meta: &Arc<Meta>, symbol: &Symbol) -> ExtendsChain {
        let mut result = ExtendsChain::default();
        let mut visited = HashSet::new();
        let mut current = CssResolve::new(meta.clone(), symbol.clone());
        loop {
            let key = (current.meta.path.clone(), current.symbol.name().to_string());
            if !visited.insert(key) {
                result.circular = true;
                break;
            }
            result.chain.push(current.clone());

            let extends = match &current.symbol {
                Symbol::Class(class) => class.extends.as_ref().map(|e| e.name.clone()),
                _ => None,
            };
            if let Some(base) = extends {
                match current.meta.symbols.get_main(&base).cloned() {
                    Some(next) => {
                        current = CssResolve::new(current.meta.clone(), next);
                        continue;
                    }
                    None => {
                        result.error = Some(ResolveError::UnknownSymbol {
                            name: base,
                            request: String::new(),
                        });
                        break;
                    }
                }
            }

            let Some(import) = current.symbol.import().cloned() else {
                break;
            };
            match self.resolve_import_symbol(&current.meta, &import) {
                Ok(Resolved::Css(next)) => current = next,
                Ok(Resolved::Script { .. }) => break,
                Err(error) => {
                    result.error = Some(error);
                    break;
                }
            }
        }
        result
    }

    /// Extends chain of a class, closest first.
    pub fn resolve_class_chain(&self, meta: &Arc<Meta>, name: &str) -> ExtendsChain {
        match meta.symbols.get_main(name) {
            Some(symbol @ (Symbol::Class(_) | Symbol::Import(_))) => {
                self.resolve_extends(meta, symbol)
            }
            _ => ExtendsChain::default(),
        }
    }

    /// Extends chain of an element (component) selector.
    pub fn resolve_element_chain(&self, meta: &Arc<Meta>, name: &str) -> ExtendsChain {
        match meta.symbols.get_main(name) {
            Some(symbol @ (Symbol::Element(_) | Symbol::Import(_))) => {
                self.resolve_extends(meta, symbol)
            }
            _ => ExtendsChain::default(),
        }
    }

    /// Visits every stylesheet `meta` depends on, breadth first, once each.
    /// The visitor receives the dependency and its import depth (1 for
    /// direct imports).
    pub fn visit_dependencies<F>(&self, meta: &Arc<Meta>, mut visit: F)
    where
        F: FnMut(&Arc<Meta>, usize),
    {
        let mut seen: HashSet<PathBuf> = HashSet::from([meta.path.clone()]);
        let mut queue = VecDeque::from([(meta.clone(), 0usize)]);
        while let Some((current, depth)) = queue.pop_front() {
            for import in &current.imports {
                if let Ok(ResolvedModule::Stylesheet(dependency)) = self.resolve_import(import) {
                    if seen.insert(dependency.path.clone()) {
                        visit(&dependency, depth + 1);
                        queue.push_back((dependency, depth + 1));
                    }
                }
            }
        }
    }

    /// Walks every import reachable from `meta` and returns the first
    /// failure that must stop the build. Other import failures are left to
    /// the transform diagnostics.
    pub fn check_dependencies(&self, meta: &Arc<Meta>) -> Result<()> {
        let mut seen: HashSet<PathBuf> = HashSet::from([meta.path.clone()]);
        let mut queue = VecDeque::from([meta.clone()]);
        while let Some(current) = queue.pop_front() {
            for import in &current.imports {
                match self.resolve_import(import) {
                    Ok(ResolvedModule::Stylesheet(dependency)) => {
                        if seen.insert(dependency.path.clone()) {
                            queue.push_back(dependency);
                        }
                    }
                    Ok(ResolvedModule::Script { .. }) => {}
                    Err(err) => {
                        if let Some(fatal) = err.fatal() {
                            return Err(fatal);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Evicts `path` and its dependents from the cache.
    pub fn invalidate(&self, path: &Path) -> Vec<PathBuf> {
        self.cache.invalidate(path)
    }
}

fn imported_name(name: &ImportedName) -> &str {
    match name {
        ImportedName::Default => "default",
        ImportedName::Named(name) => name,
    }
}

fn is_stylesheet(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "css")
}
