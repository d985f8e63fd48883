//! Compiler facade: wires the file system, module resolution, namespace
//! strategy, script modules and cache into one resolver and transformer.
//!
//! ```rust
//! use std::sync::Arc;
//! use stcss::compiler::{Compiler, CompilerConfig};
//! use stcss::resolver::fs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([("/src/entry.st.css", ".btn { color: red; }")]);
//! let compiler = Compiler::new(
//!     CompilerConfig::default()
//!         .with_root_dir("/src")
//!         .with_fs(Arc::new(fs)),
//! );
//! let output = compiler.build("entry.st.css").unwrap();
//! assert_eq!(output.exports.classes["btn"], "entry__btn");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::diagnostics::Severity;
use crate::error::{Result, StcssError};
use crate::meta::{Exports, Meta};
use crate::namespace::{NamespaceStrategy, PlainStrategy};
use crate::resolver::cache::MetaCache;
use crate::resolver::fs::{FileSystem, ModuleResolver, OsFileSystem, RelativeModuleResolver, normalize_path};
use crate::resolver::script::ScriptRegistry;
use crate::resolver::StylableResolver;
use crate::transformer::{TransformResult, Transformer};

/// Whether error diagnostics fail [`Compiler::build`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildMode {
    /// Always produce output.
    #[default]
    Development,
    /// Fail on any error-severity diagnostic.
    Production,
}

pub struct CompilerConfig {
    pub root_dir: PathBuf,
    pub fs: Arc<dyn FileSystem>,
    pub module_resolver: Arc<dyn ModuleResolver>,
    pub namespace: Arc<dyn NamespaceStrategy>,
    pub scripts: ScriptRegistry,
    /// Shared with other compilers when set.
    pub cache: Option<Arc<MetaCache>>,
    pub mode: BuildMode,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("/"),
            fs: Arc::new(OsFileSystem),
            module_resolver: Arc::new(RelativeModuleResolver::new()),
            namespace: Arc::new(PlainStrategy),
            scripts: ScriptRegistry::new(),
            cache: None,
            mode: BuildMode::default(),
        }
    }
}

impl fmt::Debug for CompilerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilerConfig")
            .field("root_dir", &self.root_dir)
            .field("shared_cache", &self.cache.is_some())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CompilerConfig {
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_module_resolver(mut self, module_resolver: Arc<dyn ModuleResolver>) -> Self {
        self.module_resolver = module_resolver;
        self
    }

    pub fn with_namespace(mut self, namespace: Arc<dyn NamespaceStrategy>) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn with_scripts(mut self, scripts: ScriptRegistry) -> Self {
        self.scripts = scripts;
        self
    }

    pub fn with_cache(mut self, cache: Arc<MetaCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Output of [`Compiler::build`].
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub meta: Meta,
    pub exports: Exports,
    /// Serialized output stylesheet.
    pub css: String,
}

pub struct Compiler {
    root_dir: PathBuf,
    mode: BuildMode,
    transformer: Transformer,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Self {
        let mut resolver = StylableResolver::new(config.fs, config.module_resolver, config.namespace)
            .with_scripts(config.scripts);
        if let Some(cache) = config.cache {
            resolver = resolver.with_cache(cache);
        }
        Self {
            root_dir: normalize_path(&config.root_dir),
            mode: config.mode,
            transformer: Transformer::new(Arc::new(resolver)),
        }
    }

    pub fn resolver(&self) -> &Arc<StylableResolver> {
        self.transformer.resolver()
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    fn entry_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.root_dir.join(path))
        }
    }

    /// Analyzes a stylesheet; relative paths are taken from the root dir.
    pub fn process(&self, path: impl AsRef<Path>) -> Result<Arc<Meta>> {
        self.resolver().process_file(&self.entry_path(path.as_ref()))
    }

    pub fn transform(&self, meta: &Arc<Meta>) -> TransformResult {
        self.transformer.transform(meta)
    }

    /// Drops `path` and everything importing it from the cache.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> Vec<PathBuf> {
        self.resolver().invalidate(&self.entry_path(path.as_ref()))
    }

    /// Processes and transforms `path`. Namespace collisions anywhere in
    /// the import graph fail the build.
    pub fn build(&self, path: impl AsRef<Path>) -> Result<BuildOutput> {
        let meta = self.process(path)?;
        let TransformResult { meta, exports } = self.transformer.try_transform(&meta)?;

        if self.mode == BuildMode::Production {
            let errors: Vec<_> = meta
                .diagnostics
                .iter()
                .chain(meta.transform_diagnostics.iter().flat_map(|d| d.iter()))
                .filter(|d| d.severity == Severity::Error)
                .collect();
            if let Some(first) = errors.first() {
                return Err(StcssError::Diagnostics {
                    path: meta.path.clone(),
                    count: errors.len(),
                    first: format!("{}: {}", first.code, first.message),
                });
            }
        }

        let css = meta
            .output_ast
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        log::debug!("built {} ({} bytes of css)", meta.path.display(), css.len());
        Ok(BuildOutput { meta, exports, css })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::fs::MemoryFileSystem;

    fn compiler(files: &[(&str, &str)], mode: BuildMode) -> Compiler {
        let fs = MemoryFileSystem::with_files(files.iter().map(|(p, c)| (*p, *c)));
        Compiler::new(
            CompilerConfig::default()
                .with_root_dir("/src")
                .with_fs(Arc::new(fs))
                .with_mode(mode),
        )
    }

    #[test]
    fn test_relative_entry_is_joined_to_root() {
        let compiler = compiler(&[("/src/a.st.css", ".x {}")], BuildMode::Development);
        let meta = compiler.process("a.st.css").unwrap();
        assert_eq!(meta.path, PathBuf::from("/src/a.st.css"));
    }

    #[test]
    fn test_development_never_blocks() {
        let compiler = compiler(&[("/src/a.st.css", ".x { -st-extends: Nope; }")], BuildMode::Development);
        assert!(compiler.build("a.st.css").is_ok());
    }

    #[test]
    fn test_production_fails_on_errors() {
        let compiler = compiler(&[("/src/a.st.css", ".x { -st-extends: Nope; }")], BuildMode::Production);
        let err = compiler.build("a.st.css").unwrap_err();
        assert!(
            matches!(&err, StcssError::Diagnostics { first, .. } if first.starts_with("CANNOT_EXTEND_UNKNOWN_SYMBOL")),
            "{err}"
        );
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let compiler = compiler(&[], BuildMode::Development);
        assert!(matches!(compiler.build("missing.st.css"), Err(StcssError::Io { .. })));
    }
}
