//! Script-backed modules: mixins and formatters implemented in Rust and
//! registered by path.
//!
//! A stylesheet imports them like any other module:
//!
//! ```rust
//! use stcss::resolver::script::{MixinTree, NativeModule, ScriptRegistry};
//!
//! let mut scripts = ScriptRegistry::new();
//! scripts.register(
//!     "/src/mixins.js",
//!     NativeModule::new()
//!         .mixin("grid", |args| {
//!             let columns = args.first().map(String::as_str).unwrap_or("1");
//!             Ok(MixinTree::new()
//!                 .decl("display", "grid")
//!                 .decl("grid-template-columns", format!("repeat({columns}, 1fr)")))
//!         })
//!         .formatter("double", |args| {
//!             let n: f64 = args.first().and_then(|a| a.parse().ok()).ok_or("expected a number")?;
//!             Ok((n * 2.0).to_string())
//!         }),
//! );
//! assert!(scripts.get(std::path::Path::new("/src/mixins.js")).is_some());
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

pub type MixinFn = Arc<dyn Fn(&[String]) -> Result<MixinTree, String> + Send + Sync>;
pub type FormatterFn = Arc<dyn Fn(&[String]) -> Result<String, String> + Send + Sync>;

/// A value in a mixin tree: a declaration value or a nested block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MixinValue {
    Value(String),
    Block(MixinTree),
}

/// Ordered CSS-in-code tree returned by script mixins.
///
/// Keys are property names, selectors (`".x"`, `"&:hover"`) or at-rule
/// preludes (`"@media (min-width: 1px)"`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MixinTree {
    pub entries: Vec<(String, MixinValue)>,
}

impl MixinTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decl(mut self, prop: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push((prop.into(), MixinValue::Value(value.into())));
        self
    }

    pub fn block(mut self, key: impl Into<String>, tree: MixinTree) -> Self {
        self.entries.push((key.into(), MixinValue::Block(tree)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub enum ScriptExport {
    Mixin(MixinFn),
    Formatter(FormatterFn),
}

impl fmt::Debug for ScriptExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptExport::Mixin(_) => write!(f, "ScriptExport::Mixin"),
            ScriptExport::Formatter(_) => write!(f, "ScriptExport::Formatter"),
        }
    }
}

pub trait ScriptModule: Send + Sync {
    fn export(&self, name: &str) -> Option<ScriptExport>;

    fn export_names(&self) -> Vec<String>;
}

/// A script module assembled from Rust closures.
#[derive(Clone, Default)]
pub struct NativeModule {
    exports: IndexMap<String, ScriptExport>,
}

impl NativeModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mixin<F>(mut self, name: impl Into<String>, mixin: F) -> Self
    where
        F: Fn(&[String]) -> Result<MixinTree, String> + Send + Sync + 'static,
    {
        self.exports.insert(name.into(), ScriptExport::Mixin(Arc::new(mixin)));
        self
    }

    pub fn formatter<F>(mut self, name: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&[String]) -> Result<String, String> + Send + Sync + 'static,
    {
        self.exports
            .insert(name.into(), ScriptExport::Formatter(Arc::new(formatter)));
        self
    }
}

impl ScriptModule for NativeModule {
    fn export(&self, name: &str) -> Option<ScriptExport> {
        self.exports.get(name).cloned()
    }

    fn export_names(&self) -> Vec<String> {
        self.exports.keys().cloned().collect()
    }
}

/// Script modules by absolute path.
#[derive(Clone, Default)]
pub struct ScriptRegistry {
    modules: HashMap<PathBuf, Arc<dyn ScriptModule>>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: impl Into<PathBuf>, module: impl ScriptModule + 'static) {
        self.modules.insert(path.into(), Arc::new(module));
    }

    pub fn register_arc(&mut self, path: impl Into<PathBuf>, module: Arc<dyn ScriptModule>) {
        self.modules.insert(path.into(), module);
    }

    pub fn get(&self, path: &Path) -> Option<Arc<dyn ScriptModule>> {
        self.modules.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Calls a mixin, turning panics into errors.
pub fn call_mixin(mixin: &MixinFn, args: &[String]) -> Result<MixinTree, String> {
    guarded(|| mixin(args))
}

/// Calls a formatter, turning panics into errors.
pub fn call_formatter(formatter: &FormatterFn, args: &[String]) -> Result<String, String> {
    guarded(|| formatter(args))
}

fn guarded<T>(call: impl FnOnce() -> Result<T, String>) -> Result<T, String> {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("script function panicked: {message}");
            Err(message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "script function panicked".to_string()
    }
}
