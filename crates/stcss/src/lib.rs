//! # stcss - namespaced CSS modules
//!
//! A compiler for a CSS superset that turns component stylesheets into
//! plain CSS with collision-free names. On top of standard CSS it adds:
//!
//! - **Imports**: `@st-import Button, [accent, keyframes(fade)] from "./button.st.css";`
//! - **Namespacing**: `.btn` → `.entry__btn`, `--x` → `--entry-x`, keyframes
//!   and layers likewise; `:global(...)` and `st-global(...)` escape it
//! - **Build-time variables**: `:vars { accent: red; }` and `value(accent)`,
//!   including `st-map(...)` / `st-array(...)` structured values
//! - **Mixins**: `-st-mixin: other-class(color blue), scriptMixin(2);`
//! - **Inheritance**: `-st-extends` for classes and components
//! - **States**: `-st-states: on, size(enum(s, m))` with `.x:on` / `.x:size(m)`
//! - **Scopes**: `@st-scope .root { ... }`
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stcss::compiler::{Compiler, CompilerConfig};
//! use stcss::resolver::fs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([(
//!     "/src/entry.st.css",
//!     ":vars { accent: red; }\n.btn { -st-states: on; color: value(accent); }\n.btn:on { color: blue; }",
//! )]);
//! let compiler = Compiler::new(CompilerConfig::default().with_fs(Arc::new(fs)));
//! let output = compiler.build("/src/entry.st.css").unwrap();
//! assert!(output.css.contains(".entry__btn.entry--on"));
//! assert_eq!(output.exports.st_vars["accent"], "red");
//! ```
//!
//! ## Pipeline
//!
//! source → [`csstree`] AST → [`processor`] ([`Meta`]) → [`transformer`] →
//! output AST and [`Exports`]. The [`resolver`] supplies other stylesheets'
//! metas on demand and caches them by content.
//!
//! ## Modules
//!
//! - [`compiler`]: configuration and the build entry point
//! - [`processor`]: analysis pass
//! - [`transformer`]: output pass
//! - [`features`]: one module per language feature
//! - [`resolver`]: module resolution, caching and script modules
//! - [`namespace`]: namespace strategies and the collision registry
//! - [`diagnostics`]: non-fatal problems
//! - [`error`]: fatal errors

pub mod boxed;
pub mod compiler;
pub mod diagnostics;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod meta;
pub mod namespace;
pub mod processor;
pub mod resolver;
pub mod symbols;
pub mod transformer;

pub use compiler::{BuildMode, BuildOutput, Compiler, CompilerConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Result, StcssError};
pub use meta::{Exports, Meta};
pub use processor::{process, process_with};
pub use resolver::StylableResolver;
pub use transformer::{TransformResult, Transformer};
