//! # stcss-rs
//!
//! Namespaced CSS modules for Rust build tooling.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`csstree`]: generic CSS syntax (parser, selectors, values, printer)
//! - [`stcss`]: the compiler (analysis, cross-file resolution, transformation)
//!
//! ```rust
//! use std::sync::Arc;
//! use stcss_rs::stcss::{Compiler, CompilerConfig};
//! use stcss_rs::stcss::resolver::fs::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::with_files([("/app/panel.st.css", ".title { font-weight: bold; }")]);
//! let compiler = Compiler::new(CompilerConfig::default().with_fs(Arc::new(fs)));
//! let output = compiler.build("/app/panel.st.css").unwrap();
//! assert_eq!(output.css, ".panel__title {\n    font-weight: bold;\n}\n");
//! ```

pub use csstree;
pub use stcss;

pub use stcss::{BuildMode, BuildOutput, Compiler, CompilerConfig, Diagnostic, Exports, Meta, Result, StcssError};
