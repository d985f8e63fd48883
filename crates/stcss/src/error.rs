//! Error types for stylesheet processing.
//!
//! Only problems that prevent any output from being produced are errors:
//! the entry file cannot be read or parsed, a namespace collides, or the
//! configuration is unusable. Everything else is reported as a
//! [`Diagnostic`](crate::diagnostics::Diagnostic) and processing continues.

use std::path::PathBuf;

use csstree::CssError;
use thiserror::Error;

/// Result type alias for stcss operations.
pub type Result<T> = std::result::Result<T, StcssError>;

#[derive(Error, Debug)]
pub enum StcssError {
    /// The file system could not provide a stylesheet.
    #[error("Failed to read stylesheet '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A module specifier could not be resolved to a path.
    #[error("Cannot resolve '{request}' from '{context}'")]
    ModuleNotFound { request: String, context: PathBuf },

    /// The stylesheet text is not valid CSS.
    #[error("CSS syntax error in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: CssError,
    },

    /// Two different files requested the same namespace.
    #[error("Namespace '{namespace}' requested for '{path}' is already used by '{existing}'")]
    NamespaceCollision {
        namespace: String,
        path: PathBuf,
        existing: PathBuf,
    },

    /// Structurally invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A production build produced error diagnostics.
    #[error("Build of '{path}' failed with {count} error(s): {first}")]
    Diagnostics {
        path: PathBuf,
        count: usize,
        first: String,
    },
}

impl StcssError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a module resolution error.
    pub fn module_not_found(request: impl Into<String>, context: impl Into<PathBuf>) -> Self {
        Self::ModuleNotFound {
            request: request.into(),
            context: context.into(),
        }
    }
}
