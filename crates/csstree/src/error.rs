//! Error types for CSS parsing.

use thiserror::Error;

/// Errors that can occur while parsing CSS source, selectors or values.
///
/// # Examples
///
/// ```rust
/// use csstree::parse_stylesheet;
///
/// // Unclosed block
/// let result = parse_stylesheet(".a { color: red;");
/// assert!(result.is_err());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CssError {
    /// Invalid CSS syntax was encountered while building the tree.
    ///
    /// `offset` is the byte offset in the source where the problem starts.
    #[error("CSS syntax error at offset {offset}: {message}")]
    InvalidSyntax { message: String, offset: usize },

    /// A selector could not be parsed completely.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

impl CssError {
    /// Create a syntax error.
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
            offset,
        }
    }

    /// Create a selector error.
    pub fn selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }
}
