//! # csstree - generic CSS syntax
//!
//! A small CSS syntax layer used by the `stcss` compiler. It knows nothing about
//! the stcss extensions; it only provides:
//!
//! - **Parsing**: source text into a [`Stylesheet`] of rules, at-rules,
//!   declarations and comments, each with a source [`Span`]
//! - **Selectors**: a structured selector tree ([`selector`]) with `&`
//!   nesting resolution
//! - **Values**: a lossless declaration value tokenizer ([`value`])
//! - **Printing**: normalized serialization via `Display`
//!
//! ## Quick Start
//!
//! ```rust
//! use csstree::{parse_stylesheet, Node};
//!
//! let source = r#"
//!     @media (min-width: 10px) {
//!         .btn { color: red; }
//!     }
//! "#;
//!
//! let sheet = parse_stylesheet(source).expect("valid CSS");
//! let Node::AtRule(media) = &sheet.nodes[0] else { panic!() };
//! assert_eq!(media.name, "media");
//! assert_eq!(media.params, "(min-width: 10px)");
//! ```
//!
//! ## Modules
//!
//! - [`ast`]: tree data structures
//! - [`parser`]: block-level parser
//! - [`selector`]: selector parsing and nesting
//! - [`value`]: value tokenizer
//! - [`location`]: offset to line/column mapping
//! - [`error`]: error types

pub mod ast;
pub mod error;
pub mod location;
pub mod parser;
mod printer;
pub mod selector;
pub mod value;

pub use ast::{AtRule, Comment, Declaration, Input, Node, NodeKind, Rule, Span, Stylesheet};
pub use error::CssError;
pub use location::{Position, position_at};
pub use parser::{parse_stylesheet, parse_stylesheet_with_path};
