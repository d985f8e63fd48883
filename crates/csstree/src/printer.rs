//! Stylesheet serialization.
//!
//! Output is normalized rather than whitespace-preserving: one declaration
//! per line, four-space indentation, blocks closed on their own line.
//!
//! ```rust
//! use csstree::parse_stylesheet;
//!
//! let sheet = parse_stylesheet(".a{color:red}").unwrap();
//! assert_eq!(sheet.to_string(), ".a {\n    color: red;\n}\n");
//! ```

use std::fmt::{self, Write};

use crate::ast::{Node, Stylesheet};

const INDENT: &str = "    ";

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes, 0)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_node(f, self, 0)
    }
}

fn write_nodes(out: &mut impl Write, nodes: &[Node], depth: usize) -> fmt::Result {
    for node in nodes {
        write_node(out, node, depth)?;
    }
    Ok(())
}

fn write_node(out: &mut impl Write, node: &Node, depth: usize) -> fmt::Result {
    let indent = INDENT.repeat(depth);
    match node {
        Node::Rule(rule) => {
            write!(out, "{indent}{}", rule.selector)?;
            write_block(out, &rule.nodes, depth, &indent)
        }
        Node::AtRule(at_rule) => {
            write!(out, "{indent}@{}", at_rule.name)?;
            if !at_rule.params.is_empty() {
                write!(out, " {}", at_rule.params)?;
            }
            match &at_rule.nodes {
                Some(nodes) => write_block(out, nodes, depth, &indent),
                None => writeln!(out, ";"),
            }
        }
        Node::Decl(decl) => {
            write!(out, "{indent}{}: {}", decl.prop, decl.value)?;
            if decl.important {
                write!(out, " !important")?;
            }
            writeln!(out, ";")
        }
        Node::Comment(comment) => writeln!(out, "{indent}/*{}*/", comment.text),
    }
}

fn write_block(out: &mut impl Write, nodes: &[Node], depth: usize, indent: &str) -> fmt::Result {
    if nodes.is_empty() {
        return writeln!(out, " {{}}");
    }
    writeln!(out, " {{")?;
    write_nodes(out, nodes, depth + 1)?;
    writeln!(out, "{indent}}}")
}
