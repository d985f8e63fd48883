//! Declaration value parsing.
//!
//! Splits a declaration value into a flat list of [`ValueNode`]s with nested
//! function arguments. Parsing is lossless: [`stringify`] returns the exact
//! input text.
//!
//! ```rust
//! use csstree::value::{parse_value, stringify, ValueNode};
//!
//! let nodes = parse_value("1px solid value(color)");
//! assert!(matches!(&nodes[4], ValueNode::Function { name, .. } if name == "value"));
//! assert_eq!(stringify(&nodes), "1px solid value(color)");
//! ```

/// A node of a parsed value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueNode {
    /// Any run of non-separator characters: `12px`, `red`, `#fff`, `--var`.
    Word(String),
    /// Whitespace run.
    Space(String),
    /// `,` or `/` separator.
    Div(char),
    /// Quoted string; `value` excludes the quotes and keeps escapes verbatim.
    Str { quote: char, value: String },
    /// `name(args)`; `name` is empty for bare parentheses.
    Function { name: String, nodes: Vec<ValueNode> },
    /// `/* text */`
    Comment(String),
}

impl ValueNode {
    pub fn word(value: impl Into<String>) -> Self {
        ValueNode::Word(value.into())
    }

    pub fn is_space(&self) -> bool {
        matches!(self, ValueNode::Space(_))
    }
}

/// Parses a value string into nodes.
pub fn parse_value(input: &str) -> Vec<ValueNode> {
    let mut lexer = ValueLexer::new(input);
    lexer.parse_nodes(false)
}

/// Serializes nodes back to text.
pub fn stringify(nodes: &[ValueNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Serializes a single node.
pub fn stringify_node(node: &ValueNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &ValueNode) {
    match node {
        ValueNode::Word(word) => out.push_str(word),
        ValueNode::Space(space) => out.push_str(space),
        ValueNode::Div(c) => out.push(*c),
        ValueNode::Str { quote, value } => {
            out.push(*quote);
            out.push_str(value);
            out.push(*quote);
        }
        ValueNode::Function { name, nodes } => {
            out.push_str(name);
            out.push('(');
            for child in nodes {
                write_node(out, child);
            }
            out.push(')');
        }
        ValueNode::Comment(text) => {
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
        }
    }
}

/// Splits nodes on top-level `,` separators.
///
/// Each group keeps its surrounding whitespace; use [`stringify`] + `trim` to
/// read an argument.
pub fn split_by_comma(nodes: &[ValueNode]) -> Vec<Vec<ValueNode>> {
    let mut groups = vec![Vec::new()];
    for node in nodes {
        if matches!(node, ValueNode::Div(',')) {
            groups.push(Vec::new());
        } else if let Some(group) = groups.last_mut() {
            group.push(node.clone());
        }
    }
    if groups.len() == 1 && groups[0].iter().all(ValueNode::is_space) {
        return Vec::new();
    }
    groups
}

/// Removes leading and trailing whitespace/comment nodes.
pub fn trim_nodes(nodes: &[ValueNode]) -> &[ValueNode] {
    let is_blank = |n: &ValueNode| matches!(n, ValueNode::Space(_) | ValueNode::Comment(_));
    let start = nodes.iter().position(|n| !is_blank(n)).unwrap_or(nodes.len());
    let end = nodes.iter().rposition(|n| !is_blank(n)).map_or(start, |i| i + 1);
    &nodes[start..end]
}

struct ValueLexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ValueLexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn parse_nodes(&mut self, in_function: bool) -> Vec<ValueNode> {
        let mut nodes = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ')' if in_function => return nodes,
                c if c.is_whitespace() => nodes.push(self.consume_space()),
                ',' | '/' if !self.remaining().starts_with("/*") => {
                    self.advance();
                    nodes.push(ValueNode::Div(c));
                }
                '/' => nodes.push(self.consume_comment()),
                '"' | '\'' => nodes.push(self.consume_string(c)),
                '(' => {
                    self.advance();
                    nodes.push(self.consume_function(String::new()));
                }
                _ => {
                    let word = self.consume_word(in_function);
                    if self.peek() == Some('(') && !word.is_empty() {
                        self.advance();
                        nodes.push(self.consume_function(word));
                    } else if word.is_empty() {
                        // Stray ')' at the top level.
                        if let Some(c) = self.advance() {
                            nodes.push(ValueNode::Word(c.to_string()));
                        }
                    } else {
                        nodes.push(ValueNode::Word(word));
                    }
                }
            }
        }
        nodes
    }

    fn consume_space(&mut self) -> ValueNode {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
        ValueNode::Space(self.input[start..self.pos].to_string())
    }

    fn consume_comment(&mut self) -> ValueNode {
        let body_start = self.pos + 2;
        match self.input[body_start..].find("*/") {
            Some(end) => {
                self.pos = body_start + end + 2;
                ValueNode::Comment(self.input[body_start..body_start + end].to_string())
            }
            None => {
                self.pos = self.input.len();
                ValueNode::Comment(self.input[body_start..].to_string())
            }
        }
    }

    fn consume_string(&mut self, quote: char) -> ValueNode {
        self.advance();
        let start = self.pos;
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some(c) if c == quote => {
                    let value = self.input[start..self.pos - c.len_utf8()].to_string();
                    return ValueNode::Str { quote, value };
                }
                Some(_) => {}
                None => {
                    return ValueNode::Str {
                        quote,
                        value: self.input[start..].to_string(),
                    };
                }
            }
        }
    }

    fn consume_function(&mut self, name: String) -> ValueNode {
        let nodes = if name.eq_ignore_ascii_case("url") {
            self.consume_url_body()
        } else {
            self.parse_nodes(true)
        };
        // consume ')' when present (unclosed functions run to the end)
        if self.peek() == Some(')') {
            self.advance();
        }
        ValueNode::Function { name, nodes }
    }

    /// `url(...)` bodies are kept as a single word unless quoted.
    fn consume_url_body(&mut self) -> Vec<ValueNode> {
        let trimmed = self.remaining().trim_start();
        if trimmed.starts_with('"') || trimmed.starts_with('\'') {
            return self.parse_nodes(true);
        }
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ')' {
                break;
            }
            self.advance();
        }
        vec![ValueNode::Word(self.input[start..self.pos].to_string())]
    }

    fn consume_word(&mut self, in_function: bool) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            let stop = c.is_whitespace()
                || matches!(c, ',' | '/' | '"' | '\'' | '(')
                || (c == ')' && (in_function || self.pos > start));
            if stop {
                break;
            }
            if c == '\\' {
                self.advance();
            }
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_functions() {
        let nodes = parse_value("value(a, value(b))");
        let ValueNode::Function { name, nodes: args } = &nodes[0] else {
            panic!("expected function");
        };
        assert_eq!(name, "value");
        assert_eq!(split_by_comma(args).len(), 2);
    }

    #[test]
    fn test_split_empty_args() {
        assert!(split_by_comma(&parse_value("  ")).is_empty());
    }

    #[test]
    fn test_trim_nodes() {
        let nodes = parse_value("  red  ");
        assert_eq!(stringify(trim_nodes(&nodes)), "red");
    }

    #[test]
    fn test_lossless_roundtrip_with_strings_and_comments() {
        let source = "url(\"a b.png\") /* c */ 1px/2px, 'x'";
        assert_eq!(stringify(&parse_value(source)), source);
    }
}
