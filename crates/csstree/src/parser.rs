//! Block-level stylesheet parser.
//!
//! Converts CSS source text into a [`Stylesheet`] tree. The parser only
//! understands the generic block structure of CSS (at-rules, rules,
//! declarations and comments); selectors and values are kept as text and can
//! be parsed further with [`crate::selector`] and [`crate::value`].
//!
//! Nested rules are supported (`.a { &:hover { ... } }`): any statement that
//! ends with a block is a rule, any statement ending with `;` or `}` is a
//! declaration.
//!
//! # Example
//!
//! ```rust
//! use csstree::{parse_stylesheet, Node};
//!
//! let sheet = parse_stylesheet(".btn { color: red; }").unwrap();
//! assert_eq!(sheet.nodes.len(), 1);
//! let Node::Rule(rule) = &sheet.nodes[0] else { panic!("expected rule") };
//! assert_eq!(rule.selector, ".btn");
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::ast::{AtRule, Comment, Declaration, Input, Node, Rule, Span, Stylesheet};
use crate::error::CssError;

/// Parses a full stylesheet.
pub fn parse_stylesheet(source: &str) -> Result<Stylesheet, CssError> {
    parse_stylesheet_with_path(source, None)
}

/// Parses a full stylesheet and records the path it was read from.
pub fn parse_stylesheet_with_path(
    source: &str,
    path: Option<PathBuf>,
) -> Result<Stylesheet, CssError> {
    let mut parser = BlockParser::new(source);
    let nodes = parser.parse_nodes(false)?;
    Ok(Stylesheet {
        nodes,
        input: Some(Arc::new(Input {
            path,
            text: source.to_string(),
        })),
    })
}

/// What ended a statement prelude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminator {
    OpenBrace,
    Semicolon,
    CloseBrace,
    Eof,
}

struct BlockParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> BlockParser<'a> {
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

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn parse_nodes(&mut self, nested: bool) -> Result<Vec<Node>, CssError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None if nested => {
                    return Err(CssError::syntax("Unclosed block", self.pos));
                }
                None => return Ok(nodes),
                Some('}') if nested => return Ok(nodes),
                Some('}') => {
                    return Err(CssError::syntax("Unexpected '}'", self.pos));
                }
                Some(';') => {
                    self.advance();
                }
                Some('/') if self.remaining().starts_with("/*") => {
                    nodes.push(Node::Comment(self.parse_comment()?));
                }
                Some('@') => nodes.push(Node::AtRule(self.parse_at_rule()?)),
                Some(_) => nodes.push(self.parse_rule_or_declaration()?),
            }
        }
    }

    fn parse_comment(&mut self) -> Result<Comment, CssError> {
        let start = self.pos;
        let body = &self.remaining()[2..];
        match body.find("*/") {
            Some(end) => {
                let text = body[..end].to_string();
                self.pos += 2 + end + 2;
                Ok(Comment {
                    text,
                    span: Span::new(start, self.pos),
                })
            }
            None => Err(CssError::syntax("Unclosed comment", start)),
        }
    }

    fn parse_at_rule(&mut self) -> Result<AtRule, CssError> {
        let start = self.pos;
        self.advance(); // consume '@'

        let name_start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let name = self.input[name_start..self.pos].to_string();
        if name.is_empty() {
            return Err(CssError::syntax("At-rule without name", start));
        }

        let (params, terminator) = self.read_prelude()?;
        let mut at_rule = AtRule::new(name, params.trim());

        match terminator {
            Terminator::OpenBrace => {
                self.advance();
                let nodes = self.parse_nodes(true)?;
                self.advance(); // consume '}'
                at_rule.nodes = Some(nodes);
            }
            Terminator::Semicolon => {
                self.advance();
            }
            Terminator::CloseBrace | Terminator::Eof => {}
        }

        at_rule.span = Span::new(start, self.pos);
        Ok(at_rule)
    }

    fn parse_rule_or_declaration(&mut self) -> Result<Node, CssError> {
        let start = self.pos;
        let (prelude, terminator) = self.read_prelude()?;

        if terminator == Terminator::OpenBrace {
            self.advance();
            let nodes = self.parse_nodes(true)?;
            self.advance(); // consume '}'
            return Ok(Node::Rule(Rule {
                selector: prelude.trim().to_string(),
                nodes,
                span: Span::new(start, self.pos),
            }));
        }

        let end = start + self.input[start..self.pos].trim_end().len();
        if terminator == Terminator::Semicolon {
            self.advance();
        }

        let Some(colon) = prelude.find(':') else {
            return Err(CssError::syntax(
                format!("Unknown word '{}'", prelude.trim()),
                start,
            ));
        };
        let prop = prelude[..colon].trim();
        if prop.is_empty() {
            return Err(CssError::syntax("Declaration without property", start));
        }

        let (value, important) = split_important(prelude[colon + 1..].trim());
        let span_end = if terminator == Terminator::Semicolon {
            self.pos
        } else {
            end
        };
        Ok(Node::Decl(Declaration {
            prop: prop.to_string(),
            value: value.to_string(),
            important,
            span: Span::new(start, span_end),
        }))
    }

    /// Reads statement text up to a top-level `{`, `;` or `}` (not consumed).
    ///
    /// Strings, parentheses and brackets are balanced; comments are dropped.
    fn read_prelude(&mut self) -> Result<(String, Terminator), CssError> {
        let mut text = String::new();
        let mut depth = 0usize;

        loop {
            let Some(c) = self.peek() else {
                return Ok((text, Terminator::Eof));
            };
            match c {
                '{' if depth == 0 => return Ok((text, Terminator::OpenBrace)),
                ';' if depth == 0 => return Ok((text, Terminator::Semicolon)),
                '}' if depth == 0 => return Ok((text, Terminator::CloseBrace)),
                '/' if self.remaining().starts_with("/*") => {
                    self.parse_comment()?;
                }
                '"' | '\'' => {
                    let literal = self.read_string(c)?;
                    text.push_str(literal);
                }
                '\\' => {
                    text.push(c);
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        text.push(escaped);
                    }
                }
                '(' | '[' => {
                    depth += 1;
                    text.push(c);
                    self.advance();
                }
                ')' | ']' => {
                    depth = depth.saturating_sub(1);
                    text.push(c);
                    self.advance();
                }
                _ => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    /// Consumes a quoted string (including quotes) and returns its raw text.
    fn read_string(&mut self, quote: char) -> Result<&'a str, CssError> {
        let start = self.pos;
        self.advance();
        loop {
            match self.advance() {
                Some('\\') => {
                    self.advance();
                }
                Some(c) if c == quote => return Ok(&self.input[start..self.pos]),
                Some(_) => {}
                None => return Err(CssError::syntax("Unclosed string", start)),
            }
        }
    }
}

fn split_important(value: &str) -> (&str, bool) {
    let lower = value.to_ascii_lowercase();
    if lower.ends_with("!important") {
        let cut = value.len() - "!important".len();
        (value[..cut].trim_end(), true)
    } else {
        (value, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_important() {
        assert_eq!(split_important("red !important"), ("red", true));
        assert_eq!(split_important("red"), ("red", false));
        assert_eq!(split_important("red!IMPORTANT"), ("red", true));
    }

    #[test]
    fn test_declaration_span_covers_semicolon() {
        let sheet = parse_stylesheet(".a { color: red; }").unwrap();
        let Node::Rule(rule) = &sheet.nodes[0] else {
            panic!("expected rule")
        };
        let decl = rule.declarations().next().unwrap();
        assert_eq!(&".a { color: red; }"[decl.span.start..decl.span.end], "color: red;");
    }

    #[test]
    fn test_last_declaration_without_semicolon() {
        let sheet = parse_stylesheet(".a { color: red }").unwrap();
        let Node::Rule(rule) = &sheet.nodes[0] else {
            panic!("expected rule")
        };
        let decl = rule.declarations().next().unwrap();
        assert_eq!(decl.value, "red");
        assert_eq!(&".a { color: red }"[decl.span.start..decl.span.end], "color: red");
    }
}
