//! Selector data structures and parsing.
//!
//! - [`parse_selector_list`]: nom entry point for comma-separated selectors
//! - [`SelectorList::parse`]: convenience wrapper requiring full consumption
//! - [`nest_selectors`] / [`replace_parent`]: `&` nesting resolution
//!
//! A [`ComplexSelector`] is a sequence of [`SelectorPart`]s; each part holds a
//! compound selector and the combinator that *follows* it. The last part always
//! has [`Combinator::None`]. A relative selector such as `> .child` starts with
//! a part whose compound is empty.
//!
//! ## Example
//!
//! ```rust
//! use csstree::selector::{Selector, SelectorList};
//!
//! let list = SelectorList::parse(".root:hover > Button::label").unwrap();
//! let parts = &list.selectors[0].parts;
//! assert_eq!(parts.len(), 2);
//! assert_eq!(parts[0].compound.selectors[0], Selector::Class("root".into()));
//! assert_eq!(list.to_string(), ".root:hover > Button::label");
//! ```

mod nesting;
mod parser;

use std::fmt;

pub use nesting::{nest_selectors, replace_parent};
pub use parser::{
    parse_complex_selector, parse_compound_selector, parse_ident, parse_selector_list,
    parse_simple_selector,
};

use crate::error::CssError;

/// Arguments of a functional pseudo-class or pseudo-element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PseudoArgs {
    /// Selector-taking pseudos: `:not(...)`, `:is(...)`, `:global(...)`.
    Selectors(SelectorList),
    /// Anything else, kept verbatim (trimmed): `:nth-child(2n + 1)`, `:state(x)`.
    Raw(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Type(String),
    Class(String),
    Id(String),
    Universal,
    /// The nesting selector `&`.
    Parent,
    /// Attribute selector, raw text between the brackets.
    Attribute(String),
    PseudoClass(String, Option<PseudoArgs>),
    PseudoElement(String, Option<PseudoArgs>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    pub selectors: Vec<Selector>,
}

impl CompoundSelector {
    pub fn new(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn contains_parent(&self) -> bool {
        self.selectors.iter().any(|s| matches!(s, Selector::Parent))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combinator {
    None,
    Descendant,
    Child,
    AdjacentSibling, // +
    GeneralSibling,  // ~
}

impl Combinator {
    fn symbol(self) -> &'static str {
        match self {
            Combinator::None | Combinator::Descendant => "",
            Combinator::Child => ">",
            Combinator::AdjacentSibling => "+",
            Combinator::GeneralSibling => "~",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorPart {
    pub compound: CompoundSelector,
    pub combinator: Combinator,
}

impl SelectorPart {
    pub fn new(compound: CompoundSelector, combinator: Combinator) -> Self {
        Self {
            compound,
            combinator,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<SelectorPart>,
}

impl ComplexSelector {
    pub fn new(parts: Vec<SelectorPart>) -> Self {
        Self { parts }
    }

    /// True when any compound of this selector contains `&`.
    pub fn contains_parent(&self) -> bool {
        self.parts.iter().any(|p| p.compound.contains_parent())
    }

    /// Returns the single simple selector when the selector is exactly one
    /// simple selector (e.g. `.btn`).
    pub fn as_simple(&self) -> Option<&Selector> {
        match self.parts.as_slice() {
            [part] if part.compound.selectors.len() == 1 => part.compound.selectors.first(),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn new(selectors: Vec<ComplexSelector>) -> Self {
        Self { selectors }
    }

    /// Parses a complete selector list; trailing garbage is an error.
    pub fn parse(source: &str) -> Result<SelectorList, CssError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(CssError::selector(source, "empty selector"));
        }
        match parse_selector_list(trimmed) {
            Ok((remaining, list)) if remaining.trim().is_empty() => Ok(list),
            Ok((remaining, _)) => Err(CssError::selector(
                source,
                format!("unexpected '{}'", remaining.trim()),
            )),
            Err(e) => Err(CssError::selector(source, e.to_string())),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Type(name) => write!(f, "{name}"),
            Selector::Class(name) => write!(f, ".{name}"),
            Selector::Id(name) => write!(f, "#{name}"),
            Selector::Universal => write!(f, "*"),
            Selector::Parent => write!(f, "&"),
            Selector::Attribute(raw) => write!(f, "[{raw}]"),
            Selector::PseudoClass(name, args) => {
                write!(f, ":{name}")?;
                write_pseudo_args(f, args)
            }
            Selector::PseudoElement(name, args) => {
                write!(f, "::{name}")?;
                write_pseudo_args(f, args)
            }
        }
    }
}

fn write_pseudo_args(f: &mut fmt::Formatter<'_>, args: &Option<PseudoArgs>) -> fmt::Result {
    match args {
        None => Ok(()),
        Some(PseudoArgs::Selectors(list)) => write!(f, "({list})"),
        Some(PseudoArgs::Raw(raw)) => write!(f, "({raw})"),
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for selector in &self.selectors {
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ComplexSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            if part.compound.is_empty() {
                // Relative selector: leading combinator only.
                if part.combinator != Combinator::None && part.combinator != Combinator::Descendant {
                    write!(f, "{} ", part.combinator.symbol())?;
                }
                continue;
            }
            write!(f, "{}", part.compound)?;
            match part.combinator {
                Combinator::None => {}
                Combinator::Descendant => write!(f, " ")?,
                other => write!(f, " {} ", other.symbol())?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, selector) in self.selectors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}
