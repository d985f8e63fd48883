use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, multispace0},
    combinator::{map, opt},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{preceded, tuple},
};

use super::{
    Combinator, ComplexSelector, CompoundSelector, PseudoArgs, Selector, SelectorList,
    SelectorPart,
};

/// Pseudo-classes whose arguments are a selector list.
const SELECTOR_PSEUDOS: &[&str] = &[
    "not", "is", "where", "has", "matches", "any", "global", "host", "host-context", "slotted",
];

/// Parses a CSS identifier (alphanumerics, dashes, underscores, non-ASCII and
/// backslash escapes). Escapes are kept verbatim.
pub fn parse_ident(input: &str) -> IResult<&str, &str> {
    let mut end = 0;
    let mut chars = input.char_indices().peekable();
    while let Some(&(i, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            chars.next();
            end = i + c.len_utf8();
        } else if c == '\\' {
            chars.next();
            match chars.next() {
                Some((j, escaped)) => end = j + escaped.len_utf8(),
                None => end = i + 1,
            }
        } else {
            break;
        }
    }
    if end == 0 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::AlphaNumeric)));
    }
    Ok((&input[end..], &input[..end]))
}

/// Parses a simple selector: Type, .Class, #ID, &, *, [attr], :pseudo or ::pseudo.
pub fn parse_simple_selector(input: &str) -> IResult<&str, Selector> {
    alt((
        map(preceded(char('#'), parse_ident), |s| {
            Selector::Id(s.to_string())
        }),
        map(preceded(char('.'), parse_ident), |s| {
            Selector::Class(s.to_string())
        }),
        parse_pseudo,
        map(char('&'), |_| Selector::Parent),
        map(char('*'), |_| Selector::Universal),
        parse_attribute_selector,
        map(parse_ident, |s| Selector::Type(s.to_string())),
    ))(input)
}

/// Parses a compound selector (e.g., "Button.primary:hover").
pub fn parse_compound_selector(input: &str) -> IResult<&str, CompoundSelector> {
    let (input, first) = parse_simple_selector(input)?;
    // No whitespace allowed between simple selectors of one compound
    let (input, rest) = many0(parse_simple_selector)(input)?;

    let mut selectors = vec![first];
    selectors.extend(rest);
    Ok((input, CompoundSelector::new(selectors)))
}

fn parse_combinator(input: &str) -> IResult<&str, Combinator> {
    alt((
        map(char('>'), |_| Combinator::Child),
        map(char('+'), |_| Combinator::AdjacentSibling),
        map(char('~'), |_| Combinator::GeneralSibling),
    ))(input)
}

/// Parses a complex selector with combinators (e.g., "Container > Button").
pub fn parse_complex_selector(input: &str) -> IResult<&str, ComplexSelector> {
    let mut parts = Vec::new();

    // Relative selectors (`> .child`) start with a combinator.
    let (input, _) = multispace0(input)?;
    let (mut input, mut current_compound) = match parse_combinator(input) {
        Ok((after_op, leading)) => {
            parts.push(SelectorPart::new(CompoundSelector::default(), leading));
            let (after_ws, _) = multispace0(after_op)?;
            parse_compound_selector(after_ws)?
        }
        Err(_) => parse_compound_selector(input)?,
    };

    loop {
        let (rem, ws) = multispace0(input)?;

        if let Ok((after_op, found_combinator)) = parse_combinator(rem) {
            let (after_ws, _) = multispace0(after_op)?;
            match parse_compound_selector(after_ws) {
                Ok((next_input, next_compound)) => {
                    parts.push(SelectorPart::new(current_compound, found_combinator));
                    current_compound = next_compound;
                    input = next_input;
                    continue;
                }
                Err(_) => break,
            }
        }

        if !ws.is_empty() {
            match parse_compound_selector(rem) {
                Ok((next_input, next_compound)) => {
                    parts.push(SelectorPart::new(current_compound, Combinator::Descendant));
                    current_compound = next_compound;
                    input = next_input;
                    continue;
                }
                Err(_) => break,
            }
        }

        break;
    }

    parts.push(SelectorPart::new(current_compound, Combinator::None));
    Ok((input, ComplexSelector::new(parts)))
}

/// Parses a comma-separated list of selectors (e.g., ".a, .b > .c").
pub fn parse_selector_list(input: &str) -> IResult<&str, SelectorList> {
    let (input, _) = multispace0(input)?;
    let (input, first) = parse_complex_selector(input)?;
    let (input, rest) = many0(preceded(
        tuple((multispace0, char(','), multispace0)),
        parse_complex_selector,
    ))(input)?;
    let (input, _) = multispace0(input)?;

    let mut selectors = vec![first];
    selectors.extend(rest);
    Ok((input, SelectorList::new(selectors)))
}

fn parse_pseudo(input: &str) -> IResult<&str, Selector> {
    let (input, colons) = alt((tag("::"), tag(":")))(input)?;
    let (input, name) = parse_ident(input)?;
    let (input, raw_args) = opt(parse_parenthesized)(input)?;

    let args = raw_args.map(|raw| pseudo_args(name, raw));
    let selector = if colons == "::" {
        Selector::PseudoElement(name.to_string(), args)
    } else {
        Selector::PseudoClass(name.to_string(), args)
    };
    Ok((input, selector))
}

fn pseudo_args(name: &str, raw: &str) -> PseudoArgs {
    let raw = raw.trim();
    if SELECTOR_PSEUDOS.contains(&name.to_ascii_lowercase().as_str()) {
        if let Ok(list) = SelectorList::parse(raw) {
            return PseudoArgs::Selectors(list);
        }
    }
    PseudoArgs::Raw(raw.to_string())
}

/// Consumes `( ... )` with balanced nesting and quotes; returns the inner text.
fn parse_parenthesized(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('(') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    }
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[1..i]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn parse_attribute_selector(input: &str) -> IResult<&str, Selector> {
    if !input.starts_with('[') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    }
    let mut quote: Option<char> = None;
    for (i, c) in input.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => {
                return Ok((&input[i + 1..], Selector::Attribute(input[1..i].to_string())));
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_with_escape() {
        let (rest, ident) = parse_ident(r"a\:b rest").unwrap();
        assert_eq!(ident, r"a\:b");
        assert_eq!(rest, " rest");
    }

    #[test]
    fn test_parenthesized_balances_nested_parens() {
        let (rest, inner) = parse_parenthesized("(a(b) \")\")x").unwrap();
        assert_eq!(inner, "a(b) \")\"");
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_unknown_pseudo_args_are_raw() {
        let (_, selector) = parse_simple_selector(":size( large )").unwrap();
        assert_eq!(
            selector,
            Selector::PseudoClass("size".into(), Some(PseudoArgs::Raw("large".into())))
        );
    }
}
