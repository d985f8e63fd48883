//! Nesting selector (`&`) resolution.
//!
//! ```css
//! .btn {
//!     &:hover { }      /* .btn:hover */
//!     & > .icon { }    /* .btn > .icon */
//!     .label { }       /* .btn .label (implicit descendant) */
//!     > .child { }     /* .btn > .child */
//! }
//! ```
//!
//! - `&` is replaced by the parent selector
//! - `&.class` appends to the parent's last compound
//! - Nested without `&` implies a descendant (or the leading combinator)

use super::{Combinator, ComplexSelector, CompoundSelector, Selector, SelectorList, SelectorPart};

/// Combines every parent selector with every nested selector (parents outer).
pub fn nest_selectors(parents: &SelectorList, children: &SelectorList) -> SelectorList {
    let mut combined = Vec::new();
    for parent in &parents.selectors {
        for child in &children.selectors {
            combined.push(nest_complex(parent, child));
        }
    }
    SelectorList::new(combined)
}

fn nest_complex(parent: &ComplexSelector, child: &ComplexSelector) -> ComplexSelector {
    if child.contains_parent() {
        return replace_parent(child, parent);
    }

    let mut parts = parent.parts.clone();
    let mut child_parts = child.parts.iter().peekable();

    // `> .child` keeps its leading combinator, plain `.child` is a descendant.
    let mut joint = Combinator::Descendant;
    if let Some(first) = child_parts.peek() {
        if first.compound.is_empty() {
            joint = first.combinator;
            child_parts.next();
        }
    }
    if let Some(last) = parts.last_mut() {
        if matches!(last.combinator, Combinator::None) {
            last.combinator = joint;
        }
    }
    parts.extend(child_parts.cloned());
    ComplexSelector::new(parts)
}

/// Replaces every `&` in `selector` with `replacement`.
///
/// Simple selectors following `&` in the same compound are appended to the
/// replacement's last compound (`&:hover` → `.btn:hover`).
pub fn replace_parent(selector: &ComplexSelector, replacement: &ComplexSelector) -> ComplexSelector {
    let mut parts = Vec::new();

    for part in &selector.parts {
        if !part.compound.contains_parent() {
            parts.push(part.clone());
            continue;
        }

        let mut current: Vec<Selector> = Vec::new();
        for simple in &part.compound.selectors {
            if !matches!(simple, Selector::Parent) {
                current.push(simple.clone());
                continue;
            }
            let Some((last, leading)) = replacement.parts.split_last() else {
                continue;
            };
            for rep in leading {
                current.extend(rep.compound.selectors.iter().cloned());
                parts.push(SelectorPart::new(
                    CompoundSelector::new(std::mem::take(&mut current)),
                    rep.combinator,
                ));
            }
            current.extend(last.compound.selectors.iter().cloned());
        }
        parts.push(SelectorPart::new(CompoundSelector::new(current), part.combinator));
    }

    ComplexSelector::new(parts)
}
