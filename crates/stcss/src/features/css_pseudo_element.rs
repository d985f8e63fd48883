//! Custom pseudo-elements: `Button::label` targets the `label` class of
//! the stylesheet whose root `Button` resolves to.

use phf::phf_set;

use crate::meta::ROOT_CLASS;
use crate::resolver::CssResolve;
use crate::symbols::Symbol;

static NATIVE_PSEUDO_ELEMENTS: phf::Set<&'static str> = phf_set! {
    "after", "backdrop", "before", "cue", "cue-region", "file-selector-button",
    "first-letter", "first-line", "grammar-error", "highlight", "marker",
    "part", "placeholder", "selection", "slotted", "spelling-error",
    "target-text", "view-transition", "view-transition-group",
    "view-transition-image-pair", "view-transition-new", "view-transition-old",
};

pub fn is_native_pseudo_element(name: &str) -> bool {
    name.starts_with('-') || NATIVE_PSEUDO_ELEMENTS.contains(name.to_ascii_lowercase().as_str())
}

pub mod diagnostics {
    use crate::diagnostics::DiagnosticType;

    pub fn unknown_pseudo_element(name: &str) -> DiagnosticType {
        DiagnosticType::warning(
            "UNKNOWN_PSEUDO_ELEMENT",
            format!("unknown pseudo-element \"{name}\""),
        )
    }
}

/// The class `name` of the closest stylesheet whose root is part of
/// `chain`.
pub fn find_part(chain: &[CssResolve], name: &str) -> Option<CssResolve> {
    chain
        .iter()
        .filter(|entry| matches!(&entry.symbol, Symbol::Class(class) if class.name == ROOT_CLASS))
        .find_map(|entry| match entry.meta.symbols.get_main(name) {
            Some(symbol @ Symbol::Class(_)) => Some(CssResolve::new(entry.meta.clone(), symbol.clone())),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_pseudo_elements() {
        assert!(is_native_pseudo_element("before"));
        assert!(is_native_pseudo_element("-webkit-scrollbar"));
        assert!(!is_native_pseudo_element("label"));
    }
}
