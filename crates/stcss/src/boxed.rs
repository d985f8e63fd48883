//! Structured (boxed) variable values.

use std::fmt;

use indexmap::IndexMap;

pub const STRING_TYPE: &str = "st-string";
pub const MAP_TYPE: &str = "st-map";
pub const ARRAY_TYPE: &str = "st-array";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoxedValue {
    Text(String),
    Map(IndexMap<String, Boxed>),
    List(Vec<Boxed>),
}

/// An evaluated variable value tagged with the custom value type that
/// produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Boxed {
    pub type_name: String,
    pub value: BoxedValue,
}

impl Boxed {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            type_name: STRING_TYPE.to_string(),
            value: BoxedValue::Text(value.into()),
        }
    }

    pub fn map(entries: IndexMap<String, Boxed>) -> Self {
        Self {
            type_name: MAP_TYPE.to_string(),
            value: BoxedValue::Map(entries),
        }
    }

    pub fn list(items: Vec<Boxed>) -> Self {
        Self {
            type_name: ARRAY_TYPE.to_string(),
            value: BoxedValue::List(items),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            BoxedValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_structured(&self) -> bool {
        !matches!(self.value, BoxedValue::Text(_))
    }

    /// Descends one path segment: a key for maps, an index for lists.
    pub fn get(&self, segment: &str) -> Option<&Boxed> {
        match &self.value {
            BoxedValue::Map(entries) => entries.get(segment),
            BoxedValue::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            BoxedValue::Text(_) => None,
        }
    }

    /// Descends a full path.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Boxed> {
        path.iter()
            .try_fold(self, |current, segment| current.get(segment.as_ref()))
    }
}

/// Literal form: text as is, maps as `st-map(key value, ...)`, lists as
/// `st-array(a, b)`.
impl fmt::Display for Boxed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            BoxedValue::Text(text) => write!(f, "{text}"),
            BoxedValue::Map(entries) => {
                write!(f, "{}(", self.type_name)?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} {value}")?;
                }
                write!(f, ")")
            }
            BoxedValue::List(items) => {
                write!(f, "{}(", self.type_name)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_lookup() {
        let mut inner = IndexMap::new();
        inner.insert("light".to_string(), Boxed::text("white"));
        let mut outer = IndexMap::new();
        outer.insert("bg".to_string(), Boxed::map(inner));
        outer.insert("sizes".to_string(), Boxed::list(vec![Boxed::text("1px"), Boxed::text("2px")]));
        let value = Boxed::map(outer);

        assert_eq!(value.get_path(&["bg", "light"]).and_then(Boxed::as_text), Some("white"));
        assert_eq!(value.get_path(&["sizes", "1"]).and_then(Boxed::as_text), Some("2px"));
        assert!(value.get_path(&["sizes", "5"]).is_none());
        assert!(value.get_path(&["bg", "light", "x"]).is_none());
    }

    #[test]
    fn test_literal_form() {
        let mut entries = IndexMap::new();
        entries.insert("a".to_string(), Boxed::text("red"));
        entries.insert("b".to_string(), Boxed::list(vec![Boxed::text("1"), Boxed::text("2")]));
        assert_eq!(Boxed::map(entries).to_string(), "st-map(a red, b st-array(1, 2))");
    }
}
