//! Offset to line/column mapping.

/// A 1-based line/column position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Converts a byte offset into a 1-based line and column (in characters).
///
/// Offsets past the end of `source` clamp to the end.
pub fn position_at(source: &str, offset: usize) -> Position {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    Position { line, column }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_line() {
        assert_eq!(position_at("abc", 1), Position { line: 1, column: 2 });
    }

    #[test]
    fn test_after_newline() {
        assert_eq!(position_at("a\nbc", 3), Position { line: 2, column: 2 });
    }

    #[test]
    fn test_clamps_to_end() {
        assert_eq!(position_at("ab", 10), Position { line: 1, column: 3 });
    }
}
