use std::fmt;

/// A place in a text: character offset, plus 1-based line and column (in
/// characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Self = Self {
        offset: 0,
        line: 1,
        column: 1,
    };

    /// Offsets past the end clamp to the end of `text`; offsets inside a
    /// multi-byte character snap back to its first byte.
    pub fn from_byte_offset(text: &str, byte_offset: usize) -> Self {
        let mut end = byte_offset.min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let before = &text[..end];
        let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
        Self {
            offset: before.chars().count(),
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
