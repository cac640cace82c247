//! Source locations and byte/character offset translation
//!
//! The tokenizer reports positions as `(line, byte column)` pairs. Nodes store
//! character offsets instead, so that comment attachment and verbatim slicing
//! work the same way regardless of how many bytes a character occupies.
//! [`SourceIndex`] scans every line once: ASCII lines translate with plain
//! arithmetic, lines containing multi-byte characters get a lookup table.

use serde::Serialize;
use std::fmt;

/// A half-open range in the source, expressed in characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub start_line: usize,
    pub start_char: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_char: usize,
    pub end_column: usize,
}

impl Location {
    /// A range covering `size` characters on a single line
    pub fn token(line: usize, char: usize, column: usize, size: usize) -> Self {
        Self {
            start_line: line,
            start_char: char,
            start_column: column,
            end_line: line,
            end_char: char + size,
            end_column: column + size,
        }
    }

    /// A zero-width marker for productions whose bounds are not known yet
    pub fn fixed(line: usize, char: usize, column: usize) -> Self {
        Self::token(line, char, column, 0)
    }

    /// Span from the start of `self` to the end of `other`
    pub fn to(&self, other: &Location) -> Self {
        Self {
            start_line: self.start_line,
            start_char: self.start_char,
            start_column: self.start_column,
            end_line: self.end_line.max(other.end_line),
            end_char: other.end_char,
            end_column: other.end_column,
        }
    }

    /// Same start, new end bounds
    pub fn with_end(&self, end_line: usize, end_char: usize, end_column: usize) -> Self {
        Self {
            end_line,
            end_char,
            end_column,
            ..*self
        }
    }

    /// Same end, new start bounds
    pub fn with_start(&self, start_line: usize, start_char: usize, start_column: usize) -> Self {
        Self {
            start_line,
            start_char,
            start_column,
            ..*self
        }
    }

    pub fn contains(&self, other: &Location) -> bool {
        self.start_char <= other.start_char && other.end_char <= self.end_char
    }

    pub fn is_empty(&self) -> bool {
        self.start_char == self.end_char
    }

    pub fn len(&self) -> usize {
        self.end_char - self.start_char
    }

    /// `[start_line, start_char, end_line, end_char]`, the compact form used by dumps
    pub fn to_array(&self) -> [usize; 4] {
        [self.start_line, self.start_char, self.end_line, self.end_char]
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Offsets for one source line
#[derive(Debug, Clone)]
enum LineOffsets {
    /// Every byte is a character
    SingleByte { start_char: usize, len: usize },
    /// `byte_to_char[b]` is the character index within the line of byte `b`,
    /// `char_to_byte[c]` is the byte index of character `c`
    MultiByte {
        start_char: usize,
        byte_to_char: Vec<usize>,
        char_to_byte: Vec<usize>,
    },
}

impl LineOffsets {
    fn start_char(&self) -> usize {
        match self {
            LineOffsets::SingleByte { start_char, .. } => *start_char,
            LineOffsets::MultiByte { start_char, .. } => *start_char,
        }
    }

    fn char_column(&self, byte_column: usize) -> usize {
        match self {
            LineOffsets::SingleByte { .. } => byte_column,
            LineOffsets::MultiByte { byte_to_char, .. } => byte_to_char
                .get(byte_column)
                .copied()
                .unwrap_or_else(|| byte_to_char.last().copied().unwrap_or(0)),
        }
    }

    fn char_count(&self) -> usize {
        match self {
            LineOffsets::SingleByte { len, .. } => *len,
            LineOffsets::MultiByte { char_to_byte, .. } => char_to_byte.len().saturating_sub(1),
        }
    }
}

/// Per-line translation table between byte columns and character offsets
#[derive(Debug, Clone)]
pub struct SourceIndex {
    lines: Vec<LineOffsets>,
    line_byte_starts: Vec<usize>,
    char_len: usize,
    byte_len: usize,
}

impl SourceIndex {
    pub fn new(source: &str) -> Self {
        let mut lines = Vec::new();
        let mut line_byte_starts = Vec::new();
        let mut start_char = 0;
        let mut byte_start = 0;

        for line in source.split_inclusive('\n') {
            line_byte_starts.push(byte_start);
            if line.is_ascii() {
                lines.push(LineOffsets::SingleByte {
                    start_char,
                    len: line.len(),
                });
                start_char += line.len();
            } else {
                let mut byte_to_char = Vec::with_capacity(line.len() + 1);
                let mut char_to_byte = Vec::with_capacity(line.len() + 1);
                for (index, (offset, ch)) in line.char_indices().enumerate() {
                    char_to_byte.push(offset);
                    for _ in 0..ch.len_utf8() {
                        byte_to_char.push(index);
                    }
                }
                let count = char_to_byte.len();
                byte_to_char.push(count);
                char_to_byte.push(line.len());
                lines.push(LineOffsets::MultiByte {
                    start_char,
                    byte_to_char,
                    char_to_byte,
                });
                start_char += count;
            }
            byte_start += line.len();
        }

        // A trailing empty line still needs an entry so that EOF positions resolve.
        if source.is_empty() || source.ends_with('\n') {
            line_byte_starts.push(byte_start);
            lines.push(LineOffsets::SingleByte { start_char, len: 0 });
        }

        Self {
            lines,
            line_byte_starts,
            char_len: start_char,
            byte_len: source.len(),
        }
    }

    /// Number of lines, counting a final unterminated line
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of characters in the source
    pub fn char_len(&self) -> usize {
        self.char_len
    }

    /// Character column of a `(line, byte column)` pair; lines are 1-based
    pub fn char_column(&self, line: usize, byte_column: usize) -> usize {
        match self.lines.get(line.saturating_sub(1)) {
            Some(offsets) => offsets.char_column(byte_column),
            None => 0,
        }
    }

    /// Absolute character offset of a `(line, byte column)` pair
    pub fn char_pos(&self, line: usize, byte_column: usize) -> usize {
        match self.lines.get(line.saturating_sub(1)) {
            Some(offsets) => offsets.start_char() + offsets.char_column(byte_column),
            None => self.char_len,
        }
    }

    /// Absolute character offset of the first character of `line`
    pub fn line_start_char(&self, line: usize) -> usize {
        self.lines
            .get(line.saturating_sub(1))
            .map(LineOffsets::start_char)
            .unwrap_or(self.char_len)
    }

    /// Byte offset of a `(line, byte column)` pair
    pub fn byte_pos(&self, line: usize, byte_column: usize) -> usize {
        self.line_byte_starts
            .get(line.saturating_sub(1))
            .map(|start| start + byte_column)
            .unwrap_or(self.byte_len)
    }

    /// Translate an absolute character offset back into a byte offset
    pub fn byte_offset(&self, char_pos: usize) -> usize {
        if char_pos >= self.char_len {
            return self.byte_len;
        }
        let index = self
            .lines
            .partition_point(|line| line.start_char() <= char_pos)
            .saturating_sub(1);
        let line = &self.lines[index];
        let column = char_pos - line.start_char();
        let byte_start = self.line_byte_starts[index];
        match line {
            LineOffsets::SingleByte { .. } => byte_start + column,
            LineOffsets::MultiByte { char_to_byte, .. } => {
                byte_start + char_to_byte.get(column).copied().unwrap_or(0)
            }
        }
    }

    /// 1-based line containing an absolute character offset
    pub fn line_of(&self, char_pos: usize) -> usize {
        self.lines
            .partition_point(|line| line.start_char() <= char_pos)
            .max(1)
    }

    /// Location spanning two absolute character offsets
    pub fn location(&self, start_char: usize, end_char: usize) -> Location {
        Location {
            start_line: self.line_of(start_char),
            start_char,
            start_column: self.column_of(start_char),
            end_line: self.line_of(end_char),
            end_char,
            end_column: self.column_of(end_char),
        }
    }

    /// Character column of an absolute character offset
    pub fn column_of(&self, char_pos: usize) -> usize {
        let index = self
            .lines
            .partition_point(|line| line.start_char() <= char_pos)
            .saturating_sub(1);
        let line = &self.lines[index];
        (char_pos - line.start_char()).min(line.char_count())
    }

    /// Slice the source by character offsets
    pub fn slice<'a>(&self, source: &'a str, start_char: usize, end_char: usize) -> &'a str {
        let start = self.byte_offset(start_char).min(source.len());
        let end = self.byte_offset(end_char).min(source.len()).max(start);
        &source[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_take_the_furthest_end_line() {
        let a = Location::token(1, 0, 0, 3);
        let b = Location {
            start_line: 2,
            start_char: 10,
            start_column: 2,
            end_line: 4,
            end_char: 30,
            end_column: 3,
        };

        let span = a.to(&b);
        assert_eq!(span.start_char, 0);
        assert_eq!(span.end_char, 30);
        assert_eq!(span.end_line, 4);
        assert!(span.contains(&a));
        assert!(span.contains(&b));
    }

    #[test]
    fn fixed_locations_are_empty() {
        let loc = Location::fixed(3, 12, 4);
        assert!(loc.is_empty());
        assert_eq!(loc.to_array(), [3, 12, 3, 12]);
    }

    #[test]
    fn ascii_lines_translate_arithmetically() {
        let index = SourceIndex::new("foo\nbar baz\n");
        assert_eq!(index.char_pos(1, 0), 0);
        assert_eq!(index.char_pos(2, 4), 8);
        assert_eq!(index.char_column(2, 4), 4);
        assert_eq!(index.char_len(), 12);
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn multibyte_lines_use_a_table() {
        let source = "é = 1\nx = \"ü\" + y\n";
        let index = SourceIndex::new(source);

        // `=` is byte 3 on line 1 but character 2
        assert_eq!(index.char_column(1, 3), 2);
        assert_eq!(index.char_pos(1, 3), 2);

        // `+` on line 2 is byte 9, character 8, absolute 6 + 8
        assert_eq!(index.char_column(2, 9), 8);
        assert_eq!(index.char_pos(2, 9), 14);
        assert_eq!(index.byte_offset(14), source.find('+').unwrap());
    }

    #[test]
    fn slices_by_character_offsets() {
        let source = "a = \"日本\"\nb\n";
        let index = SourceIndex::new(source);
        assert_eq!(index.slice(source, 4, 8), "\"日本\"");
        assert_eq!(index.slice(source, 9, 10), "b");
    }
}
