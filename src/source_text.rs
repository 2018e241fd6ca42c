//! Conversions between byte offsets (used by [`crate::arena::NodeArena`]
//! node records) and 1-based line/column [`SourcePosition`]s (used by
//! [`crate::edit::TextEdit`] ranges and diagnostics).
//!
//! Column is counted in UTF-8 bytes within the line, matching the byte
//! offsets the arena stores; a formatter operating on source text that is
//! not purely ASCII would need a grapheme-aware column instead, which is
//! out of scope here (spec.md's Non-goals exclude semantic analysis, and
//! byte-accurate columns are sufficient for every built-in rule).

use crate::position::SourcePosition;

/// A precomputed table of line-start byte offsets for one source buffer,
/// enabling O(log n) offset <-> position conversions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the byte offset where line `i + 1` begins.
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            text_len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Converts a 1-based line/column position into a byte offset.
    ///
    /// # Panics
    ///
    /// Panics if `position`'s line exceeds the number of lines indexed.
    pub fn offset_of(&self, position: SourcePosition) -> usize {
        let line_index = position.line() as usize - 1;
        let line_start = self.line_starts[line_index];
        (line_start + position.column() as usize - 1).min(self.text_len)
    }

    /// Converts a byte offset into a 1-based line/column position.
    pub fn position_of(&self, offset: usize) -> SourcePosition {
        let offset = offset.min(self.text_len);
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line_index] + 1;
        SourcePosition::new(line_index as u32 + 1, column as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_roundtrips() {
        let idx = LineIndex::new("hello world");
        let pos = idx.position_of(6);
        assert_eq!(pos, SourcePosition::new(1, 7));
        assert_eq!(idx.offset_of(pos), 6);
    }

    #[test]
    fn multi_line_offsets() {
        let text = "abc\ndef\nghi";
        let idx = LineIndex::new(text);
        assert_eq!(idx.line_count(), 3);
        assert_eq!(idx.position_of(4), SourcePosition::new(2, 1));
        assert_eq!(idx.position_of(7), SourcePosition::new(2, 4));
        assert_eq!(idx.offset_of(SourcePosition::new(3, 1)), 8);
    }

    #[test]
    fn position_at_end_of_text() {
        let text = "abc\ndef";
        let idx = LineIndex::new(text);
        let pos = idx.position_of(text.len());
        assert_eq!(pos, SourcePosition::new(2, 4));
    }
}
