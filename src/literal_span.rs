//! Precomputed bitmap answering "is this byte offset inside a string
//! literal or comment" in O(1), replacing the naive
//! scan-from-offset-zero-on-every-call approach spec §9's second Open
//! Question calls out as O(n²) in aggregate.
//!
//! Computed once per file during the analyze/format stages; rules that
//! need to avoid reformatting inside string/char literals or comments
//! (whitespace, line-length wrap) query it instead of rescanning.

/// A per-byte-offset map of whether that offset falls inside a literal or
/// comment span. Built once per source buffer.
#[derive(Debug, Clone)]
pub struct LiteralSpanBitmap {
    in_literal_or_comment: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    LineComment,
    BlockComment,
    StringLiteral,
    CharLiteral,
}

impl LiteralSpanBitmap {
    /// Scans `source` once, building a byte-indexed bitmap. Recognizes
    /// `//` line comments, `/* */` block comments, `"..."` string
    /// literals, and `'...'` char literals, with `\`-escaping honored
    /// inside both literal kinds.
    pub fn compute(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut map = vec![false; bytes.len()];
        let mut state = ScanState::Normal;
        let mut i = 0;
        let mut escaped = false;

        while i < bytes.len() {
            let b = bytes[i];
            match state {
                ScanState::Normal => {
                    if b == b'/' && bytes.get(i + 1) == Some(&b'/') {
                        state = ScanState::LineComment;
                        map[i] = true;
                    } else if b == b'/' && bytes.get(i + 1) == Some(&b'*') {
                        state = ScanState::BlockComment;
                        map[i] = true;
                    } else if b == b'"' {
                        state = ScanState::StringLiteral;
                        map[i] = true;
                    } else if b == b'\'' {
                        state = ScanState::CharLiteral;
                        map[i] = true;
                    }
                }
                ScanState::LineComment => {
                    map[i] = true;
                    if b == b'\n' {
                        state = ScanState::Normal;
                        map[i] = false;
                    }
                }
                ScanState::BlockComment => {
                    map[i] = true;
                    if b == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        map[i + 1] = true;
                        i += 1;
                        state = ScanState::Normal;
                    }
                }
                ScanState::StringLiteral => {
                    map[i] = true;
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        state = ScanState::Normal;
                    }
                }
                ScanState::CharLiteral => {
                    map[i] = true;
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'\'' {
                        state = ScanState::Normal;
                    }
                }
            }
            i += 1;
        }

        Self {
            in_literal_or_comment: map,
        }
    }

    /// O(1) lookup: is `offset` inside a literal or comment span.
    pub fn contains(&self, offset: usize) -> bool {
        self.in_literal_or_comment
            .get(offset)
            .copied()
            .unwrap_or(false)
    }
}
