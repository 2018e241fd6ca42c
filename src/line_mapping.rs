//! Bidirectional original <-> formatted line correspondence (spec §3, §4.4
//! emit stage, §6 line-mapping export, testable property §8.7).

use crate::edit::TextEdit;
use crate::source_text::LineIndex;
use std::collections::HashMap;

/// An immutable bidirectional map between original and formatted
/// 1-based line numbers.
///
/// A deleted original line maps to `None` in `to_formatted`; a newly
/// inserted formatted line maps to `None` in `to_original`.
#[derive(Debug, Clone)]
pub struct LineMapping {
    original_to_formatted: HashMap<u32, u32>,
    formatted_to_original: HashMap<u32, u32>,
    original_line_count: u32,
    formatted_line_count: u32,
}

impl LineMapping {
    /// Builds a mapping from a correspondence list. Entries are
    /// `(original_line, formatted_line)` pairs for lines that survive;
    /// deleted/inserted lines are simply absent from the list.
    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (u32, u32)>,
        original_line_count: u32,
        formatted_line_count: u32,
    ) -> Self {
        let mut original_to_formatted = HashMap::new();
        let mut formatted_to_original = HashMap::new();
        for (orig, formatted) in pairs {
            original_to_formatted.insert(orig, formatted);
            formatted_to_original.insert(formatted, orig);
        }
        Self {
            original_to_formatted,
            formatted_to_original,
            original_line_count,
            formatted_line_count,
        }
    }

    /// The identity mapping: every line maps to itself. Used when a rule
    /// run produces no edits (spec scenario S1).
    pub fn identity(line_count: u32) -> Self {
        Self::from_pairs((1..=line_count).map(|l| (l, l)), line_count, line_count)
    }

    pub fn to_formatted(&self, original_line: u32) -> Option<u32> {
        self.original_to_formatted.get(&original_line).copied()
    }

    pub fn to_original(&self, formatted_line: u32) -> Option<u32> {
        self.formatted_to_original.get(&formatted_line).copied()
    }

    pub fn original_line_count(&self) -> u32 {
        self.original_line_count
    }

    pub fn formatted_line_count(&self) -> u32 {
        self.formatted_line_count
    }

    /// `formatted_line_count - original_line_count`.
    pub fn line_delta(&self) -> i64 {
        self.formatted_line_count as i64 - self.original_line_count as i64
    }

    /// Derives a [`LineMapping`] from the resolved, non-overlapping edit
    /// set the emit stage applied to produce `formatted` from `original`
    /// (spec §4.4's emit stage, which "computes LineMapping").
    ///
    /// Walks `edits` in ascending order, advancing a running line delta:
    /// a same-line edit that inserts newlines (e.g. a line-length wrap)
    /// keeps its original line mapped and bumps every later line forward;
    /// an edit spanning multiple original lines (e.g. brace-style joining
    /// a brace onto the previous line) marks its interior lines deleted.
    /// `formatted_line_count` is read directly off `formatted` rather than
    /// accumulated, so it is always exact even if a rule's edit produced
    /// more or fewer newlines than this walk assumed.
    pub fn from_resolved_edits(original: &str, formatted: &str, edits: &[TextEdit]) -> Self {
        let original_line_count = LineIndex::new(original).line_count() as u32;
        let formatted_line_count = LineIndex::new(formatted).line_count() as u32;

        let mut ordered = edits.to_vec();
        ordered.sort();

        let mut pairs = Vec::new();
        let mut cursor = 1u32;
        let mut delta: i64 = 0;

        for edit in &ordered {
            let start_line = edit.range().start().line();
            let end_line = edit.range().end().line();

            while cursor < start_line {
                pairs.push((cursor, (cursor as i64 + delta) as u32));
                cursor += 1;
            }

            let inserted_lines = edit.replacement().matches('\n').count() as i64;
            let deleted_lines = end_line.saturating_sub(start_line) as i64;

            if cursor == start_line {
                // First edit touching this line: the line itself survives
                // (it isn't wholly deleted, only rewritten), its interior
                // continuation lines (if any) are dropped from `pairs`.
                pairs.push((start_line, (cursor as i64 + delta) as u32));
                cursor = end_line + 1;
            }
            // A second edit already on an already-recorded line still
            // contributes its newline delta even though no new pair is
            // recorded for it.
            delta += inserted_lines - deleted_lines;
        }

        while cursor <= original_line_count {
            pairs.push((cursor, (cursor as i64 + delta).max(1) as u32));
            cursor += 1;
        }

        Self::from_pairs(pairs, original_line_count, formatted_line_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapping_round_trips() {
        let mapping = LineMapping::identity(5);
        for line in 1..=5 {
            let formatted = mapping.to_formatted(line).unwrap();
            assert_eq!(mapping.to_original(formatted), Some(line));
        }
        assert_eq!(mapping.line_delta(), 0);
    }

    #[test]
    fn deleted_line_maps_to_none() {
        // Original line 2 was deleted; 1->1, 3->2.
        let mapping = LineMapping::from_pairs([(1, 1), (3, 2)], 3, 2);
        assert_eq!(mapping.to_formatted(2), None);
        assert_eq!(mapping.to_original(1), Some(1));
        assert_eq!(mapping.line_delta(), -1);
    }

    #[test]
    fn inserted_line_has_no_original() {
        // A new formatted line 2 was inserted; original 1->1, 2->3.
        let mapping = LineMapping::from_pairs([(1, 1), (2, 3)], 2, 3);
        assert_eq!(mapping.to_original(2), None);
        assert_eq!(mapping.line_delta(), 1);
    }

    #[test]
    fn from_resolved_edits_is_identity_with_no_edits() {
        let source = "a\nb\nc\n";
        let mapping = LineMapping::from_resolved_edits(source, source, &[]);
        assert_eq!(mapping.line_delta(), 0);
        assert_eq!(mapping.to_formatted(2), Some(2));
    }

    #[test]
    fn from_resolved_edits_tracks_a_same_line_wrap() {
        use crate::edit::EditPriority;
        use crate::position::{SourcePosition, SourceRange};

        let original = "aaaa bbbb\nsecond\n";
        let formatted = "aaaa\n    bbbb\nsecond\n";
        let edit = TextEdit::new(
            SourceRange::new(SourcePosition::new(1, 5), SourcePosition::new(1, 6)),
            "\n    ",
            "line-length",
            EditPriority::Normal,
        );
        let mapping = LineMapping::from_resolved_edits(original, formatted, &[edit]);
        assert_eq!(mapping.to_formatted(1), Some(1));
        assert_eq!(mapping.to_formatted(2), Some(3));
        assert_eq!(mapping.formatted_line_count(), 3);
    }

    #[test]
    fn from_resolved_edits_tracks_a_deleted_newline() {
        use crate::edit::EditPriority;
        use crate::position::{SourcePosition, SourceRange};

        let original = "void m()\n{\n}\n";
        let formatted = "void m() {\n}\n";
        let edit = TextEdit::new(
            SourceRange::new(SourcePosition::new(1, 9), SourcePosition::new(2, 1)),
            " ",
            "brace-style",
            EditPriority::Normal,
        );
        let mapping = LineMapping::from_resolved_edits(original, formatted, &[edit]);
        assert_eq!(mapping.to_formatted(1), Some(1));
        assert_eq!(mapping.to_formatted(2), None);
        assert_eq!(mapping.to_formatted(3), Some(2));
    }
}
