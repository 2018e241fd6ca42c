//! Text edits: the unit of intent a rule proposes, before conflict
//! resolution merges them into an applicable set (spec §3, §4.2).

pub mod resolver;

use crate::position::SourceRange;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Edit priority. Higher wins when the conflict resolver must pick one of
/// two overlapping edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EditPriority {
    Low,
    Normal,
    High,
    Critical,
}

/// An immutable proposed replacement of a source range.
///
/// `replacement == ""` is a deletion; `range.start() == range.end()` is an
/// insertion. Ordering is by `(range.start, range.end)`, giving a total
/// order (testable property §8.3) that the resolver uses to sort edits
/// before scanning for overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    range: SourceRange,
    replacement: String,
    rule_id: String,
    priority: EditPriority,
}

impl TextEdit {
    pub fn new(
        range: SourceRange,
        replacement: impl Into<String>,
        rule_id: impl Into<String>,
        priority: EditPriority,
    ) -> Self {
        Self {
            range,
            replacement: replacement.into(),
            rule_id: rule_id.into(),
            priority,
        }
    }

    pub fn range(&self) -> SourceRange {
        self.range
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn rule_id(&self) -> &str {
        &self.rule_id
    }

    pub fn priority(&self) -> EditPriority {
        self.priority
    }

    pub fn is_insertion(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.replacement.is_empty() && !self.range.is_empty()
    }

    /// Two edits overlap iff their ranges overlap (spec §3's range
    /// overlap definition, testable property §8.4).
    pub fn overlaps(&self, other: &TextEdit) -> bool {
        self.range.overlaps(&other.range)
    }
}

impl PartialOrd for TextEdit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextEdit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.range.cmp(&other.range)
    }
}
