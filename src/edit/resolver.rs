//! Conflict resolution: merges an unordered multiset of [`TextEdit`]s from
//! independent rules into a non-overlapping, deterministic sequence, and
//! applies that sequence to a source buffer (spec §4.2).

use crate::edit::TextEdit;
use crate::source_text::LineIndex;

/// A conflict between two same-priority, cross-but-not-nested edits. One
/// survives (the earlier by `(start, end)`); this diagnostic records both
/// rule ids so the conflict is visible even though only one edit applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictWarning {
    pub kept_rule_id: String,
    pub dropped_rule_id: String,
    pub range_description: String,
}

/// The result of resolving one rule run's edits.
#[derive(Debug, Clone, Default)]
pub struct ResolvedEdits {
    pub edits: Vec<TextEdit>,
    pub conflicts: Vec<ConflictWarning>,
}

/// Merges `edits` into a non-overlapping, deterministic set.
///
/// Algorithm (spec §4.2):
/// 1. Sort by `(range.start, range.end)`.
/// 2. Scan linearly; for each overlapping pair, prefer strictly higher
///    priority, then the strictly broader range on a priority tie (kept
///    silently), then the earlier edit by `(start, end)` on a crossing,
///    same-priority tie (emitting a conflict warning for that last case
///    only).
/// 3. The survivors are guaranteed non-overlapping (checked below).
///
/// `O(n log n)` in the number of edits.
pub fn resolve(mut edits: Vec<TextEdit>) -> ResolvedEdits {
    edits.sort();

    let mut survivors: Vec<TextEdit> = Vec::with_capacity(edits.len());
    let mut conflicts = Vec::new();

    'next_edit: for candidate in edits {
        let mut i = 0;
        while i < survivors.len() {
            if !survivors[i].overlaps(&candidate) {
                i += 1;
                continue;
            }
            match pick_winner(&survivors[i], &candidate) {
                Winner::Existing => continue 'next_edit,
                Winner::Candidate => {
                    survivors.remove(i);
                }
                Winner::Tie => {
                    conflicts.push(ConflictWarning {
                        kept_rule_id: survivors[i].rule_id().to_string(),
                        dropped_rule_id: candidate.rule_id().to_string(),
                        range_description: format!("{}", survivors[i].range()),
                    });
                    continue 'next_edit;
                }
            }
        }
        let insert_at = survivors.binary_search(&candidate).unwrap_or_else(|pos| pos);
        survivors.insert(insert_at, candidate);
    }

    debug_assert!(is_non_overlapping(&survivors));

    ResolvedEdits {
        edits: survivors,
        conflicts,
    }
}

enum Winner {
    Existing,
    Candidate,
    /// Crossing ranges, equal priority, neither contains the other: the
    /// earlier-sorted edit (by construction, `existing`) wins and a
    /// conflict is recorded.
    Tie,
}

fn pick_winner(existing: &TextEdit, candidate: &TextEdit) -> Winner {
    if existing.priority() > candidate.priority() {
        return Winner::Existing;
    }
    if candidate.priority() > existing.priority() {
        return Winner::Candidate;
    }
    if existing.range().strictly_contains(&candidate.range()) {
        return Winner::Existing;
    }
    if candidate.range().strictly_contains(&existing.range()) {
        return Winner::Candidate;
    }
    Winner::Tie
}

fn is_non_overlapping(edits: &[TextEdit]) -> bool {
    edits
        .windows(2)
        .all(|pair| !pair[0].overlaps(&pair[1]))
}

/// Applies a resolved, non-overlapping edit set to `source`, in reverse
/// order of `range.start` so that earlier edits' offsets are never
/// invalidated by later ones.
pub fn apply(source: &str, edits: &[TextEdit]) -> String {
    let index = LineIndex::new(source);
    let mut ordered = edits.to_vec();
    ordered.sort();

    let mut out = source.to_string();
    for edit in ordered.iter().rev() {
        let start = index.offset_of(edit.range().start());
        let end = index.offset_of(edit.range().end());
        out.replace_range(start..end, edit.replacement());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditPriority;
    use crate::position::{SourcePosition, SourceRange};

    fn range(line: u32, a: u32, b: u32) -> SourceRange {
        SourceRange::new(SourcePosition::new(line, a), SourcePosition::new(line, b))
    }

    #[test]
    fn higher_priority_wins_overlap() {
        let low = TextEdit::new(range(1, 1, 5), "low", "rule-a", EditPriority::Low);
        let high = TextEdit::new(range(1, 3, 8), "high", "rule-b", EditPriority::High);
        let resolved = resolve(vec![low, high.clone()]);
        assert_eq!(resolved.edits, vec![high]);
    }

    #[test]
    fn broader_range_wins_on_priority_tie() {
        let narrow = TextEdit::new(range(1, 3, 5), "n", "rule-a", EditPriority::Normal);
        let broad = TextEdit::new(range(1, 1, 10), "b", "rule-b", EditPriority::Normal);
        let resolved = resolve(vec![narrow, broad.clone()]);
        assert_eq!(resolved.edits, vec![broad]);
        assert!(resolved.conflicts.is_empty());
    }

    #[test]
    fn crossing_tie_keeps_earlier_and_warns() {
        let a = TextEdit::new(range(1, 1, 5), "a", "rule-a", EditPriority::Normal);
        let b = TextEdit::new(range(1, 3, 8), "b", "rule-b", EditPriority::Normal);
        let resolved = resolve(vec![b, a.clone()]);
        assert_eq!(resolved.edits, vec![a]);
        assert_eq!(resolved.conflicts.len(), 1);
        assert_eq!(resolved.conflicts[0].kept_rule_id, "rule-a");
        assert_eq!(resolved.conflicts[0].dropped_rule_id, "rule-b");
    }

    #[test]
    fn non_overlapping_edits_all_survive() {
        let a = TextEdit::new(range(1, 1, 2), "a", "rule-a", EditPriority::Normal);
        let b = TextEdit::new(range(1, 5, 6), "b", "rule-b", EditPriority::Normal);
        let resolved = resolve(vec![b.clone(), a.clone()]);
        assert_eq!(resolved.edits.len(), 2);
        assert!(resolved.conflicts.is_empty());
        assert_eq!(resolved.edits[0], a);
        assert_eq!(resolved.edits[1], b);
    }

    #[test]
    fn resolve_is_deterministic() {
        let a = TextEdit::new(range(1, 1, 5), "a", "rule-a", EditPriority::Low);
        let b = TextEdit::new(range(1, 3, 8), "b", "rule-b", EditPriority::High);
        let r1 = resolve(vec![a.clone(), b.clone()]);
        let r2 = resolve(vec![b, a]);
        assert_eq!(r1.edits, r2.edits);
    }

    #[test]
    fn apply_reverse_order_preserves_offsets() {
        let source = "abcdef";
        let edit_a = TextEdit::new(range(1, 1, 2), "X", "r", EditPriority::Normal); // replace 'a'
        let edit_b = TextEdit::new(range(1, 4, 5), "Y", "r", EditPriority::Normal); // replace 'd'
        let out = apply(source, &[edit_a, edit_b]);
        assert_eq!(out, "XbcYef");
    }

    #[test]
    fn apply_insertion_and_deletion() {
        let source = "hello world";
        let insertion = TextEdit::new(
            SourceRange::point(SourcePosition::new(1, 6)),
            ",",
            "r",
            EditPriority::Normal,
        );
        let deletion = TextEdit::new(range(1, 7, 8), "", "r", EditPriority::Normal); // delete 'w'
        let out = apply(source, &[insertion, deletion]);
        assert_eq!(out, "hello,orld");
    }

    #[test]
    fn idempotent_on_already_resolved_set() {
        let a = TextEdit::new(range(1, 1, 2), "a", "rule-a", EditPriority::Normal);
        let once = resolve(vec![a.clone()]);
        let twice = resolve(once.edits.clone());
        assert_eq!(once.edits, twice.edits);
    }
}
