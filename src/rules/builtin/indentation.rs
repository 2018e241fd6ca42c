//! Normalizes leading-whitespace indentation to a single character kind
//! (tabs or spaces), quantized to a configured indent width, with a
//! continuation bump for lines inside an unclosed paren/bracket group
//! (spec §4.3's `IndentationFormattingConfiguration`).

use crate::config::{
    find_config, IndentationFormattingConfiguration, IndentationType, FormattingConfiguration,
};
use crate::diagnostics::{FormattingViolation, Severity};
use crate::edit::{EditPriority, TextEdit};
use crate::error::PipelineError;
use crate::position::{SourcePosition, SourceRange};
use crate::rules::{Rule, TransformationContext};

pub struct IndentationRule;

impl Rule for IndentationRule {
    fn id(&self) -> &str {
        "indentation"
    }

    fn name(&self) -> &str {
        "Indentation"
    }

    fn description(&self) -> &str {
        "Normalizes leading whitespace to a single indentation kind, quantized to a configured width."
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn analyze(
        &self,
        context: &TransformationContext<'_>,
        configs: &[FormattingConfiguration],
    ) -> Result<Vec<FormattingViolation>, PipelineError> {
        let cfg = find_config(
            configs,
            FormattingConfiguration::as_indentation,
            IndentationFormattingConfiguration::default(),
        );
        let mut violations = Vec::new();
        for line in scan_lines(context) {
            if let Some(offending) = mismatched_character(&line.indent, cfg.indentation_type) {
                violations.push(FormattingViolation {
                    rule_id: self.id().to_string(),
                    severity: self.default_severity(),
                    message: format!(
                        "line mixes indentation: found {offending} but configured indentation type is {:?}",
                        cfg.indentation_type
                    ),
                    file_path: context.file_path().to_path_buf(),
                    range: SourceRange::new(
                        SourcePosition::new(line.number, 1),
                        SourcePosition::new(line.number, line.indent.len() as u32 + 1),
                    ),
                    suggested_fix: None,
                });
            }
        }
        Ok(violations)
    }

    fn format(
        &self,
        context: &TransformationContext<'_>,
        configs: &[FormattingConfiguration],
    ) -> Result<Vec<TextEdit>, PipelineError> {
        let cfg = find_config(
            configs,
            FormattingConfiguration::as_indentation,
            IndentationFormattingConfiguration::default(),
        );
        let mut edits = Vec::new();
        for line in scan_lines(context) {
            let canonical = canonical_indent(&cfg, line.depth, line.paren_depth, line.closes_block);
            if canonical == line.indent {
                continue;
            }
            edits.push(TextEdit::new(
                SourceRange::new(
                    SourcePosition::new(line.number, 1),
                    SourcePosition::new(line.number, line.indent.len() as u32 + 1),
                ),
                canonical,
                self.id(),
                EditPriority::Normal,
            ));
        }
        Ok(edits)
    }
}

fn mismatched_character(indent: &str, kind: IndentationType) -> Option<&'static str> {
    match kind {
        IndentationType::Spaces if indent.contains('\t') => Some("a tab"),
        IndentationType::Tabs if indent.contains(' ') => Some("a space"),
        _ => None,
    }
}

fn canonical_indent(
    cfg: &IndentationFormattingConfiguration,
    depth: u32,
    paren_depth: u32,
    closes_block: bool,
) -> String {
    let effective_depth = if closes_block { depth.saturating_sub(1) } else { depth };
    let continuation = if paren_depth > 0 { cfg.continuation_multiplier } else { 0 };
    let levels = effective_depth + continuation;
    match cfg.indentation_type {
        IndentationType::Spaces => " ".repeat((levels * cfg.indent_size) as usize),
        IndentationType::Tabs => "\t".repeat(levels as usize),
    }
}

struct LineInfo {
    number: u32,
    indent: String,
    /// Net `{`/`}` nesting before this line, i.e. the block this line opens
    /// into.
    depth: u32,
    /// Net unclosed `(`/`[` count before this line; > 0 marks a
    /// continuation line.
    paren_depth: u32,
    /// Whether the first non-whitespace byte on the line is `}`.
    closes_block: bool,
}

/// Scans `source` once, tracking brace/paren nesting as it goes (skipping
/// bytes inside string/char literals and comments), and yields per-line
/// leading-whitespace and nesting-depth facts.
fn scan_lines(context: &TransformationContext<'_>) -> Vec<LineInfo> {
    let source = context.source();
    let bytes = source.as_bytes();
    let mut lines = Vec::new();

    let mut brace_depth: i64 = 0;
    let mut paren_depth: i64 = 0;
    let mut line_number = 1u32;
    let mut line_start = 0usize;

    let mut i = 0usize;
    while i <= bytes.len() {
        let at_eof = i == bytes.len();
        let is_newline = !at_eof && bytes[i] == b'\n';
        if at_eof || is_newline {
            let line_bytes = &bytes[line_start..i];
            let indent_len = line_bytes
                .iter()
                .take_while(|&&b| b == b' ' || b == b'\t')
                .count();
            let indent = String::from_utf8_lossy(&line_bytes[..indent_len]).into_owned();
            let first_code = line_bytes[indent_len..]
                .first()
                .copied()
                .unwrap_or(0);

            lines.push(LineInfo {
                number: line_number,
                indent,
                depth: brace_depth.max(0) as u32,
                paren_depth: paren_depth.max(0) as u32,
                closes_block: first_code == b'}',
            });

            if at_eof {
                break;
            }
            line_start = i + 1;
            line_number += 1;
        }
        if !at_eof && !context.is_in_literal_or_comment(i) {
            match bytes[i] {
                b'{' => brace_depth += 1,
                b'}' => brace_depth -= 1,
                b'(' | b'[' => paren_depth += 1,
                b')' | b']' => paren_depth -= 1,
                _ => {}
            }
        }
        i += 1;
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeArena;
    use crate::config::default_configurations;
    use crate::deadline::Deadline;
    use std::collections::BTreeSet;

    fn ctx<'a>(arena: &'a NodeArena, source: &'a str) -> TransformationContext<'a> {
        TransformationContext::new(source, "a.java", arena, Deadline::none(), BTreeSet::new())
    }

    #[test]
    fn flags_tab_when_spaces_configured() {
        let arena = NodeArena::with_default_capacity();
        let source = "void m() {\n\tfoo();\n}\n".to_string();
        let c = ctx(&arena, &source);
        let violations = IndentationRule.analyze(&c, &default_configurations()).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].range.start().line(), 2);
    }

    #[test]
    fn accepts_consistent_spaces() {
        let arena = NodeArena::with_default_capacity();
        let source = "void m() {\n    foo();\n}\n".to_string();
        let c = ctx(&arena, &source);
        let violations = IndentationRule.analyze(&c, &default_configurations()).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn format_quantizes_mixed_indentation_to_spaces() {
        let arena = NodeArena::with_default_capacity();
        let source = "void m() {\n\t foo();\n\tbar();\n}\n".to_string();
        let c = ctx(&arena, &source);
        let edits = IndentationRule.format(&c, &default_configurations()).unwrap();
        assert_eq!(edits.len(), 2);
        for edit in &edits {
            assert_eq!(edit.replacement(), "    ");
        }
    }

    #[test]
    fn format_dedents_closing_brace() {
        let arena = NodeArena::with_default_capacity();
        let source = "void m() {\n  foo();\n  }\n".to_string();
        let c = ctx(&arena, &source);
        let edits = IndentationRule.format(&c, &default_configurations()).unwrap();
        let closing = edits.iter().find(|e| e.range().start().line() == 3).unwrap();
        assert_eq!(closing.replacement(), "");
    }

    #[test]
    fn format_is_idempotent() {
        let arena = NodeArena::with_default_capacity();
        let source = "void m() {\n\tfoo();\n}\n".to_string();
        let c = ctx(&arena, &source);
        let edits = IndentationRule.format(&c, &default_configurations()).unwrap();
        let resolved = crate::edit::resolver::resolve(edits);
        let once = crate::edit::resolver::apply(&source, &resolved.edits);

        let arena2 = NodeArena::with_default_capacity();
        let c2 = ctx(&arena2, &once);
        let edits2 = IndentationRule.format(&c2, &default_configurations()).unwrap();
        assert!(edits2.is_empty());
    }
}
