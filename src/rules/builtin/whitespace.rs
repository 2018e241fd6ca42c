//! Enforces a single space around binary operators and after commas (spec
//! §4.3's `WhitespaceFormattingConfiguration`).
//!
//! Operator recognition is a lightweight byte scan over a fixed operator
//! table, not a grammar-aware token stream (spec.md places the concrete
//! target-language grammar out of this crate's scope). It does not
//! distinguish unary from binary `+`/`-`; a file relying on that
//! distinction for alignment is outside what this rule attempts.

use crate::config::{find_config, FormattingConfiguration, WhitespaceFormattingConfiguration};
use crate::diagnostics::{FormattingViolation, Severity};
use crate::edit::{EditPriority, TextEdit};
use crate::error::PipelineError;
use crate::position::SourceRange;
use crate::rules::{Rule, TransformationContext};

/// Recognized binary operators, longest-match-first so `==` is not split
/// into two `=` matches.
const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "%=", "+", "-", "*", "/", "%", "=", "<", ">",
];

pub struct WhitespaceRule;

impl Rule for WhitespaceRule {
    fn id(&self) -> &str {
        "whitespace"
    }

    fn name(&self) -> &str {
        "Whitespace"
    }

    fn description(&self) -> &str {
        "Enforces a single space around binary operators and after commas."
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
            FormattingConfiguration::as_whitespace,
            WhitespaceFormattingConfiguration::default(),
        );
        let mut violations = Vec::new();
        for problem in find_problems(context, &cfg) {
            violations.push(FormattingViolation {
                rule_id: self.id().to_string(),
                severity: self.default_severity(),
                message: problem.message.clone(),
                file_path: context.file_path().to_path_buf(),
                range: problem.range,
                suggested_fix: Some(problem.replacement.clone()),
            });
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
            FormattingConfiguration::as_whitespace,
            WhitespaceFormattingConfiguration::default(),
        );
        let edits = find_problems(context, &cfg)
            .into_iter()
            .map(|p| TextEdit::new(p.range, p.replacement, self.id(), EditPriority::Normal))
            .collect();
        Ok(edits)
    }
}

struct Problem {
    range: SourceRange,
    replacement: String,
    message: String,
}

fn find_problems(context: &TransformationContext<'_>, cfg: &WhitespaceFormattingConfiguration) -> Vec<Problem> {
    let source = context.source();
    let bytes = source.as_bytes();
    let mut problems = Vec::new();

    let mut i = 0usize;
    while i < bytes.len() {
        if context.is_in_literal_or_comment(i) {
            i += 1;
            continue;
        }

        if bytes[i] == b',' {
            if cfg.space_after_comma {
                if let Some(p) = comma_spacing_problem(context, bytes, i) {
                    problems.push(p);
                }
            }
            i += 1;
            continue;
        }

        if cfg.space_around_operators {
            if let Some((op, len)) = match_operator(bytes, i) {
                if let Some(p) = operator_spacing_problem(context, bytes, i, op, len) {
                    problems.push(p);
                }
                i += len;
                continue;
            }
        }

        i += 1;
    }

    problems
}

fn match_operator(bytes: &[u8], i: usize) -> Option<(&'static str, usize)> {
    OPERATORS.iter().find_map(|&op| {
        let op_bytes = op.as_bytes();
        if bytes[i..].starts_with(op_bytes) {
            Some((op, op_bytes.len()))
        } else {
            None
        }
    })
}

fn operator_spacing_problem(
    context: &TransformationContext<'_>,
    bytes: &[u8],
    offset: usize,
    op: &str,
    len: usize,
) -> Option<Problem> {
    let before_ok = offset == 0 || bytes[offset - 1] == b' ' || bytes[offset - 1] == b'\n';
    let after = offset + len;
    let after_ok = after >= bytes.len() || bytes[after] == b' ' || bytes[after] == b'\n';
    if before_ok && after_ok {
        return None;
    }
    let start = context.position_of(offset);
    let end = context.position_of(after);
    Some(Problem {
        range: SourceRange::new(start, end),
        replacement: format!(" {op} "),
        message: format!("operator `{op}` should have a single space on each side"),
    })
}

fn comma_spacing_problem(context: &TransformationContext<'_>, bytes: &[u8], offset: usize) -> Option<Problem> {
    let after = offset + 1;
    if after < bytes.len() && (bytes[after] == b' ' || bytes[after] == b'\n') {
        return None;
    }
    if after < bytes.len() && (bytes[after] == b')' || bytes[after] == b']') {
        // A trailing comma immediately before a closer needs no space.
        return None;
    }
    let start = context.position_of(offset);
    let end = context.position_of(after);
    Some(Problem {
        range: SourceRange::new(start, end),
        replacement: ", ".to_string(),
        message: "comma should be followed by a single space".to_string(),
    })
}
