//! Diagnostic data shapes (spec §3's `FormattingViolation`, §6's error
//! output, §7's error taxonomy).
//!
//! This crate produces diagnostics as plain serializable data; rendering
//! them to a terminal (human, optionally ANSI) or to `application/json` is
//! the external collaborator's job per spec §6. `Diagnostic::to_json` is
//! provided because it is pure data mapping, not a rendering policy.

use crate::error::PipelineError;
use crate::position::SourceRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticCategory {
    Parse,
    Config,
    Format,
    System,
}

/// A single diagnostic, produced either by a rule's `analyze` (a
/// [`FormattingViolation`]) or by a pipeline failure surfaced through
/// [`crate::error::PipelineError`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub severity: Severity,
    pub file: PathBuf,
    pub range: Option<SourceRange>,
    pub message: String,
    pub rule_id: Option<String>,
    pub suggested_fix: Option<String>,
}

impl Diagnostic {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "category": self.category,
            "severity": self.severity,
            "file": self.file,
            "line": self.range.map(|r| r.start().line()),
            "column": self.range.map(|r| r.start().column()),
            "message": self.message,
            "ruleId": self.rule_id,
            "suggestedFix": self.suggested_fix,
        })
    }
}

/// A JSON-renderable batch of diagnostics, matching spec §6's
/// `{"type": "error-report", "diagnostics": [...]}` machine output shape.
pub fn error_report_json(diagnostics: &[Diagnostic]) -> serde_json::Value {
    serde_json::json!({
        "type": "error-report",
        "diagnostics": diagnostics.iter().map(Diagnostic::to_json).collect::<Vec<_>>(),
    })
}

/// A rule's analyze-stage finding: a diagnostic, not a mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormattingViolation {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub file_path: PathBuf,
    pub range: SourceRange,
    pub suggested_fix: Option<String>,
}

impl From<FormattingViolation> for Diagnostic {
    fn from(v: FormattingViolation) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Format,
            severity: v.severity,
            file: v.file_path,
            range: Some(v.range),
            message: v.message,
            rule_id: Some(v.rule_id),
            suggested_fix: v.suggested_fix,
        }
    }
}

impl From<&PipelineError> for Diagnostic {
    fn from(err: &PipelineError) -> Self {
        let file = err.file_path().cloned().unwrap_or_default();
        let category = match err {
            PipelineError::Parse { .. } => DiagnosticCategory::Parse,
            PipelineError::Config { .. } => DiagnosticCategory::Config,
            PipelineError::Format { .. } => DiagnosticCategory::Format,
            PipelineError::ResourceLimit { .. }
            | PipelineError::Io { .. }
            | PipelineError::Security { .. }
            | PipelineError::Internal { .. } => DiagnosticCategory::System,
        };
        let range = match err {
            PipelineError::Parse { range, .. } => *range,
            _ => None,
        };
        let rule_id = match err {
            PipelineError::Format { rule_id, .. } => Some(rule_id.clone()),
            _ => None,
        };
        Diagnostic {
            category,
            severity: Severity::Error,
            file,
            range,
            message: err.to_string(),
            rule_id,
            suggested_fix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourcePosition;

    #[test]
    fn violation_converts_to_format_diagnostic() {
        let v = FormattingViolation {
            rule_id: "line-length".into(),
            severity: Severity::Warning,
            message: "line too long".into(),
            file_path: PathBuf::from("a.java"),
            range: SourceRange::new(SourcePosition::new(1, 1), SourcePosition::new(1, 1)),
            suggested_fix: None,
        };
        let diag: Diagnostic = v.into();
        assert_eq!(diag.category, DiagnosticCategory::Format);
        assert_eq!(diag.rule_id.as_deref(), Some("line-length"));
    }

    #[test]
    fn resource_limit_error_maps_to_system_category() {
        let err = PipelineError::ResourceLimit {
            file_path: PathBuf::from("big.java"),
            limit: crate::error::ResourceLimit::FileSizeBytes(11_000_000),
        };
        let diag: Diagnostic = (&err).into();
        assert_eq!(diag.category, DiagnosticCategory::System);
        assert_eq!(diag.severity, Severity::Error);
    }

    #[test]
    fn error_report_json_has_expected_shape() {
        let diagnostics = vec![Diagnostic {
            category: DiagnosticCategory::System,
            severity: Severity::Error,
            file: PathBuf::from("a.java"),
            range: None,
            message: "oops".into(),
            rule_id: None,
            suggested_fix: None,
        }];
        let json = error_report_json(&diagnostics);
        assert_eq!(json["type"], "error-report");
        assert_eq!(json["diagnostics"].as_array().unwrap().len(), 1);
    }
}
