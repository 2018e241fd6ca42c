//! The rule engine: a registry of independent, stateless rules that each
//! analyze or format the same AST, producing diagnostics and/or edits
//! which the [`crate::edit::resolver`] merges (spec §4.3).

pub mod builtin;

use crate::arena::NodeArena;
use crate::config::FormattingConfiguration;
use crate::deadline::{Deadline, DeadlineExceeded};
use crate::diagnostics::{FormattingViolation, Severity};
use crate::edit::TextEdit;
use crate::error::PipelineError;
use crate::literal_span::LiteralSpanBitmap;
use crate::position::SourcePosition;
use crate::source_text::LineIndex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Read-only context handed to every rule invocation: the source text,
/// its parsed AST, position conversions, cooperative cancellation, and
/// the set of enabled rules. Rules are stateless; everything they need
/// comes from this context and the configuration list.
pub struct TransformationContext<'a> {
    source: &'a str,
    file_path: PathBuf,
    arena: &'a NodeArena,
    line_index: LineIndex,
    literal_spans: LiteralSpanBitmap,
    deadline: Deadline,
    enabled_rules: BTreeSet<String>,
}

impl<'a> TransformationContext<'a> {
    pub fn new(
        source: &'a str,
        file_path: impl Into<PathBuf>,
        arena: &'a NodeArena,
        deadline: Deadline,
        enabled_rules: BTreeSet<String>,
    ) -> Self {
        Self {
            source,
            file_path: file_path.into(),
            arena,
            line_index: LineIndex::new(source),
            literal_spans: LiteralSpanBitmap::compute(source),
            deadline,
            enabled_rules,
        }
    }

    pub fn source(&self) -> &str {
        self.source
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    pub fn get_line_number(&self, offset: usize) -> u32 {
        self.line_index.position_of(offset).line()
    }

    pub fn get_column_number(&self, offset: usize) -> u32 {
        self.line_index.position_of(offset).column()
    }

    pub fn position_of(&self, offset: usize) -> SourcePosition {
        self.line_index.position_of(offset)
    }

    /// Whether `offset` falls inside a string/char literal or comment —
    /// an O(1) query against a bitmap computed once per file (spec §9's
    /// second Open Question).
    pub fn is_in_literal_or_comment(&self, offset: usize) -> bool {
        self.literal_spans.contains(offset)
    }

    pub fn check_deadline(&self) -> Result<(), DeadlineExceeded> {
        self.deadline.check()
    }

    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.enabled_rules.contains(rule_id)
    }

    pub fn enabled_rules(&self) -> &BTreeSet<String> {
        &self.enabled_rules
    }
}

/// A stateless analyzer/formatter. Any state a rule needs lives in the
/// [`TransformationContext`] or its configuration, never on `self`
/// (spec §4.3: "Rules are stateless").
pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn default_severity(&self) -> Severity;

    fn analyze(
        &self,
        context: &TransformationContext<'_>,
        configs: &[FormattingConfiguration],
    ) -> Result<Vec<FormattingViolation>, PipelineError>;

    fn format(
        &self,
        context: &TransformationContext<'_>,
        configs: &[FormattingConfiguration],
    ) -> Result<Vec<TextEdit>, PipelineError>;
}

/// A registry of rules, looked up by id and iterated in a deterministic
/// (by-id) order (spec §4.3: "Rules run in an engine-defined deterministic
/// order (by id)").
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
        self.rules.sort_by(|a, b| a.id().cmp(b.id()));
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.rules.iter().find(|r| r.id() == id).map(|r| r.as_ref())
    }

    /// All registered rules, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Registered rules whose id is in `enabled`, in ascending id order.
    pub fn enabled<'a>(&'a self, enabled: &'a BTreeSet<String>) -> impl Iterator<Item = &'a dyn Rule> {
        self.rules
            .iter()
            .map(|r| r.as_ref())
            .filter(move |r| enabled.contains(r.id()))
    }

    /// A registry preloaded with every built-in rule (spec §4.3's named
    /// reference set).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(builtin::LineLengthRule));
        registry.register(Box::new(builtin::BraceStyleRule));
        registry.register(Box::new(builtin::IndentationRule));
        registry.register(Box::new(builtin::WhitespaceRule));
        registry.register(Box::new(builtin::ImportOrganizationRule::new(None)));
        registry
    }
}

/// Runs `format` on every rule in `rules` and collects every edit set
/// into one flat list, for the resolver to merge in a single pass (spec
/// §4.3: edit sets are fed to the resolver together, not applied
/// sequentially).
pub fn run_format_rules<'a>(
    rules: impl Iterator<Item = &'a dyn Rule>,
    context: &TransformationContext<'_>,
    configs: &[FormattingConfiguration],
) -> Result<Vec<TextEdit>, PipelineError> {
    let mut all_edits = Vec::new();
    for rule in rules {
        context.check_deadline().map_err(|_| PipelineError::ResourceLimit {
            file_path: context.file_path().to_path_buf(),
            limit: crate::error::ResourceLimit::Deadline,
        })?;
        let edits = rule.format(context, configs)?;
        all_edits.extend(edits);
    }
    Ok(all_edits)
}

/// Runs `analyze` on every rule in `rules` and concatenates the
/// violations (spec §4.3: "each rule runs independently, violations are
/// concatenated").
pub fn run_analyze_rules<'a>(
    rules: impl Iterator<Item = &'a dyn Rule>,
    context: &TransformationContext<'_>,
    configs: &[FormattingConfiguration],
) -> Result<Vec<FormattingViolation>, PipelineError> {
    let mut all_violations = Vec::new();
    for rule in rules {
        context.check_deadline().map_err(|_| PipelineError::ResourceLimit {
            file_path: context.file_path().to_path_buf(),
            limit: crate::error::ResourceLimit::Deadline,
        })?;
        all_violations.extend(rule.analyze(context, configs)?);
    }
    Ok(all_violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_iterates_in_id_order() {
        let registry = RuleRegistry::with_builtins();
        let ids: Vec<&str> = registry.iter().map(Rule::id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn enabled_filters_by_id() {
        let registry = RuleRegistry::with_builtins();
        let mut enabled = BTreeSet::new();
        enabled.insert("brace-style".to_string());
        let names: Vec<&str> = registry.enabled(&enabled).map(Rule::id).collect();
        assert_eq!(names, vec!["brace-style"]);
    }
}
