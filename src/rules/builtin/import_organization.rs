//! Sorts, groups, and deduplicates import declarations; optionally
//! expands a wildcard import into individual imports via the classpath
//! probe (spec §4.3, §4.8).
//!
//! Unlike the other built-ins, this rule reads the AST (via
//! [`crate::ast::ImportAttribute`]) rather than rescanning raw text,
//! since import declarations are exactly the kind of per-kind attribute
//! data the arena's side tables exist for.

use crate::arena::NodeIndex;
use crate::ast::{ImportAttribute, NodeKind};
use crate::classpath::{ClasspathProbe, PackageListingCache};
use crate::config::{
    find_config, FormattingConfiguration, ImportOrganizationFormattingConfiguration,
};
use crate::diagnostics::{FormattingViolation, Severity};
use crate::edit::{EditPriority, TextEdit};
use crate::error::PipelineError;
use crate::position::SourceRange;
use crate::rules::{Rule, TransformationContext};
use std::sync::Arc;

pub struct ImportOrganizationRule {
    probe: Option<Arc<ClasspathProbe>>,
    package_cache: PackageListingCache,
}

impl ImportOrganizationRule {
    pub fn new(probe: Option<Arc<ClasspathProbe>>) -> Self {
        Self {
            probe,
            package_cache: PackageListingCache::default(),
        }
    }
}

struct ImportEntry {
    index: NodeIndex,
    attribute: ImportAttribute,
    start: usize,
    end: usize,
}

impl Rule for ImportOrganizationRule {
    fn id(&self) -> &str {
        "import-organization"
    }

    fn name(&self) -> &str {
        "Import Organization"
    }

    fn description(&self) -> &str {
        "Sorts, groups, and deduplicates imports; expands wildcard imports when a classpath probe is available."
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
            FormattingConfiguration::as_import_organization,
            ImportOrganizationFormattingConfiguration::default(),
        );
        let entries = collect_imports(context);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut violations = Vec::new();
        let block_range = block_range(context, &entries);

        let actual: Vec<&str> = entries.iter().map(|e| e.attribute.qualified_name.as_str()).collect();
        let canonical = canonical_order(&entries, &cfg);
        if actual != canonical.iter().map(|e| e.attribute.qualified_name.as_str()).collect::<Vec<_>>() {
            violations.push(FormattingViolation {
                rule_id: self.id().to_string(),
                severity: self.default_severity(),
                message: "imports are not sorted and grouped per the configured group order".into(),
                file_path: context.file_path().to_path_buf(),
                range: block_range,
                suggested_fix: None,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &entries {
            if !seen.insert(&entry.attribute.qualified_name) {
                violations.push(FormattingViolation {
                    rule_id: self.id().to_string(),
                    severity: self.default_severity(),
                    message: format!("duplicate import `{}`", entry.attribute.qualified_name),
                    file_path: context.file_path().to_path_buf(),
                    range: node_range(context, entry),
                    suggested_fix: None,
                });
            }
        }

        if cfg.expand_wildcards {
            for entry in &entries {
                if entry.attribute.is_wildcard && !self.probe_can_expand() {
                    violations.push(FormattingViolation {
                        rule_id: self.id().to_string(),
                        severity: Severity::Info,
                        message: format!(
                            "wildcard import `{}.*` cannot be expanded without a configured classpath probe",
                            entry.attribute.qualified_name
                        ),
                        file_path: context.file_path().to_path_buf(),
                        range: node_range(context, entry),
                        suggested_fix: None,
                    });
                }
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
            FormattingConfiguration::as_import_organization,
            ImportOrganizationFormattingConfiguration::default(),
        );
        let entries = collect_imports(context);
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let block_range = block_range(context, &entries);
        let expanded = self.expand_wildcards(&entries, &cfg);
        let deduped = dedupe(expanded);
        let ordered = canonical_order(&deduped, &cfg);

        let rendered: String = ordered
            .iter()
            .map(|e| render_import(&e.attribute))
            .collect::<Vec<_>>()
            .join("\n")
            + "\n";

        Ok(vec![TextEdit::new(
            block_range,
            rendered,
            self.id(),
            EditPriority::Normal,
        )])
    }
}

impl ImportOrganizationRule {
    fn probe_can_expand(&self) -> bool {
        self.probe.as_ref().is_some_and(|p| !p.is_closed())
    }

    /// Replaces every wildcard entry with one synthetic entry per class the
    /// probe reports for that package, sorted; non-wildcard entries (or a
    /// wildcard entry when no probe is configured) pass through unchanged.
    fn expand_wildcards(
        &self,
        entries: &[ImportEntry],
        cfg: &ImportOrganizationFormattingConfiguration,
    ) -> Vec<ImportEntry> {
        if !cfg.expand_wildcards {
            return clone_entries(entries);
        }
        let Some(probe) = self.probe.as_ref().filter(|p| !p.is_closed()) else {
            return clone_entries(entries);
        };

        let mut out = Vec::new();
        for entry in entries {
            if !entry.attribute.is_wildcard {
                out.push(clone_entry(entry));
                continue;
            }
            let mut classes: Vec<String> = self
                .package_cache
                .get_or_scan(probe, &entry.attribute.qualified_name)
                .into_iter()
                .collect();
            if classes.is_empty() {
                out.push(clone_entry(entry));
                continue;
            }
            classes.sort();
            for class_name in classes {
                out.push(ImportEntry {
                    index: entry.index,
                    attribute: ImportAttribute {
                        qualified_name: class_name,
                        is_wildcard: false,
                        is_static: entry.attribute.is_static,
                    },
                    start: entry.start,
                    end: entry.end,
                });
            }
        }
        out
    }
}

fn clone_entry(e: &ImportEntry) -> ImportEntry {
    ImportEntry {
        index: e.index,
        attribute: e.attribute.clone(),
        start: e.start,
        end: e.end,
    }
}

fn clone_entries(entries: &[ImportEntry]) -> Vec<ImportEntry> {
    entries.iter().map(clone_entry).collect()
}

fn dedupe(entries: Vec<ImportEntry>) -> Vec<ImportEntry> {
    let mut seen = std::collections::HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.attribute.qualified_name.clone()))
        .collect()
}

fn collect_imports(context: &TransformationContext<'_>) -> Vec<ImportEntry> {
    let arena = context.arena();
    let mut entries: Vec<ImportEntry> = arena
        .iter()
        .filter(|(_, kind)| *kind == NodeKind::ImportDeclaration)
        .filter_map(|(index, _)| {
            let attribute = arena.get_attribute::<ImportAttribute>(index).ok()?.clone();
            Some(ImportEntry {
                index,
                attribute,
                start: arena.start(index)?,
                end: arena.end(index)?,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.start);
    entries
}

fn group_index(qualified_name: &str, group_order: &[String]) -> usize {
    group_order
        .iter()
        .position(|prefix| qualified_name.starts_with(prefix.as_str()))
        .unwrap_or(group_order.len())
}

/// Static imports first (sorted), then non-static entries grouped by
/// `group_order` prefix and sorted alphabetically within each group;
/// entries matching no group sort last.
fn canonical_order(
    entries: &[ImportEntry],
    cfg: &ImportOrganizationFormattingConfiguration,
) -> Vec<ImportEntry> {
    let mut ordered = clone_entries(entries);
    ordered.sort_by(|a, b| {
        let static_key = |e: &ImportEntry| !e.attribute.is_static;
        static_key(a)
            .cmp(&static_key(b))
            .then_with(|| {
                group_index(&a.attribute.qualified_name, &cfg.group_order)
                    .cmp(&group_index(&b.attribute.qualified_name, &cfg.group_order))
            })
            .then_with(|| a.attribute.qualified_name.cmp(&b.attribute.qualified_name))
    });
    ordered
}

fn render_import(attribute: &ImportAttribute) -> String {
    let suffix = if attribute.is_wildcard { ".*" } else { "" };
    if attribute.is_static {
        format!("import static {}{suffix};", attribute.qualified_name)
    } else {
        format!("import {}{suffix};", attribute.qualified_name)
    }
}

fn node_range(context: &TransformationContext<'_>, entry: &ImportEntry) -> SourceRange {
    SourceRange::new(context.position_of(entry.start), context.position_of(entry.end))
}

fn block_range(context: &TransformationContext<'_>, entries: &[ImportEntry]) -> SourceRange {
    let start = entries.iter().map(|e| e.start).min().unwrap_or(0);
    let end = entries.iter().map(|e| e.end).max().unwrap_or(0);
    SourceRange::new(context.position_of(start), context.position_of(end))
}
