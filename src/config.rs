//! Typed rule configuration (spec §4.3) and the thin external-loader
//! surface (spec §6).
//!
//! Rules look up configuration by type from a heterogeneous list via
//! [`find_config`], rather than coupling to any particular ordering or
//! source. The hierarchical TOML/YAML merge described in spec §6 — field
//! precedence, VCS-root/home/system search order, `ConfigNotFound` /
//! `ConfigValidation` / `FileAccess` discovery failures — is explicitly an
//! external collaborator; [`ConfigDiscovery`] names that contract without
//! implementing the search. What *is* implemented here is the single-file
//! TOML deserialization into [`FormattingConfiguration`], since that is
//! pure data mapping the CLI needs to be runnable end to end.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentationType {
    Spaces,
    Tabs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BraceStyle {
    SameLine,
    NewLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLengthFormattingConfiguration {
    pub max_columns: u32,
    pub continuation_indent: u32,
    /// Preserved as-configured per spec §9's first Open Question: not
    /// motivated by the rest of the design, but not ours to reinterpret.
    pub max_wraps_per_line: u32,
}

/// Default cap on wrap edits emitted for a single line (spec §9).
pub const DEFAULT_MAX_WRAPS_PER_LINE: u32 = 3;

impl Default for LineLengthFormattingConfiguration {
    fn default() -> Self {
        Self {
            max_columns: 120,
            continuation_indent: 8,
            max_wraps_per_line: DEFAULT_MAX_WRAPS_PER_LINE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraceStyleFormattingConfiguration {
    pub style: BraceStyle,
}

impl Default for BraceStyleFormattingConfiguration {
    fn default() -> Self {
        Self {
            style: BraceStyle::SameLine,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentationFormattingConfiguration {
    pub indentation_type: IndentationType,
    pub indent_size: u32,
    pub continuation_multiplier: u32,
    pub tab_width: u32,
}

impl Default for IndentationFormattingConfiguration {
    fn default() -> Self {
        Self {
            indentation_type: IndentationType::Spaces,
            indent_size: 4,
            continuation_multiplier: 2,
            tab_width: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitespaceFormattingConfiguration {
    pub space_around_operators: bool,
    pub space_after_comma: bool,
}

impl Default for WhitespaceFormattingConfiguration {
    fn default() -> Self {
        Self {
            space_around_operators: true,
            space_after_comma: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOrganizationFormattingConfiguration {
    pub expand_wildcards: bool,
    pub group_order: Vec<String>,
}

impl Default for ImportOrganizationFormattingConfiguration {
    fn default() -> Self {
        Self {
            expand_wildcards: false,
            group_order: vec!["java".into(), "javax".into(), "org".into(), "com".into()],
        }
    }
}

/// A tagged sum of every built-in configuration record. External rule
/// extensions carry their own configuration type and are looked up the
/// same way via [`find_config`]; this enum covers only the built-ins spec
/// §4.3 names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FormattingConfiguration {
    LineLength(LineLengthFormattingConfiguration),
    BraceStyle(BraceStyleFormattingConfiguration),
    Indentation(IndentationFormattingConfiguration),
    Whitespace(WhitespaceFormattingConfiguration),
    ImportOrganization(ImportOrganizationFormattingConfiguration),
}

/// Returns the first configuration matching `extract`, or `default` if
/// none is present. Lets rules pull their configuration out of a
/// heterogeneous list without caring about its ordering or what other
/// rules' configurations are mixed in alongside it.
pub fn find_config<T: Clone>(
    configs: &[FormattingConfiguration],
    extract: impl Fn(&FormattingConfiguration) -> Option<&T>,
    default: T,
) -> T {
    configs
        .iter()
        .find_map(|c| extract(c))
        .cloned()
        .unwrap_or(default)
}

impl FormattingConfiguration {
    pub fn as_line_length(&self) -> Option<&LineLengthFormattingConfiguration> {
        match self {
            FormattingConfiguration::LineLength(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_brace_style(&self) -> Option<&BraceStyleFormattingConfiguration> {
        match self {
            FormattingConfiguration::BraceStyle(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_indentation(&self) -> Option<&IndentationFormattingConfiguration> {
        match self {
            FormattingConfiguration::Indentation(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_whitespace(&self) -> Option<&WhitespaceFormattingConfiguration> {
        match self {
            FormattingConfiguration::Whitespace(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_import_organization(&self) -> Option<&ImportOrganizationFormattingConfiguration> {
        match self {
            FormattingConfiguration::ImportOrganization(c) => Some(c),
            _ => None,
        }
    }
}

/// The default rule configuration set, used when no `.styler.toml`
/// overrides are discovered.
pub fn default_configurations() -> Vec<FormattingConfiguration> {
    vec![
        FormattingConfiguration::LineLength(LineLengthFormattingConfiguration::default()),
        FormattingConfiguration::BraceStyle(BraceStyleFormattingConfiguration::default()),
        FormattingConfiguration::Indentation(IndentationFormattingConfiguration::default()),
        FormattingConfiguration::Whitespace(WhitespaceFormattingConfiguration::default()),
        FormattingConfiguration::ImportOrganization(
            ImportOrganizationFormattingConfiguration::default(),
        ),
    ]
}

/// A single `.styler.toml` document: a flat list of configuration
/// entries. Hierarchical merge across a VCS-root/home/system search path
/// is out of scope (external collaborator, spec §6); this loader handles
/// exactly one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub configurations: Vec<FormattingConfiguration>,
}

pub fn load_single_file(path: &Path) -> Result<Vec<FormattingConfiguration>, crate::error::PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|e| crate::error::PipelineError::Config {
        message: format!("failed to read {}: {e}", path.display()),
        config_file: Some(path.to_path_buf()),
    })?;
    let doc: ConfigDocument = toml::from_str(&text).map_err(|e| crate::error::PipelineError::Config {
        message: format!("failed to parse {}: {e}", path.display()),
        config_file: Some(path.to_path_buf()),
    })?;
    Ok(doc.configurations)
}

/// The contract for the external hierarchical configuration loader
/// (spec §6): field-level precedence merge across a search path from a
/// starting directory up to the VCS root, then user home, then
/// system-wide. Not implemented in this crate; named here so the core's
/// `FormattingConfiguration` surface has a documented producer.
pub trait ConfigDiscovery {
    fn discover(&self, start_dir: &Path) -> Result<Vec<FormattingConfiguration>, ConfigDiscoveryError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigDiscoveryError {
    #[error("no configuration found; searched: {searched_paths:?}")]
    NotFound { searched_paths: Vec<PathBuf> },
    #[error("invalid configuration in {config_file}: {message}")]
    Validation { config_file: PathBuf, message: String },
    #[error("cannot access {path}: {message}")]
    FileAccess { path: PathBuf, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_config_falls_back_to_default_when_absent() {
        let configs = vec![FormattingConfiguration::BraceStyle(
            BraceStyleFormattingConfiguration::default(),
        )];
        let line_length = find_config(
            &configs,
            FormattingConfiguration::as_line_length,
            LineLengthFormattingConfiguration::default(),
        );
        assert_eq!(line_length.max_columns, 120);
    }

    #[test]
    fn find_config_returns_first_match() {
        let configs = vec![FormattingConfiguration::LineLength(
            LineLengthFormattingConfiguration {
                max_columns: 80,
                ..Default::default()
            },
        )];
        let found = find_config(
            &configs,
            FormattingConfiguration::as_line_length,
            LineLengthFormattingConfiguration::default(),
        );
        assert_eq!(found.max_columns, 80);
    }

    #[test]
    fn load_single_file_parses_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".styler.toml");
        std::fs::write(
            &path,
            r#"
            [[configurations]]
            kind = "LineLength"
            max_columns = 100
            continuation_indent = 8
            max_wraps_per_line = 3
            "#,
        )
        .unwrap();
        let configs = load_single_file(&path).unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].as_line_length().unwrap().max_columns, 100);
    }
}
