//! Error taxonomy for the formatting pipeline.
//!
//! Every file-scoped error carries `file_path`. Each variant names the
//! recovery strategy it is typically paired with in a doc comment; the
//! actual strategy assignment lives with the pipeline stage configuration
//! (see [`crate::recovery`]), not on the error type itself.

use crate::position::SourceRange;
use std::path::PathBuf;
use std::sync::Arc;

/// The limit that a [`PipelineError::ResourceLimit`] reports as exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceLimit {
    FileSizeBytes(u64),
    MemoryBudgetBytes(u64),
    Deadline,
}

impl std::fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLimit::FileSizeBytes(n) => write!(f, "file size limit ({n} bytes)"),
            ResourceLimit::MemoryBudgetBytes(n) => write!(f, "memory budget ({n} bytes)"),
            ResourceLimit::Deadline => write!(f, "processing deadline"),
        }
    }
}

/// The pipeline's full error taxonomy (spec §7).
///
/// Cloneable: errors are handed to recovery strategies, retried, logged,
/// and surfaced as diagnostics, often from more than one place. Wrapping
/// the inner error source in `Arc` keeps the enum `Clone` without forcing
/// every leaf error to be `Clone` itself.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// Grammar failure while parsing. Recovery: SkipFile.
    #[error("parse error in {file_path}: {message}")]
    Parse {
        file_path: PathBuf,
        message: String,
        range: Option<SourceRange>,
    },

    /// Missing, invalid, or unreadable configuration. Recovery: FailFast.
    #[error("configuration error: {message}")]
    Config {
        message: String,
        config_file: Option<PathBuf>,
    },

    /// A rule failed internally. Recovery: Fallback(original text).
    #[error("rule {rule_id} failed formatting {file_path}: {message}")]
    Format {
        file_path: PathBuf,
        rule_id: String,
        message: String,
    },

    /// A hard resource limit was exceeded. Recovery: SkipFile.
    #[error("resource limit exceeded for {file_path}: {limit}")]
    ResourceLimit {
        file_path: PathBuf,
        limit: ResourceLimit,
    },

    /// Read or write failed. Recovery: Retry, then SkipFile.
    #[error("I/O error on {file_path}: {message}")]
    Io {
        file_path: PathBuf,
        message: String,
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// Path traversal or other security policy violation. Recovery:
    /// SkipFile with a warning.
    #[error("security error for {file_path}: {message}")]
    Security { file_path: PathBuf, message: String },

    /// An internal invariant was violated. Recovery: SkipFile; always
    /// logged at error level, never silently swallowed.
    #[error("internal error: {message}")]
    Internal {
        message: String,
        file_path: Option<PathBuf>,
    },
}

impl PipelineError {
    /// The file this error is scoped to, if any (`Config` errors may be
    /// batch-scoped rather than file-scoped).
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            PipelineError::Parse { file_path, .. }
            | PipelineError::Format { file_path, .. }
            | PipelineError::ResourceLimit { file_path, .. }
            | PipelineError::Io { file_path, .. }
            | PipelineError::Security { file_path, .. } => Some(file_path),
            PipelineError::Internal { file_path, .. } => file_path.as_ref(),
            PipelineError::Config { .. } => None,
        }
    }

    pub fn io(file_path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            file_path: file_path.into(),
            message: source.to_string(),
            source: Some(Arc::new(source)),
        }
    }
}

/// A single pipeline-stage failure, as returned by [`crate::pipeline::PipelineStageResult`].
///
/// This wraps [`PipelineError`] with the stage name that produced it and
/// an optional upstream cause, matching spec §3's `PipelineError` shape.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{stage_name}] {error}")]
pub struct StagePipelineError {
    pub stage_name: &'static str,
    pub error: PipelineError,
    #[source]
    pub cause: Option<Arc<StagePipelineError>>,
}

impl StagePipelineError {
    pub fn new(stage_name: &'static str, error: PipelineError) -> Self {
        Self {
            stage_name,
            error,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: StagePipelineError) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn file_path(&self) -> Option<&PathBuf> {
        self.error.file_path()
    }
}
