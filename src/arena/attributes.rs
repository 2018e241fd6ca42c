//! Error type for arena attribute and index lookups.

/// Failure modes for [`super::NodeArena`] lookups (spec §4.1).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArenaError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },
}
