// Error types for composition.
//
// Two failure classes come out of generation itself: configuration errors,
// reported before any note is produced, and invariant violations, which mean
// the measure budget and the duration set disagree or a loop failed to make
// progress. The remaining variants wrap I/O and JSON failures at the edges
// (config loading, MIDI writing).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("invalid configuration: {param}: {reason}")]
    Configuration { param: &'static str, reason: String },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ComposeError {
    pub(crate) fn config(param: &'static str, reason: impl Into<String>) -> Self {
        ComposeError::Configuration {
            param,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ComposeError>;
