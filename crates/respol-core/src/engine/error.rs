use super::Trigger;

/// Decisions that do not produce an [`Outcome`](super::Outcome).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The policy says to abort the stage.
    #[error("{code}: stage aborted on {trigger} (status code {status_code})")]
    StageError {
        code: String,
        status_code: u16,
        trigger: Trigger,
    },
    /// A backoff wait was interrupted; no decision was made for this attempt.
    #[error("backoff interrupted by stage shutdown")]
    Interrupted,
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::StageError { .. })
    }
}

impl From<crate::control::Interrupted> for EngineError {
    fn from(_: crate::control::Interrupted) -> Self {
        EngineError::Interrupted
    }
}
