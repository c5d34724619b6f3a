//! Operator-selectable reaction to a non-success response or timeout.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a stage does when a configured status code (or a timeout) is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseAction {
    /// Abort the whole stage with the configured error code.
    StageError,
    /// Emit an error record and move on to the next record.
    ErrorRecord,
    /// Retry straight away, no delay.
    #[serde(alias = "RETRY_IMMEDIATELY")]
    RetryImmediate,
    /// Retry after a delay that grows by the base interval each time.
    RetryLinearBackoff,
    /// Retry after a delay that doubles each time.
    RetryExponentialBackoff,
}

impl ResponseAction {
    /// True for the two actions that sleep before retrying.
    pub fn is_backoff(self) -> bool {
        matches!(
            self,
            ResponseAction::RetryLinearBackoff | ResponseAction::RetryExponentialBackoff
        )
    }

    /// True for every action that re-attempts the request.
    pub fn is_retry(self) -> bool {
        matches!(
            self,
            ResponseAction::RetryImmediate
                | ResponseAction::RetryLinearBackoff
                | ResponseAction::RetryExponentialBackoff
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ResponseAction::StageError => "STAGE_ERROR",
            ResponseAction::ErrorRecord => "ERROR_RECORD",
            ResponseAction::RetryImmediate => "RETRY_IMMEDIATE",
            ResponseAction::RetryLinearBackoff => "RETRY_LINEAR_BACKOFF",
            ResponseAction::RetryExponentialBackoff => "RETRY_EXPONENTIAL_BACKOFF",
        }
    }
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
