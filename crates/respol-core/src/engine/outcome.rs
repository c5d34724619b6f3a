use serde::Serialize;
use std::fmt;

use crate::action::ResponseAction;
use crate::timeout::TimeoutType;

/// The failure a decision is being made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Trigger {
    /// A non-success HTTP status.
    Status(u16),
    /// A classified timeout. `Timeout(TimeoutType::None)` is treated as a
    /// non-timeout failure.
    Timeout(TimeoutType),
}

impl Trigger {
    pub fn is_timeout(&self) -> bool {
        self.timeout_type().is_some()
    }

    /// The classified timeout, or `None` for a status or an unclassified trigger.
    pub fn timeout_type(&self) -> Option<TimeoutType> {
        match self {
            Trigger::Timeout(t) if t.is_timeout() => Some(*t),
            Trigger::Timeout(_) | Trigger::Status(_) => None,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Status(code) => write!(f, "HTTP {}", code),
            Trigger::Timeout(t) => write!(f, "{} timeout", t),
        }
    }
}

/// Error kind reported in a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A configured status action ended the retry loop.
    GenericActionError,
    /// A timeout action ended the retry loop.
    RecordTimeoutError,
}

impl ErrorKind {
    /// Stable code used in error records.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::GenericActionError => "RESPOL_101",
            ErrorKind::RecordTimeoutError => "RESPOL_102",
        }
    }
}

/// Everything a caller needs to build an error record and route it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Terminal {
    pub error_kind: ErrorKind,
    pub status_code: u16,
    pub action: ResponseAction,
    pub retries: u32,
    pub send_to_error: bool,
    pub send_to_output: bool,
    pub timeout_type: Option<TimeoutType>,
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Re-attempt the request; any backoff has already been waited out.
    Retry,
    /// Stop retrying; emit an error record and route as indicated.
    Terminal(Terminal),
}

impl Outcome {
    pub fn is_retry(&self) -> bool {
        matches!(self, Outcome::Retry)
    }

    pub fn terminal(&self) -> Option<&Terminal> {
        match self {
            Outcome::Terminal(t) => Some(t),
            Outcome::Retry => None,
        }
    }
}
