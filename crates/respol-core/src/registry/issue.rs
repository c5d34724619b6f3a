//! Configuration issues raised while registering response-action policies.

use serde::Serialize;
use std::fmt;

/// What is wrong with one configured policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigIssueKind {
    /// Two policies target the same status code; the later one is kept.
    DuplicateStatusCode(u16),
    /// A backoff action has no positive interval.
    InvalidBackoffInterval { status_code: u16 },
    /// A policy targets a 2xx status.
    SuccessStatusCode(u16),
    /// A status policy uses the key reserved for the timeout policy.
    ReservedStatusCode(u16),
}

impl ConfigIssueKind {
    /// Stable code shown to operators.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigIssueKind::InvalidBackoffInterval { .. } => "RESPOL_15",
            ConfigIssueKind::SuccessStatusCode(_) => "RESPOL_16",
            ConfigIssueKind::DuplicateStatusCode(_) => "RESPOL_17",
            ConfigIssueKind::ReservedStatusCode(_) => "RESPOL_18",
        }
    }
}

impl fmt::Display for ConfigIssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssueKind::DuplicateStatusCode(code) => {
                write!(f, "multiple actions configured for status code {}", code)
            }
            ConfigIssueKind::InvalidBackoffInterval { status_code } => write!(
                f,
                "backoff interval for status code {} must be greater than 0",
                status_code
            ),
            ConfigIssueKind::SuccessStatusCode(code) => write!(
                f,
                "status code {} is a success status and cannot have an action",
                code
            ),
            ConfigIssueKind::ReservedStatusCode(code) => write!(
                f,
                "status code {} is reserved for the timeout action; use [timeout_action]",
                code
            ),
        }
    }
}

/// An issue tied to the configuration field it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigIssue {
    pub config_name: String,
    pub kind: ConfigIssueKind,
}

impl ConfigIssue {
    pub fn new(config_name: impl Into<String>, kind: ConfigIssueKind) -> Self {
        Self {
            config_name: config_name.into(),
            kind,
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.config_name, self.kind.code(), self.kind)
    }
}

/// Returned when a policy set with issues is turned into a usable registry.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{} configuration issue(s): {}", .0.len(), join_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
