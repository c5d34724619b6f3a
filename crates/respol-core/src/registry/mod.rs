//! Validated mapping from status code to response-action policy.
//!
//! Built once per stage instance from operator configuration. Registration
//! never fails outright: every problem is collected as a [`ConfigIssue`] so
//! the surrounding validation step can report all of them together and
//! refuse to start the stage.

mod issue;

use std::collections::BTreeMap;

use crate::engine::Trigger;
use crate::policy::{ResponseActionPolicy, TIMEOUT_STATUS_CODE};

pub use issue::{ConfigError, ConfigIssue, ConfigIssueKind};

/// Status code -> policy, with the timeout policy under the reserved key.
#[derive(Debug, Clone, Default)]
pub struct StatusActionRegistry {
    config_name: String,
    policies: BTreeMap<u16, ResponseActionPolicy>,
}

/// A registry together with the issues found while building it.
#[derive(Debug, Clone)]
pub struct Registration {
    pub registry: StatusActionRegistry,
    pub issues: Vec<ConfigIssue>,
}

impl Registration {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// The registry if no issues were found.
    pub fn into_result(self) -> Result<StatusActionRegistry, ConfigError> {
        if self.issues.is_empty() {
            Ok(self.registry)
        } else {
            Err(ConfigError::Invalid(self.issues))
        }
    }
}

impl StatusActionRegistry {
    /// Empty registry; `config_name` names the config field in issue reports.
    pub fn new(config_name: impl Into<String>) -> Self {
        Self {
            config_name: config_name.into(),
            policies: BTreeMap::new(),
        }
    }

    /// Register every status policy in order, then the timeout policy, and
    /// collect all issues.
    pub fn build<'a, I>(
        config_name: impl Into<String>,
        policies: I,
        timeout_policy: Option<&ResponseActionPolicy>,
    ) -> Registration
    where
        I: IntoIterator<Item = &'a ResponseActionPolicy>,
    {
        let mut registry = Self::new(config_name);
        let mut issues = Vec::new();
        for policy in policies {
            issues.extend(registry.register(policy.clone()));
        }
        if let Some(policy) = timeout_policy {
            issues.extend(registry.register_timeout(policy.clone()));
        }
        if !issues.is_empty() {
            tracing::warn!(
                config = %registry.config_name,
                issues = issues.len(),
                "response action configuration has issues"
            );
        }
        Registration { registry, issues }
    }

    /// Insert one status policy (last write wins) and return the issues it
    /// raises. A policy on the reserved timeout key is reported and dropped.
    pub fn register(&mut self, policy: ResponseActionPolicy) -> Vec<ConfigIssue> {
        let status_code = policy.status_code;
        if status_code == TIMEOUT_STATUS_CODE {
            return vec![self.issue(ConfigIssueKind::ReservedStatusCode(status_code))];
        }
        let mut issues = Vec::new();
        if (200..300).contains(&status_code) {
            issues.push(ConfigIssueKind::SuccessStatusCode(status_code));
        }
        self.insert(policy, issues)
    }

    /// Insert the policy applied to every classified timeout.
    pub fn register_timeout(&mut self, mut policy: ResponseActionPolicy) -> Vec<ConfigIssue> {
        policy.status_code = TIMEOUT_STATUS_CODE;
        self.insert(policy, Vec::new())
    }

    fn insert(&mut self, policy: ResponseActionPolicy, extra: Vec<ConfigIssueKind>) -> Vec<ConfigIssue> {
        let status_code = policy.status_code;
        let mut issues = Vec::new();
        if policy.action.is_backoff() && policy.backoff_interval_ms <= 0 {
            issues.push(ConfigIssueKind::InvalidBackoffInterval { status_code });
        }
        issues.extend(extra);
        if self.policies.insert(status_code, policy).is_some() {
            issues.insert(0, ConfigIssueKind::DuplicateStatusCode(status_code));
        }

        issues.into_iter().map(|kind| self.issue(kind)).collect()
    }

    fn issue(&self, kind: ConfigIssueKind) -> ConfigIssue {
        ConfigIssue::new(self.config_name.clone(), kind)
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    /// Policy for an HTTP status code.
    pub fn get(&self, status_code: u16) -> Option<&ResponseActionPolicy> {
        if status_code == TIMEOUT_STATUS_CODE {
            return None;
        }
        self.policies.get(&status_code)
    }

    /// Policy applied to every classified timeout.
    pub fn timeout_policy(&self) -> Option<&ResponseActionPolicy> {
        self.policies.get(&TIMEOUT_STATUS_CODE)
    }

    pub fn lookup(&self, trigger: &Trigger) -> Option<&ResponseActionPolicy> {
        match trigger {
            Trigger::Status(code) => self.get(*code),
            Trigger::Timeout(_) => self.timeout_policy(),
        }
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policies in ascending status-code order (timeout policy first).
    pub fn iter(&self) -> impl Iterator<Item = &ResponseActionPolicy> {
        self.policies.values()
    }
}
