//! A single operator-configured response-action rule.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::action::ResponseAction;

/// Reserved, non-HTTP status key under which the timeout policy is stored.
pub const TIMEOUT_STATUS_CODE: u16 = 0;

pub(crate) fn default_max_num_retries() -> i32 {
    10
}

pub(crate) fn default_backoff_interval_ms() -> i64 {
    1000
}

/// Maps one status code (or the timeout key) to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseActionPolicy {
    /// HTTP status this rule applies to; [`TIMEOUT_STATUS_CODE`] for timeouts.
    pub status_code: u16,
    pub action: ResponseAction,
    /// Retry budget for the current failure streak; `<= 0` means unlimited.
    #[serde(default = "default_max_num_retries")]
    pub max_num_retries: i32,
    /// Base backoff interval in milliseconds. Must be positive for backoff actions.
    #[serde(default = "default_backoff_interval_ms")]
    pub backoff_interval_ms: i64,
    /// Route a terminal failure to normal output as well as to the error stream.
    #[serde(default)]
    pub pass_record: bool,
}

impl ResponseActionPolicy {
    pub fn new(status_code: u16, action: ResponseAction) -> Self {
        Self {
            status_code,
            action,
            max_num_retries: default_max_num_retries(),
            backoff_interval_ms: default_backoff_interval_ms(),
            pass_record: false,
        }
    }

    /// Policy stored under the reserved timeout key.
    pub fn for_timeout(action: ResponseAction) -> Self {
        Self::new(TIMEOUT_STATUS_CODE, action)
    }

    pub fn with_max_retries(mut self, max_num_retries: i32) -> Self {
        self.max_num_retries = max_num_retries;
        self
    }

    pub fn with_backoff_ms(mut self, backoff_interval_ms: i64) -> Self {
        self.backoff_interval_ms = backoff_interval_ms;
        self
    }

    pub fn with_pass_record(mut self, pass_record: bool) -> Self {
        self.pass_record = pass_record;
        self
    }

    pub fn is_timeout_policy(&self) -> bool {
        self.status_code == TIMEOUT_STATUS_CODE
    }

    /// False when retries are unlimited.
    pub fn has_retry_limit(&self) -> bool {
        self.max_num_retries > 0
    }

    /// Base interval as a duration; negative intervals clamp to zero.
    pub fn backoff_interval(&self) -> Duration {
        Duration::from_millis(self.backoff_interval_ms.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let p = ResponseActionPolicy::new(503, ResponseAction::RetryLinearBackoff)
            .with_max_retries(3)
            .with_backoff_ms(250)
            .with_pass_record(true);
        assert_eq!(p.status_code, 503);
        assert_eq!(p.max_num_retries, 3);
        assert_eq!(p.backoff_interval(), Duration::from_millis(250));
        assert!(p.pass_record);
        assert!(p.has_retry_limit());
        assert!(!p.is_timeout_policy());
    }

    #[test]
    fn non_positive_retries_mean_unlimited() {
        let p = ResponseActionPolicy::new(500, ResponseAction::RetryImmediate).with_max_retries(0);
        assert!(!p.has_retry_limit());
        let p = p.with_max_retries(-1);
        assert!(!p.has_retry_limit());
    }

    #[test]
    fn negative_interval_clamps() {
        let p = ResponseActionPolicy::for_timeout(ResponseAction::RetryLinearBackoff)
            .with_backoff_ms(-5);
        assert!(p.is_timeout_policy());
        assert_eq!(p.backoff_interval(), Duration::ZERO);
    }

    #[test]
    fn toml_defaults_apply() {
        let p: ResponseActionPolicy = toml::from_str(
            r#"
            status_code = 429
            action = "RETRY_EXPONENTIAL_BACKOFF"
        "#,
        )
        .unwrap();
        assert_eq!(p.max_num_retries, 10);
        assert_eq!(p.backoff_interval_ms, 1000);
        assert!(!p.pass_record);
    }
}
