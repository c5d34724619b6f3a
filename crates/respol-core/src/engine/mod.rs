//! Response-action decision engine.
//!
//! Given the policy matched for a failed attempt, whether this failure is the
//! first of its streak, and the stage's shared [`BackoffState`], the engine
//! decides to retry (after waiting out any backoff), to end the retry loop
//! with a [`Terminal`] outcome, or to abort the stage.
//!
//! The first-occurrence flag always comes from the caller. Only the calling
//! stage knows whether this failure matches the one before it.

mod error;
mod outcome;

use std::time::Duration;

use crate::action::ResponseAction;
use crate::backoff::BackoffState;
use crate::control::{Sleeper, ThreadSleeper};
use crate::policy::ResponseActionPolicy;
use crate::timeout::TimeoutType;

pub use error::EngineError;
pub use outcome::{ErrorKind, Outcome, Terminal, Trigger};

/// Error code carried by a stage abort unless configured otherwise.
pub const DEFAULT_STAGE_ERROR_CODE: &str = "RESPOL_STAGE_ERROR";

#[derive(Debug, Clone)]
pub struct ResponseActionEngine<S = ThreadSleeper> {
    sleeper: S,
    stage_error_code: String,
}

impl Default for ResponseActionEngine<ThreadSleeper> {
    fn default() -> Self {
        Self::new(ThreadSleeper::default())
    }
}

impl<S: Sleeper> ResponseActionEngine<S> {
    pub fn new(sleeper: S) -> Self {
        Self {
            sleeper,
            stage_error_code: DEFAULT_STAGE_ERROR_CODE.to_string(),
        }
    }

    /// Error code reported when a `STAGE_ERROR` policy fires.
    pub fn with_stage_error_code(mut self, code: impl Into<String>) -> Self {
        self.stage_error_code = code.into();
        self
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn stage_error_code(&self) -> &str {
        &self.stage_error_code
    }

    /// Decide what to do about one failed attempt. May block for the
    /// backoff interval before returning [`Outcome::Retry`].
    pub fn decide(
        &self,
        policy: &ResponseActionPolicy,
        trigger: Trigger,
        first_occurrence: bool,
        state: &BackoffState,
    ) -> Result<Outcome, EngineError> {
        let retry_count = state.begin_occurrence(first_occurrence);

        if Self::is_terminal(policy, trigger, retry_count) {
            return Ok(Outcome::Terminal(Self::terminal(
                policy,
                trigger,
                first_occurrence,
                retry_count,
            )));
        }

        let base_ms = policy.backoff_interval_ms.max(0) as u64;
        match policy.action {
            ResponseAction::StageError => {
                tracing::error!(
                    status_code = policy.status_code,
                    %trigger,
                    code = %self.stage_error_code,
                    "response action aborts stage"
                );
                Err(EngineError::StageError {
                    code: self.stage_error_code.clone(),
                    status_code: policy.status_code,
                    trigger,
                })
            }
            // Always caught by the terminal check above.
            ResponseAction::ErrorRecord => Ok(Outcome::Terminal(Self::terminal(
                policy,
                trigger,
                first_occurrence,
                retry_count,
            ))),
            ResponseAction::RetryImmediate => {
                tracing::debug!(%trigger, retry_count, "retrying immediately");
                Ok(Outcome::Retry)
            }
            ResponseAction::RetryLinearBackoff => {
                let wait_ms = state.next_linear(first_occurrence, base_ms);
                self.backoff(trigger, retry_count, wait_ms)?;
                Ok(Outcome::Retry)
            }
            ResponseAction::RetryExponentialBackoff => {
                let wait_ms = state.next_exponential(first_occurrence, base_ms);
                self.backoff(trigger, retry_count, wait_ms)?;
                Ok(Outcome::Retry)
            }
        }
    }

    fn is_terminal(policy: &ResponseActionPolicy, trigger: Trigger, retry_count: u32) -> bool {
        match policy.action {
            ResponseAction::ErrorRecord => true,
            ResponseAction::StageError => false,
            ResponseAction::RetryImmediate
            | ResponseAction::RetryLinearBackoff
            | ResponseAction::RetryExponentialBackoff => {
                let exhausted =
                    policy.has_retry_limit() && retry_count > policy.max_num_retries as u32;
                // The batch budget is already spent once a record times out.
                let record_timeout = trigger == Trigger::Timeout(TimeoutType::Record);
                exhausted || record_timeout
            }
        }
    }

    fn terminal(
        policy: &ResponseActionPolicy,
        trigger: Trigger,
        first_occurrence: bool,
        retry_count: u32,
    ) -> Terminal {
        let error_kind = if trigger.is_timeout() {
            ErrorKind::RecordTimeoutError
        } else {
            ErrorKind::GenericActionError
        };
        let retries = if first_occurrence {
            0
        } else {
            retry_count.saturating_sub(1)
        };
        let batch_timeout = trigger == Trigger::Timeout(TimeoutType::Record);
        let terminal = Terminal {
            error_kind,
            status_code: policy.status_code,
            action: policy.action,
            retries,
            send_to_error: true,
            send_to_output: policy.pass_record && !batch_timeout,
            timeout_type: trigger.timeout_type(),
        };
        tracing::warn!(
            %trigger,
            action = %policy.action,
            retries,
            send_to_output = terminal.send_to_output,
            "response action is terminal"
        );
        terminal
    }

    fn backoff(&self, trigger: Trigger, retry_count: u32, wait_ms: u64) -> Result<(), EngineError> {
        tracing::debug!(%trigger, retry_count, wait_ms, "applying backoff");
        self.sleeper.sleep(Duration::from_millis(wait_ms)).map_err(|e| {
            tracing::info!(%trigger, wait_ms, "backoff interrupted");
            EngineError::from(e)
        })
    }
}
