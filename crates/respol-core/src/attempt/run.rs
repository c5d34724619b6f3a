//! Attempt loop: run a request closure until it succeeds or a policy ends it.

use std::sync::{Arc, Mutex, PoisonError};

use crate::backoff::BackoffState;
use crate::control::{Sleeper, ThreadSleeper};
use crate::engine::{EngineError, Outcome, ResponseActionEngine, Terminal, Trigger};
use crate::registry::StatusActionRegistry;
use crate::timeout::{TimeoutClassifier, TimeoutType};

use super::error::AttemptError;

/// Remembers the last failure so the stage can tell the engine whether a
/// failure starts a new streak.
#[derive(Debug, Default)]
pub struct FailureStreak {
    last: Mutex<Option<Trigger>>,
}

impl FailureStreak {
    /// Record a failure; returns `true` if it differs from the previous one.
    pub fn observe(&self, trigger: Trigger) -> bool {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let first = *last != Some(trigger);
        *last = Some(trigger);
        first
    }

    /// A success ends the streak.
    pub fn clear(&self) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn last(&self) -> Option<Trigger> {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything one stage instance needs to react to failed attempts.
#[derive(Debug)]
pub struct StageContext<S = ThreadSleeper> {
    pub engine: ResponseActionEngine<S>,
    pub registry: StatusActionRegistry,
    pub classifier: TimeoutClassifier,
    pub state: Arc<BackoffState>,
    pub streak: FailureStreak,
}

impl<S: Sleeper> StageContext<S> {
    pub fn new(
        engine: ResponseActionEngine<S>,
        registry: StatusActionRegistry,
        classifier: TimeoutClassifier,
    ) -> Self {
        Self {
            engine,
            registry,
            classifier,
            state: Arc::new(BackoffState::new()),
            streak: FailureStreak::default(),
        }
    }

    /// Map an attempt failure to the trigger policies are keyed on.
    /// `None` for transport errors that are not timeouts.
    pub fn trigger_for(&self, err: &AttemptError) -> Option<Trigger> {
        match err {
            AttemptError::Status(code) => Some(Trigger::Status(*code)),
            AttemptError::Transport(e) => match self.classifier.classify(&**e) {
                TimeoutType::None => None,
                t => Some(Trigger::Timeout(t)),
            },
        }
    }

    /// Stage restart: forget the streak and every counter.
    pub fn reset(&self) {
        self.streak.clear();
        self.state.reset();
    }
}

/// How a run of attempts ended.
#[derive(Debug)]
pub enum RunOutcome<T> {
    /// An attempt succeeded.
    Completed(T),
    /// A policy ended the retry loop; build an error record from this.
    Terminal(Terminal),
    /// No policy covers this failure; the stage applies its own default.
    Unhandled(AttemptError),
}

/// Runs a closure until it succeeds, a policy ends the loop, or the stage
/// aborts. Backoff waits happen inside the engine between attempts.
pub fn run_with_policy<T, S, F>(ctx: &StageContext<S>, mut f: F) -> Result<RunOutcome<T>, EngineError>
where
    S: Sleeper,
    F: FnMut() -> Result<T, AttemptError>,
{
    loop {
        let err = match f() {
            Ok(value) => {
                ctx.streak.clear();
                return Ok(RunOutcome::Completed(value));
            }
            Err(e) => e,
        };

        let trigger = match ctx.trigger_for(&err) {
            Some(t) => t,
            None => {
                tracing::debug!(error = %err, "attempt failed without a timeout");
                return Ok(RunOutcome::Unhandled(err));
            }
        };
        let policy = match ctx.registry.lookup(&trigger) {
            Some(p) => p,
            None => {
                tracing::debug!(%trigger, "no response action configured");
                return Ok(RunOutcome::Unhandled(err));
            }
        };

        let first = ctx.streak.observe(trigger);
        match ctx.engine.decide(policy, trigger, first, &ctx.state)? {
            Outcome::Retry => continue,
            Outcome::Terminal(t) => return Ok(RunOutcome::Terminal(t)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ResponseAction;
    use crate::control::RecordingSleeper;
    use crate::engine::ErrorKind;
    use crate::policy::ResponseActionPolicy;
    use crate::timeout::SocketTimeout;
    use std::collections::VecDeque;
    use std::io;
    use std::time::Duration;

    fn context(policies: &[ResponseActionPolicy]) -> StageContext<RecordingSleeper> {
        let (timeout, status): (Vec<_>, Vec<_>) =
            policies.iter().partition(|p| p.is_timeout_policy());
        let registry = StatusActionRegistry::build("cfg", status, timeout.first().copied())
            .into_result()
            .unwrap();
        StageContext::new(
            ResponseActionEngine::new(RecordingSleeper::new()),
            registry,
            TimeoutClassifier::default(),
        )
    }

    /// Closure that replays scripted attempt results.
    fn script(
        steps: Vec<Result<&'static str, AttemptError>>,
    ) -> impl FnMut() -> Result<&'static str, AttemptError> {
        let mut steps = VecDeque::from(steps);
        move || steps.pop_front().expect("script exhausted")
    }

    #[test]
    fn retries_then_completes() {
        let ctx = context(&[ResponseActionPolicy::new(503, ResponseAction::RetryLinearBackoff)
            .with_backoff_ms(10)
            .with_max_retries(5)]);
        let f = script(vec![
            Err(AttemptError::Status(503)),
            Err(AttemptError::Status(503)),
            Ok("body"),
        ]);
        match run_with_policy(&ctx, f).unwrap() {
            RunOutcome::Completed(v) => assert_eq!(v, "body"),
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(
            ctx.engine.sleeper().durations(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
        assert_eq!(ctx.streak.last(), None);
    }

    #[test]
    fn exhausts_and_returns_terminal() {
        let ctx = context(&[ResponseActionPolicy::new(503, ResponseAction::RetryExponentialBackoff)
            .with_backoff_ms(100)
            .with_max_retries(2)]);
        let f = || Err::<(), _>(AttemptError::Status(503));
        match run_with_policy(&ctx, f).unwrap() {
            RunOutcome::Terminal(t) => {
                assert_eq!(t.retries, 2);
                assert_eq!(t.error_kind, ErrorKind::GenericActionError);
            }
            other => panic!("expected terminal, got {:?}", other),
        }
        assert_eq!(
            ctx.engine.sleeper().durations(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }

    #[test]
    fn changing_status_starts_new_streak() {
        let ctx = context(&[
            ResponseActionPolicy::new(502, ResponseAction::RetryLinearBackoff)
                .with_backoff_ms(10)
                .with_max_retries(0),
            ResponseActionPolicy::new(503, ResponseAction::RetryLinearBackoff)
                .with_backoff_ms(10)
                .with_max_retries(0),
        ]);
        let f = script(vec![
            Err(AttemptError::Status(502)),
            Err(AttemptError::Status(502)),
            Err(AttemptError::Status(503)),
            Ok("done"),
        ]);
        assert!(matches!(
            run_with_policy(&ctx, f).unwrap(),
            RunOutcome::Completed("done")
        ));
        // 503 is a fresh failure, so the base interval is used again.
        assert_eq!(
            ctx.engine.sleeper().durations(),
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(10)
            ]
        );
    }

    #[test]
    fn unconfigured_status_is_unhandled() {
        let ctx = context(&[ResponseActionPolicy::new(503, ResponseAction::RetryImmediate)]);
        let f = || Err::<(), _>(AttemptError::Status(404));
        assert!(matches!(
            run_with_policy(&ctx, f).unwrap(),
            RunOutcome::Unhandled(AttemptError::Status(404))
        ));
    }

    #[test]
    fn non_timeout_transport_error_is_unhandled() {
        let ctx = context(&[ResponseActionPolicy::for_timeout(ResponseAction::RetryImmediate)]);
        let f = || {
            Err::<(), _>(AttemptError::from(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "refused",
            )))
        };
        assert!(matches!(
            run_with_policy(&ctx, f).unwrap(),
            RunOutcome::Unhandled(AttemptError::Transport(_))
        ));
    }

    #[test]
    fn read_timeout_uses_timeout_policy() {
        let ctx = context(&[ResponseActionPolicy::for_timeout(ResponseAction::RetryImmediate)
            .with_max_retries(1)]);
        let f = || Err::<(), _>(AttemptError::transport(SocketTimeout::new("Read timed out")));
        match run_with_policy(&ctx, f).unwrap() {
            RunOutcome::Terminal(t) => {
                assert_eq!(t.error_kind, ErrorKind::RecordTimeoutError);
                assert_eq!(t.timeout_type, Some(TimeoutType::Read));
                assert_eq!(t.retries, 1);
            }
            other => panic!("expected terminal, got {:?}", other),
        }
    }

    #[test]
    fn std_socket_read_timeout_uses_timeout_policy() {
        use std::io::Read;
        use std::net::{TcpListener, TcpStream};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (_server, _) = listener.accept().unwrap();
        client.set_read_timeout(Some(Duration::from_millis(50))).unwrap();

        let ctx = context(&[ResponseActionPolicy::for_timeout(ResponseAction::ErrorRecord)]);
        let f = || {
            let mut buf = [0u8; 16];
            client.read(&mut buf).map_err(AttemptError::from)
        };
        match run_with_policy(&ctx, f).unwrap() {
            RunOutcome::Terminal(t) => {
                assert_eq!(t.error_kind, ErrorKind::RecordTimeoutError);
                assert_eq!(t.timeout_type, Some(TimeoutType::Unknown));
            }
            other => panic!("expected terminal, got {:?}", other),
        }
    }

    #[test]
    fn stage_error_propagates() {
        let ctx = context(&[ResponseActionPolicy::new(401, ResponseAction::StageError)]);
        let f = || Err::<(), _>(AttemptError::Status(401));
        let err = run_with_policy(&ctx, f).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn streak_carries_across_runs_until_success() {
        let ctx = context(&[ResponseActionPolicy::new(404, ResponseAction::ErrorRecord)]);
        let fail = || Err::<(), _>(AttemptError::Status(404));
        let first = run_with_policy(&ctx, fail).unwrap();
        let second = run_with_policy(&ctx, fail).unwrap();
        match (first, second) {
            (RunOutcome::Terminal(a), RunOutcome::Terminal(b)) => {
                assert_eq!(a.retries, 0);
                // Same failure as the previous record: not a first occurrence.
                assert_eq!(b.retries, 0);
                assert_eq!(ctx.state.retry_count(), 1);
            }
            other => panic!("expected two terminals, got {:?}", other),
        }
        assert!(matches!(
            run_with_policy(&ctx, || Ok::<_, AttemptError>(())).unwrap(),
            RunOutcome::Completed(())
        ));
        assert!(ctx.streak.observe(Trigger::Status(404)));
    }

    #[test]
    fn reset_clears_streak_and_state() {
        let ctx = context(&[]);
        ctx.streak.observe(Trigger::Status(500));
        ctx.state.begin_occurrence(false);
        ctx.reset();
        assert_eq!(ctx.streak.last(), None);
        assert_eq!(ctx.state.retry_count(), 0);
    }
}
