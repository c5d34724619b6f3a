//! Integration test: a stage built from TOML config reacting to scripted
//! transport failures, with real (short) backoff sleeps and shutdown.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use respol_core::attempt::{run_with_policy, AttemptError, RunOutcome};
use respol_core::config::RespolConfig;
use respol_core::control::{RecordingSleeper, ShutdownToken, ThreadSleeper};
use respol_core::error_record::ErrorRecord;
use respol_core::timeout::{SocketTimeout, TimeoutError};
use respol_core::{EngineError, ErrorKind, TimeoutType};

const CONFIG: &str = r#"
    config_name = "conf.responseActions"
    stage_error_code = "HTTP_STAGE_ABORT"

    [[actions]]
    status_code = 503
    action = "RETRY_LINEAR_BACKOFF"
    backoff_interval_ms = 5
    max_num_retries = 3

    [[actions]]
    status_code = 429
    action = "RETRY_EXPONENTIAL_BACKOFF"
    backoff_interval_ms = 60000
    max_num_retries = 0

    [[actions]]
    status_code = 404
    action = "ERROR_RECORD"
    pass_record = true

    [[actions]]
    status_code = 401
    action = "STAGE_ERROR"

    [timeout_action]
    action = "RETRY_IMMEDIATE"
    max_num_retries = 2
    pass_record = true
"#;

fn config() -> RespolConfig {
    toml::from_str(CONFIG).expect("config parses")
}

/// Error shaped like an HTTP client error wrapping a socket timeout.
#[derive(Debug)]
struct ClientError(SocketTimeout);

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client request failed")
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

#[test]
fn linear_backoff_sleeps_then_recovers() {
    let ctx = config().stage_context(ThreadSleeper::default()).unwrap();
    let mut script = VecDeque::from(vec![
        Err(AttemptError::Status(503)),
        Err(AttemptError::Status(503)),
        Ok("payload"),
    ]);
    let start = Instant::now();
    let outcome = run_with_policy(&ctx, || script.pop_front().unwrap()).unwrap();
    assert!(matches!(outcome, RunOutcome::Completed("payload")));
    // 5ms + 10ms of backoff.
    assert!(start.elapsed() >= Duration::from_millis(15));
    assert_eq!(ctx.state.snapshot().linear_ms, 10);
}

#[test]
fn wrapped_read_timeout_becomes_timeout_error_record() {
    let ctx = config().stage_context(RecordingSleeper::new()).unwrap();
    let outcome = run_with_policy(&ctx, || {
        Err::<(), _>(AttemptError::transport(ClientError(SocketTimeout::new(
            "Read timed out",
        ))))
    })
    .unwrap();
    let terminal = match outcome {
        RunOutcome::Terminal(t) => t,
        other => panic!("expected terminal, got {:?}", other),
    };
    assert_eq!(terminal.error_kind, ErrorKind::RecordTimeoutError);
    assert_eq!(terminal.timeout_type, Some(TimeoutType::Read));
    assert_eq!(terminal.retries, 2);
    assert!(terminal.send_to_output);

    let rec = ErrorRecord::from_terminal(&terminal, "rec-1", Some("GET /items"));
    assert_eq!(rec.code, "RESPOL_102");
    assert!(rec.message.ends_with(": GET /items"));
}

#[test]
fn record_timeout_is_not_retried_and_not_passed_through() {
    let ctx = config().stage_context(RecordingSleeper::new()).unwrap();
    let mut calls = 0;
    let outcome = run_with_policy(&ctx, || {
        calls += 1;
        Err::<(), _>(AttemptError::transport(TimeoutError::new(
            "record processing timed out after 30000 ms",
        )))
    })
    .unwrap();
    assert_eq!(calls, 1);
    match outcome {
        RunOutcome::Terminal(t) => {
            assert_eq!(t.timeout_type, Some(TimeoutType::Record));
            assert!(!t.send_to_output);
            assert!(t.send_to_error);
        }
        other => panic!("expected terminal, got {:?}", other),
    }
}

#[test]
fn error_record_routes_to_both_streams() {
    let ctx = config().stage_context(RecordingSleeper::new()).unwrap();
    let outcome = run_with_policy(&ctx, || Err::<(), _>(AttemptError::Status(404))).unwrap();
    match outcome {
        RunOutcome::Terminal(t) => {
            assert_eq!(t.error_kind, ErrorKind::GenericActionError);
            assert!(t.send_to_error && t.send_to_output);
            assert_eq!(t.retries, 0);
        }
        other => panic!("expected terminal, got {:?}", other),
    }
}

#[test]
fn stage_error_aborts_with_configured_code() {
    let ctx = config().stage_context(RecordingSleeper::new()).unwrap();
    let err = run_with_policy(&ctx, || Err::<(), _>(AttemptError::Status(401))).unwrap_err();
    match err {
        EngineError::StageError { code, status_code, .. } => {
            assert_eq!(code, "HTTP_STAGE_ABORT");
            assert_eq!(status_code, 401);
        }
        other => panic!("expected stage error, got {:?}", other),
    }
}

#[test]
fn shutdown_interrupts_long_backoff() {
    let token = ShutdownToken::new();
    let ctx = Arc::new(
        config()
            .stage_context(ThreadSleeper::new(token.clone()))
            .unwrap(),
    );
    let worker = {
        let ctx = Arc::clone(&ctx);
        thread::spawn(move || {
            let start = Instant::now();
            let res = run_with_policy(&*ctx, || Err::<(), _>(AttemptError::Status(429)));
            (res.map(|_| ()), start.elapsed())
        })
    };
    thread::sleep(Duration::from_millis(50));
    token.request_shutdown();
    let (res, elapsed) = worker.join().unwrap();
    assert_eq!(res.unwrap_err(), EngineError::Interrupted);
    assert!(elapsed < Duration::from_secs(30));
}

#[test]
fn concurrent_workers_share_backoff_state() {
    let ctx = Arc::new(config().stage_context(RecordingSleeper::new()).unwrap());
    ctx.state.begin_occurrence(true);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                for _ in 0..25 {
                    ctx.state.begin_occurrence(false);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(ctx.state.retry_count(), 100);
}
