//! Simulate command: replay one failure against the configured policy.

use anyhow::{Context, Result};
use respol_core::config::RespolConfig;
use respol_core::control::RecordingSleeper;
use respol_core::timeout::SocketTimeout;
use respol_core::{EngineError, Outcome, Trigger};
use serde_json::json;
use std::time::Duration;

use crate::cli::SimulateTarget;

/// One line of simulation output.
#[derive(Debug)]
pub struct Step {
    pub attempt: u32,
    pub first_occurrence: bool,
    pub retry_count: u32,
    pub wait_ms: Option<u64>,
    pub result: Result<Outcome, EngineError>,
}

impl Step {
    fn is_last(&self) -> bool {
        !matches!(self.result, Ok(Outcome::Retry))
    }

    fn to_json(&self) -> serde_json::Value {
        let (decision, detail) = match &self.result {
            Ok(Outcome::Retry) => ("retry", serde_json::Value::Null),
            Ok(Outcome::Terminal(t)) => ("terminal", json!(t)),
            Err(e) => ("abort", json!(e.to_string())),
        };
        json!({
            "attempt": self.attempt,
            "first_occurrence": self.first_occurrence,
            "retry_count": self.retry_count,
            "wait_ms": self.wait_ms,
            "decision": decision,
            "detail": detail,
        })
    }

    fn to_line(&self) -> String {
        let head = format!("attempt {:>3} (retry count {})", self.attempt, self.retry_count);
        match &self.result {
            Ok(Outcome::Retry) => match self.wait_ms {
                Some(ms) => format!("{}: retry after {} ms", head, ms),
                None => format!("{}: retry immediately", head),
            },
            Ok(Outcome::Terminal(t)) => format!(
                "{}: terminal {} (action {}, retries {}, to output: {})",
                head,
                t.error_kind.code(),
                t.action,
                t.retries,
                t.send_to_output
            ),
            Err(e) => format!("{}: {}", head, e),
        }
    }
}

/// Whole milliseconds, saturating like the backoff accumulators.
fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn resolve_trigger(cfg: &RespolConfig, target: &SimulateTarget) -> Result<Trigger> {
    if let Some(code) = target.status {
        return Ok(Trigger::Status(code));
    }
    let message = target
        .timeout
        .as_deref()
        .context("either --status or --timeout is required")?;
    let timeout_type = cfg.classifier().classify(&SocketTimeout::new(message));
    Ok(Trigger::Timeout(timeout_type))
}

/// Replay `attempts` consecutive failures, stopping at the first final decision.
pub fn simulate(cfg: &RespolConfig, target: &SimulateTarget, attempts: u32) -> Result<Vec<Step>> {
    let ctx = cfg.stage_context(RecordingSleeper::new())?;
    let trigger = resolve_trigger(cfg, target)?;
    let policy = ctx
        .registry
        .lookup(&trigger)
        .with_context(|| format!("no response action configured for {}", trigger))?;

    let mut steps = Vec::new();
    for attempt in 1..=attempts {
        let first_occurrence = ctx.streak.observe(trigger);
        let slept_before = ctx.engine.sleeper().durations().len();
        let result = ctx.engine.decide(policy, trigger, first_occurrence, &ctx.state);
        let wait_ms = ctx
            .engine
            .sleeper()
            .durations()
            .get(slept_before)
            .map(|d| duration_ms(*d));
        let step = Step {
            attempt,
            first_occurrence,
            retry_count: ctx.state.retry_count(),
            wait_ms,
            result,
        };
        let last = step.is_last();
        steps.push(step);
        if last {
            break;
        }
    }
    Ok(steps)
}

pub fn run_simulate(cfg: &RespolConfig, target: &SimulateTarget, attempts: u32, json: bool) -> Result<()> {
    for step in simulate(cfg, target, attempts)? {
        if json {
            println!("{}", step.to_json());
        } else {
            println!("{}", step.to_line());
        }
    }
    Ok(())
}
