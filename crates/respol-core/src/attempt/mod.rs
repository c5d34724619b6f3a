//! Caller-side attempt loop.
//!
//! This is the part of a stage that sits around the engine: it classifies
//! each failed attempt, looks up the matching policy, decides whether the
//! failure starts a new streak, and loops until the engine says stop.

mod error;
mod run;

pub use error::AttemptError;
pub use run::{run_with_policy, FailureStreak, RunOutcome, StageContext};
