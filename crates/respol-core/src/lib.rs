//! Response-action policies for HTTP pipeline stages.
//!
//! A stage that makes outbound calls declares, per status code and for
//! timeouts, whether to abort, emit an error record, or retry (immediately or
//! with linear/exponential backoff). This crate validates that policy set,
//! classifies transport timeouts, keeps the per-stage retry counters, and
//! turns each failed attempt into a single decision.

pub mod config;
pub mod logging;

pub mod action;
pub mod attempt;
pub mod backoff;
pub mod control;
pub mod engine;
pub mod error_record;
pub mod policy;
pub mod registry;
pub mod timeout;

pub use action::ResponseAction;
pub use backoff::BackoffState;
pub use engine::{EngineError, ErrorKind, Outcome, ResponseActionEngine, Terminal, Trigger};
pub use policy::ResponseActionPolicy;
pub use registry::StatusActionRegistry;
pub use timeout::{TimeoutClassifier, TimeoutType};
