//! Timeout classification.
//!
//! Transports report which phase of a request timed out only through
//! free-text messages. This module walks an error and its causes, finds the
//! timeout (if any), and maps its message onto a fixed [`TimeoutType`]
//! taxonomy using configurable [`TimeoutMarkers`].

mod classify;
mod error;
mod markers;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use classify::TimeoutClassifier;
pub use error::{SocketTimeout, TimeoutError};
pub use markers::TimeoutMarkers;

/// Which kind of timeout a failed attempt ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeoutType {
    /// No timeout-class error was found.
    None,
    /// A timeout was found but its message matched no marker.
    Unknown,
    /// Establishing the connection timed out.
    Connection,
    /// Waiting for response data timed out.
    Read,
    /// The whole request exceeded its time budget.
    Request,
    /// The pipeline's own per-record processing budget ran out.
    Record,
}

impl TimeoutType {
    pub fn is_timeout(self) -> bool {
        self != TimeoutType::None
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeoutType::None => "NONE",
            TimeoutType::Unknown => "UNKNOWN",
            TimeoutType::Connection => "CONNECTION",
            TimeoutType::Read => "READ",
            TimeoutType::Request => "REQUEST",
            TimeoutType::Record => "RECORD",
        }
    }
}

impl fmt::Display for TimeoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
