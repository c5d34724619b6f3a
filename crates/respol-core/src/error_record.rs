//! Error records built from terminal outcomes.

use serde::Serialize;

use crate::action::ResponseAction;
use crate::engine::{ErrorKind, Terminal};
use crate::timeout::TimeoutType;

/// A record routed to the error stream, annotated with why it got there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord<R> {
    pub record: R,
    pub code: &'static str,
    pub message: String,
    pub status_code: u16,
    pub action: ResponseAction,
    pub retries: u32,
    pub timeout_type: Option<TimeoutType>,
    /// The same record must also go to normal output.
    pub send_to_output: bool,
}

impl<R> ErrorRecord<R> {
    /// Attach a record (and an optional caller message) to a terminal outcome.
    pub fn from_terminal(terminal: &Terminal, record: R, detail: Option<&str>) -> Self {
        let mut message = match terminal.error_kind {
            ErrorKind::GenericActionError => format!(
                "error processing record: status {} handled by {} after {} retries",
                terminal.status_code, terminal.action, terminal.retries
            ),
            ErrorKind::RecordTimeoutError => format!(
                "record timed out ({}): handled by {} after {} retries",
                terminal.timeout_type.unwrap_or(TimeoutType::Unknown),
                terminal.action,
                terminal.retries
            ),
        };
        if let Some(detail) = detail.filter(|d| !d.is_empty()) {
            message.push_str(": ");
            message.push_str(detail);
        }
        Self {
            record,
            code: terminal.error_kind.code(),
            message,
            status_code: terminal.status_code,
            action: terminal.action,
            retries: terminal.retries,
            timeout_type: terminal.timeout_type,
            send_to_output: terminal.send_to_output,
        }
    }
}

impl<R: Serialize> ErrorRecord<R> {
    /// JSON form written to the error stream.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
