//! Classify transport errors into [`TimeoutType`]s.

use std::error::Error;
use std::io;

use super::error::{SocketTimeout, TimeoutError};
use super::markers::TimeoutMarkers;
use super::TimeoutType;

/// Message text of a socket-level timeout, or `None` if `err` is not one.
/// The inner `Option` is `None` when the timeout carries no description.
fn socket_timeout_text(err: &(dyn Error + 'static)) -> Option<Option<String>> {
    if let Some(e) = err.downcast_ref::<io::Error>() {
        // Unix reports an expired SO_RCVTIMEO/SO_SNDTIMEO as WouldBlock.
        if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
            // A bare-kind or OS io::Error only has its generic kind text.
            return Some(e.get_ref().map(|inner| inner.to_string()));
        }
        return None;
    }
    if let Some(e) = err.downcast_ref::<curl::Error>() {
        if e.is_operation_timedout() {
            return Some(e.extra_description().map(str::to_string));
        }
        return None;
    }
    err.downcast_ref::<SocketTimeout>()
        .map(|e| e.message().map(str::to_string))
}

/// Message text of a pipeline-raised timeout, or `None` if `err` is not one.
fn generic_timeout_text(err: &(dyn Error + 'static)) -> Option<Option<String>> {
    err.downcast_ref::<TimeoutError>()
        .map(|e| e.message().map(str::to_string))
}

/// First socket-level timeout in the `source()` chain below `err`.
fn find_socket_timeout_cause(err: &(dyn Error + 'static)) -> Option<Option<String>> {
    let mut current = err.source();
    while let Some(cause) = current {
        if let Some(text) = socket_timeout_text(cause) {
            return Some(text);
        }
        current = cause.source();
    }
    None
}

/// Assigns a [`TimeoutType`] to errors raised by a request attempt.
#[derive(Debug, Clone, Default)]
pub struct TimeoutClassifier {
    markers: TimeoutMarkers,
}

impl TimeoutClassifier {
    pub fn new(markers: TimeoutMarkers) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &TimeoutMarkers {
        &self.markers
    }

    /// Classify an error and its cause chain.
    ///
    /// The error itself is used when it is a socket or pipeline timeout;
    /// otherwise the first socket timeout among its causes is used. Returns
    /// [`TimeoutType::None`] when there is no timeout at all.
    pub fn classify(&self, err: &(dyn Error + 'static)) -> TimeoutType {
        let text = match socket_timeout_text(err)
            .or_else(|| generic_timeout_text(err))
            .or_else(|| find_socket_timeout_cause(err))
        {
            Some(text) => text,
            None => return TimeoutType::None,
        };
        let timeout_type = self.classify_message(text.as_deref());
        tracing::debug!(error = %err, timeout_type = %timeout_type, "classified timeout");
        timeout_type
    }

    /// Match a timeout message against the markers in priority order.
    pub fn classify_message(&self, message: Option<&str>) -> TimeoutType {
        let message = match message {
            Some(m) if !m.is_empty() => m,
            _ => return TimeoutType::Unknown,
        };
        self.markers.find(message).unwrap_or(TimeoutType::Unknown)
    }
}
