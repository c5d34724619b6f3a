use serde::{Deserialize, Serialize};

use super::TimeoutType;

/// Text markers searched for in a timeout error's message.
///
/// Transports only report the timeout phase in free text, so these strings
/// are tied to the wording of the transport in use. Each type takes several
/// markers so one config can cover more than one transport. They live in
/// config so they can be changed without touching the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutMarkers {
    pub connection: Vec<String>,
    pub read: Vec<String>,
    pub request: Vec<String>,
    pub record: Vec<String>,
}

fn owned(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|m| m.to_string()).collect()
}

impl Default for TimeoutMarkers {
    fn default() -> Self {
        Self {
            // libcurl says "Connection timed out after N milliseconds" and
            // "Resolving timed out after N milliseconds".
            connection: owned(&["connect timed out", "Connection timed out", "Resolving timed out"]),
            // libcurl low-speed limit: "Operation too slow. Less than ...".
            read: owned(&["Read timed out", "Operation too slow"]),
            // libcurl total timeout: "Operation timed out after N milliseconds ...".
            request: owned(&["request timed out", "Operation timed out"]),
            record: owned(&["record processing timed out"]),
        }
    }
}

impl TimeoutMarkers {
    /// Marker lists in match priority order.
    pub fn in_priority_order(&self) -> [(TimeoutType, &[String]); 4] {
        [
            (TimeoutType::Connection, self.connection.as_slice()),
            (TimeoutType::Read, self.read.as_slice()),
            (TimeoutType::Request, self.request.as_slice()),
            (TimeoutType::Record, self.record.as_slice()),
        ]
    }

    /// Canonical (first) marker for a classified type, if it has one.
    pub fn marker_for(&self, timeout_type: TimeoutType) -> Option<&str> {
        self.in_priority_order()
            .into_iter()
            .find(|(t, _)| *t == timeout_type)
            .and_then(|(_, markers)| markers.first())
            .map(String::as_str)
    }

    /// First type with a non-empty marker contained in `message`.
    pub(crate) fn find(&self, message: &str) -> Option<TimeoutType> {
        self.in_priority_order()
            .into_iter()
            .find(|(_, markers)| {
                markers
                    .iter()
                    .any(|m| !m.is_empty() && message.contains(m.as_str()))
            })
            .map(|(timeout_type, _)| timeout_type)
    }
}
