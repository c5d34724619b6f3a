//! Timeout error types raised by stages and transports that do not have
//! their own timeout error.

use std::fmt;

/// A socket-level timeout (connect/read) reported by a transport.
#[derive(Debug, Clone, Default)]
pub struct SocketTimeout {
    message: Option<String>,
}

impl SocketTimeout {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A timeout that carries no description.
    pub fn bare() -> Self {
        Self { message: None }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for SocketTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "socket timeout: {}", m),
            None => write!(f, "socket timeout"),
        }
    }
}

impl std::error::Error for SocketTimeout {}

/// A timeout raised by the pipeline itself (e.g. a batch or per-record
/// processing budget ran out), as opposed to one raised by the socket.
#[derive(Debug, Clone, Default)]
pub struct TimeoutError {
    message: Option<String>,
}

impl TimeoutError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    pub fn bare() -> Self {
        Self { message: None }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(m) => write!(f, "timeout: {}", m),
            None => write!(f, "timeout"),
        }
    }
}

impl std::error::Error for TimeoutError {}
