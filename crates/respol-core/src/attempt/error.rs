//! Failure of a single request attempt, as seen by the calling stage.

use std::fmt;

/// Error returned by one request attempt (HTTP status or transport failure).
/// Kept separate from `anyhow` so it can be classified before reporting.
#[derive(Debug)]
pub enum AttemptError {
    /// The response had a non-success status.
    Status(u16),
    /// The transport raised an error (possibly a timeout somewhere in its causes).
    Transport(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl AttemptError {
    pub fn transport(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        AttemptError::Transport(Box::new(e))
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Status(code) => write!(f, "HTTP {}", code),
            AttemptError::Transport(e) => write!(f, "transport: {}", e),
        }
    }
}

impl std::error::Error for AttemptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttemptError::Transport(e) => Some(&**e),
            AttemptError::Status(_) => None,
        }
    }
}

impl From<curl::Error> for AttemptError {
    fn from(e: curl::Error) -> Self {
        AttemptError::transport(e)
    }
}

impl From<std::io::Error> for AttemptError {
    fn from(e: std::io::Error) -> Self {
        AttemptError::transport(e)
    }
}
