//! Stage shutdown tokens and interruptible backoff sleeps.
//!
//! A stage hands a [`ShutdownToken`] to the engine's sleeper. When the stage
//! is stopped, `request_shutdown` wakes every thread blocked in a backoff
//! wait; the wait reports [`Interrupted`] so the attempt can be abandoned.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A backoff wait was cut short by a stage shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("backoff sleep interrupted by stage shutdown")]
pub struct Interrupted;

#[derive(Debug, Default)]
struct Shared {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable shutdown signal shared between a stage and its workers.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    shared: Arc<Shared>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // The flag is a plain bool; a poisoned lock still holds a usable value.
        self.shared
            .stopped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Signal shutdown and wake all waiters.
    pub fn request_shutdown(&self) {
        *self.lock() = true;
        self.shared.wake.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        *self.lock()
    }

    /// Block for up to `timeout`. Returns `true` if shutdown was requested
    /// before the time elapsed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut stopped = self.lock();
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .shared
                .wake
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            stopped = guard;
        }
        true
    }
}

/// Something that can wait out a backoff interval.
pub trait Sleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted>;
}

/// Blocks the calling thread; wakes early if the token is shut down.
#[derive(Debug, Clone, Default)]
pub struct ThreadSleeper {
    token: ShutdownToken,
}

impl ThreadSleeper {
    pub fn new(token: ShutdownToken) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &ShutdownToken {
        &self.token
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        if self.token.wait_timeout(duration) {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Never blocks; remembers every requested duration. Used for dry runs.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        self.slept
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        Ok(())
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
        (**self).sleep(duration)
    }
}
