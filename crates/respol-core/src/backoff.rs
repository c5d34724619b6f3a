//! Per-stage retry and backoff counters.
//!
//! One `BackoffState` is owned by a stage instance and shared (via `Arc`) by
//! every request attempt that instance makes. Each field is its own atomic;
//! the three are not updated as one transaction. State is in memory only and
//! is lost when the stage restarts.

use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct BackoffState {
    retry_count: AtomicU32,
    linear_ms: AtomicU64,
    exponential_ms: AtomicU64,
}

/// Point-in-time copy of a [`BackoffState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BackoffSnapshot {
    pub retry_count: u32,
    pub linear_ms: u64,
    pub exponential_ms: u64,
}

impl BackoffState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (`first = true`) or continue a failure streak. Returns the
    /// retry count after the update.
    pub fn begin_occurrence(&self, first: bool) -> u32 {
        if first {
            self.retry_count.store(0, Ordering::SeqCst);
            0
        } else {
            let prev = self
                .retry_count
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| {
                    Some(c.saturating_add(1))
                })
                .unwrap_or_else(|c| c);
            prev.saturating_add(1)
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// Next linear interval: the base on a first occurrence, otherwise the
    /// last linear interval plus the base.
    pub fn next_linear(&self, first: bool, base_ms: u64) -> u64 {
        Self::advance(&self.linear_ms, |last| {
            if first {
                base_ms
            } else {
                last.saturating_add(base_ms)
            }
        })
    }

    /// Next exponential interval: the base on a first occurrence, otherwise
    /// double the last exponential interval.
    pub fn next_exponential(&self, first: bool, base_ms: u64) -> u64 {
        Self::advance(&self.exponential_ms, |last| {
            if first {
                base_ms
            } else {
                last.saturating_mul(2)
            }
        })
    }

    fn advance(cell: &AtomicU64, step: impl Fn(u64) -> u64) -> u64 {
        let prev = cell
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
            .unwrap_or_else(|last| last);
        step(prev)
    }

    pub fn snapshot(&self) -> BackoffSnapshot {
        BackoffSnapshot {
            retry_count: self.retry_count.load(Ordering::SeqCst),
            linear_ms: self.linear_ms.load(Ordering::SeqCst),
            exponential_ms: self.exponential_ms.load(Ordering::SeqCst),
        }
    }

    /// Full reset, used when the stage restarts.
    pub fn reset(&self) {
        self.retry_count.store(0, Ordering::SeqCst);
        self.linear_ms.store(0, Ordering::SeqCst);
        self.exponential_ms.store(0, Ordering::SeqCst);
    }
}
