use callguard_core::{FailureKind, ResilienceEvent};
use std::time::{Duration, Instant};

/// Events emitted by the retry executor.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and another one will follow after `delay`.
    Retry {
        name: String,
        timestamp: Instant,
        /// Number of the attempt that just failed (1-indexed).
        attempt: usize,
        delay: Duration,
        kind: FailureKind,
    },
    /// The call succeeded, on the first attempt or after retries.
    Success {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// Every allowed attempt failed with a retryable failure.
    Exhausted {
        name: String,
        timestamp: Instant,
        attempts: usize,
        kind: FailureKind,
    },
    /// A failure the policy does not retry ended the call.
    IgnoredError {
        name: String,
        timestamp: Instant,
        attempts: usize,
        kind: FailureKind,
    },
    /// The caller cancelled the call during an attempt or a backoff wait.
    Cancelled {
        name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::Success { .. } => "success",
            RetryEvent::Exhausted { .. } => "exhausted",
            RetryEvent::IgnoredError { .. } => "ignored_error",
            RetryEvent::Cancelled { .. } => "cancelled",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retry { timestamp, .. }
            | RetryEvent::Success { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::IgnoredError { timestamp, .. }
            | RetryEvent::Cancelled { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            RetryEvent::Retry { name, .. }
            | RetryEvent::Success { name, .. }
            | RetryEvent::Exhausted { name, .. }
            | RetryEvent::IgnoredError { name, .. }
            | RetryEvent::Cancelled { name, .. } => name,
        }
    }
}
