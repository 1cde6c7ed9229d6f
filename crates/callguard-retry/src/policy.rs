use crate::backoff::IntervalFunction;
use callguard_core::{CallFailure, FailureKind};
use std::sync::Arc;
use std::time::Duration;

/// Decides whether a failure should be retried.
pub type RetryPredicate = Arc<dyn Fn(&CallFailure) -> bool + Send + Sync>;

/// Retries transient dependency faults: `ServerError` and `Timeout`.
pub fn retry_transient(failure: &CallFailure) -> bool {
    failure.kind().is_dependency_fault()
}

/// Attempt budget, backoff and retry predicate for one logical call.
///
/// Immutable and shared read-only across calls.
#[derive(Clone)]
pub struct RetryPolicy {
    pub(crate) max_attempts: usize,
    pub(crate) interval_fn: Arc<dyn IntervalFunction>,
    pub(crate) retry_predicate: RetryPredicate,
}

impl RetryPolicy {
    /// Creates a policy that retries transient faults.
    ///
    /// `max_attempts` includes the first attempt.
    pub fn new(max_attempts: usize, interval_fn: Arc<dyn IntervalFunction>) -> Self {
        Self {
            max_attempts,
            interval_fn,
            retry_predicate: Arc::new(retry_transient),
        }
    }

    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CallFailure) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Checks whether `failure` may be retried.
    ///
    /// Cancellations and breaker denials are never retried, whatever the
    /// predicate says.
    pub fn should_retry(&self, failure: &CallFailure) -> bool {
        match failure.kind() {
            FailureKind::Cancelled | FailureKind::CircuitOpen => false,
            _ => (self.retry_predicate)(failure),
        }
    }

    /// Computes the wait after the `retry`-th failed attempt (0-indexed).
    pub fn next_backoff(&self, retry: usize) -> Duration {
        self.interval_fn.next_interval(retry)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}
