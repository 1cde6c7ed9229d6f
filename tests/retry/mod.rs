//! Retry executor tests.
//!
//! - behavior.rs: attempt counting, retryable kinds, backoff timing
//! - cancellation.rs: cancel during an attempt or a backoff wait
//! - events.rs: listener callbacks

mod cancellation;

use callguard_retry::{RetryConfig, RetryExecutor};
use std::time::Duration;

pub(crate) fn executor(max_attempts: usize, wait: Duration) -> RetryExecutor {
    RetryExecutor::new(
        RetryConfig::builder()
            .max_attempts(max_attempts)
            .fixed_backoff(wait)
            .build()
            .unwrap(),
    )
}
