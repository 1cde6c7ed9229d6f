//! Circuit breaker tests.
//!
//! - thresholds.rs: window arithmetic and the CLOSED -> OPEN decision
//! - half_open.rs: trial admission and the way out of HALF_OPEN
//! - concurrency.rs: concurrent permits and recordings against one key
//! - stale.rs: outcomes that arrive after a transition

mod concurrency;
mod half_open;

use callguard_circuitbreaker::{BreakerConfig, CircuitBreaker};
use std::time::Duration;

pub(crate) fn breaker(
    window: usize,
    threshold: u8,
    minimum: usize,
    wait: Duration,
    permitted: usize,
) -> CircuitBreaker {
    let config = BreakerConfig::builder()
        .window_size(window)
        .failure_rate_threshold(threshold)
        .minimum_calls_before_evaluation(minimum)
        .wait_duration_in_open(wait)
        .permitted_calls_in_half_open(permitted)
        .build()
        .unwrap();
    CircuitBreaker::new("callee", config)
}
