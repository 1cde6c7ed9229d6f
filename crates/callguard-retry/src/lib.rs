//! Bounded, cancellable retry of a single logical call.
//!
//! A [`RetryExecutor`] runs an attempt, classifies the failure against its
//! [`RetryPolicy`], waits out the backoff and tries again until the call
//! succeeds, fails with a non-retryable failure, runs out of attempts or is
//! cancelled. The whole sequence counts as one logical call: callers record
//! only its terminal result with the circuit breaker.
//!
//! # Features
//!
//! - **IntervalFunction abstraction**: fixed, exponential, exponential with
//!   jitter, or a custom closure
//! - **Retry predicates**: control which failure kinds are retried
//! - **Cancellation**: a [`CancellationToken`] interrupts an in-flight
//!   attempt or a backoff wait
//! - **Event system**: observability through [`RetryEvent`]s
//!
//! # Example
//!
//! ```
//! use callguard_core::CallFailure;
//! use callguard_retry::{InvocationContext, RetryConfig, RetryExecutor};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = RetryExecutor::new(
//!     RetryConfig::builder()
//!         .max_attempts(3)
//!         .fixed_backoff(Duration::from_millis(500))
//!         .on_retry(|attempt, delay| println!("attempt {attempt} failed, waiting {delay:?}"))
//!         .build()?,
//! );
//!
//! let mut ctx = InvocationContext::new("callee-client-v1");
//! let cancel = CancellationToken::new();
//! let body = executor
//!     .execute(&mut ctx, &cancel, || async { Ok::<_, CallFailure>("pong") })
//!     .await?;
//! assert_eq!(body, "pong");
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod context;
mod events;
mod policy;

pub use backoff::{
    ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval, IntervalFunction,
};
pub use config::{RetryConfig, RetryConfigBuilder};
pub use context::InvocationContext;
pub use events::RetryEvent;
pub use policy::{retry_transient, RetryPolicy, RetryPredicate};

use callguard_core::CallFailure;
#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
use std::future::Future;
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::time::Instant;
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Runs one logical call with retries.
///
/// Cheap to clone; the configuration is shared.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: Arc<RetryConfig>,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryExecutor {
    pub fn new(config: impl Into<Arc<RetryConfig>>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "retry_calls_total",
                "Total number of logical calls by terminal result"
            );
            describe_counter!(
                "retry_attempts_total",
                "Total number of attempts made against dependencies"
            );
        });

        Self {
            config: config.into(),
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Executes `work` until it succeeds or the policy gives up.
    ///
    /// `work` is invoked once per attempt. Returns the first success, the
    /// first non-retryable failure, the last failure once the attempts are
    /// spent, or a `Cancelled` failure as soon as `cancel` fires.
    ///
    /// No lock is held across attempts or backoff waits.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &mut InvocationContext,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Result<T, CallFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        let policy = &self.config.policy;
        let listeners = &self.config.event_listeners;
        let key = ctx.key().to_string();

        loop {
            if cancel.is_cancelled() {
                return Err(self.cancelled(ctx, &key));
            }

            ctx.attempt += 1;

            #[cfg(feature = "metrics")]
            counter!("retry_attempts_total", "retry" => key.clone()).increment(1);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CallFailure::cancelled()),
                result = work() => result,
            };

            let failure = match result {
                Ok(value) => {
                    listeners.emit(&RetryEvent::Success {
                        name: key.clone(),
                        timestamp: Instant::now(),
                        attempts: ctx.attempt,
                    });

                    #[cfg(feature = "metrics")]
                    counter!("retry_calls_total", "retry" => key.clone(), "result" => "success")
                        .increment(1);

                    #[cfg(feature = "tracing")]
                    {
                        if ctx.attempt > 1 {
                            tracing::debug!(dependency = %key, attempts = ctx.attempt, "call succeeded after retries");
                        }
                    }

                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if failure.is_cancelled() {
                ctx.last_failure = Some(failure);
                return Err(self.cancelled(ctx, &key));
            }

            let kind = failure.kind();
            ctx.last_failure = Some(failure.clone());

            if !policy.should_retry(&failure) {
                listeners.emit(&RetryEvent::IgnoredError {
                    name: key.clone(),
                    timestamp: Instant::now(),
                    attempts: ctx.attempt,
                    kind,
                });

                #[cfg(feature = "metrics")]
                counter!("retry_calls_total", "retry" => key.clone(), "result" => "ignored")
                    .increment(1);

                #[cfg(feature = "tracing")]
                tracing::debug!(dependency = %key, %kind, "failure not retryable");

                return Err(failure);
            }

            if ctx.attempt >= policy.max_attempts {
                listeners.emit(&RetryEvent::Exhausted {
                    name: key.clone(),
                    timestamp: Instant::now(),
                    attempts: ctx.attempt,
                    kind,
                });

                #[cfg(feature = "metrics")]
                counter!("retry_calls_total", "retry" => key.clone(), "result" => "exhausted")
                    .increment(1);

                #[cfg(feature = "tracing")]
                tracing::warn!(dependency = %key, attempts = ctx.attempt, %kind, "retries exhausted");

                return Err(failure);
            }

            let delay = policy.next_backoff(ctx.attempt - 1);
            listeners.emit(&RetryEvent::Retry {
                name: key.clone(),
                timestamp: Instant::now(),
                attempt: ctx.attempt,
                delay,
                kind,
            });

            #[cfg(feature = "tracing")]
            tracing::debug!(dependency = %key, attempt = ctx.attempt, ?delay, %kind, "retrying after failure");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(ctx, &key)),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    fn cancelled(&self, ctx: &InvocationContext, key: &str) -> CallFailure {
        self.config.event_listeners.emit(&RetryEvent::Cancelled {
            name: key.to_string(),
            timestamp: Instant::now(),
            attempts: ctx.attempt,
        });

        #[cfg(feature = "metrics")]
        counter!("retry_calls_total", "retry" => key.to_string(), "result" => "cancelled")
            .increment(1);

        #[cfg(feature = "tracing")]
        tracing::debug!(dependency = %key, attempts = ctx.attempt, "call cancelled");

        CallFailure::cancelled()
    }
}
