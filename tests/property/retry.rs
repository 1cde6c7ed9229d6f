//! Property tests for the retry executor.
//!
//! Invariants tested:
//! - Never exceeds max_attempts
//! - Stops on the first success
//! - Non-retryable kinds get exactly one attempt

use callguard_core::{CallFailure, FailureKind};
use callguard_retry::{CancellationToken, InvocationContext, RetryConfig, RetryExecutor};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn kind() -> impl Strategy<Value = FailureKind> {
    prop::sample::select(FailureKind::ALL.to_vec())
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: attempts = min(max_attempts, first success index + 1)
    #[test]
    fn attempts_bounded_and_stop_on_success(
        max_attempts in 1usize..=8,
        succeed_on in 1usize..=12,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let retry = RetryExecutor::new(
                RetryConfig::builder()
                    .max_attempts(max_attempts)
                    .fixed_backoff(Duration::from_millis(10))
                    .build()
                    .unwrap(),
            );
            let calls = AtomicUsize::new(0);
            let mut ctx = InvocationContext::new("prop");

            let result = retry
                .execute(&mut ctx, &CancellationToken::new(), || {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    async move {
                        if n >= succeed_on {
                            Ok(n)
                        } else {
                            Err(CallFailure::server_error("boom"))
                        }
                    }
                })
                .await;

            let expected_attempts = max_attempts.min(succeed_on);
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected_attempts);
            prop_assert_eq!(ctx.attempt(), expected_attempts);
            prop_assert_eq!(result.is_ok(), succeed_on <= max_attempts);
            Ok(())
        })?;
    }

    /// Property: only server errors and timeouts are retried by default
    #[test]
    fn only_dependency_faults_are_retried(
        max_attempts in 2usize..=5,
        kind in kind(),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let retry = RetryExecutor::new(
                RetryConfig::builder()
                    .max_attempts(max_attempts)
                    .fixed_backoff(Duration::from_millis(10))
                    .build()
                    .unwrap(),
            );
            let calls = AtomicUsize::new(0);

            let result: Result<(), _> = retry
                .execute(&mut InvocationContext::new("prop"), &CancellationToken::new(), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move { Err(CallFailure::new(kind, "injected")) }
                })
                .await;

            let expected = match kind {
                FailureKind::ServerError | FailureKind::Timeout => max_attempts,
                _ => 1,
            };
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected);
            prop_assert_eq!(result.unwrap_err().kind(), kind);
            Ok(())
        })?;
    }
}
