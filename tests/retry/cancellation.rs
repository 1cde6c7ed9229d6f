use super::executor;
use callguard_core::{CallFailure, FailureKind};
use callguard_retry::{CancellationToken, InvocationContext};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn cancel_during_attempt() {
    let retry = executor(3, Duration::from_millis(500));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let mut ctx = InvocationContext::new("callee");
    let result = retry
        .execute(&mut ctx, &cancel, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("late")
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), FailureKind::Cancelled);
    assert_eq!(ctx.attempt(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_backoff_stops_further_attempts() {
    let retry = executor(3, Duration::from_secs(5));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let calls = AtomicUsize::new(0);
    let result: Result<(), _> = retry
        .execute(&mut InvocationContext::new("callee"), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CallFailure::server_error("boom")) }
        })
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_makes_no_attempt() {
    let retry = executor(3, Duration::from_millis(500));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let calls = AtomicUsize::new(0);
    let result = retry
        .execute(&mut InvocationContext::new("callee"), &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), FailureKind::Cancelled);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_failure_from_work_is_not_retried() {
    let retry = executor(3, Duration::from_millis(500));
    let calls = AtomicUsize::new(0);

    let result: Result<(), _> = retry
        .execute(
            &mut InvocationContext::new("callee"),
            &CancellationToken::new(),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CallFailure::cancelled()) }
            },
        )
        .await;

    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
