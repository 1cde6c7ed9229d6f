use callguard_core::CallFailure;
use std::future::Future;
use std::time::Duration;

/// Runs one attempt under an optional deadline.
///
/// An attempt that outlives `deadline` is dropped and reported as a
/// `Timeout` failure, a health signal distinct from caller cancellation.
pub async fn with_timeout<T, Fut>(deadline: Option<Duration>, attempt: Fut) -> Result<T, CallFailure>
where
    Fut: Future<Output = Result<T, CallFailure>>,
{
    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, attempt).await {
            Ok(result) => result,
            Err(_elapsed) => Err(CallFailure::timeout(deadline)),
        },
        None => attempt.await,
    }
}
