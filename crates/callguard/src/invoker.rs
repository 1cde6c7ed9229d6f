use crate::registry::Registry;
use crate::response::Response;
use crate::timeout::with_timeout;
use callguard_circuitbreaker::classify_result;
use callguard_core::{CallFailure, DependencyKey};
use callguard_fallback::FallbackDispatcher;
use callguard_retry::InvocationContext;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The single entry point application code uses to call a dependency.
///
/// For each logical call it asks the key's breaker for a permit, runs the
/// unit of work through the retry executor (each attempt under the key's
/// call timeout), classifies the terminal result, records it once with the
/// breaker and, on any non-success path, hands the failure to the fallback
/// dispatcher.
pub struct ResilientInvoker<T> {
    registry: Arc<Registry>,
    fallbacks: FallbackDispatcher<T>,
}

impl<T> ResilientInvoker<T> {
    pub fn new(registry: impl Into<Arc<Registry>>, fallbacks: FallbackDispatcher<T>) -> Self {
        Self {
            registry: registry.into(),
            fallbacks,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn fallbacks(&self) -> &FallbackDispatcher<T> {
        &self.fallbacks
    }

    /// Calls the dependency behind `key`.
    ///
    /// `work` is invoked once per attempt and must produce a fresh attempt
    /// each time.
    pub async fn call<F, Fut>(&self, key: impl Into<DependencyKey>, work: F) -> Response<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        self.call_with_cancel(key, &CancellationToken::new(), work)
            .await
    }

    /// Like [`call`](Self::call), aborting the pending attempt or backoff
    /// wait as soon as `cancel` fires.
    ///
    /// A cancelled call is not recorded with the breaker; if it held a
    /// half-open trial slot the slot is handed back. The same holds when the
    /// returned future is dropped before completion.
    pub async fn call_with_cancel<F, Fut>(
        &self,
        key: impl Into<DependencyKey>,
        cancel: &CancellationToken,
        mut work: F,
    ) -> Response<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallFailure>>,
    {
        let key = key.into();
        let entry = self.registry.entry(&key);
        let breaker = entry.breaker();

        let Some(permit) = breaker.permit().await else {
            #[cfg(feature = "tracing")]
            tracing::debug!(breaker = %key, "call denied by open circuit");

            return Response::Degraded(self.fallbacks.resolve(&key, CallFailure::circuit_open(&key)));
        };

        let deadline = entry.call_timeout();
        let mut ctx = InvocationContext::new(key.clone());
        let result = entry
            .retry()
            .execute(&mut ctx, cancel, || with_timeout(deadline, work()))
            .await;

        match classify_result(entry.classifier(), &result) {
            Some(outcome) => {
                breaker.record_outcome(permit, outcome).await;
            }
            None => breaker.release(permit).await,
        }

        match result {
            Ok(value) => Response::Success(value),
            Err(failure) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    breaker = %key,
                    kind = %failure.kind(),
                    attempts = ctx.attempt(),
                    elapsed_ms = ctx.elapsed().as_millis() as u64,
                    "call failed, dispatching fallback"
                );

                Response::Degraded(self.fallbacks.resolve(&key, failure))
            }
        }
    }
}

impl<T> Clone for ResilientInvoker<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            fallbacks: self.fallbacks.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ResilientInvoker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientInvoker")
            .field("registry", &self.registry)
            .field("fallbacks", &self.fallbacks)
            .finish()
    }
}
