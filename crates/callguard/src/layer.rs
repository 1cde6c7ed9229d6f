//! Tower integration: every request to the wrapped service becomes one
//! logical call protected by a [`ResilientInvoker`].

use crate::invoker::ResilientInvoker;
use crate::response::Response;
use callguard_core::{CallFailure, DependencyKey};
use futures::future::BoxFuture;
use std::convert::Infallible;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// Applies a [`ResilientInvoker`] to a service for one dependency key.
pub struct ResilientLayer<T> {
    invoker: ResilientInvoker<T>,
    key: DependencyKey,
}

impl<T> ResilientLayer<T> {
    pub fn new(invoker: ResilientInvoker<T>, key: impl Into<DependencyKey>) -> Self {
        Self {
            invoker,
            key: key.into(),
        }
    }
}

impl<T> Clone for ResilientLayer<T> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S, T> Layer<S> for ResilientLayer<T> {
    type Service = ResilientService<S, T>;

    fn layer(&self, inner: S) -> Self::Service {
        ResilientService {
            inner,
            invoker: self.invoker.clone(),
            key: self.key.clone(),
        }
    }
}

/// A service whose failures are absorbed into [`Response::Degraded`].
///
/// Infallible: the wrapped service's readiness is awaited per attempt, so
/// readiness errors are retried and classified like call errors.
///
/// `poll_ready` is always ready. Backpressure from the inner service shows up
/// as attempt latency instead, and counts against the key's call timeout.
/// Dropping the returned future abandons the call without recording it.
pub struct ResilientService<S, T> {
    inner: S,
    invoker: ResilientInvoker<T>,
    key: DependencyKey,
}

impl<S: Clone, T> Clone for ResilientService<S, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            invoker: self.invoker.clone(),
            key: self.key.clone(),
        }
    }
}

impl<S, T, Req> Service<Req> for ResilientService<S, T>
where
    S: Service<Req, Response = T, Error = CallFailure> + Clone + Send + 'static,
    S::Future: Send + 'static,
    Req: Clone + Send + 'static,
    T: Send + 'static,
{
    type Response = Response<T>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let inner = self.inner.clone();
        let invoker = self.invoker.clone();
        let key = self.key.clone();

        Box::pin(async move {
            let response = invoker
                .call(key, move || {
                    let svc = inner.clone();
                    let req = req.clone();
                    async move { svc.oneshot(req).await }
                })
                .await;
            Ok(response)
        })
    }
}
