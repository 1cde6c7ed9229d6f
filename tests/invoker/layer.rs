use super::support::{CALLEE, Callee, callee_fallbacks, invoker, invoker_with};
use callguard::{
    CallFailure, CircuitState, FailureKind, FallbackDispatcher, Registry, ResilientInvoker,
    ResilientLayer, Response,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tower::{Layer, Service, ServiceBuilder, ServiceExt, service_fn};

/// Inner service that takes `delay` to become ready on every fresh clone.
struct SlowToReady {
    delay: Duration,
    sleep: Option<Pin<Box<tokio::time::Sleep>>>,
}

impl SlowToReady {
    fn new(delay: Duration) -> Self {
        Self { delay, sleep: None }
    }
}

impl Clone for SlowToReady {
    fn clone(&self) -> Self {
        Self::new(self.delay)
    }
}

impl Service<()> for SlowToReady {
    type Response = String;
    type Error = CallFailure;
    type Future = futures::future::Ready<Result<String, CallFailure>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), CallFailure>> {
        let delay = self.delay;
        let sleep = self
            .sleep
            .get_or_insert_with(|| Box::pin(tokio::time::sleep(delay)));
        ready!(sleep.as_mut().poll(cx));
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: ()) -> Self::Future {
        futures::future::ready(Ok("ready".to_string()))
    }
}

#[tokio::test(start_paused = true)]
async fn service_requests_are_protected() {
    let callee = Arc::new(Callee::new(0));
    let c = Arc::clone(&callee);
    let service = ServiceBuilder::new()
        .layer(ResilientLayer::new(invoker(), CALLEE))
        .service(service_fn(move |path: &'static str| {
            let callee = Arc::clone(&c);
            async move { callee.get(path).await }
        }));

    let response = service.clone().oneshot("/hello").await.unwrap();
    assert!(matches!(response, Response::Success(_)));

    let response = service.clone().oneshot("/500-error").await.unwrap();
    assert_eq!(response.failure_kind(), Some(FailureKind::ServerError));
    assert_eq!(callee.hits("/500-error"), 3);
}

#[tokio::test(start_paused = true)]
async fn layered_services_share_the_key_breaker() {
    let invoker = ResilientInvoker::new(
        Registry::new(),
        FallbackDispatcher::builder()
            .register(CALLEE, callee_fallbacks())
            .build(),
    );
    let layer = ResilientLayer::new(invoker.clone(), CALLEE);

    let failing = layer.layer(service_fn(|_: ()| async {
        Err::<String, _>(CallFailure::from_status(500, "boom"))
    }));
    let healthy = layer.layer(service_fn(|_: ()| async { Ok::<_, CallFailure>("ok".to_string()) }));

    for _ in 0..5 {
        failing.clone().oneshot(()).await.unwrap();
    }
    assert_eq!(invoker.registry().state(CALLEE), Some(CircuitState::Open));

    let response = healthy.oneshot(()).await.unwrap();
    assert_eq!(response.failure_kind(), Some(FailureKind::CircuitOpen));
}

#[tokio::test(start_paused = true)]
async fn inner_backpressure_becomes_attempt_latency() {
    let layer = ResilientLayer::new(invoker(), CALLEE);

    let mut service = layer.layer(SlowToReady::new(Duration::from_millis(200)));
    let ready = std::future::poll_fn(|cx| service.poll_ready(cx)).await;
    assert!(ready.is_ok(), "outer service is always ready");

    let start = tokio::time::Instant::now();
    let response = service.call(()).await.unwrap();
    assert!(response.is_success());
    assert!(start.elapsed() >= Duration::from_millis(200));

    // readiness slower than the 1s call timeout fails every attempt
    let stalled = layer.layer(SlowToReady::new(Duration::from_secs(2)));
    let response = stalled.oneshot(()).await.unwrap();
    assert_eq!(response.failure_kind(), Some(FailureKind::Timeout));
}

#[tokio::test(start_paused = true)]
async fn dropped_service_future_frees_the_trial_slot() {
    let invoker = invoker_with(1);
    let callee = Arc::new(Callee::new(5));
    let c = Arc::clone(&callee);
    let service = ResilientLayer::new(invoker.clone(), CALLEE).layer(service_fn(
        move |path: &'static str| {
            let callee = Arc::clone(&c);
            async move { callee.get(path).await }
        },
    ));

    for _ in 0..5 {
        service.clone().oneshot("/circuit-test").await.unwrap();
    }
    assert_eq!(invoker.registry().state(CALLEE), Some(CircuitState::Open));
    tokio::time::advance(Duration::from_secs(2)).await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), service.clone().oneshot("/slow")).await;
    assert!(abandoned.is_err());

    let response = service.clone().oneshot("/hello").await.unwrap();
    assert!(response.is_success());
    assert_eq!(invoker.registry().state(CALLEE), Some(CircuitState::Closed));
}
