use super::support::{CALLEE, Callee, invoker};
use callguard::{CircuitState, FailureKind, FallbackPath, Response};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn hello_passes_through() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker.call(CALLEE, || callee.get("/hello")).await;

    assert!(matches!(response, Response::Success(ref body) if body == "Hello from callee"));
    let metrics = invoker.registry().metrics(CALLEE).await.unwrap();
    assert_eq!(metrics.total_calls, 1);
    assert_eq!(metrics.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_endpoint_times_out_on_every_attempt() {
    let invoker = invoker();
    let callee = Callee::new(0);
    let start = Instant::now();

    let response = invoker.call(CALLEE, || callee.get("/slow")).await;

    assert_eq!(response.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(response.value().unwrap(), "Fallback: Request timeout");
    assert_eq!(callee.hits("/slow"), 3);

    // three 1s attempts and two 500ms waits
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_millis(4100));

    let metrics = invoker.registry().metrics(CALLEE).await.unwrap();
    assert_eq!(metrics.total_calls, 1, "one logical call, one outcome");
    assert_eq!(metrics.failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn configurable_delay_against_call_timeout() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker.call(CALLEE, || callee.get("/timeout/0")).await;
    assert_eq!(response.into_value().unwrap(), "responded after 0s");

    let response = invoker.call(CALLEE, || callee.get("/timeout/2")).await;
    assert_eq!(response.failure_kind(), Some(FailureKind::Timeout));
    assert_eq!(callee.hits("/timeout/2"), 3);
}

#[tokio::test(start_paused = true)]
async fn client_error_is_degraded_but_healthy() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker.call(CALLEE, || callee.get("/4xx-error")).await;

    let degraded = response.degraded().unwrap();
    assert_eq!(degraded.kind(), FailureKind::ClientError);
    assert_eq!(degraded.failure().status(), Some(404));
    assert_eq!(degraded.path(), FallbackPath::Kind);
    assert_eq!(callee.hits("/4xx-error"), 1, "4xx is never retried");

    let metrics = invoker.registry().metrics(CALLEE).await.unwrap();
    assert_eq!(metrics.failure_count, 0);
    assert_eq!(metrics.success_count, 1);
}

#[tokio::test(start_paused = true)]
async fn client_errors_never_open_the_circuit() {
    let invoker = invoker();
    let callee = Callee::new(0);

    for _ in 0..20 {
        let response = invoker.call(CALLEE, || callee.get("/4xx-error")).await;
        assert_eq!(response.failure_kind(), Some(FailureKind::ClientError));
    }
    assert_eq!(
        invoker.registry().state(CALLEE),
        Some(CircuitState::Closed)
    );
    assert_eq!(callee.hits("/4xx-error"), 20);
}

#[tokio::test(start_paused = true)]
async fn server_error_retried_then_recorded_once() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker.call(CALLEE, || callee.get("/500-error")).await;

    let degraded = response.degraded().unwrap();
    assert_eq!(degraded.kind(), FailureKind::ServerError);
    assert_eq!(degraded.path(), FallbackPath::KeyDefault);
    assert_eq!(degraded.value().unwrap(), "Fallback: Service unavailable");
    assert_eq!(callee.hits("/500-error"), 3);

    let metrics = invoker.registry().metrics(CALLEE).await.unwrap();
    assert_eq!(metrics.total_calls, 1);
    assert_eq!(metrics.failure_count, 1);
}

#[tokio::test(start_paused = true)]
async fn service_unavailable_is_a_server_error() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker.call(CALLEE, || callee.get("/503-error")).await;

    assert_eq!(response.failure_kind(), Some(FailureKind::ServerError));
    assert_eq!(
        response.degraded().and_then(|d| d.failure().status()),
        Some(503)
    );
    assert_eq!(callee.hits("/503-error"), 3);
}

#[tokio::test(start_paused = true)]
async fn five_failing_calls_open_the_circuit() {
    let invoker = invoker();
    let callee = Callee::new(0);

    for _ in 0..5 {
        invoker.call(CALLEE, || callee.get("/500-error")).await;
    }
    assert_eq!(invoker.registry().state(CALLEE), Some(CircuitState::Open));
    assert_eq!(callee.hits("/500-error"), 15);

    let response = invoker.call(CALLEE, || callee.get("/hello")).await;
    assert_eq!(response.failure_kind(), Some(FailureKind::CircuitOpen));
    assert_eq!(
        response.value().unwrap(),
        "Fallback: Service unavailable (circuit open)"
    );
    assert_eq!(callee.hits("/hello"), 0, "denied calls never reach the callee");
}

#[tokio::test(start_paused = true)]
async fn unregistered_key_uses_defaults_and_global_fallback() {
    let invoker = invoker();
    let callee = Callee::new(0);

    let response = invoker
        .call("inventory-service", || callee.get("/500-error"))
        .await;

    let degraded = response.degraded().unwrap();
    assert_eq!(degraded.path(), FallbackPath::Global);
    assert!(degraded.value().is_none());
    assert_eq!(degraded.message(), callguard::SERVICE_UNAVAILABLE);
    assert_eq!(callee.hits("/500-error"), 3, "default policy is three attempts");
}
