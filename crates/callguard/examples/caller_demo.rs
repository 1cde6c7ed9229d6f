//! Replays the caller service's endpoints against an in-process callee.
//!
//! Run with: cargo run -p callguard --example caller_demo
//! With more detail: RUST_LOG=debug cargo run -p callguard --example caller_demo

use callguard::{
    BreakerConfig, CallFailure, DependencyConfig, FallbackDispatcher, FallbackRegistry, Registry,
    ResilientInvoker, Response, RetryConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CALLEE: &str = "callee-client-v1";
// circuit-test calls go out without retries so every call lands in the window
const CIRCUIT_TEST: &str = "callee-circuit-test";

/// Stand-in for the remote callee and its fault-injection endpoints.
struct Callee {
    circuit_test_calls: AtomicUsize,
    fail_until: usize,
}

impl Callee {
    fn new(fail_until: usize) -> Self {
        Self {
            circuit_test_calls: AtomicUsize::new(0),
            fail_until,
        }
    }

    async fn get(&self, path: &str) -> Result<String, CallFailure> {
        match path {
            "/hello" => Ok("Hello from callee".to_string()),
            "/slow" => {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok("slow response".to_string())
            }
            "/4xx-error" => Err(CallFailure::from_status(404, "resource not found")),
            "/500-error" => Err(CallFailure::from_status(500, "internal server error")),
            "/503-error" => Err(CallFailure::from_status(503, "service unavailable")),
            "/circuit-test" => {
                let count = self.circuit_test_calls.fetch_add(1, Ordering::SeqCst) + 1;
                if count <= self.fail_until {
                    Err(CallFailure::from_status(
                        500,
                        format!("circuit-test failure {count}/{}", self.fail_until),
                    ))
                } else {
                    Ok(format!("circuit-test success (call {count})"))
                }
            }
            other => match other.strip_prefix("/timeout/").map(str::parse::<u64>) {
                Some(Ok(secs)) => {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    Ok(format!("responded after {secs}s"))
                }
                _ => Err(CallFailure::from_status(404, format!("no route for {other}"))),
            },
        }
    }
}

fn callee_fallbacks() -> Result<FallbackRegistry<String>, callguard::ConfigError> {
    FallbackRegistry::builder()
        .on_circuit_open(|_| "Fallback: Service unavailable (circuit open)".to_string())
        .on_timeout(|_| "Fallback: Request timeout".to_string())
        .on_client_error(|ctx| format!("Fallback: Client error ({})", ctx.failure().detail()))
        .on_server_error(|ctx| match ctx.failure().status() {
            Some(503) => "Fallback: Service Unavailable".to_string(),
            _ => "Fallback: Server error".to_string(),
        })
        .default_handler(|_| "Fallback: Service unavailable".to_string())
        .build()
}

fn print(endpoint: &str, response: &Response<String>) {
    match response {
        Response::Success(body) => println!("{endpoint:<22} ok        {body}"),
        Response::Degraded(degraded) => println!(
            "{endpoint:<22} degraded  [{}] {}",
            degraded.kind(),
            degraded.value().map(String::as_str).unwrap_or(degraded.message())
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let breaker = BreakerConfig::builder()
        .window_size(5)
        .failure_rate_threshold(50)
        .minimum_calls_before_evaluation(5)
        .wait_duration_in_open(Duration::from_secs(2))
        .permitted_calls_in_half_open(1)
        .on_state_transition(|from, to| println!("  breaker: {from:?} -> {to:?}"))
        .build()?;

    let registry = Registry::builder()
        .register(
            CIRCUIT_TEST,
            DependencyConfig::builder()
                .breaker(breaker.clone())
                .retry(RetryConfig::builder().max_attempts(1).build()?)
                .build(),
        )
        .register(
            CALLEE,
            DependencyConfig::builder()
                .breaker(breaker)
                .retry(
                    RetryConfig::builder()
                        .max_attempts(3)
                        .fixed_backoff(Duration::from_millis(500))
                        .on_retry(|attempt, delay| {
                            println!("  retry: attempt {attempt} failed, next in {delay:?}")
                        })
                        .build()?,
                )
                .call_timeout(Duration::from_secs(1))
                .build(),
        )
        .build();

    let fallbacks = FallbackDispatcher::builder()
        .register(CALLEE, callee_fallbacks()?)
        .register(CIRCUIT_TEST, callee_fallbacks()?)
        .build();

    let invoker = ResilientInvoker::new(registry, fallbacks);
    let callee = Arc::new(Callee::new(8));

    for (endpoint, path) in [
        ("/test-hello", "/hello"),
        ("/test-slow", "/slow"),
        ("/test-timeout/0", "/timeout/0"),
        ("/test-timeout/2", "/timeout/2"),
        ("/test-error-4xx", "/4xx-error"),
        ("/test-error-500", "/500-error"),
        ("/test-error-503", "/503-error"),
    ] {
        let response = invoker.call(CALLEE, || callee.get(path)).await;
        print(endpoint, &response);
    }

    println!("\n/test-circuit-flow (callee fails its first 8 calls)");
    for round in 1..=14 {
        let response = invoker
            .call(CIRCUIT_TEST, || callee.get("/circuit-test"))
            .await;
        print(&format!("  call {round}"), &response);
        if invoker.registry().state(CIRCUIT_TEST) == Some(callguard::CircuitState::Open) {
            tokio::time::sleep(Duration::from_millis(700)).await;
        }
    }

    for (key, health) in invoker.registry().health() {
        println!("{key}: {health}");
    }

    Ok(())
}
