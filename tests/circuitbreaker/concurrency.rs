use super::breaker;
use callguard_circuitbreaker::{BreakerConfig, CircuitBreaker, CircuitState};
use callguard_core::CallOutcome;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Barrier;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exactly_one_trial_under_contention() {
    let cb = breaker(5, 50, 5, Duration::from_millis(50), 1);
    for _ in 0..5 {
        let permit = cb.permit().await.unwrap();
        cb.record_outcome(permit, CallOutcome::Failure).await;
    }
    assert_eq!(cb.state().await, CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(80)).await;

    let barrier = Arc::new(Barrier::new(50));
    let mut handles = Vec::new();
    for _ in 0..50 {
        let cb = cb.clone();
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            cb.permit().await
        }));
    }

    let mut admitted = Vec::new();
    for handle in handles {
        if let Some(permit) = handle.await.unwrap() {
            admitted.push(permit);
        }
    }
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].state(), CircuitState::HalfOpen);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_open_exactly_once() {
    let opened = Arc::new(AtomicUsize::new(0));
    let o = Arc::clone(&opened);
    let config = BreakerConfig::builder()
        .window_size(10)
        .minimum_calls_before_evaluation(10)
        .failure_rate_threshold(50)
        .wait_duration_in_open(Duration::from_secs(60))
        .on_state_transition(move |_, to| {
            if to == CircuitState::Open {
                o.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap();
    let cb = CircuitBreaker::new("callee", config);

    let permits: Vec<_> = futures::future::join_all((0..40).map(|_| cb.permit()))
        .await
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(permits.len(), 40, "all admitted while closed");

    let mut handles = Vec::new();
    for permit in permits {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            cb.record_outcome(permit, CallOutcome::Failure).await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() {
            applied += 1;
        }
    }

    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(applied, 10, "outcomes after the transition are stale");
    assert_eq!(cb.state().await, CircuitState::Open);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn keys_do_not_share_state() {
    let a = breaker(2, 50, 2, Duration::from_secs(60), 1);
    let b = CircuitBreaker::new("other", BreakerConfig::default());

    let mut handles = Vec::new();
    for i in 0..20 {
        let a = a.clone();
        let b = b.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                if let Some(permit) = a.permit().await {
                    a.record_outcome(permit, CallOutcome::Failure).await;
                }
            } else if let Some(permit) = b.permit().await {
                b.record_outcome(permit, CallOutcome::Success).await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(a.state().await, CircuitState::Open);
    assert_eq!(b.state().await, CircuitState::Closed);
    assert_eq!(b.metrics().await.success_count, 5);
}
