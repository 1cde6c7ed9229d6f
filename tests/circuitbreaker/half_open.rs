use super::breaker;
use callguard_circuitbreaker::{BreakerConfig, CircuitBreaker, CircuitState};
use callguard_core::CallOutcome;
use std::sync::{Arc, Mutex};
use std::time::Duration;

async fn trip(cb: &CircuitBreaker) {
    while cb.state().await != CircuitState::Open {
        let permit = cb.permit().await.unwrap();
        cb.record_outcome(permit, CallOutcome::Failure).await;
    }
}

#[tokio::test(start_paused = true)]
async fn first_call_after_wait_becomes_trial() {
    let cb = breaker(5, 50, 5, Duration::from_secs(2), 1);
    trip(&cb).await;

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cb.state().await, CircuitState::Open, "transition is lazy");

    let trial = cb.permit().await.expect("trial admitted");
    assert_eq!(trial.state(), CircuitState::HalfOpen);
    assert_eq!(cb.health_status(), "degraded");
    assert!(cb.permit().await.is_none(), "only one trial in flight");

    cb.record_outcome(trial, CallOutcome::Success).await;
    let metrics = cb.metrics().await;
    assert_eq!(metrics.state, CircuitState::Closed);
    assert_eq!(metrics.total_calls, 0);
    assert_eq!(cb.http_status(), 200);
}

#[tokio::test(start_paused = true)]
async fn failed_trial_reopens_with_fresh_wait() {
    let cb = breaker(5, 50, 5, Duration::from_secs(2), 1);
    trip(&cb).await;

    tokio::time::advance(Duration::from_secs(2)).await;
    let trial = cb.permit().await.unwrap();
    cb.record_outcome(trial, CallOutcome::Failure).await;
    assert_eq!(cb.state().await, CircuitState::Open);
    assert_eq!(cb.http_status(), 503);

    tokio::time::advance(Duration::from_millis(1500)).await;
    assert!(cb.permit().await.is_none());

    tokio::time::advance(Duration::from_millis(500)).await;
    assert!(cb.permit().await.is_some());
}

#[tokio::test(start_paused = true)]
async fn all_trials_must_succeed_to_close() {
    let cb = breaker(4, 50, 4, Duration::from_secs(1), 3);
    trip(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let trials: Vec<_> = futures::future::join_all((0..3).map(|_| cb.permit()))
        .await
        .into_iter()
        .flatten()
        .collect();
    assert_eq!(trials.len(), 3);
    assert!(cb.permit().await.is_none());

    let mut trials = trials.into_iter();
    cb.record_outcome(trials.next().unwrap(), CallOutcome::Success)
        .await;
    cb.record_outcome(trials.next().unwrap(), CallOutcome::Success)
        .await;
    assert_eq!(cb.state().await, CircuitState::HalfOpen);

    cb.record_outcome(trials.next().unwrap(), CallOutcome::Success)
        .await;
    assert_eq!(cb.state().await, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn half_open_outcomes_do_not_enter_window() {
    let cb = breaker(4, 50, 4, Duration::from_secs(1), 2);
    trip(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let trial = cb.permit().await.unwrap();
    cb.record_outcome(trial, CallOutcome::Success).await;

    let metrics = cb.metrics().await;
    assert_eq!(metrics.state, CircuitState::HalfOpen);
    assert_eq!(metrics.half_open_trials, 1);
    assert_eq!(metrics.half_open_successes, 1);
    assert_eq!(metrics.total_calls, 4, "window still holds the tripping calls");
}

#[tokio::test(start_paused = true)]
async fn released_trial_slot_is_reusable() {
    let cb = breaker(2, 50, 2, Duration::from_secs(1), 1);
    trip(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;

    let trial = cb.permit().await.unwrap();
    assert!(cb.permit().await.is_none());

    cb.release(trial).await;
    assert_eq!(cb.state().await, CircuitState::HalfOpen);

    let retrial = cb.permit().await.expect("slot handed back");
    cb.record_outcome(retrial, CallOutcome::Success).await;
    assert_eq!(cb.state().await, CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn transitions_are_reported_in_order() {
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let t = Arc::clone(&transitions);
    let config = BreakerConfig::builder()
        .window_size(2)
        .minimum_calls_before_evaluation(2)
        .wait_duration_in_open(Duration::from_secs(1))
        .on_state_transition(move |from, to| t.lock().unwrap().push((from, to)))
        .build()
        .unwrap();
    let cb = CircuitBreaker::new("callee", config);

    trip(&cb).await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let trial = cb.permit().await.unwrap();
    cb.record_outcome(trial, CallOutcome::Success).await;

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}
