use crate::config::BreakerConfig;
use crate::events::CircuitBreakerEvent;
use crate::window::SlidingWindow;
use callguard_core::CallOutcome;
#[cfg(feature = "metrics")]
use metrics::{counter, gauge};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Represents the state of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[repr(u8)]
pub enum CircuitState {
    /// The circuit is closed and calls are allowed.
    Closed = 0,
    /// The circuit is open and calls are rejected.
    Open = 1,
    /// The circuit is half-open and a limited number of trial calls are allowed.
    HalfOpen = 2,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }

    /// Returns the state name used in metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

/// Snapshot of a breaker's internal state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CircuitMetrics {
    pub state: CircuitState,
    /// Outcomes currently held by the sliding window.
    pub total_calls: usize,
    pub failure_count: usize,
    pub success_count: usize,
    /// Failure rate of the window in percent (0.0 to 100.0).
    pub failure_rate: f64,
    /// Trial calls admitted in the current half-open period.
    pub half_open_trials: usize,
    /// Trial calls that succeeded in the current half-open period.
    pub half_open_successes: usize,
    pub time_since_state_change: Duration,
}

/// Admission stamped with the breaker generation it was issued in.
#[derive(Debug)]
pub(crate) struct Ticket {
    pub(crate) generation: u64,
    pub(crate) state: CircuitState,
}

impl Ticket {
    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }
}

/// The breaker state machine. Not synchronized; callers serialize access.
pub(crate) struct Circuit {
    key: String,
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    // bumped on every transition; permits from older generations are stale
    generation: u64,
    window: SlidingWindow,
    half_open_trials: usize,
    half_open_successes: usize,
}

impl Circuit {
    pub(crate) fn new(key: String, window_size: usize, state_atomic: Arc<AtomicU8>) -> Self {
        state_atomic.store(CircuitState::Closed as u8, Ordering::Release);
        Self {
            key,
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            generation: 0,
            window: SlidingWindow::new(window_size),
            half_open_trials: 0,
            half_open_successes: 0,
        }
    }

    pub(crate) fn state(&self) -> CircuitState {
        self.state
    }

    pub(crate) fn metrics(&self) -> CircuitMetrics {
        CircuitMetrics {
            state: self.state,
            total_calls: self.window.len(),
            failure_count: self.window.failures(),
            success_count: self.window.successes(),
            failure_rate: self.window.failure_rate_percent(),
            half_open_trials: self.half_open_trials,
            half_open_successes: self.half_open_successes,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    /// Decides whether a call may proceed.
    ///
    /// The OPEN -> HALF_OPEN transition happens here, and the call that
    /// performs it takes the first trial slot.
    pub(crate) fn try_acquire(&mut self, config: &BreakerConfig) -> Option<Ticket> {
        let permitted = match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.wait_duration_in_open {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.half_open_trials = 1;
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_trials < config.permitted_calls_in_half_open {
                    self.half_open_trials += 1;
                    true
                } else {
                    false
                }
            }
        };

        if permitted {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallPermitted {
                    key: self.key.clone(),
                    timestamp: std::time::Instant::now(),
                    state: self.state,
                });
            Some(Ticket {
                generation: self.generation,
                state: self.state,
            })
        } else {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::CallRejected {
                    key: self.key.clone(),
                    timestamp: std::time::Instant::now(),
                    state: self.state,
                });

            #[cfg(feature = "metrics")]
            counter!("circuitbreaker_calls_total", "circuitbreaker" => self.key.clone(), "outcome" => "rejected").increment(1);

            None
        }
    }

    /// Applies the classified outcome of an admitted call.
    ///
    /// Returns `false` when the permit is stale and the outcome was dropped.
    pub(crate) fn record(
        &mut self,
        permit: Ticket,
        outcome: CallOutcome,
        config: &BreakerConfig,
    ) -> bool {
        if permit.generation != self.generation {
            config
                .event_listeners
                .emit(&CircuitBreakerEvent::OutcomeDiscarded {
                    key: self.key.clone(),
                    timestamp: std::time::Instant::now(),
                    state: self.state,
                });
            return false;
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::OutcomeRecorded {
                key: self.key.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
                outcome,
            });

        #[cfg(feature = "metrics")]
        counter!(
            "circuitbreaker_calls_total",
            "circuitbreaker" => self.key.clone(),
            "outcome" => if outcome.is_failure() { "failure" } else { "success" }
        )
        .increment(1);

        match self.state {
            CircuitState::Closed => {
                self.window.push(outcome);
                self.evaluate_window(config);
            }
            CircuitState::HalfOpen => match outcome {
                CallOutcome::Failure => self.transition_to(CircuitState::Open, config),
                CallOutcome::Success => {
                    self.half_open_successes += 1;
                    if self.half_open_successes >= config.permitted_calls_in_half_open {
                        self.transition_to(CircuitState::Closed, config);
                    }
                }
            },
            // permits are never issued while open within one generation
            CircuitState::Open => return false,
        }
        true
    }

    /// Returns an unused half-open trial slot.
    pub(crate) fn release(&mut self, permit: Ticket, config: &BreakerConfig) {
        if permit.generation != self.generation || self.state != CircuitState::HalfOpen {
            return;
        }
        self.half_open_trials = self.half_open_trials.saturating_sub(1);
        config
            .event_listeners
            .emit(&CircuitBreakerEvent::PermitReleased {
                key: self.key.clone(),
                timestamp: std::time::Instant::now(),
                state: self.state,
            });
    }

    pub(crate) fn force_open(&mut self, config: &BreakerConfig) {
        self.transition_to(CircuitState::Open, config);
    }

    pub(crate) fn force_closed(&mut self, config: &BreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    /// Returns to CLOSED with an empty window, even if already closed.
    pub(crate) fn reset(&mut self, config: &BreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
        self.window.clear();
        self.generation += 1;
    }

    fn evaluate_window(&mut self, config: &BreakerConfig) {
        if self.window.len() < config.minimum_calls_before_evaluation {
            return;
        }
        if self.window.failure_rate_reached(config.failure_rate_threshold) {
            self.transition_to(CircuitState::Open, config);
        }
    }

    fn transition_to(&mut self, state: CircuitState, config: &BreakerConfig) {
        let from_state = self.state;
        if from_state == state {
            return;
        }

        config
            .event_listeners
            .emit(&CircuitBreakerEvent::StateTransition {
                key: self.key.clone(),
                timestamp: std::time::Instant::now(),
                from_state,
                to_state: state,
            });

        #[cfg(feature = "tracing")]
        tracing::info!(breaker = %self.key, from = ?from_state, to = ?state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => self.key.clone(),
                "from" => from_state.as_str(),
                "to" => state.as_str()
            )
            .increment(1);

            gauge!("circuitbreaker_state", "circuitbreaker" => self.key.clone(), "state" => from_state.as_str())
                .set(0.0);
            gauge!("circuitbreaker_state", "circuitbreaker" => self.key.clone(), "state" => state.as_str())
                .set(1.0);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.generation += 1;
        self.half_open_trials = 0;
        self.half_open_successes = 0;
        if state == CircuitState::Closed {
            self.window.clear();
        }
    }
}
