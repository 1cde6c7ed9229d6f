//! Per-dependency circuit breaker.
//!
//! A circuit breaker stops calls to a failing dependency for a cooldown period
//! so it can recover, instead of piling more load on it.
//!
//! ## States
//! - **Closed**: all calls permitted; outcomes feed a count-based sliding window
//! - **Open**: every call is denied until `wait_duration_in_open` elapses
//! - **Half-Open**: up to `permitted_calls_in_half_open` trial calls are
//!   admitted; one failed trial re-opens, all trials succeeding closes
//!
//! ## Usage
//!
//! ```rust
//! use callguard_circuitbreaker::{BreakerConfig, CircuitBreaker, CircuitState};
//! use callguard_core::CallOutcome;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), callguard_core::ConfigError> {
//! let config = BreakerConfig::builder()
//!     .window_size(5)
//!     .failure_rate_threshold(50)
//!     .minimum_calls_before_evaluation(5)
//!     .wait_duration_in_open(Duration::from_secs(2))
//!     .build()?;
//!
//! let breaker = CircuitBreaker::new("callee-client-v1", config);
//!
//! if let Some(permit) = breaker.permit().await {
//!     // ... call the dependency, classify the result ...
//!     breaker.record_outcome(permit, CallOutcome::Success).await;
//! }
//! assert_eq!(breaker.state_sync(), CircuitState::Closed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Every permit decision and outcome recording for one breaker runs inside
//! that breaker's own critical section, so two callers racing on the
//! OPEN -> HALF_OPEN edge produce exactly one transition, and half-open trial
//! slots are handed out atomically. The critical section never awaits, so a
//! [`CallPermit`] dropped mid-call can hand its slot back synchronously. The
//! state is mirrored into an atomic for lock-free inspection via
//! [`CircuitBreaker::state_sync`].
//!
//! ## Feature Flags
//! - `metrics`: call counters, transition counters and a state gauge
//! - `tracing`: structured logs for permit decisions and transitions
//! - `serde`: `Serialize` for [`CircuitState`] and [`CircuitMetrics`]

use crate::circuit::Circuit;
use callguard_core::{CallOutcome, DependencyKey};
#[cfg(feature = "metrics")]
use metrics::{describe_counter, describe_gauge};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use parking_lot::Mutex;

pub use circuit::{CircuitMetrics, CircuitState};
pub use classifier::{
    classify_result, DefaultClassifier, FnClassifier, OutcomeClassifier, SharedClassifier,
};
pub use config::{BreakerConfig, BreakerConfigBuilder};
pub use events::CircuitBreakerEvent;
pub use permit::CallPermit;
pub use window::SlidingWindow;

mod circuit;
pub mod classifier;
mod config;
mod events;
mod permit;
mod window;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

/// Circuit breaker for a single dependency key.
///
/// Cheap to clone; clones share the same state.
pub struct CircuitBreaker {
    key: DependencyKey,
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<BreakerConfig>,
}

impl CircuitBreaker {
    /// Creates a closed breaker for `key`.
    pub fn new(key: impl Into<DependencyKey>, config: impl Into<Arc<BreakerConfig>>) -> Self {
        #[cfg(feature = "metrics")]
        METRICS_INIT.call_once(|| {
            describe_counter!(
                "circuitbreaker_calls_total",
                "Total number of calls seen by the circuit breaker"
            );
            describe_counter!(
                "circuitbreaker_transitions_total",
                "Total number of circuit breaker state transitions"
            );
            describe_gauge!(
                "circuitbreaker_state",
                "Current state of the circuit breaker"
            );
        });

        let key = key.into();
        let config = config.into();
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        let circuit = Circuit::new(
            key.to_string(),
            config.window_size,
            Arc::clone(&state_atomic),
        );
        Self {
            key,
            circuit: Arc::new(Mutex::new(circuit)),
            state_atomic,
            config,
        }
    }

    /// The dependency this breaker guards.
    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// The validated configuration.
    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Asks whether a call may proceed.
    ///
    /// Returns `None` when the call is denied. A denied call must not reach
    /// the dependency and is not recorded.
    pub async fn permit(&self) -> Option<CallPermit> {
        let permit = self
            .circuit
            .lock()
            .try_acquire(&self.config)
            .map(|ticket| CallPermit::new(ticket, Arc::clone(&self.circuit), Arc::clone(&self.config)));

        #[cfg(feature = "tracing")]
        {
            match &permit {
                Some(p) => tracing::trace!(breaker = %self.key, state = ?p.state(), "call permitted"),
                None => tracing::debug!(breaker = %self.key, "call rejected"),
            }
        }

        permit
    }

    /// Records the classified terminal outcome of a permitted call.
    ///
    /// Returns `false` if the breaker transitioned since the permit was issued
    /// and the outcome was discarded.
    pub async fn record_outcome(&self, permit: CallPermit, outcome: CallOutcome) -> bool {
        let Some(ticket) = permit.into_ticket() else {
            return false;
        };
        let applied = self.circuit.lock().record(ticket, outcome, &self.config);

        #[cfg(feature = "tracing")]
        {
            if !applied {
                tracing::debug!(breaker = %self.key, ?outcome, "stale outcome discarded");
            }
        }

        applied
    }

    /// Ends a permitted call without an outcome, e.g. after cancellation.
    ///
    /// The window is untouched; a half-open trial slot is handed back.
    pub async fn release(&self, permit: CallPermit) {
        if let Some(ticket) = permit.into_ticket() {
            self.circuit.lock().release(ticket, &self.config);
        }
    }

    /// Forces the circuit into the open state.
    pub async fn force_open(&self) {
        self.circuit.lock().force_open(&self.config);
    }

    /// Forces the circuit into the closed state.
    pub async fn force_closed(&self) {
        self.circuit.lock().force_closed(&self.config);
    }

    /// Resets the circuit to closed and clears the window.
    pub async fn reset(&self) {
        self.circuit.lock().reset(&self.config);
    }

    /// Returns the current state of the circuit.
    pub async fn state(&self) -> CircuitState {
        self.circuit.lock().state()
    }

    /// Returns a snapshot of the breaker's counters.
    pub async fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().metrics()
    }

    /// Returns the current state without locking.
    pub fn state_sync(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    /// Whether the breaker currently denies calls.
    pub fn is_open(&self) -> bool {
        self.state_sync() == CircuitState::Open
    }

    /// Returns an HTTP status code for health endpoints: 503 when open,
    /// 200 otherwise.
    pub fn http_status(&self) -> u16 {
        match self.state_sync() {
            CircuitState::Closed | CircuitState::HalfOpen => 200,
            CircuitState::Open => 503,
        }
    }

    /// Returns "healthy", "degraded" or "unhealthy".
    pub fn health_status(&self) -> &'static str {
        match self.state_sync() {
            CircuitState::Closed => "healthy",
            CircuitState::HalfOpen => "degraded",
            CircuitState::Open => "unhealthy",
        }
    }
}

impl Clone for CircuitBreaker {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            circuit: Arc::clone(&self.circuit),
            state_atomic: Arc::clone(&self.state_atomic),
            config: Arc::clone(&self.config),
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("key", &self.key)
            .field("state", &self.state_sync())
            .finish()
    }
}
