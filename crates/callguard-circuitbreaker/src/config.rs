use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;
use callguard_core::{CallOutcome, ConfigError, EventListener, EventListeners, FnListener};
use std::time::Duration;

/// Configuration for one dependency's circuit breaker.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub(crate) window_size: usize,
    pub(crate) failure_rate_threshold: u8,
    pub(crate) wait_duration_in_open: Duration,
    pub(crate) permitted_calls_in_half_open: usize,
    pub(crate) minimum_calls_before_evaluation: usize,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl BreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::new()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Failure-rate threshold in percent (0..=100).
    pub fn failure_rate_threshold(&self) -> u8 {
        self.failure_rate_threshold
    }

    pub fn wait_duration_in_open(&self) -> Duration {
        self.wait_duration_in_open
    }

    pub fn permitted_calls_in_half_open(&self) -> usize {
        self.permitted_calls_in_half_open
    }

    /// Effective minimum number of recorded calls before the failure rate is
    /// evaluated. Never larger than the window size.
    pub fn minimum_calls_before_evaluation(&self) -> usize {
        self.minimum_calls_before_evaluation
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            failure_rate_threshold: 50,
            wait_duration_in_open: Duration::from_secs(2),
            permitted_calls_in_half_open: 1,
            minimum_calls_before_evaluation: 5,
            event_listeners: EventListeners::new(),
        }
    }
}

/// Builder for [`BreakerConfig`].
pub struct BreakerConfigBuilder {
    window_size: usize,
    failure_rate_threshold: u8,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: usize,
    minimum_calls_before_evaluation: Option<usize>,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl Default for BreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakerConfigBuilder {
    /// Creates a new builder.
    ///
    /// Defaults:
    /// - window_size: 5
    /// - failure_rate_threshold: 50 (%)
    /// - wait_duration_in_open: 2 seconds
    /// - permitted_calls_in_half_open: 1
    /// - minimum_calls_before_evaluation: same as window_size
    pub fn new() -> Self {
        Self {
            window_size: 5,
            failure_rate_threshold: 50,
            wait_duration_in_open: Duration::from_secs(2),
            permitted_calls_in_half_open: 1,
            minimum_calls_before_evaluation: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets how many of the most recent outcomes the sliding window keeps.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Sets the failure rate, in percent, at which the circuit opens.
    ///
    /// The comparison is inclusive: 50 opens at exactly half the calls failing.
    pub fn failure_rate_threshold(mut self, percent: u8) -> Self {
        self.failure_rate_threshold = percent;
        self
    }

    /// Sets how long the circuit stays open before admitting a trial call.
    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    /// Sets how many trial calls are admitted while half-open.
    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    /// Sets the minimum number of recorded calls before the failure rate is
    /// evaluated.
    ///
    /// Values above the window size are capped at the window size.
    pub fn minimum_calls_before_evaluation(mut self, n: usize) -> Self {
        self.minimum_calls_before_evaluation = Some(n);
        self
    }

    /// Registers an arbitrary event listener.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<CircuitBreakerEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Registers a callback invoked on every state transition with
    /// `(from, to)`.
    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::StateTransition {
                from_state,
                to_state,
                ..
            } = event
            {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is permitted.
    pub fn on_call_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallPermitted { state, .. } = event {
                f(*state);
            }
        }));
        self
    }

    /// Registers a callback invoked when a call is denied.
    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::CallRejected { .. } = event {
                f();
            }
        }));
        self
    }

    /// Registers a callback invoked when an outcome is applied.
    pub fn on_outcome<F>(mut self, f: F) -> Self
    where
        F: Fn(CallOutcome) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let CircuitBreakerEvent::OutcomeRecorded { outcome, .. } = event {
                f(*outcome);
            }
        }));
        self
    }

    /// Validates and builds the configuration.
    pub fn build(self) -> Result<BreakerConfig, ConfigError> {
        if self.failure_rate_threshold > 100 {
            return Err(ConfigError::ThresholdOutOfRange(
                self.failure_rate_threshold,
            ));
        }
        if self.window_size == 0 {
            return Err(ConfigError::Zero {
                field: "window_size",
            });
        }
        if self.permitted_calls_in_half_open == 0 {
            return Err(ConfigError::Zero {
                field: "permitted_calls_in_half_open",
            });
        }
        let minimum = self
            .minimum_calls_before_evaluation
            .unwrap_or(self.window_size);
        if minimum == 0 {
            return Err(ConfigError::Zero {
                field: "minimum_calls_before_evaluation",
            });
        }

        Ok(BreakerConfig {
            window_size: self.window_size,
            failure_rate_threshold: self.failure_rate_threshold,
            wait_duration_in_open: self.wait_duration_in_open,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            minimum_calls_before_evaluation: minimum.min(self.window_size),
            event_listeners: self.event_listeners,
        })
    }
}
