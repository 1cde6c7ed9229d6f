use crate::backoff::{ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, IntervalFunction};
use crate::events::RetryEvent;
use crate::policy::RetryPolicy;
use callguard_core::{
    CallFailure, ConfigError, EventListener, EventListeners, FailureKind, FnListener,
};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the retry executor.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub(crate) policy: RetryPolicy,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_attempts(&self) -> usize {
        self.policy.max_attempts
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::new(3, Arc::new(FixedInterval::new(Duration::from_millis(500)))),
            event_listeners: EventListeners::new(),
        }
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    max_attempts: usize,
    interval_fn: Option<Arc<dyn IntervalFunction>>,
    retry_predicate: Option<Arc<dyn Fn(&CallFailure) -> bool + Send + Sync>>,
    event_listeners: EventListeners<RetryEvent>,
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfigBuilder {
    /// Creates a new builder with defaults.
    ///
    /// Defaults:
    /// - max_attempts: 3
    /// - backoff: fixed 500ms
    /// - retried kinds: `ServerError` and `Timeout`
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            interval_fn: None,
            retry_predicate: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// This includes the initial attempt, so max_attempts=3 means
    /// 1 initial attempt + 2 retries. Must be at least 1.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn fixed_backoff(mut self, duration: Duration) -> Self {
        self.interval_fn = Some(Arc::new(FixedInterval::new(duration)));
        self
    }

    /// Sets exponential backoff doubling from `initial_interval`.
    pub fn exponential_backoff(mut self, initial_interval: Duration) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialBackoff::new(initial_interval)));
        self
    }

    /// Sets exponential backoff with jitter.
    pub fn exponential_random_backoff(
        mut self,
        initial_interval: Duration,
        randomization_factor: f64,
    ) -> Self {
        self.interval_fn = Some(Arc::new(ExponentialRandomBackoff::new(
            initial_interval,
            randomization_factor,
        )));
        self
    }

    /// Sets a custom interval function.
    pub fn backoff<I>(mut self, interval_fn: I) -> Self
    where
        I: IntervalFunction + 'static,
    {
        self.interval_fn = Some(Arc::new(interval_fn));
        self
    }

    /// Sets a predicate deciding which failures are retried.
    ///
    /// `Cancelled` and `CircuitOpen` failures are never retried regardless
    /// of the predicate.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CallFailure) -> bool + Send + Sync + 'static,
    {
        self.retry_predicate = Some(Arc::new(predicate));
        self
    }

    /// Retries exactly the given failure kinds.
    pub fn retry_on_kinds(self, kinds: &[FailureKind]) -> Self {
        let kinds = kinds.to_vec();
        self.retry_on(move |failure| kinds.contains(&failure.kind()))
    }

    /// Adds an event listener.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<RetryEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Called with the failed attempt number (1-indexed) and the upcoming
    /// delay, before the delay starts.
    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retry { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    /// Called with the total number of attempts on success.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Success { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Called with the total number of attempts once the budget is spent.
    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Called when a non-retryable failure ends the call.
    pub fn on_ignored_error<F>(mut self, f: F) -> Self
    where
        F: Fn(FailureKind) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::IgnoredError { kind, .. } = event {
                f(*kind);
            }
        }));
        self
    }

    pub fn on_cancelled<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Cancelled { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "max_attempts",
            });
        }

        let interval_fn = self
            .interval_fn
            .unwrap_or_else(|| Arc::new(FixedInterval::new(Duration::from_millis(500))));

        let mut policy = RetryPolicy::new(self.max_attempts, interval_fn);
        if let Some(predicate) = self.retry_predicate {
            policy.retry_predicate = predicate;
        }

        Ok(RetryConfig {
            policy,
            event_listeners: self.event_listeners,
        })
    }
}
