use callguard_circuitbreaker::{BreakerConfig, DefaultClassifier, OutcomeClassifier, SharedClassifier};
use callguard_retry::RetryConfig;
use std::sync::Arc;
use std::time::Duration;

/// Everything the invoker needs to protect calls to one dependency key.
///
/// Immutable once handed to the [`Registry`](crate::Registry).
#[derive(Clone)]
pub struct DependencyConfig {
    pub(crate) breaker: Arc<BreakerConfig>,
    pub(crate) retry: Arc<RetryConfig>,
    pub(crate) classifier: SharedClassifier,
    pub(crate) call_timeout: Option<Duration>,
}

impl DependencyConfig {
    pub fn builder() -> DependencyConfigBuilder {
        DependencyConfigBuilder::new()
    }

    pub fn breaker(&self) -> &BreakerConfig {
        &self.breaker
    }

    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn classifier(&self) -> &dyn OutcomeClassifier {
        self.classifier.as_ref()
    }

    /// Deadline applied to each attempt, if any.
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            breaker: Arc::new(BreakerConfig::default()),
            retry: Arc::new(RetryConfig::default()),
            classifier: Arc::new(DefaultClassifier::new()),
            call_timeout: None,
        }
    }
}

impl std::fmt::Debug for DependencyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyConfig")
            .field("breaker", &self.breaker)
            .field("retry", &self.retry)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DependencyConfig`].
///
/// Components are validated by their own builders, so this one cannot fail.
#[derive(Default)]
pub struct DependencyConfigBuilder {
    config: DependencyConfig,
}

impl DependencyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn breaker(mut self, breaker: BreakerConfig) -> Self {
        self.config.breaker = Arc::new(breaker);
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Arc::new(retry);
        self
    }

    /// Replaces the outcome classifier.
    pub fn classifier<C>(mut self, classifier: C) -> Self
    where
        C: OutcomeClassifier + 'static,
    {
        self.config.classifier = Arc::new(classifier);
        self
    }

    /// Counts 4xx responses against the dependency's health.
    pub fn count_client_errors(self) -> Self {
        self.classifier(DefaultClassifier::counting_client_errors())
    }

    /// Fails each attempt that runs longer than `timeout` with a `Timeout`
    /// failure.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> DependencyConfig {
        self.config
    }
}
