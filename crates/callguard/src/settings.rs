//! Serde-loadable invoker settings.
//!
//! Lets the per-dependency configuration be read from TOML or JSON at
//! startup. Durations are plain milliseconds. Every field has a default, so a
//! settings file only names what differs.

use crate::config::DependencyConfig;
use crate::registry::{Registry, RegistryBuilder};
use callguard_circuitbreaker::{BreakerConfig, DefaultClassifier};
use callguard_core::{ConfigError, FailureKind};
use callguard_retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Settings for the whole invoker: a default plus per-key overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InvokerSettings {
    /// Applied to keys without an entry in `dependencies`.
    pub defaults: DependencySettings,

    /// Per-key settings, keyed by dependency key.
    pub dependencies: BTreeMap<String, DependencySettings>,
}

impl InvokerSettings {
    /// Validates every entry and builds a registry.
    pub fn into_registry(self) -> Result<Registry, ConfigError> {
        Ok(self.registry_builder()?.build())
    }

    /// Validates every entry and returns a builder for further registrations.
    pub fn registry_builder(self) -> Result<RegistryBuilder, ConfigError> {
        let mut builder = Registry::builder().default_config(self.defaults.to_config()?);
        for (key, settings) in self.dependencies {
            builder = builder.register(key, settings.to_config()?);
        }
        Ok(builder)
    }
}

/// Settings for one dependency key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DependencySettings {
    /// Sliding-window size.
    pub window_size: usize,

    /// Failure-rate threshold in percent.
    pub failure_rate_threshold: u8,

    pub minimum_calls_before_evaluation: usize,

    /// Wait in OPEN before the first trial, in milliseconds.
    pub wait_duration_in_open_ms: u64,

    pub permitted_calls_in_half_open: usize,

    /// Attempts per logical call, including the first.
    pub max_attempts: usize,

    /// Wait between attempts in milliseconds.
    pub retry_wait_ms: u64,

    /// Grow the retry wait exponentially instead of keeping it fixed.
    pub exponential_backoff: bool,

    /// Failure kinds that are retried.
    pub retry_on: Vec<FailureKind>,

    /// Count 4xx responses against the dependency's health.
    pub count_client_errors: bool,

    /// Per-attempt deadline in milliseconds.
    pub call_timeout_ms: Option<u64>,
}

impl Default for DependencySettings {
    fn default() -> Self {
        Self {
            window_size: 5,
            failure_rate_threshold: 50,
            minimum_calls_before_evaluation: 5,
            wait_duration_in_open_ms: 2_000,
            permitted_calls_in_half_open: 1,
            max_attempts: 3,
            retry_wait_ms: 500,
            exponential_backoff: false,
            retry_on: vec![FailureKind::ServerError, FailureKind::Timeout],
            count_client_errors: false,
            call_timeout_ms: None,
        }
    }
}

impl DependencySettings {
    /// Validates the settings and converts them into a [`DependencyConfig`].
    pub fn to_config(&self) -> Result<DependencyConfig, ConfigError> {
        if self.call_timeout_ms == Some(0) {
            return Err(ConfigError::Zero {
                field: "call_timeout_ms",
            });
        }

        let breaker = BreakerConfig::builder()
            .window_size(self.window_size)
            .failure_rate_threshold(self.failure_rate_threshold)
            .minimum_calls_before_evaluation(self.minimum_calls_before_evaluation)
            .wait_duration_in_open(Duration::from_millis(self.wait_duration_in_open_ms))
            .permitted_calls_in_half_open(self.permitted_calls_in_half_open)
            .build()?;

        let wait = Duration::from_millis(self.retry_wait_ms);
        let retry = RetryConfig::builder().max_attempts(self.max_attempts);
        let retry = if self.exponential_backoff {
            retry.exponential_backoff(wait)
        } else {
            retry.fixed_backoff(wait)
        };
        let retry = retry.retry_on_kinds(&self.retry_on).build()?;

        let classifier = if self.count_client_errors {
            DefaultClassifier::counting_client_errors()
        } else {
            DefaultClassifier::new()
        };

        let mut builder = DependencyConfig::builder()
            .breaker(breaker)
            .retry(retry)
            .classifier(classifier);
        if let Some(ms) = self.call_timeout_ms {
            builder = builder.call_timeout(Duration::from_millis(ms));
        }
        Ok(builder.build())
    }
}
