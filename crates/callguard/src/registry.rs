//! Process-wide map from dependency key to breaker, retry executor and
//! configuration.

use crate::config::DependencyConfig;
use callguard_circuitbreaker::{CircuitBreaker, CircuitMetrics, CircuitState, OutcomeClassifier};
use callguard_core::DependencyKey;
use callguard_retry::RetryExecutor;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-key resilience state, created lazily on the first call for the key
/// and kept for the life of the registry.
pub struct DependencyEntry {
    key: DependencyKey,
    breaker: CircuitBreaker,
    retry: RetryExecutor,
    config: DependencyConfig,
}

impl DependencyEntry {
    fn new(key: DependencyKey, config: DependencyConfig) -> Self {
        let breaker = CircuitBreaker::new(key.clone(), Arc::clone(&config.breaker));
        let retry = RetryExecutor::new(Arc::clone(&config.retry));
        Self {
            key,
            breaker,
            retry,
            config,
        }
    }

    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    pub fn classifier(&self) -> &dyn OutcomeClassifier {
        self.config.classifier()
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.config.call_timeout
    }

    pub fn config(&self) -> &DependencyConfig {
        &self.config
    }
}

impl std::fmt::Debug for DependencyEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyEntry")
            .field("key", &self.key)
            .field("state", &self.breaker.state_sync())
            .finish()
    }
}

/// The only shared mutable state of the engine.
///
/// Each key gets its own breaker with its own critical section, so calls to
/// different keys never wait on each other. Entries are never replaced or
/// evicted once created.
pub struct Registry {
    entries: DashMap<DependencyKey, Arc<DependencyEntry>>,
    configs: HashMap<DependencyKey, DependencyConfig>,
    default_config: DependencyConfig,
}

impl Registry {
    /// A registry where every key uses the default [`DependencyConfig`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the entry for `key`, creating it on first use.
    pub fn entry(&self, key: &DependencyKey) -> Arc<DependencyEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }

        let entry = self.entries.entry(key.clone()).or_insert_with(|| {
            let config = self
                .configs
                .get(key)
                .cloned()
                .unwrap_or_else(|| self.default_config.clone());

            #[cfg(feature = "tracing")]
            tracing::debug!(breaker = %key, registered = self.configs.contains_key(key), "creating dependency entry");

            Arc::new(DependencyEntry::new(key.clone(), config))
        });
        Arc::clone(entry.value())
    }

    /// Returns the breaker for `key` if a call has already created it.
    pub fn breaker(&self, key: &str) -> Option<CircuitBreaker> {
        self.entries.get(key).map(|entry| entry.breaker().clone())
    }

    /// Returns the configuration that applies to `key`.
    pub fn config_for(&self, key: &str) -> &DependencyConfig {
        self.configs.get(key).unwrap_or(&self.default_config)
    }

    /// Keys with a live entry, sorted.
    pub fn keys(&self) -> Vec<DependencyKey> {
        let mut keys: Vec<_> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Lock-free state of the breaker for `key`; `None` before its first call.
    pub fn state(&self, key: &str) -> Option<CircuitState> {
        self.entries.get(key).map(|entry| entry.breaker().state_sync())
    }

    /// Counter snapshot for `key`; `None` before its first call.
    pub async fn metrics(&self, key: &str) -> Option<CircuitMetrics> {
        let breaker = self.breaker(key)?;
        Some(breaker.metrics().await)
    }

    /// `(key, "healthy" | "degraded" | "unhealthy")` for every live entry.
    pub fn health(&self) -> Vec<(DependencyKey, &'static str)> {
        let mut health: Vec<_> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().breaker().health_status()))
            .collect();
        health.sort_by(|a, b| a.0.cmp(&b.0));
        health
    }

    /// Forces the breaker for `key` open, creating the entry if needed.
    pub async fn force_open(&self, key: impl Into<DependencyKey>) {
        self.entry(&key.into()).breaker().force_open().await;
    }

    /// Forces the breaker for `key` closed, creating the entry if needed.
    pub async fn force_closed(&self, key: impl Into<DependencyKey>) {
        self.entry(&key.into()).breaker().force_closed().await;
    }

    /// Resets the breaker for `key` to closed with an empty window.
    pub async fn reset(&self, key: impl Into<DependencyKey>) {
        self.entry(&key.into()).breaker().reset().await;
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.keys())
            .field("registered", &self.configs.len())
            .finish()
    }
}

/// Builder for [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    configs: HashMap<DependencyKey, DependencyConfig>,
    default_config: DependencyConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the configuration for `key`. A later registration for the
    /// same key replaces the earlier one.
    pub fn register(mut self, key: impl Into<DependencyKey>, config: DependencyConfig) -> Self {
        self.configs.insert(key.into(), config);
        self
    }

    /// Configuration for keys that were not registered explicitly.
    pub fn default_config(mut self, config: DependencyConfig) -> Self {
        self.default_config = config;
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            entries: DashMap::new(),
            configs: self.configs,
            default_config: self.default_config,
        }
    }
}
