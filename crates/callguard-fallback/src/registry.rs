use callguard_core::{CallFailure, ConfigError, DependencyKey, FailureKind};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a fallback handler that could not produce a value.
///
/// The dispatcher treats it like a panicking handler and falls through to
/// the process-wide default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fallback handler failed: {0}")]
pub struct FallbackHandlerError(String);

impl FallbackHandlerError {
    pub fn new(reason: impl fmt::Display) -> Self {
        Self(reason.to_string())
    }

    pub fn reason(&self) -> &str {
        &self.0
    }
}

/// What a fallback handler sees about the failed call.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    key: &'a DependencyKey,
    failure: &'a CallFailure,
}

impl<'a> FallbackContext<'a> {
    pub(crate) fn new(key: &'a DependencyKey, failure: &'a CallFailure) -> Self {
        Self { key, failure }
    }

    pub fn key(&self) -> &DependencyKey {
        self.key
    }

    pub fn kind(&self) -> FailureKind {
        self.failure.kind()
    }

    /// The original failure.
    pub fn failure(&self) -> &CallFailure {
        self.failure
    }
}

/// A fallible producer of degraded values.
pub type FallbackHandler<T> =
    Arc<dyn Fn(&FallbackContext<'_>) -> Result<T, FallbackHandlerError> + Send + Sync>;

/// Failure-kind to handler table for one dependency key, with a required
/// default entry.
///
/// Immutable after construction.
pub struct FallbackRegistry<T> {
    handlers: HashMap<FailureKind, FallbackHandler<T>>,
    default: FallbackHandler<T>,
}

impl<T> FallbackRegistry<T> {
    pub fn builder() -> FallbackRegistryBuilder<T> {
        FallbackRegistryBuilder::new()
    }

    /// A table with only a default handler returning a fixed value.
    pub fn value(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            handlers: HashMap::new(),
            default: Arc::new(move |_: &FallbackContext<'_>| Ok(value.clone())),
        }
    }

    /// Returns the handler registered for exactly `kind`.
    pub fn handler_for(&self, kind: FailureKind) -> Option<&FallbackHandler<T>> {
        self.handlers.get(&kind)
    }

    pub fn default_handler(&self) -> &FallbackHandler<T> {
        &self.default
    }

    pub fn has_handler(&self, kind: FailureKind) -> bool {
        self.handlers.contains_key(&kind)
    }
}

impl<T> Clone for FallbackRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
            default: Arc::clone(&self.default),
        }
    }
}

impl<T> fmt::Debug for FallbackRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().map(FailureKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("FallbackRegistry")
            .field("kinds", &kinds)
            .finish_non_exhaustive()
    }
}

/// Builder for [`FallbackRegistry`].
pub struct FallbackRegistryBuilder<T> {
    handlers: HashMap<FailureKind, FallbackHandler<T>>,
    default: Option<FallbackHandler<T>>,
}

impl<T> Default for FallbackRegistryBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FallbackRegistryBuilder<T> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            default: None,
        }
    }

    /// Registers a fallible handler for one failure kind.
    pub fn try_on<F>(mut self, kind: FailureKind, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> Result<T, FallbackHandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(kind, Arc::new(handler));
        self
    }

    /// Registers a handler for one failure kind.
    pub fn on<F>(self, kind: FailureKind, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.try_on(kind, move |ctx| Ok(handler(ctx)))
    }

    pub fn on_circuit_open<F>(self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.on(FailureKind::CircuitOpen, handler)
    }

    pub fn on_timeout<F>(self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.on(FailureKind::Timeout, handler)
    }

    pub fn on_client_error<F>(self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.on(FailureKind::ClientError, handler)
    }

    pub fn on_server_error<F>(self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.on(FailureKind::ServerError, handler)
    }

    /// Sets the fallible default handler for kinds without their own entry.
    pub fn try_default_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> Result<T, FallbackHandlerError> + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(handler));
        self
    }

    /// Sets the default handler for kinds without their own entry.
    pub fn default_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.try_default_handler(move |ctx| Ok(handler(ctx)))
    }

    /// Builds the table. Fails if no default handler was set.
    pub fn build(self) -> Result<FallbackRegistry<T>, ConfigError> {
        let default = self.default.ok_or(ConfigError::Missing("default fallback handler"))?;
        Ok(FallbackRegistry {
            handlers: self.handlers,
            default,
        })
    }
}
