//! Fallback dispatch for failed or denied calls.
//!
//! When a call is denied by its circuit breaker or fails terminally, the
//! [`FallbackDispatcher`] produces a [`DegradedResponse`] instead of letting
//! the failure escape to the caller.
//!
//! # Lookup order
//!
//! 1. The handler registered for the exact [`FailureKind`] in the key's
//!    [`FallbackRegistry`]
//! 2. The key's default handler
//! 3. The process-wide default, producing a generic "service unavailable"
//!    response
//!
//! A handler that returns an error or panics is treated as if the
//! process-wide default had been selected. Dispatch itself never fails and
//! never touches breaker state.
//!
//! # Example
//!
//! ```rust
//! use callguard_core::{CallFailure, DependencyKey, FailureKind};
//! use callguard_fallback::{FallbackDispatcher, FallbackPath, FallbackRegistry};
//!
//! # fn example() -> Result<(), callguard_core::ConfigError> {
//! let dispatcher = FallbackDispatcher::builder()
//!     .register(
//!         "callee-client-v1",
//!         FallbackRegistry::builder()
//!             .on_timeout(|_| "Fallback: Request timeout".to_string())
//!             .default_handler(|_| "Fallback: Service unavailable".to_string())
//!             .build()?,
//!     )
//!     .build();
//!
//! let key = DependencyKey::new("callee-client-v1");
//! let degraded = dispatcher.resolve(&key, CallFailure::from_status(503, "unavailable"));
//! assert_eq!(degraded.kind(), FailureKind::ServerError);
//! assert_eq!(degraded.path(), FallbackPath::KeyDefault);
//! assert_eq!(degraded.value().map(String::as_str), Some("Fallback: Service unavailable"));
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//! - `metrics`: `fallback_calls_total{fallback, kind, path}`
//! - `tracing`: debug logs for every dispatch, warnings for failing handlers

mod events;
mod registry;
mod response;

pub use events::FallbackEvent;
pub use registry::{
    FallbackContext, FallbackHandler, FallbackHandlerError, FallbackRegistry,
    FallbackRegistryBuilder,
};
pub use response::{DegradedResponse, FallbackPath, SERVICE_UNAVAILABLE};

use callguard_core::{CallFailure, DependencyKey, EventListener, EventListeners, FnListener};
#[cfg(feature = "metrics")]
use metrics::{counter, describe_counter};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
#[cfg(feature = "metrics")]
use std::sync::Once;
use std::time::Instant;

#[cfg(feature = "metrics")]
static METRICS_INIT: Once = Once::new();

type GlobalHandler<T> = Arc<dyn Fn(&FallbackContext<'_>) -> T + Send + Sync>;

/// Resolves failures into degraded responses.
///
/// Holds one [`FallbackRegistry`] per dependency key plus a process-wide
/// default. Immutable after construction and cheap to clone.
pub struct FallbackDispatcher<T> {
    registries: Arc<HashMap<DependencyKey, FallbackRegistry<T>>>,
    global: Option<GlobalHandler<T>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<T> FallbackDispatcher<T> {
    pub fn builder() -> FallbackDispatcherBuilder<T> {
        FallbackDispatcherBuilder::new()
    }

    /// Returns the table registered for `key`, if any.
    pub fn registry(&self, key: &DependencyKey) -> Option<&FallbackRegistry<T>> {
        self.registries.get(key)
    }

    /// Produces the degraded response for a failed or denied call.
    ///
    /// Never panics and never fails; the chosen path is reported through
    /// events, logs and metrics.
    pub fn resolve(&self, key: &DependencyKey, failure: CallFailure) -> DegradedResponse<T> {
        let kind = failure.kind();
        let ctx = FallbackContext::new(key, &failure);

        let selected = self.registries.get(key).map(|registry| {
            match registry.handler_for(kind) {
                Some(handler) => (FallbackPath::Kind, handler),
                None => (FallbackPath::KeyDefault, registry.default_handler()),
            }
        });

        let mut produced = None;
        if let Some((path, handler)) = selected {
            match run_handler(handler, &ctx) {
                Ok(value) => produced = Some((path, Some(value))),
                Err(reason) => self.handler_failed(key, &failure, path, reason),
            }
        }

        let (path, value) = match produced {
            Some(found) => found,
            None => (FallbackPath::Global, self.global_value(&ctx)),
        };

        self.event_listeners.emit(&FallbackEvent::Applied {
            key: key.to_string(),
            timestamp: Instant::now(),
            kind,
            path,
        });

        #[cfg(feature = "metrics")]
        {
            METRICS_INIT.call_once(|| {
                describe_counter!(
                    "fallback_calls_total",
                    "Total number of degraded responses by failure kind and fallback path"
                );
            });
            counter!(
                "fallback_calls_total",
                "fallback" => key.to_string(),
                "kind" => kind.as_str(),
                "path" => path.as_str()
            )
            .increment(1);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(fallback = %key, %kind, %path, "fallback applied");

        DegradedResponse::new(key.clone(), failure, path, value)
    }

    fn global_value(&self, ctx: &FallbackContext<'_>) -> Option<T> {
        let handler = self.global.as_ref()?;
        match catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
            Ok(value) => Some(value),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(fallback = %ctx.key(), "process-wide fallback handler panicked");
                None
            }
        }
    }

    fn handler_failed(
        &self,
        key: &DependencyKey,
        failure: &CallFailure,
        path: FallbackPath,
        reason: String,
    ) {
        #[cfg(feature = "tracing")]
        tracing::warn!(fallback = %key, kind = %failure.kind(), %path, %reason, "fallback handler failed");

        self.event_listeners.emit(&FallbackEvent::HandlerFailed {
            key: key.to_string(),
            timestamp: Instant::now(),
            kind: failure.kind(),
            path,
            reason,
        });
    }
}

fn run_handler<T>(
    handler: &FallbackHandler<T>,
    ctx: &FallbackContext<'_>,
) -> Result<T, String> {
    match catch_unwind(AssertUnwindSafe(|| handler(ctx))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.reason().to_string()),
        Err(panic) => Err(panic_message(panic.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

impl<T> Clone for FallbackDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            registries: Arc::clone(&self.registries),
            global: self.global.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

impl<T> Default for FallbackDispatcher<T> {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl<T> std::fmt::Debug for FallbackDispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<_> = self.registries.keys().map(DependencyKey::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("FallbackDispatcher")
            .field("keys", &keys)
            .field("global", &self.global.is_some())
            .finish()
    }
}

/// Builder for [`FallbackDispatcher`].
pub struct FallbackDispatcherBuilder<T> {
    registries: HashMap<DependencyKey, FallbackRegistry<T>>,
    global: Option<GlobalHandler<T>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<T> Default for FallbackDispatcherBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FallbackDispatcherBuilder<T> {
    pub fn new() -> Self {
        Self {
            registries: HashMap::new(),
            global: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Registers the handler table for `key`, replacing any earlier one.
    pub fn register(
        mut self,
        key: impl Into<DependencyKey>,
        registry: FallbackRegistry<T>,
    ) -> Self {
        self.registries.insert(key.into(), registry);
        self
    }

    /// Sets a value producer for the process-wide default.
    ///
    /// Without one, process-wide defaults carry no value and report
    /// [`SERVICE_UNAVAILABLE`].
    pub fn global_default<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FallbackContext<'_>) -> T + Send + Sync + 'static,
    {
        self.global = Some(Arc::new(handler));
        self
    }

    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<FallbackEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Called with the key, failure kind and path of every dispatch.
    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, callguard_core::FailureKind, FallbackPath) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::Applied { key, kind, path, .. } = event {
                f(key, *kind, *path);
            }
        }));
        self
    }

    /// Called with the key and reason when a registered handler fails.
    pub fn on_handler_failed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let FallbackEvent::HandlerFailed { key, reason, .. } = event {
                f(key, reason);
            }
        }));
        self
    }

    pub fn build(self) -> FallbackDispatcher<T> {
        FallbackDispatcher {
            registries: Arc::new(self.registries),
            global: self.global,
            event_listeners: self.event_listeners,
        }
    }
}
