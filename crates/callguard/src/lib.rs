//! Resilient invocation of remote dependencies.
//!
//! `callguard` decides, for every outbound call to a remote dependency,
//! whether to attempt it, how to retry it, how to track the dependency's
//! aggregate health and what to return when it is unavailable.
//!
//! One logical call through the [`ResilientInvoker`]:
//!
//! 1. ask the key's circuit breaker for a permit; a denial goes straight to
//!    the fallback dispatcher as [`FailureKind::CircuitOpen`]
//! 2. run the unit of work through the retry executor, each attempt under
//!    the key's call timeout
//! 3. classify the terminal result and record it once with the breaker
//! 4. return the real value, or a [`DegradedResponse`] tagged with the
//!    failure kind
//!
//! The caller always receives a well-formed [`Response`]; raw failures never
//! escape.
//!
//! # Example
//!
//! ```rust
//! use callguard::{
//!     BreakerConfig, CallFailure, DependencyConfig, FallbackDispatcher, FallbackRegistry,
//!     Registry, ResilientInvoker, Response, RetryConfig,
//! };
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), callguard::ConfigError> {
//! let registry = Registry::builder()
//!     .register(
//!         "callee-client-v1",
//!         DependencyConfig::builder()
//!             .breaker(
//!                 BreakerConfig::builder()
//!                     .window_size(5)
//!                     .failure_rate_threshold(50)
//!                     .wait_duration_in_open(Duration::from_secs(2))
//!                     .build()?,
//!             )
//!             .retry(
//!                 RetryConfig::builder()
//!                     .max_attempts(3)
//!                     .fixed_backoff(Duration::from_millis(500))
//!                     .build()?,
//!             )
//!             .call_timeout(Duration::from_secs(3))
//!             .build(),
//!     )
//!     .build();
//!
//! let fallbacks = FallbackDispatcher::builder()
//!     .register(
//!         "callee-client-v1",
//!         FallbackRegistry::builder()
//!             .on_timeout(|_| "Fallback: Request timeout".to_string())
//!             .default_handler(|_| "Fallback: Service unavailable".to_string())
//!             .build()?,
//!     )
//!     .build();
//!
//! let invoker = ResilientInvoker::new(registry, fallbacks);
//!
//! match invoker
//!     .call("callee-client-v1", || async { Ok::<_, CallFailure>("Hello".to_string()) })
//!     .await
//! {
//!     Response::Success(body) => println!("{body}"),
//!     Response::Degraded(degraded) => println!("{degraded}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Flags
//! - `tracing` (default): structured logs from every component
//! - `metrics`: counters and gauges from every component
//! - `serde`: [`InvokerSettings`] for loading configuration from TOML/JSON

mod config;
mod invoker;
mod layer;
mod registry;
mod response;
#[cfg(feature = "serde")]
mod settings;
mod timeout;

pub use config::{DependencyConfig, DependencyConfigBuilder};
pub use invoker::ResilientInvoker;
pub use layer::{ResilientLayer, ResilientService};
pub use registry::{DependencyEntry, Registry, RegistryBuilder};
pub use response::Response;
#[cfg(feature = "serde")]
pub use settings::{DependencySettings, InvokerSettings};
pub use timeout::with_timeout;

pub use callguard_circuitbreaker::{
    BreakerConfig, BreakerConfigBuilder, CallPermit, CircuitBreaker, CircuitBreakerEvent,
    CircuitMetrics, CircuitState, DefaultClassifier, FnClassifier, OutcomeClassifier,
};
pub use callguard_core::{
    CallFailure, CallOutcome, ConfigError, DependencyKey, EventListener, FailureKind, FnListener,
    ResilienceEvent,
};
pub use callguard_fallback::{
    DegradedResponse, FallbackContext, FallbackDispatcher, FallbackEvent, FallbackHandlerError,
    FallbackPath, FallbackRegistry, SERVICE_UNAVAILABLE,
};
pub use callguard_retry::{
    CancellationToken, ExponentialBackoff, ExponentialRandomBackoff, FixedInterval, FnInterval,
    IntervalFunction, RetryConfig, RetryEvent, RetryExecutor,
};
