//! Core infrastructure for callguard.
//!
//! This crate provides the vocabulary shared by every callguard component:
//! - [`DependencyKey`]: the name of a logical remote dependency
//! - [`FailureKind`] and [`CallFailure`]: the typed failure taxonomy
//! - [`CallOutcome`]: the classified health signal fed to a circuit breaker
//! - Event system for observability

mod error;
pub mod events;
mod failure;
mod key;

pub use error::ConfigError;
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
pub use failure::{CallFailure, CallOutcome, FailureKind};
pub use key::DependencyKey;
