//! Outcome classification for circuit breaker decisions.
//!
//! A classifier maps a terminal call failure to a [`CallOutcome`]. Successful
//! values are always [`CallOutcome::Success`]; cancellations and breaker
//! denials are never classified at all (see [`classify_result`]).

use callguard_core::{CallFailure, CallOutcome, FailureKind};
use std::sync::Arc;

/// Decides whether a failure counts against the dependency's health.
pub trait OutcomeClassifier: Send + Sync {
    /// Classifies a terminal failure of a permitted call.
    fn classify(&self, failure: &CallFailure) -> CallOutcome;
}

/// Shared, type-erased classifier.
pub type SharedClassifier = Arc<dyn OutcomeClassifier>;

/// Classifies a full call result.
///
/// Returns `None` for results that must not reach the sliding window:
/// [`FailureKind::Cancelled`] (the caller aborted) and
/// [`FailureKind::CircuitOpen`] (the dependency was never called).
pub fn classify_result<T>(
    classifier: &dyn OutcomeClassifier,
    result: &Result<T, CallFailure>,
) -> Option<CallOutcome> {
    match result {
        Ok(_) => Some(CallOutcome::Success),
        Err(failure) => match failure.kind() {
            FailureKind::Cancelled | FailureKind::CircuitOpen => None,
            _ => Some(classifier.classify(failure)),
        },
    }
}

/// Default classifier.
///
/// # Behavior
///
/// - `ServerError`, `Timeout` => failure
/// - `ClientError` => success, unless built with [`DefaultClassifier::counting_client_errors`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier {
    count_client_errors: bool,
}

impl DefaultClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A classifier that also counts 4xx responses as dependency failures.
    pub fn counting_client_errors() -> Self {
        Self {
            count_client_errors: true,
        }
    }
}

impl OutcomeClassifier for DefaultClassifier {
    fn classify(&self, failure: &CallFailure) -> CallOutcome {
        match failure.kind() {
            FailureKind::ServerError | FailureKind::Timeout => CallOutcome::Failure,
            FailureKind::ClientError if self.count_client_errors => CallOutcome::Failure,
            _ => CallOutcome::Success,
        }
    }
}

/// A classifier backed by a closure.
///
/// # Example
///
/// ```rust
/// use callguard_circuitbreaker::{FnClassifier, OutcomeClassifier};
/// use callguard_core::{CallFailure, CallOutcome};
///
/// // Only 503 counts against the dependency
/// let classifier = FnClassifier::new(|failure: &CallFailure| {
///     if failure.status() == Some(503) {
///         CallOutcome::Failure
///     } else {
///         CallOutcome::Success
///     }
/// });
///
/// assert_eq!(
///     classifier.classify(&CallFailure::from_status(503, "unavailable")),
///     CallOutcome::Failure
/// );
/// assert_eq!(
///     classifier.classify(&CallFailure::from_status(500, "internal")),
///     CallOutcome::Success
/// );
/// ```
#[derive(Clone)]
pub struct FnClassifier<F> {
    f: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(&CallFailure) -> CallOutcome + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> OutcomeClassifier for FnClassifier<F>
where
    F: Fn(&CallFailure) -> CallOutcome + Send + Sync,
{
    fn classify(&self, failure: &CallFailure) -> CallOutcome {
        (self.f)(failure)
    }
}

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier")
            .field("f", &"<closure>")
            .finish()
    }
}
