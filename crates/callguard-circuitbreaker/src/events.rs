use crate::circuit::CircuitState;
use callguard_core::{CallOutcome, ResilienceEvent};
use std::time::Instant;

/// Events emitted by a circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The breaker moved from one state to another.
    StateTransition {
        key: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    /// A call was permitted.
    CallPermitted {
        key: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A call was denied; it will be served by the fallback as `CircuitOpen`.
    CallRejected {
        key: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A classified outcome was applied to the breaker.
    OutcomeRecorded {
        key: String,
        timestamp: Instant,
        state: CircuitState,
        outcome: CallOutcome,
    },
    /// An outcome arrived for a permit issued before the last transition and
    /// was dropped.
    OutcomeDiscarded {
        key: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A permitted call ended without an outcome (e.g. cancelled) and gave its
    /// half-open trial slot back.
    PermitReleased {
        key: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::OutcomeRecorded { .. } => "outcome_recorded",
            CircuitBreakerEvent::OutcomeDiscarded { .. } => "outcome_discarded",
            CircuitBreakerEvent::PermitReleased { .. } => "permit_released",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. }
            | CircuitBreakerEvent::CallPermitted { timestamp, .. }
            | CircuitBreakerEvent::CallRejected { timestamp, .. }
            | CircuitBreakerEvent::OutcomeRecorded { timestamp, .. }
            | CircuitBreakerEvent::OutcomeDiscarded { timestamp, .. }
            | CircuitBreakerEvent::PermitReleased { timestamp, .. } => *timestamp,
        }
    }

    fn source(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { key, .. }
            | CircuitBreakerEvent::CallPermitted { key, .. }
            | CircuitBreakerEvent::CallRejected { key, .. }
            | CircuitBreakerEvent::OutcomeRecorded { key, .. }
            | CircuitBreakerEvent::OutcomeDiscarded { key, .. }
            | CircuitBreakerEvent::PermitReleased { key, .. } => key,
        }
    }
}
