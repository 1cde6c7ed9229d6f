use crate::circuit::{Circuit, CircuitState, Ticket};
use crate::config::BreakerConfig;
use parking_lot::Mutex;
use std::sync::Arc;

/// Proof that a call was admitted, stamped with the breaker generation.
///
/// Consumed by [`record_outcome`](crate::CircuitBreaker::record_outcome) or
/// [`release`](crate::CircuitBreaker::release), so every admitted call
/// reports at most once. A permit dropped without either, for example when
/// the caller abandons the call future, hands its half-open trial slot back
/// to the breaker.
#[must_use = "a permit must be recorded or released"]
pub struct CallPermit {
    ticket: Option<Ticket>,
    state: CircuitState,
    circuit: Arc<Mutex<Circuit>>,
    config: Arc<BreakerConfig>,
}

impl CallPermit {
    pub(crate) fn new(ticket: Ticket, circuit: Arc<Mutex<Circuit>>, config: Arc<BreakerConfig>) -> Self {
        Self {
            state: ticket.state(),
            ticket: Some(ticket),
            circuit,
            config,
        }
    }

    /// The state the breaker was in when the call was admitted.
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Disarms the guard and returns the admission it holds.
    pub(crate) fn into_ticket(mut self) -> Option<Ticket> {
        self.ticket.take()
    }
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            #[cfg(feature = "tracing")]
            tracing::debug!(state = ?self.state, "abandoned permit released");

            self.circuit.lock().release(ticket, &self.config);
        }
    }
}

impl std::fmt::Debug for CallPermit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallPermit")
            .field("state", &self.state)
            .field("armed", &self.ticket.is_some())
            .finish()
    }
}
