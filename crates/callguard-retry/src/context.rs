use callguard_core::{CallFailure, DependencyKey};
use tokio::time::Instant;

/// Per-call state threaded through the attempts of one logical call.
///
/// Owned by the call; never shared between calls.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    key: DependencyKey,
    pub(crate) attempt: usize,
    start_time: Instant,
    pub(crate) last_failure: Option<CallFailure>,
}

impl InvocationContext {
    pub fn new(key: impl Into<DependencyKey>) -> Self {
        Self {
            key: key.into(),
            attempt: 0,
            start_time: Instant::now(),
            last_failure: None,
        }
    }

    pub fn key(&self) -> &DependencyKey {
        &self.key
    }

    /// Number of attempts started so far (1-indexed once the first begins).
    pub fn attempt(&self) -> usize {
        self.attempt
    }

    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// The failure of the most recent failed attempt.
    pub fn last_failure(&self) -> Option<&CallFailure> {
        self.last_failure.as_ref()
    }
}
