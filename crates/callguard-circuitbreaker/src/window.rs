use callguard_core::CallOutcome;
use std::collections::VecDeque;

/// Fixed-capacity record of the last N classified outcomes.
///
/// Push-and-evict is O(1) and the failure count is kept as a running total, so
/// the failure-rate check never walks the buffer. Rates are compared with
/// integer arithmetic: `failures * 100 >= threshold * max(1, len)`.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    capacity: usize,
    outcomes: VecDeque<CallOutcome>,
    failures: usize,
}

impl SlidingWindow {
    /// Creates an empty window. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            outcomes: VecDeque::with_capacity(capacity),
            failures: 0,
        }
    }

    /// Records an outcome, evicting and returning the oldest one when full.
    pub fn push(&mut self, outcome: CallOutcome) -> Option<CallOutcome> {
        let evicted = if self.outcomes.len() == self.capacity {
            self.outcomes.pop_front()
        } else {
            None
        };
        if evicted == Some(CallOutcome::Failure) {
            self.failures -= 1;
        }
        if outcome.is_failure() {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);
        evicted
    }

    /// Number of outcomes currently held.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no outcome has been recorded since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Whether the next push evicts the oldest outcome.
    pub fn is_full(&self) -> bool {
        self.outcomes.len() == self.capacity
    }

    /// Maximum number of outcomes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Failures among the held outcomes.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Successes among the held outcomes.
    pub fn successes(&self) -> usize {
        self.outcomes.len() - self.failures
    }

    /// Whether the failure rate is at or above `threshold_percent`.
    pub fn failure_rate_reached(&self, threshold_percent: u8) -> bool {
        let total = self.outcomes.len().max(1) as u64;
        (self.failures as u64) * 100 >= u64::from(threshold_percent) * total
    }

    /// Failure rate in percent, for display only.
    pub fn failure_rate_percent(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.failures as f64 * 100.0 / self.outcomes.len() as f64
    }

    /// Drops every held outcome.
    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}
