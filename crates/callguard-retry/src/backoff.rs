use std::time::Duration;

/// Computes the wait before the next attempt.
pub trait IntervalFunction: Send + Sync {
    /// Returns the delay before retry number `retry + 1`.
    ///
    /// `retry` is 0-indexed: the wait after the first failed attempt is
    /// `next_interval(0)`.
    fn next_interval(&self, retry: usize) -> Duration;
}

/// The same wait before every retry.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _retry: usize) -> Duration {
        self.duration
    }
}

/// Exponential backoff: `initial * multiplier^retry`, optionally capped.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    /// Creates an exponential backoff with a multiplier of 2.0.
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }

    fn base(&self, retry: usize) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let interval = if factor.is_finite() {
            Duration::try_from_secs_f64(self.initial_interval.as_secs_f64() * factor)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::MAX
        };
        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        self.base(retry)
    }
}

/// Exponential backoff with jitter.
///
/// A randomization factor of 0.5 spreads each interval uniformly over
/// 50%..=150% of the exponential value.
#[derive(Debug, Clone)]
pub struct ExponentialRandomBackoff {
    exponential: ExponentialBackoff,
    randomization_factor: f64,
}

impl ExponentialRandomBackoff {
    pub fn new(initial_interval: Duration, randomization_factor: f64) -> Self {
        Self {
            exponential: ExponentialBackoff::new(initial_interval),
            randomization_factor: randomization_factor.clamp(0.0, 1.0),
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.exponential = self.exponential.multiplier(multiplier);
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.exponential = self.exponential.max_interval(max_interval);
        self
    }

    fn randomize(&self, duration: Duration) -> Duration {
        use rand::Rng;

        let secs = duration.as_secs_f64();
        let delta = secs * self.randomization_factor;
        if delta <= 0.0 || !delta.is_finite() {
            return duration;
        }
        let randomized = rand::rng().random_range((secs - delta)..=(secs + delta));
        Duration::try_from_secs_f64(randomized.max(0.0)).unwrap_or(duration)
    }
}

impl IntervalFunction for ExponentialRandomBackoff {
    fn next_interval(&self, retry: usize) -> Duration {
        self.randomize(self.exponential.base(retry))
    }
}

/// Closure-backed interval.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, retry: usize) -> Duration {
        (self.f)(retry)
    }
}
