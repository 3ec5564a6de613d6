use std::time::Duration;

use rand::Rng;

/// Jitter applied to a computed backoff delay.
pub type JitterFn = fn(Duration) -> Duration;

/// Retry policy for model invocations: attempt bound plus exponential backoff.
///
/// Pure data: computing a delay never sleeps, so tests can assert the schedule
/// directly and inject `no_jitter` for exact values.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first call.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: JitterFn,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter: full_jitter,
        }
    }

    pub fn with_jitter(mut self, jitter: JitterFn) -> Self {
        self.jitter = jitter;
        self
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the attempt following failed attempt `attempt` (1-based):
    /// base, 2×base, 4×base, ... capped at `max_delay`, then jittered.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let raw = self.base_delay.saturating_mul(1u32 << exponent);
        (self.jitter)(raw.min(self.max_delay))
    }
}

/// Uniform jitter in `[delay/2, delay]`.
pub fn full_jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return delay;
    }
    let half = delay / 2;
    let spread = delay.as_millis().saturating_sub(half.as_millis()) as u64;
    half + Duration::from_millis(rand::thread_rng().gen_range(0..=spread))
}

pub fn no_jitter(delay: Duration) -> Duration {
    delay
}
