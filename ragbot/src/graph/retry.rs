//! Retry policies for node execution.
//!
//! A failing node is re-run with the same input state until the policy gives up.

use std::time::Duration;

/// How often, and with what spacing, a failed node run is retried.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryPolicy {
    /// Fail immediately.
    #[default]
    None,
    /// Constant delay between attempts.
    Fixed { retries: usize, interval: Duration },
    /// Delay grows by `multiplier` per attempt, capped at `max_interval`.
    Exponential {
        retries: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    },
}

impl RetryPolicy {
    pub fn fixed(retries: usize, interval: Duration) -> Self {
        RetryPolicy::Fixed { retries, interval }
    }

    pub fn exponential(
        retries: usize,
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        RetryPolicy::Exponential {
            retries,
            initial_interval,
            max_interval,
            multiplier,
        }
    }

    /// Number of retries after the first failure.
    pub fn retries(&self) -> usize {
        match self {
            RetryPolicy::None => 0,
            RetryPolicy::Fixed { retries, .. } | RetryPolicy::Exponential { retries, .. } => {
                *retries
            }
        }
    }

    /// True when a retry may follow failed attempt number `attempt` (0-based).
    pub fn should_retry(&self, attempt: usize) -> bool {
        attempt < self.retries()
    }

    /// Wait before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: usize) -> Duration {
        match self {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed { interval, .. } => *interval,
            RetryPolicy::Exponential {
                initial_interval,
                max_interval,
                multiplier,
                ..
            } => {
                let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = initial_interval.as_secs_f64() * multiplier.powi(exp);
                if !secs.is_finite() || secs >= max_interval.as_secs_f64() {
                    *max_interval
                } else {
                    Duration::from_secs_f64(secs)
                }
            }
        }
    }
}
