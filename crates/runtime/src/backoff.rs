//! Exponential backoff for entity recovery.

use std::time::Duration;

/// Retry timing for the activation/recovery procedure.
///
/// Delays double per attempt from `initial_delay` up to `max_delay`, with
/// a small random jitter so that many instances recovering from the same
/// outage do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries.
    pub max_delay: Duration,
    /// Relative jitter applied to each delay (0.1 = ±10%).
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay to sleep before retry number `attempt`
    /// (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let raw = self.initial_delay.as_secs_f64() * f64::from(1u32 << exponent);
        let capped = raw.min(self.max_delay.as_secs_f64());
        let spread = 1.0 + self.jitter * (rand::random::<f64>() * 2.0 - 1.0);
        Duration::from_secs_f64((capped * spread).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_exponentially_up_to_the_cap() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };

        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
        assert_eq!(policy.delay(10), Duration::from_secs(5));
        assert_eq!(policy.delay(31), Duration::from_secs(5));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();

        for attempt in 1..=8 {
            let base = RetryPolicy {
                jitter: 0.0,
                ..RetryPolicy::default()
            }
            .delay(attempt)
            .as_secs_f64();

            let jittered = policy.delay(attempt).as_secs_f64();
            assert!(jittered >= base * 0.9 - f64::EPSILON);
            assert!(jittered <= base * 1.1 + f64::EPSILON);
        }
    }
}
