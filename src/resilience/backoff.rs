//! Exponential reconnect backoff with jitter.

use std::time::{Duration, Instant};

use rand::Rng;

/// Delay before reconnect attempt number `attempt` (1-based).
///
/// Doubles from `base` up to `max`, plus up to 10% jitter. Attempt 0 is immediate.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let delay_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt - 1));
    let capped_delay = delay_ms.min(max_ms);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay.saturating_add(jitter))
}

/// Tracks consecutive connect failures for one endpoint and gates the next
/// attempt until its backoff delay has passed.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    failures: u32,
    retry_at: Option<Instant>,
}

impl ReconnectBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
            retry_at: None,
        }
    }

    /// Time left before another attempt is allowed, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.retry_at
            .and_then(|at| at.checked_duration_since(now))
            .filter(|d| !d.is_zero())
    }

    pub fn record_failure(&mut self, now: Instant) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = calculate_backoff(self.failures, self.base, self.max);
        // Only unrepresentable deadlines leave the gate open.
        self.retry_at = now.checked_add(delay);
        delay
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
        self.retry_at = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let base = Duration::from_millis(100);
        let max = Duration::from_millis(2000);

        assert_eq!(calculate_backoff(0, base, max), Duration::ZERO);
        assert!(calculate_backoff(1, base, max) >= Duration::from_millis(100));
        assert!(calculate_backoff(2, base, max) >= Duration::from_millis(200));

        let capped = calculate_backoff(10, base, Duration::from_millis(1000));
        assert!(capped >= Duration::from_millis(1000));
        assert!(capped < Duration::from_millis(1100));
    }

    #[test]
    fn test_huge_cap_saturates() {
        let max = Duration::from_millis(u64::MAX);
        let delay = calculate_backoff(64, Duration::from_millis(u64::MAX / 2), max);
        assert!(delay >= Duration::from_millis(u64::MAX / 2));
        assert!(delay <= max);
    }

    #[test]
    fn test_gate_opens_after_delay() {
        let mut backoff = ReconnectBackoff::new(Duration::from_millis(500), Duration::from_secs(10));
        let now = Instant::now();
        assert_eq!(backoff.remaining(now), None);

        let delay = backoff.record_failure(now);
        assert!(delay >= Duration::from_millis(500));
        assert!(backoff.remaining(now).is_some());
        assert_eq!(backoff.remaining(now + delay), None);
    }

    #[test]
    fn test_success_resets() {
        let mut backoff = ReconnectBackoff::new(Duration::from_millis(500), Duration::from_secs(10));
        let now = Instant::now();
        backoff.record_failure(now);
        backoff.record_failure(now);
        assert_eq!(backoff.failures(), 2);

        backoff.record_success();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.remaining(now), None);
    }
}
