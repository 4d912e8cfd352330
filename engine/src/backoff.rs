//! Polling cadence for analysis status checks.
//!
//! The first fetch fires immediately; afterwards the interval grows by a
//! constant multiplier until it saturates at the cap. A bounded attempt
//! budget turns a stuck backend job into a soft timeout instead of an
//! endless poll.

use std::time::Duration;

/// Scheduler cadence. The defaults poll for roughly ten minutes: intervals
/// of 2s growing 1.5x to a 10s ceiling, 60 attempts in total.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval seeded at scheduler start.
    pub initial_interval: Duration,
    /// Ceiling the interval saturates at.
    pub max_interval: Duration,
    /// Growth factor applied after each successful fetch.
    pub backoff_multiplier: f64,
    /// Fetch budget before the poll gives up.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(2000),
            max_interval: Duration::from_millis(10_000),
            backoff_multiplier: 1.5,
            max_attempts: 60,
        }
    }
}

impl PollConfig {
    /// Next interval after a successful fetch: grown by the multiplier,
    /// never beyond the cap.
    #[must_use]
    pub fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_multiplier).min(self.max_interval)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PollConfig;

    #[test]
    fn default_cadence_seeds_at_two_seconds() {
        let config = PollConfig::default();
        assert_eq!(config.initial_interval, Duration::from_millis(2000));
        assert_eq!(config.max_interval, Duration::from_millis(10_000));
        assert_eq!(config.max_attempts, 60);
    }

    #[test]
    fn interval_grows_then_saturates() {
        let config = PollConfig::default();
        let mut interval = config.initial_interval;
        let mut observed = Vec::new();
        for _ in 0..6 {
            interval = config.next_interval(interval);
            observed.push(interval.as_millis());
        }
        assert_eq!(observed, vec![3000, 4500, 6750, 10_000, 10_000, 10_000]);
    }

    #[test]
    fn growth_matches_closed_form() {
        let config = PollConfig::default();
        let mut interval = config.initial_interval;
        for step in 1..=10_i32 {
            interval = config.next_interval(interval);
            let expected = (2000.0 * 1.5_f64.powi(step)).min(10_000.0);
            let got = interval.as_secs_f64() * 1000.0;
            assert!(
                (got - expected).abs() < 1.0,
                "step {step}: got {got}ms, expected {expected}ms"
            );
        }
    }

    #[test]
    fn interval_never_shrinks() {
        let config = PollConfig::default();
        let mut interval = config.initial_interval;
        for _ in 0..20 {
            let next = config.next_interval(interval);
            assert!(next >= interval);
            interval = next;
        }
    }
}
