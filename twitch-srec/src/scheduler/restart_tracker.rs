//! Restart backoff for crashed target tasks.
//!
//! - Up to `threshold - 1` crashes inside the window restart immediately
//! - From then on the delay is `base * 2^(crashes - threshold)`, capped
//! - Crashes older than the window are forgotten

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

const MAX_EXPONENT: u32 = 10;

#[derive(Debug, Clone)]
pub struct RestartPolicy {
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub window: Duration,
    pub threshold: usize,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(300),
            window: Duration::from_secs(60),
            threshold: 3,
        }
    }
}

#[derive(Debug, Default)]
struct CrashLog {
    recent: Vec<Instant>,
    total: u64,
}

/// Crash history per target name.
#[derive(Debug, Default)]
pub struct RestartTracker {
    logs: HashMap<String, CrashLog>,
    policy: RestartPolicy,
}

impl RestartTracker {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            logs: HashMap::new(),
            policy,
        }
    }

    /// Record a crash of `target` and return how long to wait before restarting it.
    pub fn record_crash(&mut self, target: &str) -> Duration {
        let now = Instant::now();
        let window = self.policy.window;
        let log = self.logs.entry(target.to_string()).or_default();
        log.recent.retain(|&t| now.duration_since(t) < window);
        log.recent.push(now);
        log.total += 1;

        let crashes = log.recent.len();
        let delay = self.backoff_for(crashes);
        if delay.is_zero() {
            debug!(target_name = target, crashes, "restarting immediately");
        } else {
            info!(
                "Target {} crashed {} times in {:?}, restarting in {:?}",
                target, crashes, window, delay
            );
        }
        delay
    }

    pub fn total_restarts(&self, target: &str) -> u64 {
        self.logs.get(target).map_or(0, |l| l.total)
    }

    fn backoff_for(&self, crashes: usize) -> Duration {
        if crashes < self.policy.threshold {
            return Duration::ZERO;
        }
        let exponent = ((crashes - self.policy.threshold) as u32).min(MAX_EXPONENT);
        self.policy
            .base_backoff
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.policy.max_backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let mut tracker = RestartTracker::default();
        let delays: Vec<_> = (0..6).map(|_| tracker.record_crash("alice")).collect();
        assert_eq!(
            delays,
            [0, 0, 1, 2, 4, 8].map(Duration::from_secs).to_vec()
        );
        assert_eq!(tracker.total_restarts("alice"), 6);
        assert_eq!(tracker.total_restarts("bob"), 0);
    }

    #[test]
    fn test_backoff_is_capped() {
        let mut tracker = RestartTracker::new(RestartPolicy {
            max_backoff: Duration::from_secs(10),
            ..Default::default()
        });
        let last = (0..20).map(|_| tracker.record_crash("alice")).last();
        assert_eq!(last, Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_old_crashes_are_forgotten() {
        let mut tracker = RestartTracker::default();
        for _ in 0..4 {
            tracker.record_crash("alice");
        }
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(tracker.record_crash("alice"), Duration::ZERO);
        assert_eq!(tracker.total_restarts("alice"), 5);
    }
}
