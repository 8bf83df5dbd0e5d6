//! Per-label alert rate limiting.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum interval between two accepted alerts carrying the same label.
///
/// Labels are compared exactly. A zero interval accepts everything.
#[derive(Debug)]
pub struct Cooldown {
    interval: Duration,
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl Cooldown {
    /// Create a cooldown policy.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// A policy that never suppresses.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Accept an alert for `label` now, or report how long until it would be.
    pub fn try_acquire(&self, label: &str) -> Result<(), Duration> {
        self.try_acquire_at(label, Instant::now())
    }

    fn try_acquire_at(&self, label: &str, now: Instant) -> Result<(), Duration> {
        if self.interval.is_zero() {
            return Ok(());
        }

        let mut last_accepted = self.last_accepted.lock();
        if let Some(last) = last_accepted.get(label) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < self.interval {
                return Err(self.interval - elapsed);
            }
        }
        last_accepted.insert(label.to_string(), now);
        Ok(())
    }

    /// Forget the last accepted alert for `label`.
    pub fn reset(&self, label: &str) {
        self.last_accepted.lock().remove(label);
    }
}

impl Default for Cooldown {
    fn default() -> Self {
        Self::disabled()
    }
}
