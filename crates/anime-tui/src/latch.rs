//! One-shot fetch gate owned by a view instance.
//!
//! `try_begin` succeeds at most once per activation. With a minimum interval
//! set, it also refuses when the previous attempt by this same instance was
//! too recent; the timestamp survives `rearm`, so the throttle spans
//! activations.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FetchLatch {
    has_fetched: bool,
    last_attempt: Option<Instant>,
    min_interval: Duration,
}

impl FetchLatch {
    pub fn new() -> Self {
        Self::with_min_interval(Duration::ZERO)
    }

    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self {
            has_fetched: false,
            last_attempt: None,
            min_interval,
        }
    }

    pub fn try_begin(&mut self) -> bool {
        self.try_begin_at(Instant::now())
    }

    pub fn try_begin_at(&mut self, now: Instant) -> bool {
        if self.has_fetched {
            return false;
        }
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.min_interval {
                return false;
            }
        }
        self.has_fetched = true;
        self.last_attempt = Some(now);
        true
    }

    /// Allow one more attempt (new activation). The throttle still applies.
    pub fn rearm(&mut self) {
        self.has_fetched = false;
    }

    /// The attempt in flight was dropped before it produced a result; it
    /// neither counts for this activation nor throttles the next one.
    pub fn abandon(&mut self) {
        self.has_fetched = false;
        self.last_attempt = None;
    }
}

impl Default for FetchLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_once_per_activation() {
        let mut latch = FetchLatch::new();
        assert!(latch.try_begin());
        assert!(!latch.try_begin());
        latch.rearm();
        assert!(latch.try_begin());
        assert!(!latch.try_begin());
    }

    #[test]
    fn test_throttle_spans_activations() {
        let t0 = Instant::now();
        let mut latch = FetchLatch::with_min_interval(Duration::from_millis(5000));
        assert!(latch.try_begin_at(t0));

        latch.rearm();
        assert!(!latch.try_begin_at(t0 + Duration::from_millis(4999)));
        // a refused attempt does not move the reference point
        assert!(latch.try_begin_at(t0 + Duration::from_millis(5000)));
    }

    #[test]
    fn test_abandoned_attempt_does_not_throttle() {
        let t0 = Instant::now();
        let mut latch = FetchLatch::with_min_interval(Duration::from_millis(5000));
        assert!(latch.try_begin_at(t0));
        latch.abandon();
        assert!(latch.try_begin_at(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_first_attempt_is_never_throttled() {
        let mut latch = FetchLatch::with_min_interval(Duration::from_secs(3600));
        assert!(latch.try_begin());
    }
}
