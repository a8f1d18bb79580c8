//! Sliding-window rate limiting.
//!
//! Each external dependency gets one limiter enforcing a per-minute and a
//! per-hour call budget. Timestamps are pruned against both horizons before
//! every admission check, and recorded only after a successful call.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Per-dependency sliding-window admission control.
#[derive(Debug)]
pub struct RateLimiter {
    calls_per_minute: usize,
    calls_per_hour: usize,
    minute_window: VecDeque<Instant>,
    hour_window: VecDeque<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with the given window budgets.
    pub fn new(calls_per_minute: usize, calls_per_hour: usize) -> Self {
        Self {
            calls_per_minute,
            calls_per_hour,
            minute_window: VecDeque::new(),
            hour_window: VecDeque::new(),
        }
    }

    /// Checks whether a call may proceed right now.
    ///
    /// Prunes stale timestamps, then fails fast with the wait time until the
    /// oldest in-window timestamp expires if either budget is exhausted.
    /// Does not record anything; call [`RateLimiter::record`] after the
    /// wrapped call succeeds.
    pub fn check(&mut self) -> Result<(), Duration> {
        let now = Instant::now();
        self.prune(now);

        if self.minute_window.len() >= self.calls_per_minute {
            let oldest = self.minute_window[0];
            return Err(MINUTE.saturating_sub(now - oldest));
        }

        if self.hour_window.len() >= self.calls_per_hour {
            let oldest = self.hour_window[0];
            return Err(HOUR.saturating_sub(now - oldest));
        }

        Ok(())
    }

    /// Records a successful call in both windows.
    pub fn record(&mut self) {
        let now = Instant::now();
        self.minute_window.push_back(now);
        self.hour_window.push_back(now);
    }

    /// Drops timestamps older than each window's horizon.
    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.minute_window.front() {
            if now - oldest >= MINUTE {
                self.minute_window.pop_front();
            } else {
                break;
            }
        }
        while let Some(&oldest) = self.hour_window.front() {
            if now - oldest >= HOUR {
                self.hour_window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Current number of calls inside the minute window (after pruning).
    pub fn minute_count(&mut self) -> usize {
        self.prune(Instant::now());
        self.minute_window.len()
    }

    /// Current number of calls inside the hour window (after pruning).
    pub fn hour_count(&mut self) -> usize {
        self.prune(Instant::now());
        self.hour_window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    fn admit_and_record(limiter: &mut RateLimiter) -> Result<(), Duration> {
        limiter.check()?;
        limiter.record();
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_window_limit() {
        let mut limiter = RateLimiter::new(3, 100);

        // Three consecutive calls are admitted.
        for _ in 0..3 {
            assert!(admit_and_record(&mut limiter).is_ok());
        }

        // The fourth within 60s is rejected with a wait close to a minute.
        let wait = limiter.check().unwrap_err();
        assert!(wait <= MINUTE);
        assert!(wait >= Duration::from_secs(59));

        // Once the window is pruned the limiter admits again.
        advance(Duration::from_secs(61)).await;
        assert!(admit_and_record(&mut limiter).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_per_minute_wait_time() {
        let mut limiter = RateLimiter::new(1, 10);

        assert!(admit_and_record(&mut limiter).is_ok());

        let wait = limiter.check().unwrap_err();
        assert!(wait >= Duration::from_secs(59) && wait <= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hour_window_limit() {
        let mut limiter = RateLimiter::new(100, 2);

        assert!(admit_and_record(&mut limiter).is_ok());
        assert!(admit_and_record(&mut limiter).is_ok());

        // Minute budget is free but the hour budget is spent.
        advance(Duration::from_secs(120)).await;
        let wait = limiter.check().unwrap_err();
        assert!(wait > MINUTE);

        advance(HOUR).await;
        assert!(admit_and_record(&mut limiter).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_only_drops_stale_entries() {
        let mut limiter = RateLimiter::new(10, 10);

        admit_and_record(&mut limiter).unwrap();
        advance(Duration::from_secs(30)).await;
        admit_and_record(&mut limiter).unwrap();

        assert_eq!(limiter.minute_count(), 2);

        // First entry ages out, second is still inside the minute window.
        advance(Duration::from_secs(31)).await;
        assert_eq!(limiter.minute_count(), 1);
        assert_eq!(limiter.hour_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_does_not_consume_budget() {
        let mut limiter = RateLimiter::new(1, 10);

        admit_and_record(&mut limiter).unwrap();
        assert!(limiter.check().is_err());
        assert!(limiter.check().is_err());

        // Rejected checks recorded nothing.
        assert_eq!(limiter.minute_count(), 1);
    }
}
