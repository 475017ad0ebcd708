use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

use common::{Clock, SystemClock};

/// Sliding-window call limiter: at most `max_calls` admissions within any
/// `period`.
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    calls: Mutex<VecDeque<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, period: Duration, clock: Arc<dyn Clock>) -> Self {
        assert!(max_calls > 0, "max_calls must be > 0");
        Self {
            max_calls,
            period,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
            clock,
        }
    }

    pub fn per_second(max_calls: usize, period_secs: u64) -> Self {
        Self::new(
            max_calls,
            Duration::seconds(period_secs as i64),
            Arc::new(SystemClock),
        )
    }

    /// Record a call if the window has room; returns false otherwise.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        while calls.front().is_some_and(|&t| now - t >= self.period) {
            calls.pop_front();
        }
        if calls.len() >= self.max_calls {
            return false;
        }
        calls.push_back(now);
        true
    }

    /// Calls still counted in the current window.
    pub fn in_window(&self) -> usize {
        let now = self.clock.now();
        let calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        calls.iter().filter(|&&t| now - t < self.period).count()
    }
}
