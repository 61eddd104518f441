//! Wall-clock gates for high-frequency input.
//!
//! Both types take caller-supplied millisecond timestamps, so they work with
//! any clock (event timestamps, `Instant`-derived counters, test fixtures).

/// Minimum-interval gate: fires at most once per `min_interval_ms`.
#[derive(Clone, Copy, Debug)]
pub struct RateLimiter {
    min_interval_ms: u64,
    last_fire_ms: Option<u64>,
}

impl RateLimiter {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_fire_ms: None,
        }
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn last_fire_ms(&self) -> Option<u64> {
        self.last_fire_ms
    }

    /// Returns true and records `now_ms` when strictly more than the interval
    /// has passed since the last fire. The first call always fires.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        let ready = match self.last_fire_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) > self.min_interval_ms,
        };
        if ready {
            self.last_fire_ms = Some(now_ms);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last_fire_ms = None;
    }
}

/// Trailing-edge debounce: settles once no new event arrived for `delay_ms`.
#[derive(Clone, Copy, Debug)]
pub struct Debouncer {
    delay_ms: u64,
    deadline_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            deadline_ms: None,
        }
    }

    /// Restart the quiet period.
    pub fn schedule(&mut self, now_ms: u64) {
        self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    pub fn is_pending(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// True exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => {
                self.deadline_ms = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
    }
}
