//! Per-connection fixed-window rate limiting for presence-channel events.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// Fixed-window limiter keyed by connection token. Excess events are
/// rejected non-fatally; the connection stays up.
pub struct RateLimiter {
    window: Duration,
    max_events: u32,
    counters: DashMap<Uuid, WindowCounter>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_events: u32) -> Self {
        Self {
            window,
            max_events,
            counters: DashMap::new(),
        }
    }

    /// Record one event for the connection; false means over the limit for
    /// the current window.
    pub fn allow(&self, conn: Uuid) -> bool {
        let now = Instant::now();
        let mut entry = self.counters.entry(conn).or_insert_with(|| WindowCounter {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.max_events {
            return false;
        }
        entry.count += 1;
        true
    }

    /// Drop state for a closed connection.
    pub fn forget(&self, conn: Uuid) {
        self.counters.remove(&conn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 3);
        let conn = Uuid::new_v4();
        assert!(limiter.allow(conn));
        assert!(limiter.allow(conn));
        assert!(limiter.allow(conn));
        assert!(!limiter.allow(conn));
        assert!(!limiter.allow(conn));
    }

    #[test]
    fn connections_are_limited_independently() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(limiter.allow(a));
        assert!(!limiter.allow(a));
        assert!(limiter.allow(b));
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let limiter = RateLimiter::new(Duration::from_millis(10), 1);
        let conn = Uuid::new_v4();
        assert!(limiter.allow(conn));
        assert!(!limiter.allow(conn));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow(conn));
    }

    #[test]
    fn forget_clears_state() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let conn = Uuid::new_v4();
        assert!(limiter.allow(conn));
        limiter.forget(conn);
        assert!(limiter.allow(conn));
    }
}
