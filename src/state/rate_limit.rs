//! Fixed-window request limiting keyed by client address.

use std::{
    net::IpAddr,
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateVerdict {
    /// The request may proceed.
    Allowed {
        /// Requests left in the current window, after this one.
        remaining: u32,
    },
    /// The request must be rejected.
    Limited {
        /// Time until the current window resets.
        retry_after: Duration,
    },
}

#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    count: u32,
    window_start: Instant,
}

/// Per-address fixed-window counter.
///
/// The first request from an address opens a window; every further request
/// within the window increments the counter, and once the counter reaches the
/// limit the remainder of the window is rejected. The counter resets when a
/// request arrives after the window has elapsed. State lives in process
/// memory only, so each replica counts on its own.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    slots: DashMap<IpAddr, WindowSlot>,
    max_requests: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    /// Build a limiter allowing `max_requests` per `window` and address.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            max_requests: max_requests.max(1),
            window,
        }
    }

    /// Check whether a request from `client` may proceed right now.
    pub fn check(&self, client: IpAddr) -> RateVerdict {
        self.check_at(client, Instant::now())
    }

    /// Drop window slots that have fully elapsed.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.slots
            .retain(|_, slot| now.duration_since(slot.window_start) < self.window);
    }

    /// Number of addresses currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.slots.len()
    }

    fn check_at(&self, client: IpAddr, now: Instant) -> RateVerdict {
        let mut slot = self.slots.entry(client).or_insert(WindowSlot {
            count: 0,
            window_start: now,
        });

        if now.duration_since(slot.window_start) >= self.window {
            slot.count = 0;
            slot.window_start = now;
        }

        if slot.count >= self.max_requests {
            let elapsed = now.duration_since(slot.window_start);
            return RateVerdict::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        slot.count += 1;
        RateVerdict::Allowed {
            remaining: self.max_requests - slot.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last_octet: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last_octet])
    }

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = FixedWindowLimiter::new(30, Duration::from_secs(60));
        let now = Instant::now();

        for expected_remaining in (0..30).rev() {
            match limiter.check_at(addr(1), now) {
                RateVerdict::Allowed { remaining } => assert_eq!(remaining, expected_remaining),
                other => panic!("expected allowed, got {other:?}"),
            }
        }

        match limiter.check_at(addr(1), now) {
            RateVerdict::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(60));
            }
            other => panic!("expected limited, got {other:?}"),
        }
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = FixedWindowLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at(addr(1), start);
        limiter.check_at(addr(1), start);
        assert!(matches!(
            limiter.check_at(addr(1), start + Duration::from_secs(59)),
            RateVerdict::Limited { .. }
        ));

        assert!(matches!(
            limiter.check_at(addr(1), start + Duration::from_secs(60)),
            RateVerdict::Allowed { remaining: 1 }
        ));
    }

    #[test]
    fn retry_after_counts_down_within_the_window() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        limiter.check_at(addr(1), start);
        match limiter.check_at(addr(1), start + Duration::from_secs(45)) {
            RateVerdict::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(15));
            }
            other => panic!("expected limited, got {other:?}"),
        }
    }

    #[test]
    fn addresses_are_counted_independently() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        limiter.check_at(addr(1), now);
        assert!(matches!(
            limiter.check_at(addr(1), now),
            RateVerdict::Limited { .. }
        ));
        assert!(matches!(
            limiter.check_at(addr(2), now),
            RateVerdict::Allowed { .. }
        ));
    }

    #[test]
    fn sweep_drops_elapsed_windows() {
        let limiter = FixedWindowLimiter::new(5, Duration::from_millis(0));
        limiter.check(addr(1));
        limiter.check(addr(2));
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.sweep();
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
