//! Client-side request pacing.

use std::num::NonZeroU32;
use std::thread;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Blocking GCRA limiter: the first call passes immediately, later calls are
/// spaced one period apart. A rate of zero disables pacing.
pub struct Throttle {
    limiter: Option<DirectRateLimiter>,
    clock: DefaultClock,
}

impl Throttle {
    pub fn new(calls_per_second: f64) -> Self {
        let limiter = quota_for_rate(calls_per_second).map(RateLimiter::direct);
        Self {
            limiter,
            clock: DefaultClock::default(),
        }
    }

    /// No pacing at all.
    pub fn disabled() -> Self {
        Self::new(0.0)
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Block until the next call is allowed.
    pub fn wait(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        while let Err(not_until) = limiter.check() {
            thread::sleep(not_until.wait_time_from(self.clock.now()));
        }
    }
}

const MIN_PERIOD_SECS: f64 = 0.001;
/// Rates slower than one call a day are paced at one call a day.
const MAX_PERIOD_SECS: f64 = 86_400.0;

fn quota_for_rate(calls_per_second: f64) -> Option<Quota> {
    if !calls_per_second.is_finite() || calls_per_second <= 0.0 {
        return None;
    }
    let secs = (1.0 / calls_per_second).clamp(MIN_PERIOD_SECS, MAX_PERIOD_SECS);
    let period = Duration::from_secs_f64(secs);
    Quota::with_period(period).map(|q| q.allow_burst(NonZeroU32::MIN))
}
