use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Time source for the sampling loop.
///
/// - now(): monotonic instant used to pace ticks
/// - unix_ms(): wall-clock milliseconds used to timestamp samples
pub trait Clock {
    fn now(&self) -> Instant;
    fn unix_ms(&self) -> i64;
}

/// Real clock: `Instant` for pacing and `SystemTime` for timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl MonotonicClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

/// Clock with a pinned wall time, for reproducible timestamps in tests and
/// replays. Monotonic time still comes from `Instant::now()` so pacing works.
#[derive(Debug, Clone)]
pub struct ManualClock {
    unix_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at_unix_ms(ms: i64) -> Self {
        Self {
            unix_ms: Arc::new(AtomicI64::new(ms)),
        }
    }

    /// Move the wall clock forward.
    pub fn advance(&self, d: Duration) {
        let step = i64::try_from(d.as_millis()).unwrap_or(i64::MAX);
        self.unix_ms.fetch_add(step, Ordering::Relaxed);
    }

    pub fn set_unix_ms(&self, ms: i64) {
        self.unix_ms.store(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn unix_ms(&self) -> i64 {
        self.unix_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_wall_time_only() {
        let clock = ManualClock::at_unix_ms(1_000);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.unix_ms(), 1_250);
        clock.set_unix_ms(5);
        assert_eq!(clock.unix_ms(), 5);
    }
}
