//! Monotonic tick clock.
//!
//! All dispatcher timing is expressed in ticks relative to the major-frame
//! epoch (`E0`, see `timeline_core::Dispatcher`). [`Clock::sleep_until`] takes
//! an **absolute** tick, never a relative delay, so repeated calls from the
//! dispatcher's frame loop never accumulate rounding drift.

use core::time::Duration;
use std::thread;
use std::time::Instant;

use timeline_abi::Tick;

/// Compares two tick values allowing for 64-bit wraparound: `now` is
/// considered to have reached `deadline` once the signed difference
/// `now - deadline` is non-negative.
#[inline]
pub fn tick_reached(now: Tick, deadline: Tick) -> bool {
    now.wrapping_sub(deadline) < (1u64 << 63)
}

/// The clock abstraction the dispatcher is built against (§4.1).
///
/// An implementation need not be backed by real wall-clock time — a test can
/// substitute a manually driven clock to make scenario timing deterministic.
pub trait Clock: Send + Sync {
    /// Monotonic, never wraps within any practical horizon.
    fn now(&self) -> Tick;

    /// Suspend the caller until `now() >= deadline`. Returns immediately if
    /// `deadline <= now()`.
    fn sleep_until(&self, deadline: Tick);

    /// Relinquish the CPU for one tick quantum.
    fn yield_once(&self);
}

/// Real-time [`Clock`] backed by [`std::time::Instant`].
///
/// `tick_duration` defines how long one tick lasts in wall-clock time; `now()`
/// is the number of whole tick durations elapsed since the clock was created.
/// `sleep_until` computes the remaining wall-clock duration to the target
/// tick and hands it to [`std::thread::sleep`], re-checking `now()` after
/// each wake in case of an early return.
pub struct SystemClock {
    epoch: Instant,
    tick_duration: Duration,
}

impl SystemClock {
    pub fn new(tick_duration: Duration) -> Self {
        assert!(tick_duration > Duration::ZERO, "tick_duration must be positive");
        Self {
            epoch: Instant::now(),
            tick_duration,
        }
    }

    /// Convenience constructor for a clock whose tick is one millisecond,
    /// matching `pdMS_TO_TICKS(1)` in the FreeRTOS configuration this
    /// scheduler's timeline semantics were distilled from.
    pub fn with_millisecond_ticks() -> Self {
        Self::new(Duration::from_millis(1))
    }

    fn tick_of(&self, instant: Instant) -> Tick {
        let elapsed = instant.saturating_duration_since(self.epoch);
        (elapsed.as_nanos() / self.tick_duration.as_nanos()) as Tick
    }

    fn instant_of(&self, tick: Tick) -> Instant {
        self.epoch + self.tick_duration.saturating_mul(tick as u32)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Tick {
        self.tick_of(Instant::now())
    }

    fn sleep_until(&self, deadline: Tick) {
        loop {
            let now = Instant::now();
            if tick_reached(self.tick_of(now), deadline) {
                return;
            }
            let target = self.instant_of(deadline);
            let remaining = target.saturating_duration_since(now);
            if remaining.is_zero() {
                return;
            }
            thread::sleep(remaining);
        }
    }

    fn yield_once(&self) {
        let now = self.now();
        self.sleep_until(now + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_reached_handles_wraparound() {
        assert!(tick_reached(10, 10));
        assert!(tick_reached(11, 10));
        assert!(!tick_reached(9, 10));
        assert!(tick_reached(0, u64::MAX));
    }

    #[test]
    fn system_clock_now_is_monotonic() {
        let clock = SystemClock::new(Duration::from_micros(100));
        let a = clock.now();
        clock.sleep_until(a + 5);
        let b = clock.now();
        assert!(b >= a + 5);
    }

    #[test]
    fn sleep_until_past_deadline_returns_immediately() {
        let clock = SystemClock::new(Duration::from_millis(1));
        let before = std::time::Instant::now();
        clock.sleep_until(0);
        assert!(before.elapsed() < Duration::from_millis(50));
    }
}
