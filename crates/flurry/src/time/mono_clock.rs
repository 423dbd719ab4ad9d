use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::time::Clock;

/// A monotonic [`Clock`] anchored to the wall clock once, at construction.
///
/// The wall-clock reading taken by [`MonotonicClock::new`] fixes where the
/// clock starts; every later reading adds the [`Instant`] time elapsed since
/// then. Adjustments to the system clock after construction (NTP steps,
/// manual changes) are never observed, so readings never go backward.
///
/// The trade-off is drift: a long-lived process keeps its original anchor
/// even if the host clock is corrected later.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use flurry::{Clock, FLURRY_EPOCH, MonotonicClock};
///
/// let clock = MonotonicClock::new();
/// let a = clock.since(FLURRY_EPOCH);
/// clock.sleep(Duration::from_millis(2));
/// let b = clock.since(FLURRY_EPOCH);
///
/// assert!(b >= a + Duration::from_millis(2));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
    anchor: Duration, // wall-clock time at `start`, since UNIX_EPOCH
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock at the current system time.
    ///
    /// A host clock that reads earlier than 1970 anchors at zero.
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self::with_anchor(start, anchor)
    }

    /// Builds a clock whose `start` instant corresponds to `anchor` (a
    /// duration since 1970-01-01 UTC).
    pub const fn with_anchor(start: Instant, anchor: Duration) -> Self {
        Self { start, anchor }
    }

    /// The wall-clock time this clock was anchored to.
    pub const fn anchor(&self) -> Duration {
        self.anchor
    }
}

impl Clock for MonotonicClock {
    fn since(&self, epoch: Duration) -> Duration {
        (self.anchor + self.start.elapsed()).saturating_sub(epoch)
    }

    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CUSTOM_EPOCH, FLURRY_EPOCH};

    #[test]
    fn never_goes_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.since(FLURRY_EPOCH);
        for _ in 0..10_000 {
            let now = clock.since(FLURRY_EPOCH);
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn readings_are_relative_to_anchor() {
        let anchor = FLURRY_EPOCH + Duration::from_secs(10);
        let clock = MonotonicClock::with_anchor(Instant::now(), anchor);

        let elapsed = clock.since(FLURRY_EPOCH);
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(11));
        assert_eq!(clock.anchor(), anchor);
    }

    #[test]
    fn epoch_after_anchor_saturates_at_zero() {
        let clock = MonotonicClock::with_anchor(Instant::now(), FLURRY_EPOCH);
        assert_eq!(clock.since(CUSTOM_EPOCH), Duration::ZERO);
    }
}
