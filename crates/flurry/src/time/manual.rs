use core::time::Duration;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::time::Clock;

#[derive(Debug, Default)]
struct ManualClockInner {
    millis: AtomicU64,
    sleeps: AtomicU64,
}

/// A deterministic [`Clock`] driven by hand.
///
/// The clock holds a shared millisecond counter that *is* the elapsed time
/// since the epoch: [`Clock::since`] ignores its argument and returns the
/// counter. Clones share the counter, so a test can keep one clone and move
/// another into an [`Engine`].
///
/// [`Clock::sleep`] does not block. It advances the counter by the requested
/// duration (rounded down to whole milliseconds, at least one) and records the
/// call, which makes sequence exhaustion observable without waiting.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use flurry::{Clock, ManualClock};
///
/// let clock = ManualClock::new(42);
/// assert_eq!(clock.since(Duration::ZERO), Duration::from_millis(42));
///
/// clock.sleep(Duration::from_millis(1));
/// assert_eq!(clock.millis(), 43);
/// assert_eq!(clock.sleeps(), 1);
/// ```
///
/// [`Engine`]: crate::Engine
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

impl ManualClock {
    /// Creates a clock reading `millis` milliseconds since the epoch.
    pub fn new(millis: u64) -> Self {
        let clock = Self::default();
        clock.set(millis);
        clock
    }

    /// Current reading in milliseconds.
    pub fn millis(&self) -> u64 {
        self.inner.millis.load(Ordering::Acquire)
    }

    /// Moves the clock to `millis`, forwards or backwards.
    pub fn set(&self, millis: u64) {
        self.inner.millis.store(millis, Ordering::Release);
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.inner.millis.fetch_add(millis, Ordering::AcqRel);
    }

    /// Number of times [`Clock::sleep`] has been called.
    pub fn sleeps(&self) -> u64 {
        self.inner.sleeps.load(Ordering::Acquire)
    }
}

impl Clock for ManualClock {
    fn since(&self, _epoch: Duration) -> Duration {
        Duration::from_millis(self.millis())
    }

    fn sleep(&self, dur: Duration) {
        let millis = u64::try_from(dur.as_millis()).unwrap_or(u64::MAX).max(1);
        self.inner.sleeps.fetch_add(1, Ordering::AcqRel);
        self.advance(millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_counter() {
        let a = ManualClock::new(5);
        let b = a.clone();
        b.advance(3);
        assert_eq!(a.millis(), 8);

        a.set(2);
        assert_eq!(b.since(Duration::from_secs(99)), Duration::from_millis(2));
    }

    #[test]
    fn sub_millisecond_sleep_still_advances() {
        let clock = ManualClock::new(0);
        clock.sleep(Duration::from_micros(10));
        assert_eq!(clock.millis(), 1);

        clock.sleep(Duration::from_millis(5));
        assert_eq!(clock.millis(), 6);
        assert_eq!(clock.sleeps(), 2);
    }
}
