use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::Clock;

/// The host wall clock. This is the default [`Clock`] of an [`Engine`].
///
/// Readings follow the system time, so an NTP step or manual adjustment can
/// move them backwards. A host clock that reads earlier than the epoch
/// reports zero elapsed time.
///
/// [`Engine`]: crate::Engine
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn since(&self, epoch: Duration) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .saturating_sub(epoch)
    }

    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FLURRY_EPOCH;

    #[test]
    fn tracks_wall_clock_since_epoch() {
        let before = SystemTime::now().duration_since(UNIX_EPOCH).unwrap() - FLURRY_EPOCH;
        let elapsed = SystemClock.since(FLURRY_EPOCH);
        let after = SystemTime::now().duration_since(UNIX_EPOCH).unwrap() - FLURRY_EPOCH;

        assert!(elapsed >= before);
        assert!(elapsed <= after);
    }

    #[test]
    fn future_epoch_saturates_at_zero() {
        let far_future = Duration::from_secs(u64::from(u32::MAX) * 16);
        assert_eq!(SystemClock.since(far_future), Duration::ZERO);
    }

    #[test]
    fn sleep_blocks_for_at_least_the_duration() {
        let start = std::time::Instant::now();
        SystemClock.sleep(Duration::from_millis(2));
        assert!(start.elapsed() >= Duration::from_millis(2));
    }
}
