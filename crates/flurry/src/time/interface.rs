use core::time::Duration;

/// Flurry epoch: Tuesday, January 1, 2019 00:00:00 UTC
pub const FLURRY_EPOCH: Duration = Duration::from_millis(1_546_300_800_000);

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// Discord epoch: Thursday, January 1, 2015 00:00:00 UTC
pub const DISCORD_EPOCH: Duration = Duration::from_millis(1_420_070_400_000);

/// Instagram epoch: Saturday, January 1, 2011 00:00:00 UTC
pub const INSTAGRAM_EPOCH: Duration = Duration::from_millis(1_293_840_000_000);

/// The time capability consumed by the [`Engine`].
///
/// The engine needs exactly two things from a clock: how much time has
/// passed since its epoch, and a way to block its worker while the current
/// millisecond's sequence space is exhausted. Swapping the implementation
/// lets tests drive time deterministically.
///
/// Epochs are expressed as a [`Duration`] since 1970-01-01 UTC, matching the
/// constants in this module.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use flurry::Clock;
///
/// struct FixedTime;
/// impl Clock for FixedTime {
///     fn since(&self, _epoch: Duration) -> Duration {
///         Duration::from_millis(1234)
///     }
///
///     fn sleep(&self, dur: Duration) {
///         std::thread::sleep(dur);
///     }
/// }
///
/// assert_eq!(FixedTime.since(Duration::ZERO).as_millis(), 1234);
/// ```
///
/// [`Engine`]: crate::Engine
pub trait Clock: Send + 'static {
    /// Returns the time elapsed since `epoch`.
    fn since(&self, epoch: Duration) -> Duration;

    /// Blocks the calling thread for `dur`.
    fn sleep(&self, dur: Duration);
}
