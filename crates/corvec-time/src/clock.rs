//! Tick sources for the spin operator

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Nanoseconds per tick
pub const NANOS_PER_TICK: u64 = 100;

/// Ticks per second
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Wall-clock time in 100ns ticks since the Unix epoch
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Ticks = Ticks(0);

    #[inline]
    pub fn new(ticks: u64) -> Self {
        Ticks(ticks)
    }

    #[inline]
    pub fn from_duration(d: Duration) -> Self {
        let ticks = d.as_nanos() / NANOS_PER_TICK as u128;
        Ticks(ticks.min(u64::MAX as u128) as u64)
    }

    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticks({})", self.0)
    }
}

/// Source of wall-clock ticks
pub trait TickSource {
    fn now(&self) -> Ticks;
}

/// System wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TickSource for SystemClock {
    fn now(&self) -> Ticks {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Ticks::from_duration(elapsed),
            Err(e) => {
                tracing::warn!(behind = ?e.duration(), "system clock is before the Unix epoch");
                Ticks::ZERO
            }
        }
    }
}

/// Manually driven clock, shareable across threads
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Ticks) -> Self {
        ManualClock {
            ticks: AtomicU64::new(start.0),
        }
    }

    /// Move the clock forward, returning the new reading
    pub fn advance(&self, d: Duration) -> Ticks {
        let delta = Ticks::from_duration(d).0;
        let previous = self.ticks.fetch_add(delta, Ordering::SeqCst);
        Ticks(previous.wrapping_add(delta))
    }

    pub fn set(&self, ticks: Ticks) {
        self.ticks.store(ticks.0, Ordering::SeqCst);
    }
}

impl TickSource for ManualClock {
    fn now(&self) -> Ticks {
        Ticks(self.ticks.load(Ordering::SeqCst))
    }
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now(&self) -> Ticks {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_conversions() {
        assert_eq!(Ticks::from_duration(Duration::from_millis(1)).as_u64(), 10_000);
        assert_eq!(Ticks::from_duration(Duration::from_secs(1)).as_u64(), TICKS_PER_SECOND);
        assert_eq!(Ticks::from_duration(Duration::from_nanos(1599)).as_u64(), 15);
    }

    #[test]
    fn test_system_clock_after_epoch() {
        let now = SystemClock.now();
        // 2020-01-01 in ticks
        assert!(now.as_u64() > 1_577_836_800 * TICKS_PER_SECOND);
    }

    #[test]
    fn test_system_clock_advances() {
        let t1 = SystemClock.now();
        std::thread::sleep(Duration::from_millis(10));
        let t2 = SystemClock.now();
        assert!(t2 > t1);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(Ticks::new(100));
        assert_eq!(clock.now(), Ticks::new(100));

        let t = clock.advance(Duration::from_millis(2));
        assert_eq!(t, Ticks::new(20_100));
        assert_eq!(clock.now(), t);

        clock.set(Ticks::ZERO);
        assert_eq!((&clock).now(), Ticks::ZERO);
    }
}
