//! Time units and time sources.
//!
//! The scheduler never owns a timer. It reads whichever host counter a
//! pending call was admitted against, and only ever compares counter
//! values with wrapping arithmetic.

extern crate alloc;

use core::sync::atomic::{AtomicUsize, Ordering};

/// Which host counter a delay is measured against.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeUnit {
    Millis,
    Micros,
}

impl Default for TimeUnit {
    fn default() -> Self {
        TimeUnit::Millis
    }
}

/// Counter distance from `then` to `now`, modulo the counter width.
///
/// Stays correct across counter wraparound as long as the true elapsed
/// time fits in the counter.
pub fn elapsed(now: usize, then: usize) -> usize {
    now.wrapping_sub(then)
}

/// Read access to the current counters, as seen from inside a firing
/// callback.
pub trait TimeContext {
    fn now(&self, unit: TimeUnit) -> usize;
}

/// A pair of monotonic (modulo wraparound) counters supplied by the host.
pub trait Clock: Send {
    fn now_millis(&self) -> usize;
    fn now_micros(&self) -> usize;

    fn now(&self, unit: TimeUnit) -> usize {
        match unit {
            TimeUnit::Millis => self.now_millis(),
            TimeUnit::Micros => self.now_micros(),
        }
    }
}

impl<T> Clock for &'static T
where
    T: Clock + Sync,
{
    fn now_millis(&self) -> usize {
        (**self).now_millis()
    }
    fn now_micros(&self) -> usize {
        (**self).now_micros()
    }
}

impl Clock for alloc::sync::Arc<spin::Mutex<dyn Clock>> {
    fn now_millis(&self) -> usize {
        self.lock().now_millis()
    }
    fn now_micros(&self) -> usize {
        self.lock().now_micros()
    }
}

/// Counters the host steps by hand, typically once per iteration of its
/// own loop.
///
/// The counters are atomics so a `&'static CounterClock` can drive a
/// scheduler while the host keeps advancing it.
#[derive(Debug, Default)]
pub struct CounterClock {
    millis: AtomicUsize,
    micros: AtomicUsize,
}

impl CounterClock {
    pub const fn new() -> Self {
        Self {
            millis: AtomicUsize::new(0),
            micros: AtomicUsize::new(0),
        }
    }

    pub fn advance_millis(&self, amount: usize) {
        self.millis.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn advance_micros(&self, amount: usize) {
        self.micros.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn set_millis(&self, value: usize) {
        self.millis.store(value, Ordering::Relaxed);
    }

    pub fn set_micros(&self, value: usize) {
        self.micros.store(value, Ordering::Relaxed);
    }
}

impl Clock for CounterClock {
    fn now_millis(&self) -> usize {
        self.millis.load(Ordering::Relaxed)
    }
    fn now_micros(&self) -> usize {
        self.micros.load(Ordering::Relaxed)
    }
}

#[cfg(feature = "std")]
pub use self::std_clock::StdClock;

#[cfg(feature = "std")]
mod std_clock {
    use super::Clock;
    use std::time::Instant;

    /// Milliseconds and microseconds since construction.
    #[derive(Debug)]
    pub struct StdClock {
        start: Instant,
    }

    impl StdClock {
        pub fn new() -> Self {
            Self {
                start: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_millis(&self) -> usize {
            self.start.elapsed().as_millis() as usize
        }
        fn now_micros(&self) -> usize {
            self.start.elapsed().as_micros() as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_counts_forward() {
        assert_eq!(0, elapsed(0, 0));
        assert_eq!(0, elapsed(123, 123));
        assert_eq!(1, elapsed(124, 123));
        assert_eq!(100, elapsed(160, 60));
    }

    #[test]
    fn elapsed_spans_wraparound() {
        assert_eq!(1, elapsed(0, usize::MAX));
        assert_eq!(11, elapsed(5, usize::MAX - 5));
        assert_eq!(6, elapsed(0, usize::MAX - 5));
    }

    #[test]
    fn default_unit_is_millis() {
        assert_eq!(TimeUnit::Millis, TimeUnit::default());
    }

    #[test]
    fn counter_clock_tracks_both_units() {
        let clock = CounterClock::new();
        assert_eq!(0, clock.now(TimeUnit::Millis));
        assert_eq!(0, clock.now(TimeUnit::Micros));

        clock.advance_millis(2);
        clock.advance_micros(2000);
        assert_eq!(2, clock.now(TimeUnit::Millis));
        assert_eq!(2000, clock.now(TimeUnit::Micros));

        clock.set_millis(60);
        assert_eq!(60, clock.now(TimeUnit::Millis));
        assert_eq!(2000, clock.now(TimeUnit::Micros));
    }

    #[test]
    fn counter_clock_advance_wraps() {
        let clock = CounterClock::new();
        clock.set_micros(usize::MAX);
        clock.advance_micros(2);
        assert_eq!(1, clock.now(TimeUnit::Micros));
    }

    #[cfg(feature = "std")]
    #[test]
    fn std_clock_moves_forward() {
        let clock = StdClock::new();
        let first = clock.now_micros();
        let mut last = first;
        for _ in 0..100_000 {
            last = clock.now_micros();
        }
        assert!(last >= first);
    }
}
