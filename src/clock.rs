//! Clock module - Monotonic time source shared by every component

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic seconds since an arbitrary, fixed epoch.
///
/// `sleep` is the only blocking wait the control core performs. A manual
/// clock implements it by advancing time instead of blocking.
pub trait Clock {
    fn now(&self) -> f64;
    fn sleep(&self, seconds: f64);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }

    fn sleep(&self, seconds: f64) {
        (**self).sleep(seconds)
    }
}

// ============================================================================
// MONOTONIC CLOCK - Host clock backed by Instant
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep(&self, seconds: f64) {
        if seconds > 0.0 && seconds.is_finite() {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}

// ============================================================================
// MANUAL CLOCK - Deterministic time for simulation and tests
// ============================================================================

/// Clock whose time only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, seconds: f64) {
        if seconds > 0.0 {
            *self.seconds.lock() += seconds;
        }
    }

    /// Moves the clock to `seconds`; earlier values are ignored so time
    /// never runs backwards.
    pub fn set(&self, seconds: f64) {
        let mut now = self.seconds.lock();
        if seconds > *now {
            *now = seconds;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        *self.seconds.lock()
    }

    fn sleep(&self, seconds: f64) {
        self.advance(seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_sleep_advances_shared_time() {
        let clock = ManualClock::new(1.0);
        let view = clock.clone();
        clock.sleep(0.5);
        assert_eq!(view.now(), 1.5);
    }

    #[test]
    fn manual_clock_never_moves_backwards() {
        let clock = ManualClock::new(2.0);
        clock.set(1.0);
        clock.advance(-3.0);
        assert_eq!(clock.now(), 2.0);
        clock.set(2.25);
        assert_eq!(clock.now(), 2.25);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
