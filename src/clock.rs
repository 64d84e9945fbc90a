//! Clock abstraction backing `DeferredHeading` (spec.md §9: "inject a
//! clock abstraction" so pilot-delay deferral can be driven
//! deterministically in tests instead of hanging off the wall clock).

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

/// A source of "now", in seconds since an arbitrary but monotonic epoch.
/// `Nav` only ever compares two readings from the same clock, so the
/// epoch doesn't need to mean anything outside the process.
pub trait Clock: Send + Sync {
    fn now_seconds(&self) -> f64;
}

/// Wall-clock time via `chrono::Utc::now()`, for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_seconds(&self) -> f64 {
        let epoch: DateTime<Utc> = DateTime::from_timestamp(0, 0).expect("epoch is representable");
        Utc::now().signed_duration_since(epoch).num_milliseconds() as f64 / 1000.0
    }
}

/// A settable clock for deterministic tests of `DeferredHeading`
/// adoption (spec.md §8 S4). Uses an atomic rather than a `Cell` so it
/// stays `Sync` and shareable behind the same `Arc<dyn Clock>` a
/// production `SystemClock` would be.
#[derive(Debug, Default)]
pub struct SimClock {
    seconds_bits: AtomicU64,
}

impl SimClock {
    pub fn new(start_seconds: f64) -> Self {
        Self {
            seconds_bits: AtomicU64::new(start_seconds.to_bits()),
        }
    }

    pub fn advance(&self, delta_seconds: f64) {
        self.set(self.now_seconds() + delta_seconds);
    }

    pub fn set(&self, seconds: f64) {
        self.seconds_bits.store(seconds.to_bits(), Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_seconds(&self) -> f64 {
        f64::from_bits(self.seconds_bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clock_advances_monotonically() {
        let clock = SimClock::new(0.0);
        assert_eq!(clock.now_seconds(), 0.0);
        clock.advance(3.5);
        assert_eq!(clock.now_seconds(), 3.5);
        clock.set(100.0);
        assert_eq!(clock.now_seconds(), 100.0);
    }

    #[test]
    fn system_clock_produces_increasing_readings() {
        let clock = SystemClock;
        let first = clock.now_seconds();
        let second = clock.now_seconds();
        assert!(second >= first);
    }
}
