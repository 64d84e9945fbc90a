//! Seedable randomness backing the pilot-reaction jitter (spec.md §4.9:
//! `EnqueueHeading` delays a controller-issued heading change by
//! `3 + 3·rand()` seconds). Injected as a collaborator so deferred-heading
//! tests are deterministic (spec.md §9: "Make `rand` a seedable source
//! for deterministic tests").

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// A source of `[0, 1)` uniform randomness.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;

    /// The pilot-reaction delay for a controller-issued heading change:
    /// `3 + 3·rand()` seconds, per spec.md §4.9.
    fn pilot_reaction_delay_seconds(&self) -> f64 {
        3.0 + 3.0 * self.next_unit()
    }
}

/// Thread-local `rand::thread_rng()`, for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn next_unit(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// A `StdRng` seeded at construction, for deterministic tests of
/// deferred-heading timing.
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn next_unit(&self) -> f64 {
        self.rng.lock().expect("rng mutex poisoned").gen_range(0.0..1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_source_is_reproducible() {
        let a = SeededRandomSource::new(42);
        let b = SeededRandomSource::new(42);
        assert_eq!(a.next_unit(), b.next_unit());
    }

    #[test]
    fn pilot_reaction_delay_stays_within_three_to_six_seconds() {
        let source = SeededRandomSource::new(7);
        for _ in 0..50 {
            let delay = source.pilot_reaction_delay_seconds();
            assert!((3.0..6.0).contains(&delay), "got {delay}");
        }
    }
}
