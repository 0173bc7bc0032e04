//! Randomness sources for the score queue.

use rand::Rng;

/// A source of uniform random values in `[0, 1)`.
///
/// Feeds fingerprint salting and backoff jitter; injected so both are
/// deterministic in tests.
pub trait RandomSource: Send + Sync {
    /// Returns a uniform random value in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Thread-local RNG backed by the `rand` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngRandom;

impl RandomSource for ThreadRngRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// A source that always returns the same value, for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom {
    value: f64,
}

impl FixedRandom {
    /// Creates a source pinned to the given value.
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_rng_stays_in_unit_interval() {
        for _ in 0..100 {
            let value = ThreadRngRandom.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn fixed_random_is_constant() {
        let source = FixedRandom::new(0.25);
        assert_eq!(source.next_f64(), 0.25);
        assert_eq!(source.next_f64(), 0.25);
    }
}
