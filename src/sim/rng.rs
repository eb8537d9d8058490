//! Seeded uniform random source shared by the arrival policies and the demand sampler.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform `[0, 1)` generator backed by ChaCha8.
///
/// ChaCha8 has a fixed, documented output stream, so a given seed yields the
/// same sequence on every platform and every build.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    /// Creates a generator with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a generator seeded from the thread-local entropy source.
    ///
    /// Runs started this way are not reproducible.
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }

    /// Seeded when `seed` is present, entropy-based otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::seeded)
    }

    /// Returns the next value in `[0, 1)`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SimRng::seeded(42);
        let mut b = SimRng::seeded(42);
        for _ in 0..1000 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = SimRng::seeded(1);
        let mut b = SimRng::seeded(2);
        let xs: Vec<f64> = (0..8).map(|_| a.next()).collect();
        let ys: Vec<f64> = (0..8).map(|_| b.next()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn values_are_in_unit_interval() {
        let mut rng = SimRng::seeded(7);
        for _ in 0..10_000 {
            let u = rng.next();
            assert!((0.0..1.0).contains(&u), "out of range: {u}");
        }
    }

    #[test]
    fn unseeded_generator_produces_values() {
        let mut rng = SimRng::new(None);
        let u = rng.next();
        assert!((0.0..1.0).contains(&u));
    }
}
