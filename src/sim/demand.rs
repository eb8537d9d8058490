//! Inverse-CDF sampling of per-vehicle charging need.

use super::rng::SimRng;

#[derive(Debug, Clone, Copy)]
struct CumulativeEntry {
    km: f64,
    cumulative_probability: f64,
}

/// Samples a charging need in kilometres from a discrete distribution.
///
/// The cumulative table is built once, in the order the distribution was
/// given. A draw that is not covered by any cumulative entry (the
/// distribution sums to less than one) resolves to the last entry.
#[derive(Debug, Clone)]
pub struct DemandSampler {
    table: Vec<CumulativeEntry>,
}

impl DemandSampler {
    /// Builds the sampler from `(km, probability)` pairs.
    ///
    /// The pairs are expected to be validated (non-empty, probabilities in
    /// `[0, 1]`); an empty distribution always samples 0 km.
    pub fn new(distribution: &[(f64, f64)]) -> Self {
        let mut cumulative_probability = 0.0;
        let table = distribution
            .iter()
            .map(|&(km, probability)| {
                cumulative_probability += probability;
                CumulativeEntry {
                    km,
                    cumulative_probability,
                }
            })
            .collect();
        Self { table }
    }

    /// Draws one charging need. A result of `0.0` means the vehicle needs no charge.
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        let u = rng.next();
        self.lookup(u)
    }

    fn lookup(&self, u: f64) -> f64 {
        self.table
            .iter()
            .find(|entry| u < entry.cumulative_probability)
            .or_else(|| self.table.last())
            .map_or(0.0, |entry| entry.km)
    }
}
