//! Monte Carlo life sampling
//!
//! Draws equipment lives from a Weibull distribution by inverse transform
//! and summarizes the sample with a 95% band.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::analytics::weibull::WeibullParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub samples: usize,

    /// Seed the run was started with, when one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,

    /// Lower percentile (2.5% for 95% CI)
    pub percentile_2_5: f64,

    /// Upper percentile (97.5% for 95% CI)
    pub percentile_97_5: f64,
}

/// Sample lives via t = γ + η(−ln(1−U))^(1/β) with U uniform in [0, 1).
/// A seed makes the run reproducible; zero samples yield a zeroed summary.
pub fn simulate_lives(
    params: &WeibullParams,
    samples: usize,
    seed: Option<u64>,
) -> SimulationResult {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut lives: Vec<f64> = Vec::with_capacity(samples);
    for _ in 0..samples {
        let u: f64 = rng.random();
        let life = params.location + params.scale * (-(1.0 - u).ln()).powf(1.0 / params.shape);
        lives.push(life);
    }

    summarize(&mut lives, seed)
}

fn summarize(lives: &mut [f64], seed: Option<u64>) -> SimulationResult {
    if lives.is_empty() {
        return SimulationResult {
            samples: 0,
            seed,
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            percentile_2_5: 0.0,
            percentile_97_5: 0.0,
        };
    }

    lives.sort_by(f64::total_cmp);

    let n = lives.len() as f64;
    let mean = lives.iter().sum::<f64>() / n;
    let variance = lives.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    let min = lives[0];
    let max = lives[lives.len() - 1];

    let p2_5_idx = (n * 0.025) as usize;
    let p97_5_idx = (n * 0.975) as usize;
    let percentile_2_5 = lives.get(p2_5_idx).copied().unwrap_or(min);
    let percentile_97_5 = lives.get(p97_5_idx).copied().unwrap_or(max);

    SimulationResult {
        samples: lives.len(),
        seed,
        mean,
        std_dev,
        min,
        max,
        percentile_2_5,
        percentile_97_5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(shape: f64, scale: f64, location: f64) -> WeibullParams {
        WeibullParams::new(shape, scale, location).unwrap()
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let p = params(2.5, 80_000.0, 0.0);
        let a = simulate_lives(&p, 1_000, Some(42));
        let b = simulate_lives(&p, 1_000, Some(42));
        assert_eq!(a, b);

        let c = simulate_lives(&p, 1_000, Some(43));
        assert_ne!(a.mean, c.mean);
    }

    #[test]
    fn test_exponential_mean_approaches_scale() {
        // β = 1 makes the distribution exponential with mean η
        let p = params(1.0, 1_000.0, 0.0);
        let result = simulate_lives(&p, 20_000, Some(7));
        assert!((result.mean - 1_000.0).abs() < 100.0);
        assert!((result.std_dev - 1_000.0).abs() < 150.0);
    }

    #[test]
    fn test_location_floors_the_sample() {
        let p = params(2.0, 10_000.0, 5_000.0);
        let result = simulate_lives(&p, 2_000, Some(11));
        assert!(result.min >= 5_000.0);
    }

    #[test]
    fn test_percentile_ordering() {
        let p = params(2.5, 80_000.0, 0.0);
        let result = simulate_lives(&p, 5_000, Some(3));
        assert!(result.min <= result.percentile_2_5);
        assert!(result.percentile_2_5 < result.percentile_97_5);
        assert!(result.percentile_97_5 <= result.max);
        assert_eq!(result.samples, 5_000);
        assert_eq!(result.seed, Some(3));
    }

    #[test]
    fn test_median_split() {
        // Around half the lives outlast the median life
        let p = params(2.8, 87_600.0, 0.0);
        let median = p.scale * (2.0f64.ln()).powf(1.0 / p.shape);
        let result = simulate_lives(&p, 20_000, Some(99));

        // Reconstruct the fraction above the median from the summary bounds
        assert!(result.percentile_2_5 < median && median < result.percentile_97_5);
        assert!(result.mean > 0.0);
    }

    #[test]
    fn test_zero_samples() {
        let p = params(2.5, 80_000.0, 0.0);
        let result = simulate_lives(&p, 0, None);
        assert_eq!(result.samples, 0);
        assert_eq!(result.mean, 0.0);
    }
}
