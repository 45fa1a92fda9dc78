//! Three-parameter Weibull reliability model
//!
//! Reliability, failure density, hazard rate, MTTF and B-life for a
//! (shape β, scale η, location γ) triple, plus method-of-moments parameter
//! estimation from observed failure ages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analytics::math::{correlation, gamma, mean};

/// Errors from Weibull construction, evaluation and estimation
#[derive(Debug, Error, PartialEq)]
pub enum WeibullError {
    #[error("shape must be positive and finite, got {0}")]
    InvalidShape(f64),

    #[error("scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    #[error("location must be non-negative and finite, got {0}")]
    InvalidLocation(f64),

    #[error("percentile must be in [0, 100), got {0}")]
    InvalidPercentile(f64),

    #[error("parameter estimation needs at least {needed} failure ages, got {got}")]
    NotEnoughFailures { needed: usize, got: usize },

    #[error("failure ages must be positive and finite")]
    InvalidFailureAge,
}

/// Validated Weibull parameter triple
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    /// Shape β
    pub shape: f64,
    /// Scale η in hours
    pub scale: f64,
    /// Location (failure-free life) γ in hours
    #[serde(default)]
    pub location: f64,
}

impl WeibullParams {
    /// Construct with validation: β > 0, η > 0, γ ≥ 0, all finite
    pub fn new(shape: f64, scale: f64, location: f64) -> Result<Self, WeibullError> {
        let params = Self {
            shape,
            scale,
            location,
        };
        params.validate()?;
        Ok(params)
    }

    /// Re-check the invariants (for values that arrived via deserialization)
    pub fn validate(&self) -> Result<(), WeibullError> {
        if !self.shape.is_finite() || self.shape <= 0.0 {
            return Err(WeibullError::InvalidShape(self.shape));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(WeibullError::InvalidScale(self.scale));
        }
        if !self.location.is_finite() || self.location < 0.0 {
            return Err(WeibullError::InvalidLocation(self.location));
        }
        Ok(())
    }
}

/// Hazard-rate shape class implied by β
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePattern {
    /// β < 1: hazard decreasing in t
    InfantMortality,
    /// β = 1: hazard constant (exponential)
    Random,
    /// β > 1: hazard increasing in t
    WearOut,
}

impl std::fmt::Display for FailurePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePattern::InfantMortality => write!(f, "infant-mortality"),
            FailurePattern::Random => write!(f, "random"),
            FailurePattern::WearOut => write!(f, "wear-out"),
        }
    }
}

/// A point on the sampled reliability curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub hours: f64,
    pub reliability: f64,
    pub failure_density: f64,
    pub hazard_rate: f64,
}

/// Weibull distribution over operating hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    params: WeibullParams,
}

impl Distribution {
    pub fn new(params: WeibullParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &WeibullParams {
        &self.params
    }

    /// Survival probability R(t). Exactly 1 for t ≤ γ, in (0, 1] and
    /// non-increasing above it.
    pub fn reliability(&self, t: f64) -> f64 {
        let p = &self.params;
        if t <= p.location {
            return 1.0;
        }
        let x = (t - p.location) / p.scale;
        (-x.powf(p.shape)).exp()
    }

    /// Failure probability density f(t); 0 for t ≤ γ
    pub fn failure_density(&self, t: f64) -> f64 {
        let p = &self.params;
        if t <= p.location {
            return 0.0;
        }
        let x = (t - p.location) / p.scale;
        (p.shape / p.scale) * x.powf(p.shape - 1.0) * self.reliability(t)
    }

    /// Instantaneous failure rate h(t); 0 for t ≤ γ
    pub fn hazard_rate(&self, t: f64) -> f64 {
        let p = &self.params;
        if t <= p.location {
            return 0.0;
        }
        let x = (t - p.location) / p.scale;
        (p.shape / p.scale) * x.powf(p.shape - 1.0)
    }

    /// Mean time to failure: γ + η·Γ(1 + 1/β)
    pub fn mttf(&self) -> f64 {
        let p = &self.params;
        p.location + p.scale * gamma(1.0 + 1.0 / p.shape)
    }

    /// Time by which `percentile` percent of the population has failed:
    /// γ + η·(−ln(1 − p/100))^(1/β).
    ///
    /// Valid for p in [0, 100); p = 0 returns γ. The value diverges as
    /// p → 100, so 100 and above are rejected.
    pub fn b_life(&self, percentile: f64) -> Result<f64, WeibullError> {
        if !percentile.is_finite() || !(0.0..100.0).contains(&percentile) {
            return Err(WeibullError::InvalidPercentile(percentile));
        }
        Ok(self.percentile_life(percentile / 100.0))
    }

    /// B10 life: 10% of the population failed
    pub fn b10(&self) -> f64 {
        self.percentile_life(0.10)
    }

    /// B50 life (median)
    pub fn b50(&self) -> f64 {
        self.percentile_life(0.50)
    }

    /// B90 life: 90% of the population failed
    pub fn b90(&self) -> f64 {
        self.percentile_life(0.90)
    }

    fn percentile_life(&self, fraction: f64) -> f64 {
        let p = &self.params;
        p.location + p.scale * (-(1.0 - fraction).ln()).powf(1.0 / p.shape)
    }

    /// Hazard-shape class of this parameterization.
    ///
    /// β within 1e-9 of 1 counts as constant-hazard so that a stored β of
    /// exactly 1.0 is never misclassified by float noise.
    pub fn failure_pattern(&self) -> FailurePattern {
        let beta = self.params.shape;
        if (beta - 1.0).abs() < 1e-9 {
            FailurePattern::Random
        } else if beta > 1.0 {
            FailurePattern::WearOut
        } else {
            FailurePattern::InfantMortality
        }
    }

    /// Sample the R/f/h curves at `points` evenly spaced times over
    /// [0, horizon_hours]. Zero points gives an empty curve.
    pub fn curve(&self, horizon_hours: f64, points: usize) -> Vec<CurvePoint> {
        match points {
            0 => Vec::new(),
            1 => vec![self.point_at(horizon_hours)],
            _ => (0..points)
                .map(|i| {
                    let t = horizon_hours * i as f64 / (points - 1) as f64;
                    self.point_at(t)
                })
                .collect(),
        }
    }

    fn point_at(&self, t: f64) -> CurvePoint {
        CurvePoint {
            hours: t,
            reliability: self.reliability(t),
            failure_density: self.failure_density(t),
            hazard_rate: self.hazard_rate(t),
        }
    }
}

/// Parameters estimated from observed failure ages, with fit quality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullFit {
    pub params: WeibullParams,
    /// Number of failure ages the fit saw
    pub sample_count: usize,
    /// Kolmogorov-Smirnov statistic (max CDF deviation, lower is better)
    pub ks_statistic: f64,
    /// Squared correlation of the sample against theoretical quantiles
    pub r_squared: f64,
}

impl WeibullFit {
    /// Method-of-moments fit over failure ages in operating hours.
    ///
    /// Matches the observed coefficient of variation against the Weibull
    /// CV sqrt(Γ(1+2/β)/Γ(1+1/β)² − 1) by walking β in 0.01 steps from
    /// 1.0 (at most 100 steps, floor 0.1, tolerance 0.001), then sets
    /// η = mean/Γ(1+1/β). Location is estimated as 0.
    pub fn from_failure_ages(ages: &[f64]) -> Result<Self, WeibullError> {
        if ages.len() < 2 {
            return Err(WeibullError::NotEnoughFailures {
                needed: 2,
                got: ages.len(),
            });
        }
        if ages.iter().any(|a| !a.is_finite() || *a <= 0.0) {
            return Err(WeibullError::InvalidFailureAge);
        }

        let sample_mean = mean(ages);
        // Population variance, to match the moment equations
        let variance = ages
            .iter()
            .map(|a| (a - sample_mean).powi(2))
            .sum::<f64>()
            / ages.len() as f64;
        let cv = variance.sqrt() / sample_mean;

        let mut shape = 1.0;
        for _ in 0..100 {
            let g1 = gamma(1.0 + 1.0 / shape);
            let g2 = gamma(1.0 + 2.0 / shape);
            let theoretical_cv = (g2 / (g1 * g1) - 1.0).sqrt();

            if (theoretical_cv - cv).abs() < 0.001 {
                break;
            }
            if theoretical_cv > cv {
                shape += 0.01;
            } else {
                shape -= 0.01;
            }
            if shape <= 0.1 {
                shape = 0.1;
                break;
            }
        }

        let scale = sample_mean / gamma(1.0 + 1.0 / shape);
        let params = WeibullParams::new(shape, scale, 0.0)?;
        let dist = Distribution::new(params);

        let mut sorted = ages.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();

        // Kolmogorov-Smirnov against the empirical CDF
        let mut ks = 0.0f64;
        for (i, t) in sorted.iter().enumerate() {
            let theoretical = 1.0 - dist.reliability(*t);
            let empirical = (i + 1) as f64 / n as f64;
            ks = ks.max((theoretical - empirical).abs());
        }

        // R² of the ordered sample against theoretical quantiles
        let quantiles: Vec<f64> = (0..n)
            .map(|i| {
                let p = (i as f64 + 0.5) / n as f64;
                scale * (-(1.0 - p).ln()).powf(1.0 / shape)
            })
            .collect();
        let r = correlation(&sorted, &quantiles);

        Ok(Self {
            params,
            sample_count: n,
            ks_statistic: ks,
            r_squared: r * r,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(shape: f64, scale: f64, location: f64) -> Distribution {
        Distribution::new(WeibullParams::new(shape, scale, location).unwrap())
    }

    #[test]
    fn test_params_validation() {
        assert!(WeibullParams::new(2.5, 80_000.0, 0.0).is_ok());
        assert!(matches!(
            WeibullParams::new(0.0, 80_000.0, 0.0),
            Err(WeibullError::InvalidShape(_))
        ));
        assert!(matches!(
            WeibullParams::new(2.5, -1.0, 0.0),
            Err(WeibullError::InvalidScale(_))
        ));
        assert!(matches!(
            WeibullParams::new(2.5, 80_000.0, -10.0),
            Err(WeibullError::InvalidLocation(_))
        ));
        assert!(matches!(
            WeibullParams::new(f64::NAN, 80_000.0, 0.0),
            Err(WeibullError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_reliability_is_one_at_location() {
        let d = dist(2.8, 87_600.0, 5_000.0);
        assert_eq!(d.reliability(0.0), 1.0);
        assert_eq!(d.reliability(5_000.0), 1.0);
        assert!(d.reliability(5_000.1) < 1.0);
    }

    #[test]
    fn test_reliability_efold_at_scale() {
        // At t = η (with γ = 0), R = exp(−1) regardless of β
        let d = dist(2.8, 87_600.0, 0.0);
        let r = d.reliability(87_600.0);
        assert!((r - (-1.0f64).exp()).abs() < 1e-12);
        assert!((r - 0.3679).abs() < 1e-4);
    }

    #[test]
    fn test_reliability_non_increasing() {
        let d = dist(2.5, 80_000.0, 1_000.0);
        let mut last = 1.0;
        for t in (0..200).map(|i| i as f64 * 1_000.0) {
            let r = d.reliability(t);
            assert!(r <= last + 1e-15, "reliability rose at t={}", t);
            assert!(r > 0.0 && r <= 1.0);
            last = r;
        }
    }

    #[test]
    fn test_failure_density_zero_before_location() {
        let d = dist(2.5, 80_000.0, 2_000.0);
        assert_eq!(d.failure_density(0.0), 0.0);
        assert_eq!(d.failure_density(2_000.0), 0.0);
        assert!(d.failure_density(10_000.0) > 0.0);
    }

    #[test]
    fn test_hazard_rate_shapes() {
        // β > 1: increasing
        let wear = dist(2.5, 10_000.0, 0.0);
        assert!(wear.hazard_rate(8_000.0) > wear.hazard_rate(2_000.0));
        assert_eq!(wear.failure_pattern(), FailurePattern::WearOut);

        // β = 1: constant at 1/η
        let random = dist(1.0, 10_000.0, 0.0);
        let h1 = random.hazard_rate(1_000.0);
        let h2 = random.hazard_rate(9_000.0);
        assert!((h1 - 1.0 / 10_000.0).abs() < 1e-15);
        assert!((h1 - h2).abs() < 1e-15);
        assert_eq!(random.failure_pattern(), FailurePattern::Random);

        // β < 1: decreasing
        let infant = dist(0.7, 10_000.0, 0.0);
        assert!(infant.hazard_rate(8_000.0) < infant.hazard_rate(2_000.0));
        assert_eq!(infant.failure_pattern(), FailurePattern::InfantMortality);
    }

    #[test]
    fn test_mttf_exponential_special_case() {
        // Γ(2) = 1, so MTTF = η when β = 1
        let d = dist(1.0, 50_000.0, 0.0);
        assert!((d.mttf() - 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_mttf_includes_location() {
        let base = dist(2.0, 40_000.0, 0.0).mttf();
        let shifted = dist(2.0, 40_000.0, 3_000.0).mttf();
        assert!((shifted - base - 3_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_b50_median_formula() {
        let d = dist(2.8, 87_600.0, 0.0);
        let expected = 87_600.0 * (2.0f64.ln()).powf(1.0 / 2.8);
        assert!((d.b50() - expected).abs() < 1e-9);
        assert!((d.b_life(50.0).unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_b_life_ordering_and_edges() {
        let d = dist(2.5, 80_000.0, 1_000.0);
        assert!(d.b10() < d.b50());
        assert!(d.b50() < d.b90());

        // p = 0 collapses to the failure-free life
        assert_eq!(d.b_life(0.0).unwrap(), 1_000.0);

        assert!(matches!(
            d.b_life(100.0),
            Err(WeibullError::InvalidPercentile(_))
        ));
        assert!(matches!(
            d.b_life(-1.0),
            Err(WeibullError::InvalidPercentile(_))
        ));
        assert!(d.b_life(f64::NAN).is_err());
    }

    #[test]
    fn test_curve_sampling() {
        let d = dist(2.5, 80_000.0, 0.0);
        let curve = d.curve(100_000.0, 5);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve[0].hours, 0.0);
        assert_eq!(curve[4].hours, 100_000.0);
        assert_eq!(curve[0].reliability, 1.0);
        assert!(curve[4].reliability < curve[0].reliability);

        assert!(d.curve(100_000.0, 0).is_empty());
        assert_eq!(d.curve(100_000.0, 1)[0].hours, 100_000.0);
    }

    #[test]
    fn test_fit_recovers_shape_from_quantile_sample() {
        // Quantile sample of a β=2, η=1000 Weibull at p = (i+0.5)/6.
        // Its CV sits below every Weibull CV on β ∈ [1, 2], so the walk
        // climbs the full 100 steps and stops exactly at β = 2.0.
        let ages: Vec<f64> = (0..6)
            .map(|i| {
                let p = (i as f64 + 0.5) / 6.0;
                1000.0 * (-(1.0 - p).ln()).powf(0.5)
            })
            .collect();

        let fit = WeibullFit::from_failure_ages(&ages).unwrap();
        assert!((fit.params.shape - 2.0).abs() < 1e-6);

        let expected_scale = mean(&ages) / gamma(1.5);
        assert!((fit.params.scale - expected_scale).abs() < 1e-6);
        assert_eq!(fit.sample_count, 6);

        // A quantile-matched sample lines up almost perfectly
        assert!(fit.r_squared > 0.99);
        assert!(fit.ks_statistic < 0.2);
    }

    #[test]
    fn test_fit_rejects_degenerate_input() {
        assert!(matches!(
            WeibullFit::from_failure_ages(&[5_000.0]),
            Err(WeibullError::NotEnoughFailures { needed: 2, got: 1 })
        ));
        assert!(matches!(
            WeibullFit::from_failure_ages(&[]),
            Err(WeibullError::NotEnoughFailures { .. })
        ));
        assert!(matches!(
            WeibullFit::from_failure_ages(&[5_000.0, -1.0]),
            Err(WeibullError::InvalidFailureAge)
        ));
        assert!(matches!(
            WeibullFit::from_failure_ages(&[5_000.0, f64::NAN]),
            Err(WeibullError::InvalidFailureAge)
        ));
    }
}
