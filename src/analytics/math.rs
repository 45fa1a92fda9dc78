//! Numeric kernels shared by the reliability models

use std::f64::consts::PI;

/// Natural log of the gamma function for x > 0.
///
/// Lanczos approximation (g = 7, n = 9) with the reflection formula for
/// x < 0.5. Accurate to ~1e-13 relative over the range the Weibull moment
/// equations touch (arguments in (1, 3]).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        // Reflection formula: Γ(x) = π / (sin(πx) · Γ(1-x))
        let reflected = ln_gamma(1.0 - x);
        (PI / (PI * x).sin()).ln() - reflected
    } else {
        let coefficients: [f64; 9] = [
            0.99999999999980993,
            676.5203681218851,
            -1259.1392167224028,
            771.32342877765313,
            -176.61502916214059,
            12.507343278686905,
            -0.13857109526572012,
            9.9843695780195716e-6,
            1.5056327351493116e-7,
        ];
        let g = 7.0_f64;
        let z = x - 1.0;
        let mut ag = coefficients[0];
        for (i, c) in coefficients.iter().enumerate().skip(1) {
            ag += c / (z + i as f64);
        }
        let t = z + g + 0.5;
        0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + ag.ln()
    }
}

/// Gamma function Γ(x) for x > 0
pub fn gamma(x: f64) -> f64 {
    ln_gamma(x).exp()
}

/// Arithmetic mean of a sample; 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator); 0 for fewer than 2 values
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Pearson correlation of two equal-length samples; 0 when degenerate
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }
    let mx = mean(xs);
    let my = mean(ys);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }

    let denom = (var_x * var_y).sqrt();
    if denom < 1e-300 {
        0.0
    } else {
        cov / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel_err(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_gamma_integer_points() {
        // Γ(n) = (n-1)!
        assert!(rel_err(gamma(1.0), 1.0) < 1e-10);
        assert!(rel_err(gamma(2.0), 1.0) < 1e-10);
        assert!(rel_err(gamma(3.0), 2.0) < 1e-10);
        assert!(rel_err(gamma(5.0), 24.0) < 1e-10);
    }

    #[test]
    fn test_gamma_half_integer_points() {
        // Γ(1/2) = √π, Γ(3/2) = √π/2
        let sqrt_pi = PI.sqrt();
        assert!(rel_err(gamma(0.5), sqrt_pi) < 1e-10);
        assert!(rel_err(gamma(1.5), sqrt_pi / 2.0) < 1e-10);
    }

    #[test]
    fn test_gamma_recurrence() {
        // Γ(x+1) = x·Γ(x)
        for x in [0.7, 1.3, 2.5, 4.2] {
            assert!(rel_err(gamma(x + 1.0), x * gamma(x)) < 1e-10);
        }
    }

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        // Sample std dev of this set is sqrt(32/7)
        assert!((std_dev(&values) - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);

        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[3.0]), 0.0);
    }

    #[test]
    fn test_correlation_perfect_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((correlation(&xs, &ys) - 1.0).abs() < 1e-12);

        let neg = [8.0, 6.0, 4.0, 2.0];
        assert!((correlation(&xs, &neg) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_degenerate() {
        let flat = [3.0, 3.0, 3.0];
        let xs = [1.0, 2.0, 3.0];
        assert_eq!(correlation(&xs, &flat), 0.0);
        assert_eq!(correlation(&xs, &[1.0]), 0.0);
    }
}
