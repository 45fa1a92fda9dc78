//! Least-squares trend forecasting over reading series
//!
//! Fits y = a + b*x over x = 0..n-1 and extrapolates forward. Used by
//! `rdg trend` to project RMS velocity for one equipment.

use serde::{Deserialize, Serialize};

/// Slope magnitude below which a series counts as stable, in units per step
const SLOPE_DEAD_BAND: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub samples: usize,
    /// Fitted slope in units per step; 0 when the fit is degenerate
    pub slope: f64,
    pub direction: TrendDirection,
    pub predicted: Vec<f64>,
}

/// Predict the next `steps` values. Fewer than two samples or zero steps
/// predict nothing; a degenerate fit holds the last value flat.
pub fn predict(values: &[f64], steps: usize) -> Vec<f64> {
    if values.len() < 2 || steps == 0 {
        return Vec::new();
    }
    let n = values.len();
    match fit_line(values) {
        Some((slope, intercept)) => (0..steps)
            .map(|i| intercept + slope * (n + i) as f64)
            .collect(),
        None => {
            let last = values[n - 1];
            vec![last; steps]
        }
    }
}

/// Trend classification with a dead band around zero slope
pub fn direction(values: &[f64]) -> TrendDirection {
    match fit_line(values) {
        Some((slope, _)) if slope > SLOPE_DEAD_BAND => TrendDirection::Rising,
        Some((slope, _)) if slope < -SLOPE_DEAD_BAND => TrendDirection::Falling,
        _ => TrendDirection::Stable,
    }
}

/// Fit, classify and extrapolate in one pass
pub fn forecast(values: &[f64], steps: usize) -> TrendForecast {
    let slope = fit_line(values).map(|(slope, _)| slope).unwrap_or(0.0);
    TrendForecast {
        samples: values.len(),
        slope,
        direction: direction(values),
        predicted: predict(values, steps),
    }
}

/// Least-squares (slope, intercept) over x = 0..n-1. None when fewer than
/// two samples or the denominator vanishes.
fn fit_line(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }
    if denominator.abs() < 1e-15 {
        return None;
    }
    let slope = numerator / denominator;
    Some((slope, y_mean - slope * x_mean))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_series() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(direction(&values), TrendDirection::Rising);

        let predicted = predict(&values, 2);
        assert_eq!(predicted.len(), 2);
        assert!((predicted[0] - 5.0).abs() < 1e-12);
        assert!((predicted[1] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_falling_series() {
        let values = [5.0, 4.0, 3.0, 2.0];
        assert_eq!(direction(&values), TrendDirection::Falling);

        let predicted = predict(&values, 2);
        assert!((predicted[0] - 1.0).abs() < 1e-12);
        assert!((predicted[1] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_series_is_stable_and_flat() {
        let values = [2.4, 2.4, 2.4, 2.4];
        assert_eq!(direction(&values), TrendDirection::Stable);

        let predicted = predict(&values, 3);
        assert_eq!(predicted, vec![2.4, 2.4, 2.4]);
    }

    #[test]
    fn test_noise_inside_dead_band_is_stable() {
        let values = [2.0, 2.0005, 1.9995, 2.0002];
        assert_eq!(direction(&values), TrendDirection::Stable);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(predict(&[], 5).is_empty());
        assert!(predict(&[3.0], 5).is_empty());
        assert!(predict(&[1.0, 2.0], 0).is_empty());
        assert_eq!(direction(&[3.0]), TrendDirection::Stable);
    }

    #[test]
    fn test_forecast_bundle() {
        let values = [1.0, 2.0, 3.0];
        let forecast = forecast(&values, 2);
        assert_eq!(forecast.samples, 3);
        assert!((forecast.slope - 1.0).abs() < 1e-12);
        assert_eq!(forecast.direction, TrendDirection::Rising);
        assert_eq!(forecast.predicted.len(), 2);
    }
}
