//! Steady-state availability from base failure rates
//!
//! The base failures-per-year rate is scaled by the environment multiplier
//! and NSWC-10 style stress factors, then converted to MTBF. Availability
//! is MTBF against the calibrated repair time.

use serde::{Deserialize, Serialize};

use crate::analytics::calibration::BaseFailureRate;
use crate::analytics::HOURS_PER_YEAR;

/// Operating/rated pairs for stress derating. A pair with either side
/// missing (or a non-positive rated value) contributes a factor of 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct StressInputs {
    pub operating_temperature: Option<f64>,
    pub rated_temperature: Option<f64>,
    pub operating_vibration: Option<f64>,
    pub rated_vibration: Option<f64>,
    pub operating_duty_hours: Option<f64>,
    pub rated_duty_hours: Option<f64>,
}

/// NSWC-10 stress multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressFactors {
    /// exp(0.1 * (ratio - 1)) over operating/rated temperature
    pub temperature: f64,
    /// ratio^2.5 over operating/design vibration
    pub vibration: f64,
    /// ratio^0.6 over actual/design duty hours
    pub duty_cycle: f64,
}

impl StressFactors {
    pub fn combined(&self) -> f64 {
        self.temperature * self.vibration * self.duty_cycle
    }
}

pub fn stress_factors(inputs: &StressInputs) -> StressFactors {
    StressFactors {
        temperature: ratio(inputs.operating_temperature, inputs.rated_temperature)
            .map(|r| (0.1 * (r - 1.0)).exp())
            .unwrap_or(1.0),
        vibration: ratio(inputs.operating_vibration, inputs.rated_vibration)
            .map(|r| r.powf(2.5))
            .unwrap_or(1.0),
        duty_cycle: ratio(inputs.operating_duty_hours, inputs.rated_duty_hours)
            .map(|r| r.powf(0.6))
            .unwrap_or(1.0),
    }
}

fn ratio(operating: Option<f64>, rated: Option<f64>) -> Option<f64> {
    match (operating, rated) {
        (Some(operating), Some(rated)) if rated > 0.0 => Some(operating / rated),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityEstimate {
    /// Base rate after environment and stress adjustment
    pub effective_failures_per_year: f64,
    pub environment_factor: f64,
    pub stress: StressFactors,
    pub mtbf_hours: f64,
    pub mttr_hours: f64,
    /// Steady-state fraction in (0, 1]
    pub availability: f64,
    pub annual_downtime_hours: f64,
}

/// Availability for one equipment given its calibrated base rate,
/// environment name and stress inputs.
pub fn estimate_availability(
    rate: &BaseFailureRate,
    environment: &str,
    inputs: &StressInputs,
) -> AvailabilityEstimate {
    let environment_factor = rate.environment_factor(environment);
    let stress = stress_factors(inputs);
    let effective = rate.failures_per_year * environment_factor * stress.combined();

    // A non-positive effective rate degenerates to one year between failures
    let mtbf_hours = if effective > 0.0 {
        HOURS_PER_YEAR / effective
    } else {
        HOURS_PER_YEAR
    };
    let mttr_hours = rate.repair_hours;
    let availability = mtbf_hours / (mtbf_hours + mttr_hours);

    AvailabilityEstimate {
        effective_failures_per_year: effective,
        environment_factor,
        stress,
        mtbf_hours,
        mttr_hours,
        availability,
        annual_downtime_hours: (1.0 - availability) * HOURS_PER_YEAR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn pump_rate() -> BaseFailureRate {
        BaseFailureRate {
            category: "pump".to_string(),
            subtype: "centrifugal".to_string(),
            failures_per_year: 0.52,
            repair_hours: 24.0,
            environment_factors: BTreeMap::from([
                ("onshore".to_string(), 1.0),
                ("offshore".to_string(), 1.5),
                ("harsh".to_string(), 2.0),
            ]),
        }
    }

    #[test]
    fn test_stress_factor_formulas() {
        let factors = stress_factors(&StressInputs {
            operating_temperature: Some(82.5),
            rated_temperature: Some(75.0),
            operating_vibration: Some(5.6),
            rated_vibration: Some(2.8),
            operating_duty_hours: Some(4_380.0),
            rated_duty_hours: Some(8_760.0),
        });

        assert!((factors.temperature - (0.01f64).exp()).abs() < 1e-12);
        assert!((factors.vibration - 2.0f64.powf(2.5)).abs() < 1e-12);
        assert!((factors.duty_cycle - 0.5f64.powf(0.6)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_pairs_are_neutral() {
        let factors = stress_factors(&StressInputs {
            operating_vibration: Some(5.6),
            ..Default::default()
        });
        assert_eq!(factors.temperature, 1.0);
        assert_eq!(factors.vibration, 1.0);
        assert_eq!(factors.duty_cycle, 1.0);
        assert_eq!(factors.combined(), 1.0);

        // Zero rated value cannot form a ratio
        let degenerate = stress_factors(&StressInputs {
            operating_vibration: Some(5.6),
            rated_vibration: Some(0.0),
            ..Default::default()
        });
        assert_eq!(degenerate.vibration, 1.0);
    }

    #[test]
    fn test_availability_unstressed_onshore() {
        let estimate = estimate_availability(&pump_rate(), "onshore", &StressInputs::default());

        let mtbf = 8_760.0 / 0.52;
        assert!((estimate.mtbf_hours - mtbf).abs() < 1e-9);
        assert_eq!(estimate.mttr_hours, 24.0);

        let availability = mtbf / (mtbf + 24.0);
        assert!((estimate.availability - availability).abs() < 1e-12);
        assert!(
            (estimate.annual_downtime_hours - (1.0 - availability) * 8_760.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_environment_scales_rate() {
        let onshore = estimate_availability(&pump_rate(), "onshore", &StressInputs::default());
        let offshore = estimate_availability(&pump_rate(), "offshore", &StressInputs::default());

        assert!((offshore.effective_failures_per_year - 0.78).abs() < 1e-12);
        assert!(offshore.availability < onshore.availability);
        assert_eq!(offshore.environment_factor, 1.5);
    }

    #[test]
    fn test_zero_rate_degenerates() {
        let mut rate = pump_rate();
        rate.failures_per_year = 0.0;
        let estimate = estimate_availability(&rate, "onshore", &StressInputs::default());
        assert_eq!(estimate.mtbf_hours, 8_760.0);
    }
}
