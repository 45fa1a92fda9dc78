//! Equipment health scoring, risk assessment and maintenance advice
//!
//! Health is a weighted 0-100 composite of vibration, temperature, age and
//! maintenance-recency components. Risk inverts the health components and
//! mixes in duty and environment factors. Both feed the maintenance
//! priority formula.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analytics::HOURS_PER_YEAR;
use crate::core::Criticality;

const VIBRATION_WEIGHT: f64 = 0.30;
const TEMPERATURE_WEIGHT: f64 = 0.25;
const AGE_WEIGHT: f64 = 0.25;
const MAINTENANCE_WEIGHT: f64 = 0.20;

/// Operating hours at which the duty risk factor saturates
const DUTY_SATURATION_HOURS: f64 = 200_000.0;

/// Inputs the health composite is computed from
#[derive(Debug, Clone, Default)]
pub struct HealthInputs {
    /// Latest analyzed RMS velocity, mm/s
    pub vibration_rms: Option<f64>,
    /// Operating temperature, Celsius
    pub temperature: Option<f64>,
    pub operating_hours: f64,
    /// Days since the last recorded maintenance; None if never maintained
    pub days_since_maintenance: Option<i64>,
}

/// Status band for a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            HealthStatus::Excellent
        } else if score >= 80.0 {
            HealthStatus::Good
        } else if score >= 70.0 {
            HealthStatus::Fair
        } else if score >= 60.0 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthStatus::Excellent | HealthStatus::Good => "green",
            HealthStatus::Fair => "yellow",
            HealthStatus::Poor => "orange",
            HealthStatus::Critical => "red",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthStatus::Excellent => "excellent",
            HealthStatus::Good => "good",
            HealthStatus::Fair => "fair",
            HealthStatus::Poor => "poor",
            HealthStatus::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Per-component scores. Vibration and temperature are None when the
/// equipment has no data for them; their weight is then redistributed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthComponents {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub age: f64,
    pub maintenance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub status: HealthStatus,
    pub components: HealthComponents,
}

/// Weighted composite over the present components. An absent component's
/// weight is spread over the rest, so a machine without temperature data
/// is not silently scored as if it ran cold.
pub fn health_score(inputs: &HealthInputs) -> HealthScore {
    let components = HealthComponents {
        vibration: inputs.vibration_rms.map(vibration_component),
        temperature: inputs.temperature.map(temperature_component),
        age: age_component(inputs.operating_hours),
        maintenance: maintenance_component(inputs.days_since_maintenance),
    };

    let weighted = [
        (VIBRATION_WEIGHT, components.vibration),
        (TEMPERATURE_WEIGHT, components.temperature),
        (AGE_WEIGHT, Some(components.age)),
        (MAINTENANCE_WEIGHT, Some(components.maintenance)),
    ];

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (weight, value) in weighted {
        if let Some(value) = value {
            total += weight * value;
            weight_sum += weight;
        }
    }
    let score = total / weight_sum;

    HealthScore {
        score,
        status: HealthStatus::from_score(score),
        components,
    }
}

fn vibration_component(rms: f64) -> f64 {
    if rms < 2.8 {
        100.0
    } else if rms < 4.5 {
        85.0
    } else if rms < 7.1 {
        70.0
    } else if rms < 11.2 {
        50.0
    } else {
        20.0
    }
}

fn temperature_component(temperature: f64) -> f64 {
    if temperature < 60.0 {
        100.0
    } else if temperature < 75.0 {
        90.0
    } else if temperature < 85.0 {
        75.0
    } else if temperature < 95.0 {
        60.0
    } else {
        30.0
    }
}

fn age_component(operating_hours: f64) -> f64 {
    let years = operating_hours / HOURS_PER_YEAR;
    if years < 5.0 {
        100.0
    } else if years < 10.0 {
        85.0
    } else if years < 15.0 {
        70.0
    } else if years < 20.0 {
        55.0
    } else {
        40.0
    }
}

fn maintenance_component(days_since: Option<i64>) -> f64 {
    let Some(days) = days_since else {
        // No maintenance history at all scores neutral
        return 50.0;
    };
    if days < 30 {
        100.0
    } else if days < 90 {
        85.0
    } else if days < 180 {
        70.0
    } else if days < 365 {
        55.0
    } else {
        40.0
    }
}

/// Risk level bands over the weighted risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            RiskLevel::Critical
        } else if score > 60.0 {
            RiskLevel::High
        } else if score > 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Immediate maintenance required",
            RiskLevel::High => "Schedule preventive maintenance",
            RiskLevel::Medium => "Monitor equipment condition",
            RiskLevel::Low => "Equipment in good condition",
        }
    }

    pub fn mitigation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Schedule emergency maintenance",
            RiskLevel::High => "Increase monitoring frequency",
            RiskLevel::Medium => "Regular inspections",
            RiskLevel::Low => "Continue normal operations",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskLevel::Low => "green",
            RiskLevel::Medium => "yellow",
            RiskLevel::High => "orange",
            RiskLevel::Critical => "red",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{}", s)
    }
}

/// Individual 0-100 risk factor values that went into the score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub operating_hours: f64,
    pub age: f64,
    pub criticality: f64,
    pub environment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: RiskFactors,
    pub recommendation: String,
    pub mitigation: String,
}

/// Weighted risk over six factors: vibration 0.25, temperature 0.20,
/// operating hours 0.15, age 0.15, criticality 0.15, environment 0.10.
/// Factors without data are dropped and the remaining weights renormalized,
/// mirroring the health composite.
///
/// `environment_multiplier` is the calibration's OREDA factor for the
/// equipment's environment (onshore 1.0 contributes zero risk).
pub fn assess_risk(
    health: &HealthScore,
    operating_hours: f64,
    criticality: Criticality,
    environment_multiplier: f64,
) -> RiskAssessment {
    let factors = RiskFactors {
        vibration: health.components.vibration.map(|c| 100.0 - c),
        temperature: health.components.temperature.map(|c| 100.0 - c),
        operating_hours: (operating_hours / DUTY_SATURATION_HOURS * 100.0).clamp(0.0, 100.0),
        age: 100.0 - health.components.age,
        criticality: criticality.weight() / 4.0 * 100.0,
        environment: ((environment_multiplier - 1.0) * 100.0).clamp(0.0, 100.0),
    };

    let weighted = [
        (0.25, factors.vibration),
        (0.20, factors.temperature),
        (0.15, Some(factors.operating_hours)),
        (0.15, Some(factors.age)),
        (0.15, Some(factors.criticality)),
        (0.10, Some(factors.environment)),
    ];

    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for (weight, value) in weighted {
        if let Some(value) = value {
            total += weight * value;
            weight_sum += weight;
        }
    }
    let score = total / weight_sum;
    let level = RiskLevel::from_score(score);

    RiskAssessment {
        score,
        level,
        factors,
        recommendation: level.recommendation().to_string(),
        mitigation: level.mitigation().to_string(),
    }
}

/// Maintenance action class recommended for a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaintenanceType {
    Preventive,
    Predictive,
    Corrective,
    Emergency,
}

impl MaintenanceType {
    pub fn from_health(score: f64) -> Self {
        if score < 60.0 {
            MaintenanceType::Emergency
        } else if score < 70.0 {
            MaintenanceType::Corrective
        } else if score < 80.0 {
            MaintenanceType::Predictive
        } else {
            MaintenanceType::Preventive
        }
    }
}

impl std::fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MaintenanceType::Preventive => "preventive",
            MaintenanceType::Predictive => "predictive",
            MaintenanceType::Corrective => "corrective",
            MaintenanceType::Emergency => "emergency",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceAdvice {
    /// (100 - health) x criticality weight x urgency
    pub priority: f64,
    pub maintenance_type: MaintenanceType,
    pub interval_days: i64,
    pub next_due: NaiveDate,
    pub days_until_due: i64,
}

/// Maintenance recommendation for one equipment. `today` is passed in so
/// results are reproducible.
pub fn maintenance_advice(
    health: &HealthScore,
    criticality: Criticality,
    last_maintenance: Option<NaiveDate>,
    today: NaiveDate,
) -> MaintenanceAdvice {
    let interval_days = recommended_interval_days(health.score);
    let anchor = last_maintenance.unwrap_or(today);
    let next_due = anchor + chrono::Duration::days(interval_days);
    let days_until_due = (next_due - today).num_days();

    // Overdue equipment is pinned at maximum urgency
    let urgency = (30.0 / days_until_due.max(1) as f64).max(1.0);
    let priority = (100.0 - health.score) * criticality.weight() * urgency;

    MaintenanceAdvice {
        priority,
        maintenance_type: MaintenanceType::from_health(health.score),
        interval_days,
        next_due,
        days_until_due,
    }
}

fn recommended_interval_days(health: f64) -> i64 {
    if health < 60.0 {
        7
    } else if health < 70.0 {
        14
    } else if health < 80.0 {
        30
    } else {
        90
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_component_bands() {
        assert_eq!(vibration_component(2.0), 100.0);
        assert_eq!(vibration_component(2.8), 85.0);
        assert_eq!(vibration_component(7.0), 70.0);
        assert_eq!(vibration_component(11.2), 20.0);

        assert_eq!(temperature_component(59.9), 100.0);
        assert_eq!(temperature_component(60.0), 90.0);
        assert_eq!(temperature_component(95.0), 30.0);

        // 5 years is exactly 43800 h
        assert_eq!(age_component(43_799.0), 100.0);
        assert_eq!(age_component(43_800.0), 85.0);
        assert_eq!(age_component(200_000.0), 40.0);

        assert_eq!(maintenance_component(Some(29)), 100.0);
        assert_eq!(maintenance_component(Some(364)), 55.0);
        assert_eq!(maintenance_component(Some(400)), 40.0);
        assert_eq!(maintenance_component(None), 50.0);
    }

    #[test]
    fn test_health_composite_all_present() {
        let health = health_score(&HealthInputs {
            vibration_rms: Some(5.0),
            temperature: Some(80.0),
            operating_hours: 100_000.0,
            days_since_maintenance: Some(200),
        });

        // 70*0.30 + 75*0.25 + 70*0.25 + 55*0.20
        assert!((health.score - 68.25).abs() < 1e-9);
        assert_eq!(health.status, HealthStatus::Poor);
        assert_eq!(health.components.vibration, Some(70.0));
        assert_eq!(health.components.maintenance, 55.0);
    }

    #[test]
    fn test_health_redistributes_missing_weight() {
        let health = health_score(&HealthInputs {
            vibration_rms: None,
            temperature: Some(55.0),
            operating_hours: 10_000.0,
            days_since_maintenance: None,
        });

        // (100*0.25 + 100*0.25 + 50*0.20) / 0.70
        assert!((health.score - 60.0 / 0.7).abs() < 1e-9);
        assert_eq!(health.status, HealthStatus::Good);
        assert!(health.components.vibration.is_none());
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(HealthStatus::from_score(90.0), HealthStatus::Excellent);
        assert_eq!(HealthStatus::from_score(89.99), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(80.0), HealthStatus::Good);
        assert_eq!(HealthStatus::from_score(70.0), HealthStatus::Fair);
        assert_eq!(HealthStatus::from_score(60.0), HealthStatus::Poor);
        assert_eq!(HealthStatus::from_score(59.9), HealthStatus::Critical);
    }

    #[test]
    fn test_risk_weighted_score() {
        let health = health_score(&HealthInputs {
            vibration_rms: Some(5.0),
            temperature: Some(80.0),
            operating_hours: 100_000.0,
            days_since_maintenance: Some(10),
        });

        let risk = assess_risk(&health, 100_000.0, Criticality::High, 1.5);

        // 30*0.25 + 25*0.20 + 50*0.15 + 30*0.15 + 75*0.15 + 50*0.10
        assert!((risk.score - 40.75).abs() < 1e-9);
        assert_eq!(risk.level, RiskLevel::Medium);
        assert_eq!(risk.recommendation, "Monitor equipment condition");
        assert_eq!(risk.factors.criticality, 75.0);
        assert_eq!(risk.factors.environment, 50.0);
    }

    #[test]
    fn test_risk_factor_clamps() {
        let health = health_score(&HealthInputs {
            vibration_rms: Some(1.0),
            temperature: Some(40.0),
            operating_hours: 500_000.0,
            days_since_maintenance: Some(10),
        });

        let risk = assess_risk(&health, 500_000.0, Criticality::Low, 2.8);
        assert_eq!(risk.factors.operating_hours, 100.0);
        assert_eq!(risk.factors.environment, 100.0);
        // Onshore multiplier contributes nothing
        let onshore = assess_risk(&health, 0.0, Criticality::Low, 1.0);
        assert_eq!(onshore.factors.environment, 0.0);
    }

    #[test]
    fn test_risk_level_bands() {
        assert_eq!(RiskLevel::from_score(81.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Low);
    }

    #[test]
    fn test_maintenance_advice_overdue() {
        let health = health_score(&HealthInputs {
            vibration_rms: Some(12.0),
            temperature: Some(100.0),
            operating_hours: 200_000.0,
            days_since_maintenance: Some(400),
        });
        assert!(health.score < 60.0);

        let advice = maintenance_advice(
            &health,
            Criticality::Critical,
            Some(date(2026, 1, 1)),
            date(2026, 1, 10),
        );

        assert_eq!(advice.maintenance_type, MaintenanceType::Emergency);
        assert_eq!(advice.interval_days, 7);
        assert_eq!(advice.next_due, date(2026, 1, 8));
        assert_eq!(advice.days_until_due, -2);
        // Overdue pins urgency at 30
        let expected = (100.0 - health.score) * 4.0 * 30.0;
        assert!((advice.priority - expected).abs() < 1e-9);
    }

    #[test]
    fn test_maintenance_advice_healthy() {
        let health = health_score(&HealthInputs {
            vibration_rms: Some(1.0),
            temperature: Some(40.0),
            operating_hours: 1_000.0,
            days_since_maintenance: Some(10),
        });

        let advice =
            maintenance_advice(&health, Criticality::Medium, None, date(2026, 6, 1));

        assert_eq!(advice.maintenance_type, MaintenanceType::Preventive);
        assert_eq!(advice.interval_days, 90);
        // Never maintained anchors the schedule at today
        assert_eq!(advice.next_due, date(2026, 8, 30));
        assert_eq!(advice.days_until_due, 90);
        // 90 days out means urgency 1
        let expected = (100.0 - health.score) * 2.0;
        assert!((advice.priority - expected).abs() < 1e-9);
    }
}
