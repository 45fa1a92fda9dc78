//! Equipment entity - an asset under reliability monitoring
//!
//! Carries the nameplate and service data the analytics need (category,
//! manufacturer, environment, stress ratings) plus an `analysis_results`
//! bundle populated by `eqp analyze`, `eqp simulate` and `eqp fit`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::availability::{estimate_availability, AvailabilityEstimate, StressInputs};
use crate::analytics::calibration::{Calibration, CalibrationStamp, ParamLookup};
use crate::analytics::health::{
    assess_risk, health_score, maintenance_advice, HealthInputs, HealthScore, MaintenanceAdvice,
    RiskAssessment,
};
use crate::analytics::simulation::{simulate_lives, SimulationResult};
use crate::analytics::weibull::{Distribution, FailurePattern, WeibullFit, WeibullParams};
use crate::core::entity::{Criticality, Entity, Status};
use crate::core::identity::{EntityId, EntityPrefix};

/// Equipment category, the first key of the calibration lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pump,
    Motor,
    Compressor,
    Valve,
}

impl Default for Category {
    fn default() -> Self {
        Category::Pump
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pump => "pump",
            Category::Motor => "motor",
            Category::Compressor => "compressor",
            Category::Valve => "valve",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pump" => Ok(Category::Pump),
            "motor" => Ok(Category::Motor),
            "compressor" => Ok(Category::Compressor),
            "valve" => Ok(Category::Valve),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Installation environment, mapped to a failure-rate multiplier by the
/// calibration tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Onshore,
    Offshore,
    Harsh,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::Onshore
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Onshore => "onshore",
            Environment::Offshore => "offshore",
            Environment::Harsh => "harsh",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onshore" => Ok(Environment::Onshore),
            "offshore" => Ok(Environment::Offshore),
            "harsh" => Ok(Environment::Harsh),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

/// Rated versus actual service conditions, used for stress derating
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ServiceConditions {
    /// Actual operating temperature in Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_temperature: Option<f64>,

    /// Nameplate rated temperature in Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_temperature: Option<f64>,

    /// Typical vibration level in service, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_vibration: Option<f64>,

    /// Design vibration level, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_vibration: Option<f64>,

    /// Actual annual duty in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_duty_hours: Option<f64>,

    /// Design annual duty in hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_duty_hours: Option<f64>,
}

impl ServiceConditions {
    /// Operating/rated pairs in the form the availability model takes
    pub fn stress_inputs(&self) -> StressInputs {
        StressInputs {
            operating_temperature: self.operating_temperature,
            rated_temperature: self.rated_temperature,
            operating_vibration: self.operating_vibration,
            rated_vibration: self.rated_vibration,
            operating_duty_hours: self.operating_duty_hours,
            rated_duty_hours: self.rated_duty_hours,
        }
    }
}

/// Weibull analysis snapshot for one equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeibullAnalysis {
    /// Parameters the run used
    pub params: WeibullParams,

    /// True when no calibration entry matched and the default triple was used
    pub used_fallback: bool,

    /// Hazard-shape class implied by the shape parameter
    pub pattern: FailurePattern,

    /// Mean time to failure in hours
    pub mttf_hours: f64,

    /// Hours by which 10% of the population has failed
    pub b10_life: f64,

    /// Median life in hours
    pub b50_life: f64,

    /// Hours by which 90% of the population has failed
    pub b90_life: f64,

    /// Survival probability at the current operating hours
    pub reliability_now: f64,

    /// Hours left until the B90 life, floored at zero
    pub remaining_useful_life: f64,

    /// Calibration the run was stamped with
    pub calibration: CalibrationStamp,
}

impl WeibullAnalysis {
    fn compute(lookup: ParamLookup, operating_hours: f64, stamp: CalibrationStamp) -> Self {
        let dist = Distribution::new(lookup.params);
        let b90 = dist.b90();
        Self {
            params: lookup.params,
            used_fallback: lookup.used_fallback,
            pattern: dist.failure_pattern(),
            mttf_hours: dist.mttf(),
            b10_life: dist.b10(),
            b50_life: dist.b50(),
            b90_life: b90,
            reliability_now: dist.reliability(operating_hours),
            remaining_useful_life: (b90 - operating_hours).max(0.0),
            calibration: stamp,
        }
    }
}

/// Combined analysis results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentAnalysis {
    /// Weibull reliability snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weibull: Option<WeibullAnalysis>,

    /// Health composite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<HealthScore>,

    /// Risk assessment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskAssessment>,

    /// Availability estimate (requires a base failure rate for the
    /// category/subtype pair)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<AvailabilityEstimate>,

    /// Maintenance recommendation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<MaintenanceAdvice>,

    /// Monte Carlo life simulation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationResult>,

    /// Parameter fit from this equipment's failure history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fit: Option<WeibullFit>,
}

impl EquipmentAnalysis {
    /// True when no analysis has been run yet
    pub fn is_empty(&self) -> bool {
        self.weibull.is_none()
            && self.health.is_none()
            && self.risk.is_none()
            && self.availability.is_none()
            && self.maintenance.is_none()
            && self.simulation.is_none()
            && self.fit.is_none()
    }
}

/// Equipment links
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentLinks {
    /// Readings taken on this equipment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readings: Vec<EntityId>,

    /// Failure events recorded against this equipment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<EntityId>,
}

/// Equipment entity - asset under monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    /// Unique identifier (EQP-...)
    pub id: EntityId,

    /// Plant tag (e.g. P-101)
    pub tag: String,

    /// Equipment title/name
    pub title: String,

    /// Equipment category
    pub category: Category,

    /// Subtype within the category (e.g. centrifugal), the second key of
    /// the base failure-rate lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Manufacturer, the second key of the Weibull parameter lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Model designation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Physical location (area, skid, room)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Criticality ranking
    #[serde(default)]
    pub criticality: Criticality,

    /// Installation environment
    #[serde(default)]
    pub environment: Environment,

    /// Commissioning date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commissioned: Option<NaiveDate>,

    /// Cumulative operating hours
    #[serde(default)]
    pub operating_hours: f64,

    /// Rated versus actual service conditions
    #[serde(default)]
    pub service: ServiceConditions,

    /// Date of the last completed maintenance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<NaiveDate>,

    /// Fitted Weibull parameters applied via `eqp fit --apply`; these
    /// override the calibration lookup for later analyses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitted_params: Option<WeibullParams>,

    /// Analysis results (auto-calculated)
    #[serde(default)]
    pub analysis_results: EquipmentAnalysis,

    /// Classification tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Current status
    #[serde(default)]
    pub status: Status,

    /// Links to other entities
    #[serde(default)]
    pub links: EquipmentLinks,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author name
    pub author: String,

    /// Revision counter
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Equipment {
    const PREFIX: &'static str = "EQP";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn status(&self) -> &str {
        match self.status {
            Status::Active => "active",
            Status::Standby => "standby",
            Status::Maintenance => "maintenance",
            Status::Decommissioned => "decommissioned",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Eqp),
            tag: String::new(),
            title: String::new(),
            category: Category::default(),
            subtype: None,
            manufacturer: None,
            model: None,
            location: None,
            criticality: Criticality::default(),
            environment: Environment::default(),
            commissioned: None,
            operating_hours: 0.0,
            service: ServiceConditions::default(),
            last_maintenance: None,
            fitted_params: None,
            analysis_results: EquipmentAnalysis::default(),
            tags: Vec::new(),
            status: Status::default(),
            links: EquipmentLinks::default(),
            created: Utc::now(),
            author: String::new(),
            entity_revision: 1,
        }
    }
}

impl Equipment {
    /// Create a new equipment with tag, title and category
    pub fn new(
        tag: impl Into<String>,
        title: impl Into<String>,
        category: Category,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Eqp),
            tag: tag.into(),
            title: title.into(),
            category,
            author: author.into(),
            created: Utc::now(),
            ..Default::default()
        }
    }

    /// Days since the last maintenance; None if never maintained
    pub fn days_since_maintenance(&self, today: NaiveDate) -> Option<i64> {
        self.last_maintenance.map(|date| (today - date).num_days())
    }

    /// Parameters `analyze` and `simulate` run with: fitted parameters when
    /// applied, otherwise the calibration lookup for category+manufacturer
    pub fn weibull_lookup(&self, calibration: &Calibration) -> ParamLookup {
        match self.fitted_params {
            Some(params) => ParamLookup {
                params,
                used_fallback: false,
            },
            None => calibration.weibull_for(
                self.category.as_str(),
                self.manufacturer.as_deref().unwrap_or(""),
            ),
        }
    }

    /// Run all analyses and store the results.
    ///
    /// `latest_rms` is the most recent analyzed RMS velocity for this
    /// equipment, when any reading exists. `today` anchors the age and
    /// maintenance calculations so runs are reproducible.
    pub fn analyze(&mut self, calibration: &Calibration, latest_rms: Option<f64>, today: NaiveDate) {
        let lookup = self.weibull_lookup(calibration);
        self.analysis_results.weibull = Some(WeibullAnalysis::compute(
            lookup,
            self.operating_hours,
            calibration.stamp(),
        ));

        let health = health_score(&HealthInputs {
            vibration_rms: latest_rms,
            temperature: self.service.operating_temperature,
            operating_hours: self.operating_hours,
            days_since_maintenance: self.days_since_maintenance(today),
        });

        // Availability needs a base failure rate; without a subtype or a
        // matching calibration row it stays empty.
        let base_rate = self
            .subtype
            .as_deref()
            .and_then(|subtype| calibration.base_rate_for(self.category.as_str(), subtype).ok());

        let environment_factor = base_rate
            .map(|rate| rate.environment_factor(self.environment.as_str()))
            .unwrap_or(1.0);

        self.analysis_results.risk = Some(assess_risk(
            &health,
            self.operating_hours,
            self.criticality,
            environment_factor,
        ));
        self.analysis_results.availability = base_rate.map(|rate| {
            estimate_availability(rate, self.environment.as_str(), &self.service.stress_inputs())
        });
        self.analysis_results.maintenance = Some(maintenance_advice(
            &health,
            self.criticality,
            self.last_maintenance,
            today,
        ));
        self.analysis_results.health = Some(health);
    }

    /// Monte Carlo life simulation using the same parameter lookup as
    /// `analyze`
    pub fn simulate(&mut self, calibration: &Calibration, samples: usize, seed: Option<u64>) {
        let lookup = self.weibull_lookup(calibration);
        self.analysis_results.simulation = Some(simulate_lives(&lookup.params, samples, seed));
    }

    /// Store a parameter fit; with `apply` the fitted parameters override
    /// the calibration lookup for later analyses
    pub fn record_fit(&mut self, fit: WeibullFit, apply: bool) {
        if apply {
            self.fitted_params = Some(fit.params);
        }
        self.analysis_results.fit = Some(fit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pump() -> Equipment {
        let mut eqp = Equipment::new("P-101", "Main Cooling Pump", Category::Pump, "test");
        eqp.manufacturer = Some("HMS".to_string());
        eqp.subtype = Some("centrifugal".to_string());
        eqp.operating_hours = 20_000.0;
        eqp
    }

    #[test]
    fn test_equipment_roundtrip() {
        let eqp = pump();
        let yaml = serde_yml::to_string(&eqp).unwrap();
        let parsed: Equipment = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(eqp.id, parsed.id);
        assert_eq!(eqp.tag, parsed.tag);
        assert_eq!(parsed.category, Category::Pump);
        assert_eq!(parsed.operating_hours, 20_000.0);
    }

    #[test]
    fn test_equipment_serializes_category_lowercase() {
        let eqp = pump();
        let yaml = serde_yml::to_string(&eqp).unwrap();
        assert!(yaml.contains("category: pump"));
        assert!(yaml.contains("environment: onshore"));
    }

    #[test]
    fn test_analyze_with_calibrated_parameters() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        eqp.analyze(&calibration, Some(2.0), date(2026, 8, 24));

        let weibull = eqp.analysis_results.weibull.as_ref().unwrap();
        assert!(!weibull.used_fallback);
        assert_eq!(weibull.params.shape, 2.8);
        assert_eq!(weibull.params.scale, 87_600.0);
        assert_eq!(weibull.pattern, FailurePattern::WearOut);
        assert!(weibull.b10_life < weibull.b50_life);
        assert!(weibull.b50_life < weibull.b90_life);
        assert!(
            (weibull.remaining_useful_life - (weibull.b90_life - 20_000.0)).abs() < 1e-9
        );
        assert!(weibull.reliability_now > 0.0 && weibull.reliability_now < 1.0);
        assert!(weibull.calibration.matches(&calibration));

        assert!(eqp.analysis_results.health.is_some());
        assert!(eqp.analysis_results.risk.is_some());
        assert!(eqp.analysis_results.maintenance.is_some());

        let availability = eqp.analysis_results.availability.as_ref().unwrap();
        assert_eq!(availability.environment_factor, 1.0);
        assert!(availability.availability > 0.0 && availability.availability <= 1.0);
    }

    #[test]
    fn test_analyze_unknown_manufacturer_uses_fallback() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        eqp.manufacturer = Some("Unknown GmbH".to_string());
        eqp.analyze(&calibration, None, date(2026, 8, 24));

        let weibull = eqp.analysis_results.weibull.as_ref().unwrap();
        assert!(weibull.used_fallback);
        assert_eq!(weibull.params, calibration.weibull.default);
    }

    #[test]
    fn test_analyze_without_subtype_skips_availability() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        eqp.subtype = None;
        eqp.analyze(&calibration, Some(2.0), date(2026, 8, 24));

        assert!(eqp.analysis_results.availability.is_none());
        // Risk still runs, with a neutral environment factor
        let risk = eqp.analysis_results.risk.as_ref().unwrap();
        assert_eq!(risk.factors.environment, 0.0);
    }

    #[test]
    fn test_analyze_offshore_environment_factor() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        eqp.environment = Environment::Offshore;
        eqp.analyze(&calibration, Some(2.0), date(2026, 8, 24));

        let availability = eqp.analysis_results.availability.as_ref().unwrap();
        assert_eq!(availability.environment_factor, 1.5);
    }

    #[test]
    fn test_fitted_params_override_lookup() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        let fit =
            WeibullFit::from_failure_ages(&[8_000.0, 12_000.0, 16_000.0, 20_000.0]).unwrap();
        eqp.record_fit(fit, true);
        eqp.analyze(&calibration, None, date(2026, 8, 24));

        let weibull = eqp.analysis_results.weibull.as_ref().unwrap();
        assert_eq!(weibull.params, fit.params);
        assert!(!weibull.used_fallback);
        assert_eq!(eqp.analysis_results.fit, Some(fit));
    }

    #[test]
    fn test_record_fit_without_apply_keeps_lookup() {
        let calibration = Calibration::shipped().unwrap();
        let mut eqp = pump();
        let fit =
            WeibullFit::from_failure_ages(&[8_000.0, 12_000.0, 16_000.0, 20_000.0]).unwrap();
        eqp.record_fit(fit, false);

        assert!(eqp.fitted_params.is_none());
        let lookup = eqp.weibull_lookup(&calibration);
        assert_eq!(lookup.params.shape, 2.8);
    }

    #[test]
    fn test_simulate_is_reproducible_with_seed() {
        let calibration = Calibration::shipped().unwrap();
        let mut a = pump();
        let mut b = pump();
        a.simulate(&calibration, 500, Some(42));
        b.simulate(&calibration, 500, Some(42));

        let sim_a = a.analysis_results.simulation.unwrap();
        let sim_b = b.analysis_results.simulation.unwrap();
        assert_eq!(sim_a.mean, sim_b.mean);
        assert_eq!(sim_a.samples, 500);
    }

    #[test]
    fn test_days_since_maintenance() {
        let mut eqp = pump();
        assert_eq!(eqp.days_since_maintenance(date(2026, 8, 24)), None);

        eqp.last_maintenance = Some(date(2026, 8, 1));
        assert_eq!(eqp.days_since_maintenance(date(2026, 8, 24)), Some(23));
    }

    #[test]
    fn test_analysis_bundle_empty_until_analyzed() {
        let eqp = pump();
        assert!(eqp.analysis_results.is_empty());
    }
}
