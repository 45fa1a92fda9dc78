//! Versioned analytics tables
//!
//! Zone thresholds, Weibull parameter entries and base failure rates live in
//! a calibration artifact (`.mrt/calibration.yaml`) loaded at runtime. A
//! shipped copy is embedded so a project works before anyone calibrates it.
//! Analysis results are stamped with the calibration version and digest so
//! stale results can be found after a recalibration.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::analytics::weibull::{WeibullError, WeibullParams};
use crate::analytics::zones::ZoneBands;

#[derive(Embed)]
#[folder = "calibration/"]
struct EmbeddedCalibration;

const SHIPPED_FILE: &str = "default.yaml";

/// Length of the digest prefix used in stamps
const STAMP_DIGEST_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Failed to read calibration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Calibration YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("Zone bands must be finite, positive and strictly increasing")]
    UnorderedBands,

    #[error("Weibull entry {category}/{manufacturer}: {source}")]
    BadEntry {
        category: String,
        manufacturer: String,
        #[source]
        source: WeibullError,
    },

    #[error("Default Weibull parameters: {0}")]
    BadDefault(#[source] WeibullError),

    #[error("No base failure rate for category '{category}' subtype '{subtype}'")]
    UnknownBaseRate { category: String, subtype: String },

    #[error("Embedded default calibration is missing")]
    MissingShipped,
}

/// One calibrated Weibull row, keyed by equipment category and manufacturer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeibullEntry {
    pub category: String,
    pub manufacturer: String,
    pub shape: f64,
    pub scale: f64,
    #[serde(default)]
    pub location: f64,
}

/// Weibull lookup table: calibrated entries plus the fallback triple
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeibullTable {
    pub default: WeibullParams,
    #[serde(default)]
    pub entries: Vec<WeibullEntry>,
}

/// OREDA-style base failure rate for a category/subtype pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseFailureRate {
    pub category: String,
    pub subtype: String,
    /// Failures per year per unit in a reference environment
    pub failures_per_year: f64,
    /// Mean time to repair in hours
    pub repair_hours: f64,
    /// Multipliers keyed by environment name (onshore, offshore, harsh)
    pub environment_factors: BTreeMap<String, f64>,
}

impl BaseFailureRate {
    /// Environment multiplier; unknown environment names multiply by 1.0
    pub fn environment_factor(&self, environment: &str) -> f64 {
        self.environment_factors
            .get(&environment.to_ascii_lowercase())
            .copied()
            .unwrap_or(1.0)
    }
}

/// Result of a parameter lookup. `used_fallback` is persisted downstream so
/// calibrated and default-derived figures stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamLookup {
    pub params: WeibullParams,
    pub used_fallback: bool,
}

/// Version and content digest a result was computed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationStamp {
    pub version: String,
    pub digest: String,
}

impl CalibrationStamp {
    pub fn matches(&self, calibration: &Calibration) -> bool {
        *self == calibration.stamp()
    }
}

impl std::fmt::Display for CalibrationStamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.version, self.digest)
    }
}

/// The full calibration artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calibration {
    pub version: String,
    pub calibrated_at: NaiveDate,
    pub zone_bands: ZoneBands,
    pub weibull: WeibullTable,
    #[serde(default)]
    pub base_failure_rates: Vec<BaseFailureRate>,
}

impl Calibration {
    /// The copy embedded in the binary
    pub fn shipped() -> Result<Self, CalibrationError> {
        let file =
            EmbeddedCalibration::get(SHIPPED_FILE).ok_or(CalibrationError::MissingShipped)?;
        let content = String::from_utf8_lossy(file.data.as_ref());
        Self::parse(&content)
    }

    /// Load and validate from a file
    pub fn load(path: &Path) -> Result<Self, CalibrationError> {
        let content = std::fs::read_to_string(path).map_err(|source| CalibrationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Project calibration when present, shipped defaults otherwise
    pub fn load_or_shipped(path: &Path) -> Result<Self, CalibrationError> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::shipped()
        }
    }

    fn parse(content: &str) -> Result<Self, CalibrationError> {
        let calibration: Calibration = serde_yml::from_str(content)?;
        calibration.validate()?;
        Ok(calibration)
    }

    pub fn write(&self, path: &Path) -> Result<(), CalibrationError> {
        let content = serde_yml::to_string(self)?;
        std::fs::write(path, content).map_err(|source| CalibrationError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), CalibrationError> {
        if !self.zone_bands.is_ordered() {
            return Err(CalibrationError::UnorderedBands);
        }
        self.weibull
            .default
            .validate()
            .map_err(CalibrationError::BadDefault)?;
        for entry in &self.weibull.entries {
            WeibullParams::new(entry.shape, entry.scale, entry.location).map_err(|source| {
                CalibrationError::BadEntry {
                    category: entry.category.clone(),
                    manufacturer: entry.manufacturer.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    /// SHA-256 of the canonical serialized form
    pub fn digest(&self) -> String {
        let content = serde_yml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    pub fn stamp(&self) -> CalibrationStamp {
        let mut digest = self.digest();
        digest.truncate(STAMP_DIGEST_LEN);
        CalibrationStamp {
            version: self.version.clone(),
            digest,
        }
    }

    /// Weibull parameters for an equipment, falling back to the default
    /// triple when no entry matches. Matching is case-insensitive.
    pub fn weibull_for(&self, category: &str, manufacturer: &str) -> ParamLookup {
        for entry in &self.weibull.entries {
            if entry.category.eq_ignore_ascii_case(category)
                && entry.manufacturer.eq_ignore_ascii_case(manufacturer)
            {
                return ParamLookup {
                    params: WeibullParams {
                        shape: entry.shape,
                        scale: entry.scale,
                        location: entry.location,
                    },
                    used_fallback: false,
                };
            }
        }
        ParamLookup {
            params: self.weibull.default,
            used_fallback: true,
        }
    }

    /// Base failure rate for a category/subtype pair. No fallback here: an
    /// availability figure without a base rate would be meaningless.
    pub fn base_rate_for(
        &self,
        category: &str,
        subtype: &str,
    ) -> Result<&BaseFailureRate, CalibrationError> {
        self.base_failure_rates
            .iter()
            .find(|rate| {
                rate.category.eq_ignore_ascii_case(category)
                    && rate.subtype.eq_ignore_ascii_case(subtype)
            })
            .ok_or_else(|| CalibrationError::UnknownBaseRate {
                category: category.to_string(),
                subtype: subtype.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Calibration {
        Calibration {
            version: "test-1".to_string(),
            calibrated_at: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            zone_bands: ZoneBands::default(),
            weibull: WeibullTable {
                default: WeibullParams::new(2.5, 80_000.0, 0.0).unwrap(),
                entries: vec![WeibullEntry {
                    category: "pump".to_string(),
                    manufacturer: "HMS".to_string(),
                    shape: 2.8,
                    scale: 87_600.0,
                    location: 0.0,
                }],
            },
            base_failure_rates: vec![BaseFailureRate {
                category: "pump".to_string(),
                subtype: "centrifugal".to_string(),
                failures_per_year: 0.52,
                repair_hours: 8_760.0,
                environment_factors: BTreeMap::from([
                    ("offshore".to_string(), 1.5),
                    ("onshore".to_string(), 1.0),
                    ("harsh".to_string(), 2.0),
                ]),
            }],
        }
    }

    #[test]
    fn test_shipped_calibration_loads() {
        let calibration = Calibration::shipped().unwrap();
        assert!(!calibration.version.is_empty());
        assert_eq!(calibration.zone_bands, ZoneBands::default());
        assert_eq!(calibration.weibull.default.shape, 2.5);
        assert_eq!(calibration.weibull.default.scale, 80_000.0);
        assert!(!calibration.base_failure_rates.is_empty());
    }

    #[test]
    fn test_lookup_hit_and_fallback() {
        let calibration = sample();

        let hit = calibration.weibull_for("pump", "HMS");
        assert!(!hit.used_fallback);
        assert_eq!(hit.params.shape, 2.8);
        assert_eq!(hit.params.scale, 87_600.0);

        // Case-insensitive match
        let hit = calibration.weibull_for("PUMP", "hms");
        assert!(!hit.used_fallback);

        let miss = calibration.weibull_for("pump", "Unknown Corp");
        assert!(miss.used_fallback);
        assert_eq!(miss.params, calibration.weibull.default);
    }

    #[test]
    fn test_base_rate_lookup() {
        let calibration = sample();

        let rate = calibration.base_rate_for("pump", "centrifugal").unwrap();
        assert_eq!(rate.failures_per_year, 0.52);
        assert_eq!(rate.environment_factor("offshore"), 1.5);
        assert_eq!(rate.environment_factor("ONSHORE"), 1.0);
        // Unknown environments do not scale the rate
        assert_eq!(rate.environment_factor("desert"), 1.0);

        assert!(matches!(
            calibration.base_rate_for("pump", "screw"),
            Err(CalibrationError::UnknownBaseRate { .. })
        ));
    }

    #[test]
    fn test_digest_tracks_content() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.digest(), b.digest());

        b.zone_bands.c_upper = 11.2;
        assert_ne!(a.digest(), b.digest());

        assert_eq!(a.stamp().digest.len(), STAMP_DIGEST_LEN);
        assert!(a.stamp().matches(&a));
        assert!(!b.stamp().matches(&a));
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut unordered = sample();
        unordered.zone_bands.b_upper = 0.5;
        assert!(matches!(
            unordered.validate(),
            Err(CalibrationError::UnorderedBands)
        ));

        let mut bad_entry = sample();
        bad_entry.weibull.entries[0].shape = -1.0;
        assert!(matches!(
            bad_entry.validate(),
            Err(CalibrationError::BadEntry { .. })
        ));
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.yaml");

        let original = sample();
        original.write(&path).unwrap();

        let loaded = Calibration::load(&path).unwrap();
        assert_eq!(loaded.version, original.version);
        assert_eq!(loaded.digest(), original.digest());
        assert!(!loaded.weibull_for("pump", "HMS").used_fallback);
    }

    #[test]
    fn test_load_or_shipped_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("calibration.yaml");

        let calibration = Calibration::load_or_shipped(&missing).unwrap();
        assert_eq!(calibration.version, Calibration::shipped().unwrap().version);
    }
}
