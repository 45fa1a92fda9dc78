//! ISO 10816 vibration severity zones

use serde::{Deserialize, Serialize};

use crate::analytics::vibration::VibrationError;

/// Severity zones ordered least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    A,
    B,
    C,
    D,
}

impl Zone {
    /// Advisory label shown next to the zone letter
    pub fn label(&self) -> &'static str {
        match self {
            Zone::A => "Good",
            Zone::B => "Satisfactory",
            Zone::C => "Unsatisfactory",
            Zone::D => "Unacceptable",
        }
    }

    /// Presentation color for badges and styled output
    pub fn color(&self) -> &'static str {
        match self {
            Zone::A => "green",
            Zone::B => "yellow",
            Zone::C => "orange",
            Zone::D => "red",
        }
    }

    /// Numeric severity rank (0 = least severe)
    pub fn severity(&self) -> u8 {
        match self {
            Zone::A => 0,
            Zone::B => 1,
            Zone::C => 2,
            Zone::D => 3,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::A => write!(f, "A"),
            Zone::B => write!(f, "B"),
            Zone::C => write!(f, "C"),
            Zone::D => write!(f, "D"),
        }
    }
}

/// Upper bounds of zones A, B and C in mm/s; zone D is everything above.
///
/// Bands are contiguous and a boundary value belongs to the less severe
/// zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBands {
    pub a_upper: f64,
    pub b_upper: f64,
    pub c_upper: f64,
}

impl ZoneBands {
    /// Check that bounds are finite, positive and strictly increasing
    pub fn is_ordered(&self) -> bool {
        self.a_upper.is_finite()
            && self.b_upper.is_finite()
            && self.c_upper.is_finite()
            && self.a_upper > 0.0
            && self.a_upper < self.b_upper
            && self.b_upper < self.c_upper
    }
}

impl Default for ZoneBands {
    fn default() -> Self {
        Self {
            a_upper: 1.8,
            b_upper: 4.5,
            c_upper: 7.1,
        }
    }
}

/// Classify an RMS velocity into its severity zone.
///
/// Scans the ordered bands and returns the first whose upper bound is >=
/// the value, so exact boundary values land in the less severe zone. NaN
/// and negative values are rejected; 0 is zone A.
pub fn classify(rms: f64, bands: &ZoneBands) -> Result<Zone, VibrationError> {
    if rms.is_nan() {
        return Err(VibrationError::NotANumber);
    }
    if rms < 0.0 {
        return Err(VibrationError::NegativeRms(rms));
    }

    if rms <= bands.a_upper {
        Ok(Zone::A)
    } else if rms <= bands.b_upper {
        Ok(Zone::B)
    } else if rms <= bands.c_upper {
        Ok(Zone::C)
    } else {
        Ok(Zone::D)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries_belong_to_lower_zone() {
        let bands = ZoneBands::default();
        assert_eq!(classify(1.8, &bands).unwrap(), Zone::A);
        assert_eq!(classify(1.8000001, &bands).unwrap(), Zone::B);
        assert_eq!(classify(4.5, &bands).unwrap(), Zone::B);
        assert_eq!(classify(7.1, &bands).unwrap(), Zone::C);
        assert_eq!(classify(7.100001, &bands).unwrap(), Zone::D);
    }

    #[test]
    fn test_classify_zero_is_zone_a() {
        assert_eq!(classify(0.0, &ZoneBands::default()).unwrap(), Zone::A);
    }

    #[test]
    fn test_classify_monotonic_severity() {
        let bands = ZoneBands::default();
        let samples = [0.0, 0.5, 1.8, 1.9, 3.0, 4.5, 4.6, 7.0, 7.1, 7.2, 50.0];
        let mut last = Zone::A;
        for rms in samples {
            let zone = classify(rms, &bands).unwrap();
            assert!(
                zone.severity() >= last.severity(),
                "severity dropped at rms={}",
                rms
            );
            last = zone;
        }
    }

    #[test]
    fn test_classify_rejects_nan_and_negative() {
        let bands = ZoneBands::default();
        assert_eq!(
            classify(f64::NAN, &bands).unwrap_err(),
            VibrationError::NotANumber
        );
        assert!(matches!(
            classify(-0.1, &bands).unwrap_err(),
            VibrationError::NegativeRms(_)
        ));
    }

    #[test]
    fn test_classify_respects_custom_bands() {
        // Class III machine bands, wider than the defaults
        let bands = ZoneBands {
            a_upper: 4.5,
            b_upper: 11.2,
            c_upper: 18.0,
        };
        assert_eq!(classify(4.0, &bands).unwrap(), Zone::A);
        assert_eq!(classify(10.0, &bands).unwrap(), Zone::B);
        assert_eq!(classify(17.9, &bands).unwrap(), Zone::C);
        assert_eq!(classify(18.1, &bands).unwrap(), Zone::D);
    }

    #[test]
    fn test_zone_labels() {
        assert_eq!(Zone::A.label(), "Good");
        assert_eq!(Zone::B.label(), "Satisfactory");
        assert_eq!(Zone::C.label(), "Unsatisfactory");
        assert_eq!(Zone::D.label(), "Unacceptable");
    }

    #[test]
    fn test_band_ordering_check() {
        assert!(ZoneBands::default().is_ordered());
        assert!(!ZoneBands {
            a_upper: 4.5,
            b_upper: 1.8,
            c_upper: 7.1
        }
        .is_ordered());
        assert!(!ZoneBands {
            a_upper: f64::NAN,
            b_upper: 4.5,
            c_upper: 7.1
        }
        .is_ordered());
    }
}
