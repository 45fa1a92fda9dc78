//! Reading entity - one condition measurement at a machine point
//!
//! A reading records up to nine data-logger channels for a measurement
//! point. `rdg analyze` derives RMS velocity and the severity zone from
//! the velocity channels and stamps the calibration it ran with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::calibration::{Calibration, CalibrationStamp};
use crate::analytics::vibration::{rms_velocity, VelocityChannels, VibrationError};
use crate::analytics::zones::{classify, Zone};
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// The nine optional data-logger channels of one measurement.
///
/// Channels the logger never took are absent, not zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Channels {
    /// Vertical velocity, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vel_v: Option<f64>,

    /// Horizontal velocity, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vel_h: Option<f64>,

    /// Axial velocity, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vel_axl: Option<f64>,

    /// Vertical acceleration, m/s²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_v: Option<f64>,

    /// Horizontal acceleration, m/s²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_h: Option<f64>,

    /// Axial acceleration, m/s²
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acc_axl: Option<f64>,

    /// Bearing housing velocity, mm/s RMS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brg_v: Option<f64>,

    /// Bearing gap, micrometers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brg_gap: Option<f64>,

    /// Surface temperature, Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
}

impl Channels {
    /// The velocity subset that RMS aggregation runs over
    pub fn velocity(&self) -> VelocityChannels {
        VelocityChannels::new(self.vel_v, self.vel_h, self.vel_axl)
    }

    /// Number of channels carrying a value (0..=9)
    pub fn present_count(&self) -> usize {
        [
            self.vel_v,
            self.vel_h,
            self.vel_axl,
            self.acc_v,
            self.acc_h,
            self.acc_axl,
            self.brg_v,
            self.brg_gap,
            self.temp,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

/// Derived block attached by `rdg analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingAnalysis {
    /// RMS velocity over the present velocity channels, mm/s
    pub rms_velocity: f64,

    /// Velocity channels that contributed (0..=3)
    pub channels_used: usize,

    /// Severity zone of the RMS value
    pub zone: Zone,

    /// Calibration the zone bands came from
    pub calibration: CalibrationStamp,
}

/// Reading entity - one measurement at one point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Unique identifier (RDG-...)
    pub id: EntityId,

    /// Equipment this reading belongs to
    pub equipment: EntityId,

    /// Measurement point on the machine (e.g. pump-nde)
    pub measurement_point: String,

    /// When the measurement was taken
    pub taken_at: DateTime<Utc>,

    /// Recorded channel values
    #[serde(default)]
    pub channels: Channels,

    /// Derived RMS/zone block, present after `rdg analyze`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ReadingAnalysis>,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Classification tags
    #[serde(default)]
    pub tags: Vec<String>,

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

impl Entity for Reading {
    const PREFIX: &'static str = "RDG";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.measurement_point
    }

    fn status(&self) -> &str {
        if self.analysis.is_some() {
            "analyzed"
        } else {
            "pending"
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Reading {
    /// Create a new reading for an equipment's measurement point
    pub fn new(
        equipment: EntityId,
        measurement_point: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Rdg),
            equipment,
            measurement_point: measurement_point.into(),
            taken_at: now,
            channels: Channels::default(),
            analysis: None,
            notes: None,
            tags: Vec::new(),
            created: now,
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Derive RMS velocity and severity zone and stamp the calibration.
    ///
    /// Replaces any earlier analysis block. Fails on a present non-finite
    /// velocity channel, leaving the stored block untouched.
    pub fn analyze(&mut self, calibration: &Calibration) -> Result<ReadingAnalysis, VibrationError> {
        let rms = rms_velocity(&self.channels.velocity())?;
        let zone = classify(rms.value, &calibration.zone_bands)?;
        let analysis = ReadingAnalysis {
            rms_velocity: rms.value,
            channels_used: rms.channels_used,
            zone,
            calibration: calibration.stamp(),
        };
        self.analysis = Some(analysis.clone());
        Ok(analysis)
    }
}
