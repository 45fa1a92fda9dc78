//! RMS velocity aggregation over directional vibration readings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The three orthogonal velocity channels of a reading (mm/s)
///
/// Absent channels are readings the logger never took; they are skipped,
/// not treated as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityChannels {
    pub vel_v: Option<f64>,
    pub vel_h: Option<f64>,
    pub vel_axl: Option<f64>,
}

impl VelocityChannels {
    pub fn new(vel_v: Option<f64>, vel_h: Option<f64>, vel_axl: Option<f64>) -> Self {
        Self {
            vel_v,
            vel_h,
            vel_axl,
        }
    }
}

/// RMS velocity with how many channels contributed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RmsResult {
    /// Root-mean-square velocity in mm/s
    pub value: f64,
    /// Number of channels that carried a value (0..=3)
    pub channels_used: usize,
}

/// Errors from the vibration pipeline
#[derive(Debug, Error, PartialEq)]
pub enum VibrationError {
    #[error("channel '{channel}' holds a non-finite value ({value})")]
    NonFiniteChannel { channel: &'static str, value: f64 },

    #[error("RMS velocity is not a number")]
    NotANumber,

    #[error("RMS velocity is negative ({0} mm/s)")]
    NegativeRms(f64),
}

/// Root-mean-square of the velocity channels that carry a value.
///
/// All channels absent is a defined case (value 0, zero channels used), so
/// "no data" and "zero reading" stay distinguishable through
/// `channels_used`. A channel that is present but non-finite is an error.
pub fn rms_velocity(channels: &VelocityChannels) -> Result<RmsResult, VibrationError> {
    let named = [
        ("vel_v", channels.vel_v),
        ("vel_h", channels.vel_h),
        ("vel_axl", channels.vel_axl),
    ];

    let mut sum_sq = 0.0;
    let mut used = 0usize;

    for (channel, value) in named {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(VibrationError::NonFiniteChannel { channel, value: v });
            }
            sum_sq += v * v;
            used += 1;
        }
    }

    if used == 0 {
        return Ok(RmsResult {
            value: 0.0,
            channels_used: 0,
        });
    }

    Ok(RmsResult {
        value: (sum_sq / used as f64).sqrt(),
        channels_used: used,
    })
}
