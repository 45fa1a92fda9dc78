//! Pure reliability analytics
//!
//! Everything in here is synchronous, deterministic (seeded where random)
//! and free of I/O. Calibration tables are passed in by the command layer;
//! nothing reads files or module-level lookup constants.

pub mod availability;
pub mod calibration;
pub mod health;
pub mod math;
pub mod pareto;
pub mod simulation;
pub mod trend;
pub mod vibration;
pub mod weibull;
pub mod zones;

/// Hours in a non-leap year; the annualization base throughout
pub const HOURS_PER_YEAR: f64 = 8760.0;

pub use calibration::{Calibration, CalibrationError, CalibrationStamp, ParamLookup};
pub use vibration::{RmsResult, VelocityChannels, VibrationError};
pub use weibull::{Distribution, FailurePattern, WeibullError, WeibullFit, WeibullParams};
pub use zones::{Zone, ZoneBands};
