//! Entity type definitions
//!
//! MRT tracks three entity types:
//!
//! - [`Equipment`] - Assets under monitoring, with nameplate data and
//!   stored analysis results
//! - [`Reading`] - Condition measurements with derived RMS and zone
//! - [`FailureEvent`] - Failure history feeding parameter estimation and
//!   Pareto reporting

pub mod equipment;
pub mod failure;
pub mod reading;

pub use equipment::Equipment;
pub use failure::FailureEvent;
pub use reading::Reading;
