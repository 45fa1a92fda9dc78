//! Entity trait - common interface for all entity types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::EntityId;

/// Common trait for all MRT entities
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix (e.g., "EQP", "RDG")
    const PREFIX: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the entity's title
    fn title(&self) -> &str;

    /// Get the entity's status
    fn status(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;

    /// Get the author
    fn author(&self) -> &str;
}

/// Status values common across entity types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Status {
    #[default]
    Active,
    Standby,
    Maintenance,
    Decommissioned,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Standby => write!(f, "standby"),
            Status::Maintenance => write!(f, "maintenance"),
            Status::Decommissioned => write!(f, "decommissioned"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "standby" => Ok(Status::Standby),
            "maintenance" => Ok(Status::Maintenance),
            "decommissioned" => Ok(Status::Decommissioned),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Criticality ranking for equipment
///
/// The numeric weight feeds the risk and maintenance-priority scores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Criticality {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Criticality {
    /// Multiplier used by risk and priority scoring (1..=4)
    pub fn weight(&self) -> f64 {
        match self {
            Criticality::Low => 1.0,
            Criticality::Medium => 2.0,
            Criticality::High => 3.0,
            Criticality::Critical => 4.0,
        }
    }
}

impl std::fmt::Display for Criticality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Criticality::Low => write!(f, "low"),
            Criticality::Medium => write!(f, "medium"),
            Criticality::High => write!(f, "high"),
            Criticality::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Criticality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Criticality::Low),
            "medium" => Ok(Criticality::Medium),
            "high" => Ok(Criticality::High),
            "critical" => Ok(Criticality::Critical),
            _ => Err(format!("Unknown criticality: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criticality_weight_ordering() {
        assert!(Criticality::Low.weight() < Criticality::Medium.weight());
        assert!(Criticality::Medium.weight() < Criticality::High.weight());
        assert!(Criticality::High.weight() < Criticality::Critical.weight());
        assert_eq!(Criticality::Critical.weight(), 4.0);
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["active", "standby", "maintenance", "decommissioned"] {
            let parsed: Status = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("retired".parse::<Status>().is_err());
    }
}
