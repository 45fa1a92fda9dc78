//! Failure event entity
//!
//! One record per failure of an equipment. Failure ages feed Weibull
//! parameter estimation (`eqp fit`) and modes feed the Pareto report.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Resolution state of a failure record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Failure not yet closed out
    Open,
    /// Repaired and returned to service
    Resolved,
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Open
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Open => write!(f, "open"),
            Resolution::Resolved => write!(f, "resolved"),
        }
    }
}

/// Failure event entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureEvent {
    /// Unique identifier (FLR-...)
    pub id: EntityId,

    /// Equipment that failed
    pub equipment: EntityId,

    /// Date the failure occurred
    pub occurred_at: NaiveDate,

    /// Cumulative operating hours at the moment of failure
    pub hours_at_failure: f64,

    /// Failure mode (e.g. "Bearing Failure")
    pub failure_mode: String,

    /// Root cause, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,

    /// Hours of downtime the failure caused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downtime_hours: Option<f64>,

    /// Narrative description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Resolution state
    #[serde(default)]
    pub resolution: Resolution,

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

impl Entity for FailureEvent {
    const PREFIX: &'static str = "FLR";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.failure_mode
    }

    fn status(&self) -> &str {
        match self.resolution {
            Resolution::Open => "open",
            Resolution::Resolved => "resolved",
        }
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl FailureEvent {
    /// Create a new failure event
    pub fn new(
        equipment: EntityId,
        failure_mode: impl Into<String>,
        hours_at_failure: f64,
        author: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Flr),
            equipment,
            occurred_at: now.date_naive(),
            hours_at_failure,
            failure_mode: failure_mode.into(),
            cause: None,
            downtime_hours: None,
            description: None,
            resolution: Resolution::default(),
            tags: Vec::new(),
            created: now,
            author: author.into(),
            entity_revision: 1,
        }
    }

    pub fn is_open(&self) -> bool {
        self.resolution == Resolution::Open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_roundtrip() {
        let flr = FailureEvent::new(
            EntityId::new(EntityPrefix::Eqp),
            "Bearing Failure",
            18_500.0,
            "test",
        );

        let yaml = serde_yml::to_string(&flr).unwrap();
        let parsed: FailureEvent = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(flr.id, parsed.id);
        assert_eq!(parsed.failure_mode, "Bearing Failure");
        assert_eq!(parsed.hours_at_failure, 18_500.0);
        assert_eq!(parsed.resolution, Resolution::Open);
    }

    #[test]
    fn test_failure_serializes_resolution() {
        let mut flr = FailureEvent::new(
            EntityId::new(EntityPrefix::Eqp),
            "Seal Leak",
            9_200.0,
            "test",
        );
        flr.resolution = Resolution::Resolved;

        let yaml = serde_yml::to_string(&flr).unwrap();
        assert!(yaml.contains("resolution: resolved"));
    }

    #[test]
    fn test_failure_title_is_mode() {
        let flr = FailureEvent::new(
            EntityId::new(EntityPrefix::Eqp),
            "Impeller Erosion",
            30_000.0,
            "test",
        );
        assert_eq!(flr.title(), "Impeller Erosion");
        assert!(flr.is_open());
        assert_eq!(flr.status(), "open");
    }
}
