//! Template generation for new entities

use chrono::{DateTime, NaiveDate, Utc};
use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

use crate::core::identity::EntityId;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

/// Context for template generation
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub id: EntityId,
    pub author: String,
    pub created: DateTime<Utc>,
    pub title: Option<String>,
    pub tags: Vec<String>,
    // EQP fields
    pub tag: Option<String>,
    pub category: Option<String>,
    pub subtype: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub location: Option<String>,
    pub criticality: Option<String>,
    pub environment: Option<String>,
    pub commissioned: Option<NaiveDate>,
    pub operating_hours: Option<f64>,
    // RDG fields
    pub equipment_id: Option<EntityId>,
    pub measurement_point: Option<String>,
    pub taken_at: Option<DateTime<Utc>>,
    pub channels: Vec<(String, f64)>,
    // FLR fields
    pub failure_mode: Option<String>,
    pub occurred_at: Option<NaiveDate>,
    pub hours_at_failure: Option<f64>,
    pub downtime_hours: Option<f64>,
}

impl TemplateContext {
    pub fn new(id: EntityId, author: String) -> Self {
        Self {
            id,
            author,
            created: Utc::now(),
            title: None,
            tags: Vec::new(),
            tag: None,
            category: None,
            subtype: None,
            manufacturer: None,
            model: None,
            location: None,
            criticality: None,
            environment: None,
            commissioned: None,
            operating_hours: None,
            equipment_id: None,
            measurement_point: None,
            taken_at: None,
            channels: Vec::new(),
            failure_mode: None,
            occurred_at: None,
            hours_at_failure: None,
            downtime_hours: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_criticality(mut self, criticality: impl Into<String>) -> Self {
        self.criticality = Some(criticality.into());
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn with_commissioned(mut self, date: NaiveDate) -> Self {
        self.commissioned = Some(date);
        self
    }

    pub fn with_operating_hours(mut self, hours: f64) -> Self {
        self.operating_hours = Some(hours);
        self
    }

    pub fn with_equipment(mut self, id: EntityId) -> Self {
        self.equipment_id = Some(id);
        self
    }

    pub fn with_measurement_point(mut self, point: impl Into<String>) -> Self {
        self.measurement_point = Some(point.into());
        self
    }

    pub fn with_taken_at(mut self, at: DateTime<Utc>) -> Self {
        self.taken_at = Some(at);
        self
    }

    pub fn with_channel(mut self, name: impl Into<String>, value: f64) -> Self {
        self.channels.push((name.into(), value));
        self
    }

    pub fn with_failure_mode(mut self, mode: impl Into<String>) -> Self {
        self.failure_mode = Some(mode.into());
        self
    }

    pub fn with_occurred_at(mut self, date: NaiveDate) -> Self {
        self.occurred_at = Some(date);
        self
    }

    pub fn with_hours_at_failure(mut self, hours: f64) -> Self {
        self.hours_at_failure = Some(hours);
        self
    }

    pub fn with_downtime_hours(mut self, hours: f64) -> Self {
        self.downtime_hours = Some(hours);
        self
    }
}

/// Template generator using Tera
pub struct TemplateGenerator {
    tera: Tera,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),
}

impl TemplateGenerator {
    /// Create a new template generator with embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        // Load embedded templates
        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template_str) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template_str)
                        .map_err(|e| TemplateError::RenderError(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    /// Generate an equipment template
    pub fn generate_equipment(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("id", &ctx.id.to_string());
        context.insert("author", &ctx.author);
        context.insert("created", &ctx.created.to_rfc3339());
        context.insert("title", &ctx.title.clone().unwrap_or_default());
        context.insert("tag", &ctx.tag.clone().unwrap_or_default());
        context.insert(
            "category",
            &ctx.category.clone().unwrap_or_else(|| "pump".to_string()),
        );
        context.insert("subtype", &ctx.subtype.clone().unwrap_or_default());
        context.insert(
            "manufacturer",
            &ctx.manufacturer.clone().unwrap_or_default(),
        );
        context.insert("model", &ctx.model.clone().unwrap_or_default());
        context.insert("location", &ctx.location.clone().unwrap_or_default());
        context.insert(
            "criticality",
            &ctx.criticality
                .clone()
                .unwrap_or_else(|| "medium".to_string()),
        );
        context.insert(
            "environment",
            &ctx.environment
                .clone()
                .unwrap_or_else(|| "onshore".to_string()),
        );
        context.insert("commissioned_line", &commissioned_line(ctx.commissioned));
        context.insert("operating_hours", &ctx.operating_hours.unwrap_or(0.0));
        context.insert("tags", &format_tags(&ctx.tags));

        // Try to use embedded template, fall back to hardcoded
        if self
            .tera
            .get_template_names()
            .any(|n| n == "equipment.yaml.tera")
        {
            self.tera
                .render("equipment.yaml.tera", &context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            Ok(self.hardcoded_equipment_template(ctx))
        }
    }

    /// Generate a reading template
    pub fn generate_reading(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("id", &ctx.id.to_string());
        context.insert("author", &ctx.author);
        context.insert("created", &ctx.created.to_rfc3339());
        context.insert(
            "equipment",
            &ctx.equipment_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        context.insert(
            "measurement_point",
            &ctx.measurement_point.clone().unwrap_or_default(),
        );
        context.insert(
            "taken_at",
            &ctx.taken_at.unwrap_or(ctx.created).to_rfc3339(),
        );
        context.insert("channels_block", &channels_block(&ctx.channels));
        context.insert("tags", &format_tags(&ctx.tags));

        if self
            .tera
            .get_template_names()
            .any(|n| n == "reading.yaml.tera")
        {
            self.tera
                .render("reading.yaml.tera", &context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            Ok(self.hardcoded_reading_template(ctx))
        }
    }

    /// Generate a failure event template
    pub fn generate_failure(&self, ctx: &TemplateContext) -> Result<String, TemplateError> {
        let mut context = tera::Context::new();
        context.insert("id", &ctx.id.to_string());
        context.insert("author", &ctx.author);
        context.insert("created", &ctx.created.to_rfc3339());
        context.insert(
            "equipment",
            &ctx.equipment_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        context.insert(
            "failure_mode",
            &ctx.failure_mode.clone().unwrap_or_default(),
        );
        context.insert(
            "occurred_at",
            &ctx.occurred_at
                .unwrap_or_else(|| ctx.created.date_naive())
                .format("%Y-%m-%d")
                .to_string(),
        );
        context.insert("hours_at_failure", &ctx.hours_at_failure.unwrap_or(0.0));
        context.insert("downtime_line", &downtime_line(ctx.downtime_hours));
        context.insert("tags", &format_tags(&ctx.tags));

        if self
            .tera
            .get_template_names()
            .any(|n| n == "failure.yaml.tera")
        {
            self.tera
                .render("failure.yaml.tera", &context)
                .map_err(|e| TemplateError::RenderError(e.to_string()))
        } else {
            Ok(self.hardcoded_failure_template(ctx))
        }
    }

    fn hardcoded_equipment_template(&self, ctx: &TemplateContext) -> String {
        let title = ctx.title.clone().unwrap_or_default();
        let tag = ctx.tag.clone().unwrap_or_default();
        let category = ctx.category.clone().unwrap_or_else(|| "pump".to_string());
        let criticality = ctx
            .criticality
            .clone()
            .unwrap_or_else(|| "medium".to_string());
        let environment = ctx
            .environment
            .clone()
            .unwrap_or_else(|| "onshore".to_string());
        let created = ctx.created.to_rfc3339();

        format!(
            r#"# Equipment: {title}
# Created by MRT - Machine Reliability Toolkit

id: {id}
tag: "{tag}"
title: "{title}"
category: {category}
subtype: "{subtype}"
manufacturer: "{manufacturer}"
model: "{model}"
location: "{location}"

criticality: {criticality}
environment: {environment}
{commissioned_line}
operating_hours: {operating_hours}

# Operating vs rated service conditions drive stress derating:
# service:
#   operating_temperature: 65.0
#   rated_temperature: 80.0
#   operating_vibration: 2.4
#   rated_vibration: 4.5
#   operating_duty_hours: 6000
#   rated_duty_hours: 8760

# last_maintenance: 2026-01-15   # YYYY-MM-DD

tags: {tags}
status: active

links:
  readings: []       # Readings taken on this equipment
  failures: []       # Failure events recorded against it

# Auto-managed metadata
created: {created}
author: {author}
entity_revision: 1
"#,
            id = ctx.id,
            tag = tag,
            title = title,
            category = category,
            subtype = ctx.subtype.clone().unwrap_or_default(),
            manufacturer = ctx.manufacturer.clone().unwrap_or_default(),
            model = ctx.model.clone().unwrap_or_default(),
            location = ctx.location.clone().unwrap_or_default(),
            criticality = criticality,
            environment = environment,
            commissioned_line = commissioned_line(ctx.commissioned),
            operating_hours = ctx.operating_hours.unwrap_or(0.0),
            tags = format_tags(&ctx.tags),
            created = created,
            author = ctx.author,
        )
    }

    fn hardcoded_reading_template(&self, ctx: &TemplateContext) -> String {
        format!(
            r#"# Reading: {measurement_point}
# Created by MRT - Machine Reliability Toolkit

id: {id}
equipment: "{equipment}"
measurement_point: "{measurement_point}"
taken_at: {taken_at}

# Velocity channels (vel_*, brg_v) are mm/s RMS, acceleration (acc_*) is
# m/s^2, brg_gap is micrometers, temp is degrees C
{channels_block}

notes: ""

tags: {tags}

# Auto-managed metadata
created: {created}
author: {author}
entity_revision: 1
"#,
            id = ctx.id,
            equipment = ctx
                .equipment_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            measurement_point = ctx.measurement_point.clone().unwrap_or_default(),
            taken_at = ctx.taken_at.unwrap_or(ctx.created).to_rfc3339(),
            channels_block = channels_block(&ctx.channels),
            tags = format_tags(&ctx.tags),
            created = ctx.created.to_rfc3339(),
            author = ctx.author,
        )
    }

    fn hardcoded_failure_template(&self, ctx: &TemplateContext) -> String {
        format!(
            r#"# Failure: {failure_mode}
# Created by MRT - Machine Reliability Toolkit

id: {id}
equipment: "{equipment}"
occurred_at: {occurred_at}
hours_at_failure: {hours_at_failure}
failure_mode: "{failure_mode}"

cause: ""
{downtime_line}
description: ""

resolution: open

tags: {tags}

# Auto-managed metadata
created: {created}
author: {author}
entity_revision: 1
"#,
            id = ctx.id,
            equipment = ctx
                .equipment_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            occurred_at = ctx
                .occurred_at
                .unwrap_or_else(|| ctx.created.date_naive())
                .format("%Y-%m-%d"),
            hours_at_failure = ctx.hours_at_failure.unwrap_or(0.0),
            failure_mode = ctx.failure_mode.clone().unwrap_or_default(),
            downtime_line = downtime_line(ctx.downtime_hours),
            tags = format_tags(&ctx.tags),
            created = ctx.created.to_rfc3339(),
            author = ctx.author,
        )
    }
}

/// Format a tag list as inline YAML
fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "[]".to_string()
    } else {
        format!("[{}]", tags.join(", "))
    }
}

/// Commissioned date line, commented out when no date is known
fn commissioned_line(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!("commissioned: {}", d.format("%Y-%m-%d")),
        None => "# commissioned: 2020-01-01     # YYYY-MM-DD".to_string(),
    }
}

/// Downtime line, commented out when unknown
fn downtime_line(hours: Option<f64>) -> String {
    match hours {
        Some(h) => format!("downtime_hours: {}", h),
        None => "# downtime_hours: 0.0".to_string(),
    }
}

/// Channels block with measured values, or an empty map plus guidance
fn channels_block(channels: &[(String, f64)]) -> String {
    if channels.is_empty() {
        return concat!(
            "channels: {}\n",
            "# Example:\n",
            "#   vel_v: 2.1          # vertical velocity\n",
            "#   vel_h: 2.4          # horizontal velocity\n",
            "#   vel_axl: 1.8        # axial velocity\n",
            "#   temp: 61.5          # surface temperature"
        )
        .to_string();
    }

    let mut block = String::from("channels:");
    for (name, value) in channels {
        block.push_str(&format!("\n  {}: {}", name, value));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EntityPrefix;
    use crate::entities::{Equipment, FailureEvent, Reading};
    use crate::schema::validator::Validator;

    #[test]
    fn test_equipment_template_generates_valid_yaml() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Eqp), "test".to_string())
            .with_tag("P-101")
            .with_title("Main feed pump")
            .with_category("pump")
            .with_subtype("centrifugal")
            .with_criticality("high");

        let yaml = generator.generate_equipment(&ctx).unwrap();

        // Should be valid YAML
        let parsed: serde_yml::Value = serde_yml::from_str(&yaml).unwrap();
        assert!(parsed.get("id").is_some());
        assert_eq!(parsed.get("tag").unwrap().as_str(), Some("P-101"));
        assert_eq!(parsed.get("category").unwrap().as_str(), Some("pump"));
        assert_eq!(parsed.get("criticality").unwrap().as_str(), Some("high"));
    }

    #[test]
    fn test_equipment_template_loads_and_validates() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Eqp), "test".to_string())
            .with_tag("P-101")
            .with_title("Main feed pump")
            .with_category("pump")
            .with_operating_hours(20000.0);

        let yaml = generator.generate_equipment(&ctx).unwrap();

        let eqp: Equipment = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(eqp.tag, "P-101");
        assert_eq!(eqp.operating_hours, 20000.0);

        let validator = Validator::default();
        let result = validator.validate(&yaml, "scaffold.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_ok(), "Scaffold should pass its schema: {:?}", result);
    }

    #[test]
    fn test_reading_template_with_channels() {
        let generator = TemplateGenerator::new().unwrap();
        let equipment = EntityId::new(EntityPrefix::Eqp);
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Rdg), "test".to_string())
            .with_equipment(equipment.clone())
            .with_measurement_point("DE bearing")
            .with_channel("vel_v", 2.1)
            .with_channel("vel_h", 2.4)
            .with_channel("temp", 61.5);

        let yaml = generator.generate_reading(&ctx).unwrap();

        let rdg: Reading = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(rdg.equipment, equipment);
        assert_eq!(rdg.channels.vel_v, Some(2.1));
        assert_eq!(rdg.channels.temp, Some(61.5));
        assert_eq!(rdg.channels.vel_axl, None);

        let validator = Validator::default();
        let result = validator.validate(&yaml, "scaffold.mrt.yaml", EntityPrefix::Rdg);
        assert!(result.is_ok(), "Scaffold should pass its schema: {:?}", result);
    }

    #[test]
    fn test_reading_template_without_channels() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Rdg), "test".to_string())
            .with_equipment(EntityId::new(EntityPrefix::Eqp))
            .with_measurement_point("NDE bearing");

        let yaml = generator.generate_reading(&ctx).unwrap();

        let rdg: Reading = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(rdg.channels.present_count(), 0);
    }

    #[test]
    fn test_failure_template_loads() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Flr), "test".to_string())
            .with_equipment(EntityId::new(EntityPrefix::Eqp))
            .with_failure_mode("bearing seizure")
            .with_hours_at_failure(18500.0)
            .with_downtime_hours(36.0);

        let yaml = generator.generate_failure(&ctx).unwrap();

        let flr: FailureEvent = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(flr.failure_mode, "bearing seizure");
        assert_eq!(flr.hours_at_failure, 18500.0);
        assert_eq!(flr.downtime_hours, Some(36.0));
        assert!(flr.is_open());

        let validator = Validator::default();
        let result = validator.validate(&yaml, "scaffold.mrt.yaml", EntityPrefix::Flr);
        assert!(result.is_ok(), "Scaffold should pass its schema: {:?}", result);
    }

    #[test]
    fn test_hardcoded_fallback_matches_embedded_shape() {
        let generator = TemplateGenerator::new().unwrap();
        let ctx = TemplateContext::new(EntityId::new(EntityPrefix::Eqp), "test".to_string())
            .with_tag("C-201")
            .with_title("Export compressor")
            .with_category("compressor");

        let fallback = generator.hardcoded_equipment_template(&ctx);
        let eqp: Equipment = serde_yml::from_str(&fallback).unwrap();
        assert_eq!(eqp.tag, "C-201");
    }
}
