//! Schema validation with detailed error reporting

use jsonschema::{validator_for, ValidationError as JsonSchemaError, Validator as JsonValidator};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::core::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// Validation error with source location information
#[derive(Debug, Error, Diagnostic)]
#[error("Schema validation failed: {summary}")]
#[diagnostic(code(mrt::schema::validation_error))]
pub struct ValidationError {
    summary: String,

    #[source_code]
    src: NamedSource<String>,

    #[related]
    violations: Vec<SchemaViolation>,
}

/// A single schema violation
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct SchemaViolation {
    #[label("{}", self.hint)]
    span: SourceSpan,

    message: String,
    hint: String,

    #[help]
    help: Option<String>,
}

impl SchemaViolation {
    pub fn new(message: String, hint: String, span: SourceSpan, help: Option<String>) -> Self {
        Self {
            span,
            message,
            hint,
            help,
        }
    }

    /// The violation message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl ValidationError {
    pub fn new(filename: &str, source: &str, violations: Vec<SchemaViolation>) -> Self {
        let count = violations.len();
        let summary = if count == 1 {
            "1 error".to_string()
        } else {
            format!("{} errors", count)
        };
        Self {
            summary,
            src: NamedSource::new(filename, source.to_string()),
            violations,
        }
    }

    /// Get the number of violations
    pub fn violation_count(&self) -> usize {
        self.violations.len()
    }

    /// The individual violations
    pub fn violations(&self) -> &[SchemaViolation] {
        &self.violations
    }
}

/// Schema validator with compiled schemas
pub struct Validator {
    /// Compiled JSON schemas by entity prefix
    compiled: HashMap<EntityPrefix, JsonValidator>,
}

impl Validator {
    /// Create a new validator with schemas from the registry
    pub fn new(registry: &SchemaRegistry) -> Self {
        let mut compiled = HashMap::new();

        for prefix in EntityPrefix::all() {
            if let Some(schema_str) = registry.get(*prefix) {
                if let Ok(schema_json) = serde_json::from_str::<JsonValue>(schema_str) {
                    if let Ok(compiled_schema) = validator_for(&schema_json) {
                        compiled.insert(*prefix, compiled_schema);
                    }
                }
            }
        }

        Self { compiled }
    }

    /// Validate YAML content against the schema for the given entity type,
    /// collecting every violation
    pub fn validate(
        &self,
        content: &str,
        filename: &str,
        prefix: EntityPrefix,
    ) -> Result<(), ValidationError> {
        // First parse YAML to JSON value
        let yaml_value: serde_yml::Value = match serde_yml::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                // YAML parse error - convert to validation error
                let span = find_error_span(content, e.location());
                let violation = SchemaViolation::new(
                    format!("YAML parse error: {}", e),
                    "invalid YAML".to_string(),
                    span,
                    Some("Check YAML syntax - proper indentation, colons, quotes".to_string()),
                );
                return Err(ValidationError::new(filename, content, vec![violation]));
            }
        };

        // Convert YAML value to JSON value for schema validation
        let json_value: JsonValue = match serde_json::to_value(&yaml_value) {
            Ok(v) => v,
            Err(e) => {
                let violation = SchemaViolation::new(
                    format!("Failed to convert YAML to JSON: {}", e),
                    "conversion error".to_string(),
                    (0, content.len()).into(),
                    None,
                );
                return Err(ValidationError::new(filename, content, vec![violation]));
            }
        };

        // No schema registered - validation passes (schema optional)
        let Some(schema) = self.compiled.get(&prefix) else {
            return Ok(());
        };

        let violations: Vec<SchemaViolation> = schema
            .iter_errors(&json_value)
            .map(|e| error_to_violation(content, &e))
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(filename, content, violations))
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        let registry = SchemaRegistry::default();
        Self::new(&registry)
    }
}

/// Convert a JSON Schema validation error to our violation format
fn error_to_violation(content: &str, error: &JsonSchemaError) -> SchemaViolation {
    let path = error.instance_path.to_string();
    let message = format_schema_error(error);
    let hint = format_error_hint(error);
    let help = generate_help_message(error);

    // Try to find the span in the YAML where this error occurred
    let span = find_path_span(content, &path);

    SchemaViolation::new(message, hint, span, help)
}

/// Format a JSON Schema error into a user-friendly message
fn format_schema_error(error: &JsonSchemaError) -> String {
    let path = if error.instance_path.as_str().is_empty() {
        "document root".to_string()
    } else {
        format!("'{}'", error.instance_path)
    };

    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            format!("Missing required field: {} at {}", prop_str, path)
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            format!("Wrong type at {}: expected {:?}", path, kind)
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            let opts = format_enum_options(options);
            format!("Invalid value at {}: must be one of: {}", path, opts)
        }
        jsonschema::error::ValidationErrorKind::Pattern { pattern } => {
            format!("Value at {} doesn't match pattern: {}", path, pattern)
        }
        jsonschema::error::ValidationErrorKind::MinLength { limit } => {
            format!("Value at {} is too short: minimum {} characters", path, limit)
        }
        jsonschema::error::ValidationErrorKind::MaxLength { limit } => {
            format!("Value at {} is too long: maximum {} characters", path, limit)
        }
        jsonschema::error::ValidationErrorKind::Minimum { limit } => {
            format!("Value at {} is too small: minimum {}", path, limit)
        }
        jsonschema::error::ValidationErrorKind::Maximum { limit } => {
            format!("Value at {} is too large: maximum {}", path, limit)
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            format!("Unknown field(s) at {}: {}", path, unexpected.join(", "))
        }
        _ => {
            format!("Validation error at {}: {}", path, error)
        }
    }
}

/// Format enum options as a string
fn format_enum_options(options: &JsonValue) -> String {
    if let Some(arr) = options.as_array() {
        arr.iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| v.to_string())
            })
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        options.to_string()
    }
}

/// Generate a short hint for the error label
fn format_error_hint(error: &JsonSchemaError) -> String {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { .. } => {
            "required field missing".to_string()
        }
        jsonschema::error::ValidationErrorKind::Type { .. } => "wrong type".to_string(),
        jsonschema::error::ValidationErrorKind::Enum { .. } => "invalid value".to_string(),
        jsonschema::error::ValidationErrorKind::Pattern { .. } => "pattern mismatch".to_string(),
        jsonschema::error::ValidationErrorKind::MinLength { .. } => "too short".to_string(),
        jsonschema::error::ValidationErrorKind::MaxLength { .. } => "too long".to_string(),
        jsonschema::error::ValidationErrorKind::AdditionalProperties { .. } => {
            "unknown field".to_string()
        }
        _ => "validation error".to_string(),
    }
}

/// Generate a help message with suggestions for fixing the error
fn generate_help_message(error: &JsonSchemaError) -> Option<String> {
    match &error.kind {
        jsonschema::error::ValidationErrorKind::Required { property } => {
            let prop_str = property
                .as_str()
                .map(|s| s.to_string())
                .unwrap_or_else(|| property.to_string());
            Some(format!("Add the '{}' field to your file", prop_str))
        }
        jsonschema::error::ValidationErrorKind::Enum { options } => {
            let opts = format_enum_options(options);
            Some(format!("Valid values: {}", opts))
        }
        jsonschema::error::ValidationErrorKind::Pattern { pattern } => {
            // Special case for entity ID patterns
            if pattern.contains("[0-9A-HJKMNP-TV-Z]{26}") {
                let prefix = pattern
                    .trim_start_matches('^')
                    .split('-')
                    .next()
                    .unwrap_or("EQP");
                Some(format!(
                    "ID format: {}-[26 character ULID], e.g., {}-01HC2JB7SMQX7RS1Y0GFKBHPTD",
                    prefix, prefix
                ))
            } else {
                None
            }
        }
        jsonschema::error::ValidationErrorKind::Type { kind } => {
            Some(format!("Expected value of type: {:?}", kind))
        }
        jsonschema::error::ValidationErrorKind::AdditionalProperties { unexpected } => {
            if unexpected.len() == 1 {
                Some(format!(
                    "Remove the '{}' field or check spelling",
                    unexpected[0]
                ))
            } else {
                Some("Remove unknown fields or check spelling".to_string())
            }
        }
        _ => None,
    }
}

/// Find the span (byte offset, length) for an error location
fn find_error_span(content: &str, location: Option<serde_yml::Location>) -> SourceSpan {
    if let Some(loc) = location {
        let line = loc.line().saturating_sub(1);
        let column = loc.column().saturating_sub(1);

        // Calculate byte offset
        let mut offset = 0;
        for (i, line_content) in content.lines().enumerate() {
            if i == line {
                offset += column;
                break;
            }
            offset += line_content.len() + 1; // +1 for newline
        }

        // Find a reasonable span length (rest of line or some characters)
        let rest_of_content = &content[offset.min(content.len())..];
        let len = rest_of_content
            .find('\n')
            .unwrap_or(rest_of_content.len())
            .max(1);

        (offset, len).into()
    } else {
        // No location - highlight first line
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        (0, len).into()
    }
}

/// Find the span for a JSON path in YAML content
fn find_path_span(content: &str, json_path: &str) -> SourceSpan {
    // Parse the path (e.g., "/category" or "/links/readings/0")
    let parts: Vec<&str> = json_path.split('/').filter(|s| !s.is_empty()).collect();

    if parts.is_empty() {
        // Root path - highlight first line
        let len = content.find('\n').unwrap_or(content.len()).max(1);
        return (0, len).into();
    }

    // Look for the last path component in the YAML
    let search_key = parts.last().unwrap_or(&"");

    // Handle array indices
    if search_key.parse::<usize>().is_ok() {
        // It's an array index - search for parent key
        if parts.len() >= 2 {
            let parent_key = parts[parts.len() - 2];
            if let Some(span) = find_key_span(content, parent_key) {
                return span;
            }
        }
    }

    // Search for the key in the YAML
    if let Some(span) = find_key_span(content, search_key) {
        return span;
    }

    // Fallback - highlight first line
    let len = content.find('\n').unwrap_or(content.len()).max(1);
    (0, len).into()
}

/// Find the span of a key in YAML content
fn find_key_span(content: &str, key: &str) -> Option<SourceSpan> {
    // Simple search for "key:" at the start of a line (with optional leading whitespace)
    let search_pattern = format!("{}:", key);

    let mut offset = 0;
    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(&search_pattern) {
            // Found it - calculate the offset within the line
            let key_start = offset + (line.len() - trimmed.len());
            let key_len = line.len() - (line.len() - trimmed.len());
            return Some((key_start, key_len).into());
        }
        offset += line.len() + 1; // +1 for newline
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_creation() {
        let registry = SchemaRegistry::default();
        let validator = Validator::new(&registry);
        assert!(validator.compiled.contains_key(&EntityPrefix::Eqp));
        assert!(validator.compiled.contains_key(&EntityPrefix::Rdg));
        assert!(validator.compiled.contains_key(&EntityPrefix::Flr));
    }

    #[test]
    fn test_valid_equipment() {
        let validator = Validator::default();

        let yaml = r#"
id: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
tag: P-101
title: "Main feed pump"
category: pump
subtype: centrifugal
manufacturer: HMS
criticality: high
environment: onshore
operating_hours: 20000
status: active
created: 2024-01-01T00:00:00Z
author: Test
entity_revision: 1
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_ok(), "Valid equipment should pass: {:?}", result);
    }

    #[test]
    fn test_missing_required_field() {
        let validator = Validator::default();

        let yaml = r#"
id: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
tag: P-101
# missing: title, category, created, author
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_err(), "Missing required fields should fail");
        let err = result.unwrap_err();
        assert!(err.violation_count() >= 4);
    }

    #[test]
    fn test_invalid_enum_value() {
        let validator = Validator::default();

        let yaml = r#"
id: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
tag: P-101
title: "Main feed pump"
category: turbine
created: 2024-01-01T00:00:00Z
author: Test
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_err(), "Invalid enum value should fail");
        let err = result.unwrap_err();
        assert!(
            err.violations().iter().any(|v| v.message().contains("pump")),
            "Error should list the valid categories"
        );
    }

    #[test]
    fn test_invalid_id_pattern() {
        let validator = Validator::default();

        let yaml = r#"
id: EQP-invalid
tag: P-101
title: "Main feed pump"
category: pump
created: 2024-01-01T00:00:00Z
author: Test
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_err(), "Invalid ID pattern should fail");
    }

    #[test]
    fn test_unknown_field() {
        let validator = Validator::default();

        let yaml = r#"
id: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
tag: P-101
title: "Main feed pump"
category: pump
created: 2024-01-01T00:00:00Z
author: Test
rpm: 2950
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_err(), "Unknown field should fail");
    }

    #[test]
    fn test_valid_reading_with_analysis() {
        let validator = Validator::default();

        let yaml = r#"
id: RDG-01HC2JB7SMQX7RS1Y0GFKBHPTD
equipment: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
measurement_point: "DE bearing"
taken_at: 2024-03-01T08:30:00Z
channels:
  vel_v: 2.1
  vel_h: 2.4
  vel_axl: 1.8
  temp: 61.5
analysis:
  rms_velocity: 2.11
  channels_used: 3
  zone: B
  calibration:
    version: "2026.1"
    digest: 0f69eab1c24a
created: 2024-03-01T08:31:00Z
author: Test
entity_revision: 1
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Rdg);
        assert!(result.is_ok(), "Valid reading should pass: {:?}", result);
    }

    #[test]
    fn test_reading_bad_zone() {
        let validator = Validator::default();

        let yaml = r#"
id: RDG-01HC2JB7SMQX7RS1Y0GFKBHPTD
equipment: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
measurement_point: "DE bearing"
taken_at: 2024-03-01T08:30:00Z
analysis:
  rms_velocity: 2.11
  channels_used: 3
  zone: E
  calibration:
    version: "2026.1"
    digest: 0f69eab1c24a
created: 2024-03-01T08:31:00Z
author: Test
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Rdg);
        assert!(result.is_err(), "Zone outside A-D should fail");
    }

    #[test]
    fn test_valid_failure_event() {
        let validator = Validator::default();

        let yaml = r#"
id: FLR-01HC2JB7SMQX7RS1Y0GFKBHPTD
equipment: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
occurred_at: 2024-06-15
hours_at_failure: 18500
failure_mode: "bearing seizure"
resolution: resolved
created: 2024-06-15T12:00:00Z
author: Test
entity_revision: 1
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Flr);
        assert!(
            result.is_ok(),
            "Valid failure event should pass: {:?}",
            result
        );
    }

    #[test]
    fn test_negative_hours_rejected() {
        let validator = Validator::default();

        let yaml = r#"
id: FLR-01HC2JB7SMQX7RS1Y0GFKBHPTD
equipment: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD
occurred_at: 2024-06-15
hours_at_failure: -100
failure_mode: "bearing seizure"
created: 2024-06-15T12:00:00Z
author: Test
"#;

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Flr);
        assert!(result.is_err(), "Negative hours should fail");
    }

    #[test]
    fn test_yaml_syntax_error() {
        let validator = Validator::default();

        let yaml = "id: EQP-01HC2JB7SMQX7RS1Y0GFKBHPTD\n  bad_indent: [unclosed\n";

        let result = validator.validate(yaml, "test.mrt.yaml", EntityPrefix::Eqp);
        assert!(result.is_err(), "Broken YAML should fail");
        let err = result.unwrap_err();
        assert!(err
            .violations()
            .iter()
            .any(|v| v.message().contains("YAML parse error")));
    }

    #[test]
    fn test_find_key_span() {
        let content = "id: EQP-x\ncategory: pump\n";
        let span = find_key_span(content, "category").unwrap();
        assert_eq!(span.offset(), 10);
    }
}
