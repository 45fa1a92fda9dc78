//! Schema-driven interactive wizard for entity creation
//!
//! This module provides a generic wizard that can create any entity type
//! by reading its JSON Schema and prompting the user for values.

use console::style;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use std::collections::HashMap;

use crate::core::identity::EntityPrefix;
use crate::schema::registry::SchemaRegistry;

/// A schema-driven wizard for creating entities
pub struct SchemaWizard {
    registry: SchemaRegistry,
    theme: ColorfulTheme,
}

/// Result of running the wizard - collected field values
#[derive(Debug, Default)]
pub struct WizardResult {
    pub values: HashMap<String, Value>,
}

impl WizardResult {
    /// Get a string value
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Get a numeric value
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(|v| v.as_f64())
    }
}

/// Field information extracted from schema
#[derive(Debug)]
struct FieldInfo {
    name: String,
    description: Option<String>,
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
}

#[derive(Debug)]
#[allow(dead_code)]
enum FieldType {
    String {
        min_length: Option<u64>,
        max_length: Option<u64>,
    },
    Enum {
        values: Vec<String>,
    },
    Integer {
        minimum: Option<i64>,
        maximum: Option<i64>,
    },
    Number {
        minimum: Option<f64>,
    },
    Boolean,
    Array {
        item_type: Box<FieldType>,
    },
    Skip, // For fields we handle automatically (id, created, author, etc.)
}

impl SchemaWizard {
    /// Create a new wizard with the default schema registry
    pub fn new() -> Self {
        Self {
            registry: SchemaRegistry::default(),
            theme: ColorfulTheme::default(),
        }
    }

    /// Run the wizard for a specific entity type
    pub fn run(&self, prefix: EntityPrefix) -> Result<WizardResult> {
        let schema_str = self.registry.get(prefix).ok_or_else(|| {
            miette::miette!("No schema found for entity type: {}", prefix.as_str())
        })?;
        let schema: Value = serde_json::from_str(schema_str).into_diagnostic()?;

        println!();
        println!(
            "{} Creating new {} entity",
            style("◆").cyan(),
            style(prefix.as_str()).bold()
        );
        println!("{}", style("─".repeat(50)).dim());
        println!();

        // Extract field information from schema
        let fields = self.extract_fields(&schema)?;

        // Collect values for each field
        let mut result = WizardResult::default();

        for field in fields {
            if matches!(field.field_type, FieldType::Skip) {
                continue;
            }

            let value = self.prompt_field(&field)?;
            if let Some(v) = value {
                result.values.insert(field.name, v);
            }
        }

        println!();
        println!("{} Values collected!", style("✓").green());

        Ok(result)
    }

    /// Extract field information from a JSON Schema
    fn extract_fields(&self, schema: &Value) -> Result<Vec<FieldInfo>> {
        let mut fields = Vec::new();

        let properties = schema.get("properties").and_then(|p| p.as_object());
        let required = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if let Some(props) = properties {
            // Define the order we want to prompt fields
            let field_order = [
                "tag",
                "title",
                "category",
                "subtype",
                "manufacturer",
                "model",
                "location",
                "criticality",
                "environment",
                "operating_hours",
                "equipment",
                "measurement_point",
                "failure_mode",
                "occurred_at",
                "hours_at_failure",
                "tags",
            ];

            // First add fields in preferred order
            for name in &field_order {
                if let Some(prop_schema) = props.get(*name) {
                    if let Some(field) =
                        self.parse_field(name, prop_schema, required.contains(&name.to_string()))
                    {
                        fields.push(field);
                    }
                }
            }

            // Then add any remaining fields not in our order (excluding auto-managed ones)
            for (name, prop_schema) in props {
                let skip_fields = [
                    "id",
                    "created",
                    "author",
                    "entity_revision",
                    "links",
                    "status",
                    "service",
                    "channels",
                    "analysis",
                    "analysis_results",
                    "fitted_params",
                    "resolution",
                ];
                if !field_order.contains(&name.as_str()) && !skip_fields.contains(&name.as_str()) {
                    if let Some(field) = self.parse_field(name, prop_schema, required.contains(name))
                    {
                        fields.push(field);
                    }
                }
            }
        }

        Ok(fields)
    }

    /// Parse a single field from its schema
    fn parse_field(&self, name: &str, schema: &Value, required: bool) -> Option<FieldInfo> {
        // Skip auto-managed fields
        let auto_fields = ["id", "created", "author", "entity_revision"];
        if auto_fields.contains(&name) {
            return Some(FieldInfo {
                name: name.to_string(),
                description: None,
                field_type: FieldType::Skip,
                required,
                default: None,
            });
        }

        let description = schema
            .get("description")
            .and_then(|d| d.as_str())
            .map(String::from);
        let default = schema.get("default").cloned();

        let field_type = if let Some(enum_values) = schema.get("enum").and_then(|e| e.as_array()) {
            let values: Vec<String> = enum_values
                .iter()
                .filter_map(|v| v.as_str())
                .map(String::from)
                .collect();
            FieldType::Enum { values }
        } else {
            match schema.get("type").and_then(|t| t.as_str()) {
                Some("string") => FieldType::String {
                    min_length: schema.get("minLength").and_then(|v| v.as_u64()),
                    max_length: schema.get("maxLength").and_then(|v| v.as_u64()),
                },
                Some("integer") => FieldType::Integer {
                    minimum: schema.get("minimum").and_then(|v| v.as_i64()),
                    maximum: schema.get("maximum").and_then(|v| v.as_i64()),
                },
                Some("number") => FieldType::Number {
                    minimum: schema.get("minimum").and_then(|v| v.as_f64()),
                },
                Some("boolean") => FieldType::Boolean,
                Some("array") => {
                    let item_schema = schema.get("items").unwrap_or(&Value::Null);
                    let item_type = if let Some(item_enum) =
                        item_schema.get("enum").and_then(|e| e.as_array())
                    {
                        FieldType::Enum {
                            values: item_enum
                                .iter()
                                .filter_map(|v| v.as_str())
                                .map(String::from)
                                .collect(),
                        }
                    } else {
                        FieldType::String {
                            min_length: None,
                            max_length: None,
                        }
                    };
                    FieldType::Array {
                        item_type: Box::new(item_type),
                    }
                }
                _ => return None, // Skip complex types we don't handle
            }
        };

        Some(FieldInfo {
            name: name.to_string(),
            description,
            field_type,
            required,
            default,
        })
    }

    /// Prompt the user for a field value
    fn prompt_field(&self, field: &FieldInfo) -> Result<Option<Value>> {
        let prompt = self.format_prompt(field);

        match &field.field_type {
            FieldType::Skip => Ok(None),

            FieldType::Enum { values } => {
                let default_idx = field
                    .default
                    .as_ref()
                    .and_then(|d| d.as_str())
                    .and_then(|d| values.iter().position(|v| v == d))
                    .unwrap_or(0);

                let selection = Select::with_theme(&self.theme)
                    .with_prompt(&prompt)
                    .items(values)
                    .default(default_idx)
                    .interact()
                    .into_diagnostic()?;

                Ok(Some(Value::String(values[selection].clone())))
            }

            FieldType::String { .. } => {
                let default_str = field
                    .default
                    .as_ref()
                    .and_then(|d| d.as_str())
                    .unwrap_or("");

                let value: String = if !default_str.is_empty() {
                    Input::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .default(default_str.to_string())
                        .allow_empty(!field.required)
                        .interact_text()
                        .into_diagnostic()?
                } else if !field.required {
                    Input::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .allow_empty(true)
                        .interact_text()
                        .into_diagnostic()?
                } else {
                    Input::with_theme(&self.theme)
                        .with_prompt(&prompt)
                        .interact_text()
                        .into_diagnostic()?
                };

                if value.is_empty() && !field.required {
                    Ok(None)
                } else {
                    Ok(Some(Value::String(value)))
                }
            }

            FieldType::Integer { .. } => {
                let default_val = field.default.as_ref().and_then(|d| d.as_i64()).unwrap_or(0);

                let value: String = Input::with_theme(&self.theme)
                    .with_prompt(&prompt)
                    .default(default_val.to_string())
                    .interact_text()
                    .into_diagnostic()?;

                let parsed: i64 = value.parse().unwrap_or(default_val);
                Ok(Some(Value::Number(parsed.into())))
            }

            FieldType::Number { minimum } => {
                let default_val = field
                    .default
                    .as_ref()
                    .and_then(|d| d.as_f64())
                    .or(*minimum)
                    .unwrap_or(0.0);

                let value: String = Input::with_theme(&self.theme)
                    .with_prompt(&prompt)
                    .default(default_val.to_string())
                    .interact_text()
                    .into_diagnostic()?;

                let parsed: f64 = value.parse().unwrap_or(default_val);
                let number = serde_json::Number::from_f64(parsed)
                    .unwrap_or_else(|| serde_json::Number::from(0));
                Ok(Some(Value::Number(number)))
            }

            FieldType::Boolean => {
                let default_val = field
                    .default
                    .as_ref()
                    .and_then(|d| d.as_bool())
                    .unwrap_or(false);

                let items = &["Yes", "No"];
                let default_idx = if default_val { 0 } else { 1 };

                let selection = Select::with_theme(&self.theme)
                    .with_prompt(&prompt)
                    .items(items)
                    .default(default_idx)
                    .interact()
                    .into_diagnostic()?;

                Ok(Some(Value::Bool(selection == 0)))
            }

            FieldType::Array { .. } => {
                // For arrays, we prompt for comma-separated values
                let value: String = Input::with_theme(&self.theme)
                    .with_prompt(&format!("{} (comma-separated)", prompt))
                    .allow_empty(true)
                    .interact_text()
                    .into_diagnostic()?;

                if value.is_empty() {
                    Ok(None)
                } else {
                    let items: Vec<Value> = value
                        .split(',')
                        .map(|s| Value::String(s.trim().to_string()))
                        .collect();
                    Ok(Some(Value::Array(items)))
                }
            }
        }
    }

    /// Format the prompt for a field
    fn format_prompt(&self, field: &FieldInfo) -> String {
        let name = field.name.replace('_', " ");
        let name = name
            .split_whitespace()
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    None => String::new(),
                    Some(c) => c.to_uppercase().chain(chars).collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(ref desc) = field.description {
            // Truncate long descriptions
            let short_desc = if desc.len() > 50 {
                format!("{}...", &desc[..47])
            } else {
                desc.clone()
            };
            format!("{} ({})", name, style(short_desc).dim())
        } else {
            name
        }
    }
}

impl Default for SchemaWizard {
    fn default() -> Self {
        Self::new()
    }
}
