//! Embedded JSON Schema registry
//!
//! One schema per entity prefix, compiled into the binary so validation
//! works without a network or an installed schema directory.

use std::collections::HashMap;

use rust_embed::Embed;

use crate::core::identity::EntityPrefix;

#[derive(Embed)]
#[folder = "schemas/"]
struct EmbeddedSchemas;

/// Lookup table from entity prefix to JSON Schema source
pub struct SchemaRegistry {
    schemas: HashMap<EntityPrefix, String>,
}

impl SchemaRegistry {
    /// Load every embedded schema whose filename names an entity prefix
    pub fn new() -> Self {
        let mut schemas = HashMap::new();

        for filename in EmbeddedSchemas::iter() {
            let Some(prefix) = EntityPrefix::from_filename(filename.as_ref()) else {
                continue;
            };
            let Some(file) = EmbeddedSchemas::get(filename.as_ref()) else {
                continue;
            };
            if let Ok(source) = std::str::from_utf8(&file.data) {
                schemas.insert(prefix, source.to_string());
            }
        }

        Self { schemas }
    }

    /// Schema source for an entity prefix, if one is registered
    pub fn get(&self, prefix: EntityPrefix) -> Option<&str> {
        self.schemas.get(&prefix).map(String::as_str)
    }

    /// Whether a schema is registered for this prefix
    pub fn has_schema(&self, prefix: EntityPrefix) -> bool {
        self.schemas.contains_key(&prefix)
    }

    /// Prefixes that have a registered schema
    pub fn prefixes(&self) -> impl Iterator<Item = EntityPrefix> + '_ {
        self.schemas.keys().copied()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_prefixes() {
        let registry = SchemaRegistry::new();
        for prefix in EntityPrefix::all() {
            assert!(
                registry.has_schema(*prefix),
                "missing schema for {}",
                prefix
            );
        }
    }

    #[test]
    fn test_schemas_are_valid_json() {
        let registry = SchemaRegistry::new();
        for prefix in EntityPrefix::all() {
            let source = registry.get(*prefix).unwrap();
            let value: serde_json::Value = serde_json::from_str(source).unwrap();
            assert_eq!(value["type"], "object");
            assert!(value["properties"]["id"]["pattern"]
                .as_str()
                .unwrap()
                .starts_with(&format!("^{}-", prefix)));
        }
    }

    #[test]
    fn test_unknown_prefix_has_no_schema() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.prefixes().count(), EntityPrefix::all().len());
    }
}
