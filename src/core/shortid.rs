//! Short ID system for easier entity selection
//!
//! Provides numeric aliases like `@1`, `@2` that map to full entity IDs.
//! Aliases are counted per entity prefix, so `EQP@1` and `RDG@1` can
//! coexist. The index lives in `.mrt/shortids.json` and is refreshed by
//! list commands.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::project::Project;

/// Index file location within a project
const INDEX_FILE: &str = ".mrt/shortids.json";

fn default_next_id() -> u32 {
    1
}

/// Alias table for a single entity prefix
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct PrefixIndex {
    /// Maps short number to full entity ID string
    entries: HashMap<u32, String>,
    /// Next available short ID
    #[serde(default = "default_next_id")]
    next_id: u32,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }
}

/// Per-prefix mappings of short IDs (@N) to full entity IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Alias tables keyed by prefix string ("EQP", "RDG", "FLR")
    prefixes: HashMap<String, PrefixIndex>,
    /// Maps full entity ID to its short number (reverse lookup)
    #[serde(skip)]
    reverse: HashMap<String, u32>,
}

impl ShortIdIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.root().join(INDEX_FILE);
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(mut index) = serde_json::from_str::<ShortIdIndex>(&content) {
                    // Rebuild reverse lookup
                    index.reverse = index
                        .prefixes
                        .values()
                        .flat_map(|p| p.entries.iter())
                        .map(|(k, v)| (v.clone(), *k))
                        .collect();
                    return index;
                }
            }
        }
        Self::new()
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.root().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Clear and rebuild one prefix table with new entity IDs
    pub fn rebuild(&mut self, prefix: EntityPrefix, entity_ids: impl IntoIterator<Item = String>) {
        if let Some(table) = self.prefixes.get_mut(prefix.as_str()) {
            for id in table.entries.values() {
                self.reverse.remove(id);
            }
            *table = PrefixIndex::default();
        }

        for id in entity_ids {
            self.add(&id);
        }
    }

    /// Add an entity ID and return its short ID
    ///
    /// IDs whose prefix cannot be parsed are counted under their raw
    /// leading segment so the index never rejects an entry.
    pub fn add(&mut self, entity_id: &str) -> u32 {
        if let Some(&short_id) = self.reverse.get(entity_id) {
            return short_id;
        }

        let prefix = entity_id
            .split_once('-')
            .map(|(p, _)| p.to_uppercase())
            .unwrap_or_else(|| entity_id.to_uppercase());

        let table = self.prefixes.entry(prefix).or_default();
        let short_id = table.next_id;
        table.next_id += 1;
        table.entries.insert(short_id, entity_id.to_string());
        self.reverse.insert(entity_id.to_string(), short_id);
        short_id
    }

    /// Resolve a short ID reference to a full entity ID
    ///
    /// Accepts:
    /// - `@N` or a plain number, looked up under the given prefix
    /// - `PREFIX@N` (e.g., `EQP@1`), looked up under the named prefix
    /// - Full or partial entity ID (passed through)
    pub fn resolve(&self, prefix: EntityPrefix, reference: &str) -> Option<String> {
        // PREFIX@N names its own table
        if let Some((named, num_str)) = reference.split_once('@') {
            if !named.is_empty() {
                let named: EntityPrefix = named.parse().ok()?;
                return self.lookup(named, num_str);
            }
            return self.lookup(prefix, num_str);
        }

        if reference.chars().all(|c| c.is_ascii_digit()) && !reference.is_empty() {
            return self.lookup(prefix, reference);
        }

        // Not a short ID, return as-is for partial matching
        Some(reference.to_string())
    }

    fn lookup(&self, prefix: EntityPrefix, num_str: &str) -> Option<String> {
        let n = num_str.parse::<u32>().ok()?;
        self.prefixes
            .get(prefix.as_str())
            .and_then(|table| table.entries.get(&n).cloned())
    }

    /// Get the short ID for a full entity ID
    pub fn get_short_id(&self, entity_id: &str) -> Option<u32> {
        self.reverse.get(entity_id).copied()
    }

    /// Format an entity ID with its short ID prefix
    pub fn format_with_short_id(&self, entity_id: &EntityId) -> String {
        let id_str = entity_id.to_string();
        if let Some(short_id) = self.reverse.get(&id_str) {
            format!("@{:<3} {}", short_id, id_str)
        } else {
            format!("     {}", id_str)
        }
    }

    /// Get one prefix table's entries as (short_id, full_id) pairs
    pub fn iter(&self, prefix: EntityPrefix) -> impl Iterator<Item = (u32, &str)> {
        self.prefixes
            .get(prefix.as_str())
            .into_iter()
            .flat_map(|table| table.entries.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Number of entries across all prefixes
    pub fn len(&self) -> usize {
        self.prefixes.values().map(|t| t.entries.len()).sum()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a reference that might be a short ID or a full/partial entity ID
pub fn parse_entity_reference(reference: &str, prefix: EntityPrefix, project: &Project) -> String {
    let index = ShortIdIndex::load(project);
    index
        .resolve(prefix, reference)
        .unwrap_or_else(|| reference.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_add_and_resolve() {
        let mut index = ShortIdIndex::new();

        let short1 = index.add("EQP-01ABC");
        let short2 = index.add("EQP-02DEF");

        assert_eq!(short1, 1);
        assert_eq!(short2, 2);

        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "@1"),
            Some("EQP-01ABC".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "@2"),
            Some("EQP-02DEF".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "1"),
            Some("EQP-01ABC".to_string())
        );
        assert_eq!(index.resolve(EntityPrefix::Eqp, "@99"), None);
    }

    #[test]
    fn test_short_id_counters_independent_per_prefix() {
        let mut index = ShortIdIndex::new();

        assert_eq!(index.add("EQP-01ABC"), 1);
        assert_eq!(index.add("RDG-01AAA"), 1);
        assert_eq!(index.add("RDG-01BBB"), 2);

        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "@1"),
            Some("EQP-01ABC".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Rdg, "@1"),
            Some("RDG-01AAA".to_string())
        );
    }

    #[test]
    fn test_short_id_prefix_qualified_reference() {
        let mut index = ShortIdIndex::new();
        index.add("EQP-01ABC");
        index.add("RDG-01AAA");

        // PREFIX@N overrides the command's own prefix
        assert_eq!(
            index.resolve(EntityPrefix::Rdg, "EQP@1"),
            Some("EQP-01ABC".to_string())
        );
        assert_eq!(index.resolve(EntityPrefix::Rdg, "XYZ@1"), None);
    }

    #[test]
    fn test_short_id_passthrough() {
        let index = ShortIdIndex::new();

        // Non-numeric references should pass through
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "EQP-01ABC"),
            Some("EQP-01ABC".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "feedwater"),
            Some("feedwater".to_string())
        );
    }

    #[test]
    fn test_short_id_rebuild() {
        let mut index = ShortIdIndex::new();
        index.add("EQP-001");
        index.add("EQP-002");
        index.add("RDG-001");

        assert_eq!(index.len(), 3);

        index.rebuild(
            EntityPrefix::Eqp,
            vec!["EQP-00A".to_string(), "EQP-00B".to_string(), "EQP-00C".to_string()],
        );

        // Readings are untouched, equipment renumbered from 1
        assert_eq!(index.len(), 4);
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "@1"),
            Some("EQP-00A".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Eqp, "@3"),
            Some("EQP-00C".to_string())
        );
        assert_eq!(
            index.resolve(EntityPrefix::Rdg, "@1"),
            Some("RDG-001".to_string())
        );
    }

    #[test]
    fn test_short_id_no_duplicates() {
        let mut index = ShortIdIndex::new();

        let short1 = index.add("EQP-001");
        let short2 = index.add("EQP-001"); // Same ID

        assert_eq!(short1, short2);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_get_short_id() {
        let mut index = ShortIdIndex::new();
        index.add("FLR-001");
        index.add("FLR-002");

        assert_eq!(index.get_short_id("FLR-001"), Some(1));
        assert_eq!(index.get_short_id("FLR-002"), Some(2));
        assert_eq!(index.get_short_id("FLR-003"), None);
    }
}
