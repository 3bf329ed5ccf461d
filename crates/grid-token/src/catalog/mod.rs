//! Technology catalog used to hydrate decoded grids.
//!
//! The catalog service returns a tech tree per ship type: categories of tech
//! entries, each listing its modules with display and scoring attributes.
//! For hydration the tree is flattened into a `tech -> module id -> record`
//! lookup.

pub mod cache;
pub mod source;

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;

pub use cache::{CatalogCache, FetchStatus};
#[cfg(feature = "http")]
pub use source::HttpTechTreeSource;
pub use source::{StaticTechTreeSource, TechTreeSource};

/// Display and scoring attributes of one module.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    pub image: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub bonus: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub value: f64,
    #[serde(deserialize_with = "adjacency_flag")]
    pub adjacency: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub sc_eligible: bool,
}

/// One technology inside a category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TechEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    pub image: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub modules: Vec<ModuleRecord>,
}

/// Tech tree of one ship type, keyed by category.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechTree {
    pub categories: BTreeMap<String, Vec<TechEntry>>,
}

impl TechTree {
    /// Parses the tech tree JSON returned by the catalog service.
    ///
    /// Top-level keys whose value is not a list are metadata and skipped.
    /// A list that does not parse as tech entries is dropped with a warning.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, serde_json::Value> =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidJson(e.to_string()))?;

        let mut categories = BTreeMap::new();
        for (category, value) in raw {
            if !value.is_array() {
                log::debug!("skipping tech tree metadata key {category:?}");
                continue;
            }
            match serde_json::from_value::<Vec<TechEntry>>(value) {
                Ok(entries) => {
                    categories.insert(category, entries);
                }
                Err(e) => log::warn!("dropping malformed tech tree category {category:?}: {e}"),
            }
        }
        Ok(Self { categories })
    }
}

/// Flattened `tech -> module id -> record` lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechCatalog {
    techs: FxHashMap<String, FxHashMap<String, ModuleRecord>>,
}

impl TechCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens a tech tree. Categories are dropped; a tech key appearing in
    /// several categories merges its modules.
    pub fn from_tree(tree: &TechTree) -> Self {
        let mut techs: FxHashMap<String, FxHashMap<String, ModuleRecord>> = FxHashMap::default();
        for entry in tree.categories.values().flatten() {
            let modules = techs.entry(entry.key.clone()).or_default();
            for module in &entry.modules {
                modules.insert(module.id.clone(), module.clone());
            }
        }
        Self { techs }
    }

    /// Looks up a module record.
    pub fn module(&self, tech: &str, module: &str) -> Option<&ModuleRecord> {
        self.techs.get(tech).and_then(|modules| modules.get(module))
    }

    /// Number of tech keys.
    pub fn len(&self) -> usize {
        self.techs.len()
    }

    /// Returns true if the catalog has no techs.
    pub fn is_empty(&self) -> bool {
        self.techs.is_empty()
    }
}

/// Reads `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a bool or an adjacency kind string ("greater", "lesser", ...).
fn adjacency_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Kind(String),
        Missing(()),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Kind(kind) => !(kind.is_empty() || kind == "none" || kind == "no_adjacency"),
        Flag::Missing(()) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "Weaponry": [
            {
                "key": "pulse",
                "label": "Pulse Engine",
                "image": "pulse.webp",
                "modules": [
                    { "id": "PE", "label": "Pulse Engine", "image": "pulse.webp",
                      "bonus": 1.0, "value": 5, "adjacency": "greater", "sc_eligible": true },
                    { "id": "Xa", "label": "Sentinel Upgrade", "bonus": 0.25,
                      "adjacency": false, "sc_eligible": true }
                ]
            }
        ],
        "Defensive": [
            { "key": "shield", "label": "Defensive Shields",
              "modules": [ { "id": "DS", "label": "Shield", "adjacency": null } ] }
        ],
        "recommended_builds": { "pulse": "..." }
    }"#;

    #[test]
    fn test_from_json_skips_non_category_keys() {
        let tree = TechTree::from_json(TREE).unwrap();
        assert_eq!(tree.categories.len(), 2);
        assert!(!tree.categories.contains_key("recommended_builds"));
    }

    #[test]
    fn test_flatten() {
        let catalog = TechCatalog::from_tree(&TechTree::from_json(TREE).unwrap());
        assert_eq!(catalog.len(), 2);

        let pe = catalog.module("pulse", "PE").unwrap();
        assert_eq!(pe.label, "Pulse Engine");
        assert_eq!(pe.value, 5.0);
        assert!(pe.adjacency);
        assert!(pe.sc_eligible);

        let xa = catalog.module("pulse", "Xa").unwrap();
        assert!(!xa.adjacency);
        assert_eq!(xa.image, None);

        assert!(!catalog.module("shield", "DS").unwrap().adjacency);
        assert!(catalog.module("shield", "PE").is_none());
        assert!(catalog.module("hyper", "PE").is_none());
    }

    #[test_log::test]
    fn test_null_fields_keep_category() {
        let json = r#"{
            "Weaponry": [
                { "key": "pulse", "label": null, "modules": [
                    { "id": "PE", "label": "Pulse Engine", "value": 5 },
                    { "id": "Xa", "label": null, "value": null, "bonus": null,
                      "sc_eligible": null }
                ] }
            ]
        }"#;
        let catalog = TechCatalog::from_tree(&TechTree::from_json(json).unwrap());
        assert_eq!(catalog.module("pulse", "PE").unwrap().value, 5.0);

        let xa = catalog.module("pulse", "Xa").unwrap();
        assert_eq!(xa.value, 0.0);
        assert_eq!(xa.bonus, 0.0);
        assert!(xa.label.is_empty());
        assert!(!xa.sc_eligible);
    }

    #[test_log::test]
    fn test_malformed_category_is_dropped_alone() {
        let json = r#"{
            "Weaponry": [ { "key": "pulse", "modules": [ { "id": "PE", "value": "lots" } ] } ],
            "Defensive": [ { "key": "shield", "modules": [ { "id": "DS" } ] } ]
        }"#;
        let tree = TechTree::from_json(json).unwrap();
        assert_eq!(tree.categories.keys().collect::<Vec<_>>(), ["Defensive"]);
    }

    #[test]
    fn test_invalid_json() {
        let result = TechTree::from_json("not json");
        assert!(matches!(result, Err(CatalogError::InvalidJson(_))));
    }
}
