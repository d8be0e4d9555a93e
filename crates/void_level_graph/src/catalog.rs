//! Level catalog - read-only registry of level metadata
//!
//! Built once from the import pipeline's manifest. All lookups are pure and
//! silent for unknown keys; the catalog never logs.
//!
//! # Manifest Format
//!
//! ```toml
//! [[levels]]
//! id = "forest_01"
//! world_id = "overworld"
//! area_id = "forest"
//! scene_backed = true
//! load_address = "Levels/Forest01"
//! neighbor_ids = ["forest_02"]
//! ```

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{CatalogError, CatalogResult};
use crate::record::{LevelId, LevelRecord};

#[derive(Debug, Deserialize)]
struct CatalogManifest {
    #[serde(default)]
    levels: Vec<LevelRecord>,
}

/// Registry mapping level ids to their metadata
#[derive(Debug, Clone, Default)]
pub struct LevelCatalog {
    levels: BTreeMap<LevelId, LevelRecord>,
}

impl LevelCatalog {
    /// Build a catalog. The first record wins when ids repeat.
    pub fn new(records: impl IntoIterator<Item = LevelRecord>) -> Self {
        let mut levels = BTreeMap::new();
        for mut record in records {
            record.normalize();
            levels.entry(record.id.clone()).or_insert(record);
        }
        Self { levels }
    }

    /// Build a catalog, rejecting repeated ids
    pub fn try_new(records: impl IntoIterator<Item = LevelRecord>) -> CatalogResult<Self> {
        let mut levels = BTreeMap::new();
        for mut record in records {
            record.normalize();
            match levels.entry(record.id.clone()) {
                Entry::Occupied(_) => return Err(CatalogError::DuplicateLevel(record.id)),
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }
        Ok(Self { levels })
    }

    /// Decode a JSON manifest (`{ "levels": [...] }`)
    pub fn from_json_str(content: &str) -> CatalogResult<Self> {
        let manifest: CatalogManifest = serde_json::from_str(content)?;
        Self::try_new(manifest.levels)
    }

    /// Decode a TOML manifest (`[[levels]]` tables)
    pub fn from_toml_str(content: &str) -> CatalogResult<Self> {
        let manifest: CatalogManifest = toml::from_str(content)?;
        Self::try_new(manifest.levels)
    }

    /// Load a manifest from disk, picking the decoder by extension
    pub fn load_from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_json_str(&content),
        }
    }

    /// Look up a level
    pub fn get(&self, id: &LevelId) -> Option<&LevelRecord> {
        self.levels.get(id)
    }

    /// Check if a level exists
    pub fn contains(&self, id: &LevelId) -> bool {
        self.levels.contains_key(id)
    }

    /// All levels in a world
    pub fn ids_in_world(&self, world_id: &str) -> BTreeSet<LevelId> {
        self.collect_ids(|record| record.world_id == world_id)
    }

    /// All levels in an area
    pub fn ids_in_area(&self, area_id: &str) -> BTreeSet<LevelId> {
        self.collect_ids(|record| record.in_area(area_id))
    }

    /// Graph-managed (non-standalone) levels in a world
    pub fn universe_ids_in_world(&self, world_id: &str) -> BTreeSet<LevelId> {
        self.collect_ids(|record| !record.standalone && record.world_id == world_id)
    }

    /// Graph-managed (non-standalone) levels in an area
    pub fn universe_ids_in_area(&self, area_id: &str) -> BTreeSet<LevelId> {
        self.collect_ids(|record| !record.standalone && record.in_area(area_id))
    }

    /// Links `(a, b)` where `a` lists `b` but `b` does not list `a`
    pub fn asymmetric_links(&self) -> Vec<(LevelId, LevelId)> {
        let mut links = Vec::new();
        for record in self.levels.values() {
            for neighbor in &record.neighbor_ids {
                if let Some(other) = self.levels.get(neighbor) {
                    if !other.neighbor_ids.contains(&record.id) {
                        links.push((record.id.clone(), neighbor.clone()));
                    }
                }
            }
        }
        links
    }

    /// Links `(a, b)` where `b` is not in the catalog
    pub fn dangling_links(&self) -> Vec<(LevelId, LevelId)> {
        let mut links = Vec::new();
        for record in self.levels.values() {
            for neighbor in &record.neighbor_ids {
                if !self.levels.contains_key(neighbor) {
                    links.push((record.id.clone(), neighbor.clone()));
                }
            }
        }
        links
    }

    /// Iterate records in id order
    pub fn iter(&self) -> impl Iterator<Item = &LevelRecord> {
        self.levels.values()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn collect_ids(&self, filter: impl Fn(&LevelRecord) -> bool) -> BTreeSet<LevelId> {
        self.levels
            .values()
            .filter(|record| filter(record))
            .map(|record| record.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LevelCatalog {
        LevelCatalog::new([
            LevelRecord::new("a", "w1").with_area("north").with_neighbor("b"),
            LevelRecord::new("b", "w1").with_area("north").with_neighbors(["a", "c"]),
            LevelRecord::new("c", "w1").with_area("south"),
            LevelRecord::new("d", "w2").with_neighbor("ghost"),
            LevelRecord::new("menu", "w1").standalone(),
        ])
    }

    #[test]
    fn test_lookup() {
        let catalog = sample();

        assert_eq!(catalog.len(), 5);
        assert!(catalog.get(&"a".into()).is_some());
        assert!(catalog.get(&"zzz".into()).is_none());
        assert!(catalog.ids_in_world("nowhere").is_empty());
    }

    #[test]
    fn test_membership_queries() {
        let catalog = sample();

        assert_eq!(catalog.ids_in_world("w1").len(), 4);
        assert_eq!(catalog.universe_ids_in_world("w1").len(), 3);
        assert_eq!(
            catalog.ids_in_area("north"),
            BTreeSet::from([LevelId::from("a"), LevelId::from("b")])
        );
        assert_eq!(catalog.universe_ids_in_area("south").len(), 1);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let catalog = LevelCatalog::new([
            LevelRecord::new("a", "first"),
            LevelRecord::new("a", "second"),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&"a".into()).unwrap().world_id, "first");

        let strict = LevelCatalog::try_new([
            LevelRecord::new("a", "first"),
            LevelRecord::new("a", "second"),
        ]);
        assert!(matches!(strict, Err(CatalogError::DuplicateLevel(_))));
    }

    #[test]
    fn test_link_audit() {
        let catalog = sample();

        // b lists c, c lists nobody
        assert_eq!(
            catalog.asymmetric_links(),
            vec![(LevelId::from("b"), LevelId::from("c"))]
        );
        assert_eq!(
            catalog.dangling_links(),
            vec![(LevelId::from("d"), LevelId::from("ghost"))]
        );
    }

    #[test]
    fn test_manifest_decoding() {
        let json = r#"{ "levels": [
            { "id": "a", "world_id": "w", "neighbor_ids": ["b"] },
            { "id": "b", "world_id": "w", "neighbor_ids": ["a"], "scene_backed": true }
        ] }"#;
        let catalog = LevelCatalog::from_json_str(json).unwrap();
        assert!(catalog.get(&"b".into()).unwrap().scene_backed);

        let toml = r#"
            [[levels]]
            id = "x"
            world_id = "w"
            load_address = "Levels/X"
        "#;
        let catalog = LevelCatalog::from_toml_str(toml).unwrap();
        assert_eq!(catalog.get(&"x".into()).unwrap().load_address, "Levels/X");
    }
}
