//! Level identifiers and immutable level metadata

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable engine-level identifier of a level
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    /// Create a new level ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LevelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for LevelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for LevelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Metadata for one level, as produced by the import pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    /// Level identifier
    pub id: LevelId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// World this level belongs to
    pub world_id: String,
    /// Area within the world, if any
    #[serde(default)]
    pub area_id: Option<String>,
    /// Loaded independently of the universe graph
    #[serde(default)]
    pub standalone: bool,
    /// Backed by an additive scene rather than an instantiated object
    #[serde(default)]
    pub scene_backed: bool,
    /// Address handed to the asset loader
    #[serde(default)]
    pub load_address: String,
    /// Adjacent levels
    #[serde(default)]
    pub neighbor_ids: BTreeSet<LevelId>,
}

impl LevelRecord {
    /// Create a record for a level in `world_id`
    pub fn new(id: impl Into<LevelId>, world_id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.as_str().to_string(),
            load_address: id.as_str().to_string(),
            id,
            world_id: world_id.into(),
            area_id: None,
            standalone: false,
            scene_backed: false,
            neighbor_ids: BTreeSet::new(),
        }
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set area membership
    pub fn with_area(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    /// Set the loader address
    pub fn with_load_address(mut self, address: impl Into<String>) -> Self {
        self.load_address = address.into();
        self
    }

    /// Add a neighbour. A level is never its own neighbour.
    pub fn with_neighbor(mut self, neighbor: impl Into<LevelId>) -> Self {
        let neighbor = neighbor.into();
        if neighbor != self.id {
            self.neighbor_ids.insert(neighbor);
        }
        self
    }

    /// Add several neighbours
    pub fn with_neighbors<I, T>(mut self, neighbors: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<LevelId>,
    {
        for neighbor in neighbors {
            self = self.with_neighbor(neighbor);
        }
        self
    }

    /// Mark as standalone
    pub fn standalone(mut self) -> Self {
        self.standalone = true;
        self
    }

    /// Mark as scene-backed
    pub fn scene_backed(mut self) -> Self {
        self.scene_backed = true;
        self
    }

    /// Check area membership
    pub fn in_area(&self, area_id: &str) -> bool {
        self.area_id.as_deref() == Some(area_id)
    }

    /// Restore invariants on records that came from a manifest
    pub(crate) fn normalize(&mut self) {
        let id = self.id.clone();
        self.neighbor_ids.remove(&id);
        if self.load_address.is_empty() {
            self.load_address = id.as_str().to_string();
        }
        if self.name.is_empty() {
            self.name = id.as_str().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = LevelRecord::new("cave_01", "underworld")
            .with_name("Crystal Cave")
            .with_area("caves")
            .with_neighbors(["cave_02", "cave_01", "surface"])
            .scene_backed();

        assert_eq!(record.name, "Crystal Cave");
        assert_eq!(record.load_address, "cave_01");
        assert!(record.in_area("caves"));
        assert!(record.scene_backed);
        assert!(!record.standalone);
        assert_eq!(record.neighbor_ids.len(), 2);
        assert!(!record.neighbor_ids.contains(&LevelId::from("cave_01")));
    }

    #[test]
    fn test_normalize_manifest_record() {
        let mut record: LevelRecord = serde_json::from_str(
            r#"{ "id": "hub", "world_id": "w1", "neighbor_ids": ["hub", "east"] }"#,
        )
        .unwrap();

        record.normalize();

        assert_eq!(record.load_address, "hub");
        assert_eq!(record.name, "hub");
        assert_eq!(record.neighbor_ids.len(), 1);
    }
}
