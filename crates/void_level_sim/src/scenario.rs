//! Scenario files
//!
//! A scenario describes a small streamed world and a route to walk through it.
//!
//! ```toml
//! fade_ms = 120
//!
//! [streaming]
//! strategy = "neighbours"
//! depth = 1
//!
//! [[levels]]
//! id = "meadow"
//! world_id = "overworld"
//! neighbor_ids = ["river"]
//! spots = [{ id = "start", main = true, position = [2.0, 1.0] }]
//! connections = [{ id = "east", target_level = "river", target_id = "west", arrival = [15.0, 1.0], facing = -1 }]
//!
//! [[route]]
//! level = "meadow"
//!
//! [[route]]
//! level = "river"
//! via = "east"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use void_level_graph::{CatalogError, LevelCatalog, LevelRecord};
use void_streaming::{ConfigError, StreamingConfig};

/// Scenario loading errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scenario parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to start runtime: {0}")]
    Runtime(String),
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;

/// Placement point inside a level
#[derive(Debug, Clone, Deserialize)]
pub struct SpotDef {
    pub id: String,
    #[serde(default)]
    pub main: bool,
    pub position: [f32; 2],
    #[serde(default)]
    pub facing: i32,
}

/// Connection or portal leading out of a level
#[derive(Debug, Clone, Deserialize)]
pub struct PassageDef {
    pub id: String,
    pub target_level: String,
    pub target_id: String,
    /// Where a subject arriving through this passage lands
    pub arrival: [f32; 2],
    #[serde(default)]
    pub facing: i32,
}

/// Catalog record plus the layout the in-memory scanner reports for it
#[derive(Debug, Clone, Deserialize)]
pub struct LevelDef {
    #[serde(flatten)]
    pub record: LevelRecord,
    #[serde(default)]
    pub depth: f32,
    #[serde(default)]
    pub spots: Vec<SpotDef>,
    #[serde(default)]
    pub connections: Vec<PassageDef>,
    #[serde(default)]
    pub portals: Vec<PassageDef>,
    /// Make the in-memory loader reject this level
    #[serde(default)]
    pub fail_load: bool,
}

/// One leg of the route
#[derive(Debug, Clone, Deserialize)]
pub struct RouteStep {
    pub level: String,
    /// Named spot in the target level
    #[serde(default)]
    pub spot: Option<String>,
    /// Connection of the current level to travel through
    #[serde(default)]
    pub via: Option<String>,
    /// Portal of the current level to travel through
    #[serde(default)]
    pub portal: Option<String>,
    /// Explicit placement point
    #[serde(default)]
    pub point: Option<[f32; 2]>,
}

/// Complete scenario
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub config: StreamingConfig,
    /// Curtain close/open duration
    #[serde(default)]
    pub fade_ms: u64,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub levels: Vec<LevelDef>,
    #[serde(default)]
    pub route: Vec<RouteStep>,
}

fn default_subject() -> String {
    "player".to_string()
}

impl Scenario {
    /// Parse from TOML
    pub fn from_toml_str(content: &str) -> ScenarioResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a file and apply `VOID_LEVELS_*` overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> ScenarioResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut scenario = Self::from_toml_str(&content)?;
        scenario.config.apply_env_overrides()?;
        log::info!(
            "Loaded scenario {} ({} levels, {} steps)",
            path.as_ref().display(),
            scenario.levels.len(),
            scenario.route.len()
        );
        Ok(scenario)
    }

    /// Build the level catalog, rejecting repeated ids
    pub fn catalog(&self) -> ScenarioResult<LevelCatalog> {
        Ok(LevelCatalog::try_new(self.levels.iter().map(|level| level.record.clone()))?)
    }
}
