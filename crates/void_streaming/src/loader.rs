//! Host engine collaborators used by the orchestrator
//!
//! The streaming core never touches engine scenes directly. Adapters implement
//! these traits on top of the engine's scene and addressable-asset systems.

use async_trait::async_trait;
use void_level_graph::LevelId;

use crate::error::AssetLoadError;
use crate::navigation::NavigationElement;
use crate::residency::{LoadHandle, ObjectHandle, SceneHandle};

/// Result type reported by the asset collaborator
pub type AssetResult<T> = Result<T, AssetLoadError>;

/// Asynchronous scene/object loading
///
/// Suspension happens only inside these calls. Implementations report failure
/// through `AssetLoadError` and never panic across this boundary.
#[async_trait(?Send)]
pub trait AssetLoader {
    /// Instantiate a level object from its address
    async fn load_object(&self, address: &str) -> AssetResult<ObjectHandle>;

    /// Additively load a level scene
    async fn load_scene(&self, key: &str) -> AssetResult<SceneHandle>;

    /// Unload a previously loaded scene
    async fn unload_scene(&self, handle: SceneHandle) -> AssetResult<()>;

    /// Destroy an instantiated object
    fn destroy_object(&self, handle: ObjectHandle);
}

/// Live layout of a freshly loaded level instance
#[derive(Debug, Clone, Default)]
pub struct LevelLayout {
    /// Z depth of the level root, preserved when placing subjects
    pub depth: f32,
    /// Navigation elements found under the level root, in traversal order
    pub elements: Vec<NavigationElement>,
}

impl LevelLayout {
    pub fn new(depth: f32) -> Self {
        Self {
            depth,
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, element: impl Into<NavigationElement>) -> Self {
        self.elements.push(element.into());
        self
    }
}

/// Scene-graph traversal of a loaded level instance
pub trait LevelInstanceScanner {
    /// Collect navigation elements from the children of the level instance
    fn scan(&self, id: &LevelId, handle: &LoadHandle) -> LevelLayout;
}
