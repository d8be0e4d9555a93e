//! # void_streaming - Level Residency and Transitions
//!
//! Runtime level streaming for tile/grid worlds built from discrete levels:
//! - Residency tracking for graph-managed and standalone levels
//! - Strategy-driven loading (neighbour depth, whole world, whole area)
//! - Per-level lifecycle controllers (prepare, activate, deactivate)
//! - Transition sequencing with input freeze and visual effects
//!
//! Engine scene loading, instance scanning, input and effects are supplied
//! by the host through the traits in [`loader`], [`subject`] and [`effects`].
//! Everything runs on one logical thread; async calls suspend only inside
//! those collaborators.
//!
//! ## Example
//!
//! ```ignore
//! use void_streaming::prelude::*;
//!
//! let events = Rc::new(LevelEventBus::new());
//! let orchestrator = Rc::new(LoadingOrchestrator::new(
//!     catalog, loader, scanner, events.clone(), config.strategy(),
//! ));
//! let coordinator = TransitionCoordinator::new(orchestrator, input)
//!     .with_effect(curtain)
//!     .with_timer(Rc::new(TokioTimer), config.blend_wait());
//!
//! let trail = coordinator
//!     .transition_to(&"forest_02".into(), &player, &PlacementSpec::MainSpot)
//!     .await?;
//! ```

pub mod config;
pub mod effects;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod loader;
pub mod navigation;
pub mod orchestrator;
pub mod residency;
pub mod subject;
pub mod transition;

pub use config::{ConfigError, ConfigResult, StrategyKind, StreamingConfig};
pub use effects::{Timer, TokioTimer, TransitionEffect};
pub use error::{AssetLoadError, LevelError, LevelResult};
pub use events::{LevelEvent, LevelEventBus, SubscriberId};
pub use lifecycle::{LevelController, LevelRegistry, LevelState, SharedController, WeakController};
pub use loader::{AssetLoader, AssetResult, LevelInstanceScanner, LevelLayout};
pub use navigation::{Connection, Facing, NavigationElement, PlacementSpec, Portal, Spot, Trail};
pub use orchestrator::{LoadOutcome, LoadingOrchestrator, ResidencyReport, Strategy, UnloadOutcome};
pub use residency::{
    LevelResidencySet, LoadHandle, ObjectHandle, ResidencyEntry, ResidencyKind, ResidencyScope, SceneHandle,
};
pub use subject::{InputControl, PlacementSubject};
pub use transition::{TransitionCoordinator, TransitionStage, TransitionState};

pub use void_level_graph::{LevelCatalog, LevelId, LevelRecord};

/// Prelude
pub mod prelude {
    pub use crate::config::StreamingConfig;
    pub use crate::effects::{Timer, TokioTimer, TransitionEffect};
    pub use crate::error::{AssetLoadError, LevelError, LevelResult};
    pub use crate::events::{LevelEvent, LevelEventBus};
    pub use crate::loader::{AssetLoader, LevelInstanceScanner, LevelLayout};
    pub use crate::navigation::{Connection, Facing, PlacementSpec, Portal, Spot, Trail};
    pub use crate::orchestrator::{LoadingOrchestrator, Strategy};
    pub use crate::residency::ResidencyScope;
    pub use crate::subject::{InputControl, PlacementSubject};
    pub use crate::transition::TransitionCoordinator;
    pub use void_level_graph::{LevelCatalog, LevelId, LevelRecord};
}
