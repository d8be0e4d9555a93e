//! Error types for level streaming

use thiserror::Error;
use void_level_graph::LevelId;

use crate::lifecycle::LevelState;
use crate::transition::TransitionStage;

/// Failure categories reported by the asset loading collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetLoadError {
    /// The address/key does not resolve to an asset
    #[error("Invalid asset key: {0}")]
    InvalidKey(String),

    /// The load or unload operation raised an error
    #[error("Asset operation failed: {0}")]
    OperationFailed(String),

    /// Generic failure status with no further detail
    #[error("Asset operation faulted: {0}")]
    Faulted(String),
}

/// Level streaming errors
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("Unknown level: {0}")]
    UnknownLevel(LevelId),

    #[error("World has no levels: {0}")]
    EmptyWorld(String),

    #[error("Area has no levels: {0}")]
    EmptyArea(String),

    #[error("Level {0} belongs to no area")]
    NoArea(LevelId),

    #[error("Level {0} has no spots")]
    NoSpots(LevelId),

    #[error("Level {level} has no spot {spot}")]
    UnknownSpot { level: LevelId, spot: String },

    #[error("Level {level} has no connection {connection}")]
    UnknownConnection { level: LevelId, connection: String },

    #[error("Level {level} has no portal {portal}")]
    UnknownPortal { level: LevelId, portal: String },

    #[error("Level {level} cannot {action} while {from:?}")]
    IllegalTransition {
        level: LevelId,
        from: LevelState,
        action: &'static str,
    },

    #[error("Level {0} is not resident")]
    NotResident(LevelId),

    #[error("A level transition is already in progress")]
    TransitionInProgress,

    #[error("Transition to {target} aborted at {stage:?}: {source}")]
    TransitionAborted {
        target: LevelId,
        stage: TransitionStage,
        #[source]
        source: Box<LevelError>,
    },

    #[error("Failed to load level {level}: {source}")]
    Load {
        level: LevelId,
        #[source]
        source: AssetLoadError,
    },

    #[error("Failed to unload level {level}: {source}")]
    Unload {
        level: LevelId,
        #[source]
        source: AssetLoadError,
    },
}

/// Result type for level streaming operations
pub type LevelResult<T> = Result<T, LevelError>;
