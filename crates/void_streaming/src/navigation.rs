//! Navigation elements discovered inside a level instance
//!
//! Spots are placement points. Connections and portals lead to another level
//! and carry the spot where an arriving subject is placed. Elements are
//! rebuilt every time a level instance is loaded and start disabled.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use void_level_graph::LevelId;

/// Horizontal facing of a placed subject
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Neutral,
    Right,
}

impl Facing {
    /// Signed representation: -1, 0 or 1
    pub fn sign(&self) -> i8 {
        match self {
            Self::Left => -1,
            Self::Neutral => 0,
            Self::Right => 1,
        }
    }

    /// Build from any signed value
    pub fn from_sign(sign: i32) -> Self {
        match sign.signum() {
            -1 => Self::Left,
            1 => Self::Right,
            _ => Self::Neutral,
        }
    }
}

/// Placement point inside a level
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub id: String,
    pub is_main: bool,
    pub position: Vec2,
    pub facing: Facing,
}

impl Spot {
    pub fn new(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            is_main: false,
            position,
            facing: Facing::Neutral,
        }
    }

    /// Flag as the level's main spot
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }
}

/// Edge-of-level passage to another level
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: String,
    /// Level this connection leads to
    pub target_level: LevelId,
    /// Id of the counterpart connection inside the target level
    pub target_id: String,
    /// Arrival spot for subjects entering through this connection
    pub spot: Spot,
    pub enabled: bool,
}

impl Connection {
    pub fn new(
        id: impl Into<String>,
        target_level: impl Into<LevelId>,
        target_id: impl Into<String>,
        spot: Spot,
    ) -> Self {
        Self {
            id: id.into(),
            target_level: target_level.into(),
            target_id: target_id.into(),
            spot,
            enabled: false,
        }
    }
}

/// Teleport-style passage to another level
#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    pub id: String,
    pub target_level: LevelId,
    pub target_id: String,
    pub spot: Spot,
    pub enabled: bool,
}

impl Portal {
    pub fn new(
        id: impl Into<String>,
        target_level: impl Into<LevelId>,
        target_id: impl Into<String>,
        spot: Spot,
    ) -> Self {
        Self {
            id: id.into(),
            target_level: target_level.into(),
            target_id: target_id.into(),
            spot,
            enabled: false,
        }
    }
}

/// Any element found when scanning a level instance
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationElement {
    Spot(Spot),
    Connection(Connection),
    Portal(Portal),
}

impl NavigationElement {
    /// Element id, unique per kind within one level
    pub fn id(&self) -> &str {
        match self {
            Self::Spot(spot) => &spot.id,
            Self::Connection(connection) => &connection.id,
            Self::Portal(portal) => &portal.id,
        }
    }
}

impl From<Spot> for NavigationElement {
    fn from(spot: Spot) -> Self {
        Self::Spot(spot)
    }
}

impl From<Connection> for NavigationElement {
    fn from(connection: Connection) -> Self {
        Self::Connection(connection)
    }
}

impl From<Portal> for NavigationElement {
    fn from(portal: Portal) -> Self {
        Self::Portal(portal)
    }
}

/// Record of a completed placement, suitable for save systems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub level_id: LevelId,
    pub spawn_position: Vec2,
    pub facing: Facing,
}

impl Trail {
    pub fn new(level_id: LevelId, spawn_position: Vec2, facing: Facing) -> Self {
        Self {
            level_id,
            spawn_position,
            facing,
        }
    }
}

/// How a subject should be placed in the level it is entering
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlacementSpec {
    /// The level's main spot
    #[default]
    MainSpot,
    /// A named spot
    Spot(String),
    /// Arriving through a connection of the previous level
    Connection(Connection),
    /// Arriving through a portal of the previous level
    Portal(Portal),
    /// An explicit point
    Point { position: Vec2, facing: Facing },
}
