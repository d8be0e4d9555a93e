//! # void_level_graph - Level Catalog and Neighbour Graph
//!
//! Static description of a streamed world:
//! - `LevelRecord` metadata (world, area, neighbours, load address)
//! - `LevelCatalog` read-only registry keyed by `LevelId`
//! - `NeighborExpansion` depth-limited breadth-first traversal
//!
//! The catalog is built once from the output of the level import pipeline and
//! is never mutated afterwards. Lookups are silent: callers decide how a
//! missing level should be reported.
//!
//! ## Example
//!
//! ```ignore
//! use void_level_graph::prelude::*;
//!
//! let catalog = LevelCatalog::new([
//!     LevelRecord::new("a", "overworld").with_neighbor("b"),
//!     LevelRecord::new("b", "overworld").with_neighbors(["a", "c"]),
//!     LevelRecord::new("c", "overworld").with_neighbor("b"),
//! ]);
//!
//! let mut expansion = NeighborExpansion::new();
//! let resident = expansion.expand(&catalog, &"b".into(), 1);
//! assert_eq!(resident.len(), 3);
//! ```

pub mod catalog;
pub mod error;
pub mod expansion;
pub mod record;

pub use catalog::LevelCatalog;
pub use error::{CatalogError, CatalogResult};
pub use expansion::{clamp_depth, NeighborExpansion, MAX_DEPTH, MIN_DEPTH};
pub use record::{LevelId, LevelRecord};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::catalog::LevelCatalog;
    pub use crate::error::{CatalogError, CatalogResult};
    pub use crate::expansion::NeighborExpansion;
    pub use crate::record::{LevelId, LevelRecord};
}
