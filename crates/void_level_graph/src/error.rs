//! Error types for catalog construction

use thiserror::Error;

use crate::record::LevelId;

/// Catalog build errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two records share an id (strict build only)
    #[error("Duplicate level id in catalog: {0}")]
    DuplicateLevel(LevelId),

    /// Manifest is not valid JSON
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Manifest is not valid TOML
    #[error("Catalog TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Manifest could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
