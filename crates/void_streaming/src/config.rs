//! Streaming configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VOID_LEVELS_STRATEGY`, `VOID_LEVELS_DEPTH`
//! 2. Config file (TOML)
//! 3. Defaults (neighbours, depth 1, no blend wait)
//!
//! # Example Config File
//!
//! ```toml
//! [streaming]
//! strategy = "neighbours"  # neighbours, worlds, areas
//! depth = 2
//!
//! [transition]
//! blend_wait_ms = 250
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::Strategy;

/// Environment variable overriding the strategy
pub const STRATEGY_ENV: &str = "VOID_LEVELS_STRATEGY";

/// Environment variable overriding the neighbour depth
pub const DEPTH_ENV: &str = "VOID_LEVELS_DEPTH";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Invalid depth: {0}")]
    InvalidDepth(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Residency policy name as written in config files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    #[serde(alias = "neighbors")]
    Neighbours,
    Worlds,
    Areas,
}

impl FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neighbours" | "neighbors" | "neighbour" | "neighbor" => Ok(Self::Neighbours),
            "worlds" | "world" => Ok(Self::Worlds),
            "areas" | "area" => Ok(Self::Areas),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// `[streaming]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingSection {
    pub strategy: StrategyKind,
    /// Neighbour depth, clamped to [1, 10] when the strategy is built
    pub depth: u32,
}

impl Default for StreamingSection {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Neighbours,
            depth: 1,
        }
    }
}

/// `[transition]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSection {
    /// Camera blend wait between preparing and opening, in milliseconds
    pub blend_wait_ms: u64,
}

/// Complete streaming configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub streaming: StreamingSection,
    pub transition: TransitionSection,
}

impl StreamingConfig {
    /// Parse from TOML
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::info!("Loaded streaming config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply `VOID_LEVELS_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(strategy) = lookup(STRATEGY_ENV) {
            self.streaming.strategy = strategy.parse()?;
            log::info!("Strategy overridden by {}: {:?}", STRATEGY_ENV, self.streaming.strategy);
        }
        if let Some(depth) = lookup(DEPTH_ENV) {
            self.streaming.depth = depth
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDepth(depth.clone()))?;
            log::info!("Depth overridden by {}: {}", DEPTH_ENV, self.streaming.depth);
        }
        Ok(())
    }

    /// Strategy value for the orchestrator
    pub fn strategy(&self) -> Strategy {
        match self.streaming.strategy {
            StrategyKind::Neighbours => Strategy::neighbours(self.streaming.depth),
            StrategyKind::Worlds => Strategy::Worlds,
            StrategyKind::Areas => Strategy::Areas,
        }
    }

    /// Camera blend wait
    pub fn blend_wait(&self) -> Duration {
        Duration::from_millis(self.transition.blend_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StreamingConfig::default();
        assert_eq!(config.strategy(), Strategy::Neighbours(1));
        assert_eq!(config.blend_wait(), Duration::ZERO);
    }

    #[test]
    fn test_parse_toml() {
        let config = StreamingConfig::from_toml_str(
            r#"
            [streaming]
            strategy = "areas"

            [transition]
            blend_wait_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy(), Strategy::Areas);
        assert_eq!(config.blend_wait(), Duration::from_millis(250));
    }

    #[test]
    fn test_depth_clamped() {
        let config = StreamingConfig::from_toml_str("[streaming]\ndepth = 99\n").unwrap();
        assert_eq!(config.strategy(), Strategy::Neighbours(10));
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        assert!(StreamingConfig::from_toml_str("[streaming]\nstrategy = \"spiral\"\n").is_err());
        assert!(matches!(
            "spiral".parse::<StrategyKind>(),
            Err(ConfigError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars = HashMap::from([(STRATEGY_ENV, "Worlds"), (DEPTH_ENV, "3")]);
        let mut config = StreamingConfig::default();

        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.streaming.strategy, StrategyKind::Worlds);
        assert_eq!(config.streaming.depth, 3);

        let bad = HashMap::from([(DEPTH_ENV, "deep")]);
        let result = config.apply_overrides(|key| bad.get(key).map(|v| v.to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidDepth(_))));
    }
}
