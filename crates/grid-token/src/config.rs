//! Configuration loaded from TOML, with environment overrides.
//!
//! ```toml
//! [grid]
//! width = 10
//! height = 6
//!
//! [catalog]
//! api_base = "https://api.example.test"
//! timeout_secs = 30
//! default_ship_type = "standard"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::Dimensions;

/// Overrides `catalog.api_base`.
pub const ENV_API_BASE: &str = "GRID_TOKEN_API_BASE";

/// Overrides `catalog.default_ship_type`.
pub const ENV_SHIP_TYPE: &str = "GRID_TOKEN_SHIP_TYPE";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: Dimensions,
    pub catalog: CatalogConfig,
}

/// Where and how to fetch tech trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    /// Ship type used when a share link names none.
    pub default_ship_type: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8016".to_string(),
            timeout_secs: 30,
            default_ship_type: "standard".to_string(),
        }
    }
}

impl Config {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Applies overrides from `lookup` (usually `std::env::var(..).ok()`).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api_base) = lookup(ENV_API_BASE) {
            self.catalog.api_base = api_base;
        }
        if let Some(ship_type) = lookup(ENV_SHIP_TYPE) {
            self.catalog.default_ship_type = ship_type;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.grid.cell_count(), 60);
        assert_eq!(config.catalog.default_ship_type, "standard");
    }

    #[test]
    fn test_partial_document() {
        let config = Config::from_toml_str(
            r#"
            [grid]
            width = 4

            [catalog]
            api_base = "https://api.example.test"
            "#,
        )
        .unwrap();
        assert_eq!(config.grid, Dimensions::new(4, 6));
        assert_eq!(config.catalog.api_base, "https://api.example.test");
        assert_eq!(config.catalog.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_document() {
        let result = Config::from_toml_str("[grid]\nwidth = \"wide\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/grid-token.toml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(|key| match key {
            ENV_API_BASE => Some("https://override.test".to_string()),
            _ => None,
        });
        assert_eq!(config.catalog.api_base, "https://override.test");
        assert_eq!(config.catalog.default_ship_type, "standard");
    }
}
