//! Configuration for the atlas tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (atlas.toml)
//! - Environment variables (ATLAS_*)
//!
//! ## Example config file (atlas.toml):
//! ```toml
//! [paths]
//! mapping = "models/registry-mapping.yaml"
//! workspace_root = "."
//!
//! [features]
//! event_mapping = "models/event-mapping.yaml"
//! heatmap_mapping = "models/heatmap-mapping.yaml"
//!
//! [layout]
//! rank_sep = 180.0
//! node_sep = 50.0
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::view::layout::LayoutOptions;

/// Main configuration for the atlas tools
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Input locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Optional side-mapping documents
    #[serde(default)]
    pub features: FeatureConfig,

    /// Layout spacing
    #[serde(default)]
    pub layout: LayoutConfig,
}

/// Input locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to the registry mapping document
    #[serde(default = "default_mapping_path")]
    pub mapping: PathBuf,

    /// Workspace root the mapping's registry_root is relative to
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
}

/// Optional side-mapping documents. Absent entries disable the feature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(default)]
    pub event_mapping: Option<PathBuf>,

    #[serde(default)]
    pub heatmap_mapping: Option<PathBuf>,
}

/// Layout spacing, mirrored into [`LayoutOptions`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_rank_sep")]
    pub rank_sep: f64,

    #[serde(default = "default_node_sep")]
    pub node_sep: f64,

    #[serde(default = "default_node_width")]
    pub node_width: f64,

    #[serde(default = "default_node_height")]
    pub node_height: f64,
}

// Default value functions
fn default_mapping_path() -> PathBuf {
    PathBuf::from("models/registry-mapping.yaml")
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_rank_sep() -> f64 {
    180.0
}

fn default_node_sep() -> f64 {
    50.0
}

fn default_node_width() -> f64 {
    220.0
}

fn default_node_height() -> f64 {
    80.0
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            mapping: default_mapping_path(),
            workspace_root: default_workspace_root(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_sep: default_rank_sep(),
            node_sep: default_node_sep(),
            node_width: default_node_width(),
            node_height: default_node_height(),
        }
    }
}

impl AtlasConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        // Load from default locations
        let config_locations = ["atlas.toml", ".atlas.toml", "config/atlas.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // Load from XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "arch-atlas", "atlas") {
            let xdg_config = config_dir.config_dir().join("atlas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        // Load from specified path
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Load from environment variables (ATLAS_*)
        builder = builder.add_source(
            Environment::with_prefix("ATLAS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Layout options from the configured spacing
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            rank_sep: self.layout.rank_sep,
            node_sep: self.layout.node_sep,
            node_width: self.layout.node_width,
            node_height: self.layout.node_height,
            ..LayoutOptions::default()
        }
    }

    /// Absolute mapping path (resolves relative paths)
    pub fn mapping_path(&self) -> PathBuf {
        if self.paths.mapping.is_absolute() {
            self.paths.mapping.clone()
        } else {
            self.workspace_root().join(&self.paths.mapping)
        }
    }

    /// Absolute workspace root
    pub fn workspace_root(&self) -> PathBuf {
        if self.paths.workspace_root.is_absolute() {
            self.paths.workspace_root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.paths.workspace_root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AtlasConfig::default();
        assert_eq!(config.paths.mapping, default_mapping_path());
        assert!(config.features.event_mapping.is_none());
        assert_eq!(config.layout.rank_sep, 180.0);
    }

    #[test]
    fn test_serialize_config() {
        let config = AtlasConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[paths]"));
        assert!(toml_str.contains("[layout]"));
    }

    #[test]
    fn test_layout_options_carry_spacing() {
        let mut config = AtlasConfig::default();
        config.layout.rank_sep = 240.0;
        let options = config.layout_options();
        assert_eq!(options.rank_sep, 240.0);
        assert_eq!(options.margin_x, 40.0);
    }
}
