//! Capability-heatmap mapping — optional side mapping
//!
//! Binds registry types and field keys to capability-assessment roles: one
//! entity type is the "capability", and four of its header fields drive the
//! heatmap dimensions (maturity, lifecycle, sourcing, tile size). Colors
//! and grid spans come from scales declared in the mapping document.
//!
//! Optional like the event-flow mapping: absent or malformed configuration
//! disables the feature for the run without touching the core load.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::RegistryGraph;

/// Grid span for one tile-size bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SizeSpec {
    pub cols: u32,
    pub rows: u32,
}

/// Bindings from registry vocabulary to heatmap roles.
#[derive(Debug, Clone, Deserialize)]
pub struct HeatmapConfig {
    /// Entity type key playing the "capability" role.
    pub capability_type: String,
    pub maturity_field: String,
    pub lifecycle_field: String,
    pub sourcing_field: String,
    pub size_field: String,
    /// Maturity value → color token.
    pub maturity_scale: IndexMap<String, String>,
    /// Size value → grid span.
    pub size_scale: IndexMap<String, SizeSpec>,
    /// Relationship field whose resolved targets are listed on the tile.
    #[serde(default)]
    pub realization_field: Option<String>,
    #[serde(default)]
    pub capability_label: Option<String>,
    #[serde(default)]
    pub maturity_label: Option<String>,
    #[serde(default)]
    pub lifecycle_label: Option<String>,
    #[serde(default)]
    pub sourcing_label: Option<String>,
}

impl HeatmapConfig {
    /// Load the mapping, or disable the feature: absent file is quiet,
    /// malformed content or empty scales warn. Neither is an error.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "heatmap mapping not present; feature disabled");
            return None;
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read heatmap mapping; feature disabled");
                return None;
            }
        };
        let config = match serde_yaml::from_str::<Self>(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to parse heatmap mapping; feature disabled");
                return None;
            }
        };
        if config.maturity_scale.is_empty() {
            warn!(path = %path.display(), "heatmap mapping has an empty maturity_scale; feature disabled");
            return None;
        }
        if config.size_scale.is_empty() {
            warn!(path = %path.display(), "heatmap mapping has an empty size_scale; feature disabled");
            return None;
        }
        Some(config)
    }
}

/// One capability projected onto the heatmap grid.
#[derive(Debug, Clone, Serialize)]
pub struct HeatmapTile {
    pub id: String,
    pub name: String,
    pub maturity: String,
    /// Color token from the maturity scale; empty when the value is not on
    /// the scale.
    pub color: String,
    pub lifecycle: String,
    pub sourcing: String,
    pub cols: u32,
    pub rows: u32,
    /// Display names of resolved targets of the realization field.
    pub realized_by: Vec<String>,
}

/// Project a domain's capabilities into heatmap tiles. `None` when the
/// domain has no capabilities of the configured type.
pub fn heatmap_tiles(
    graph: &RegistryGraph,
    config: &HeatmapConfig,
    domain_id: &str,
) -> Option<Vec<HeatmapTile>> {
    let domain_key = crate::graph::normalize_domain(domain_id);
    let capabilities: Vec<_> = graph
        .elements_by_type(&config.capability_type)
        .into_iter()
        .filter(|el| el.domain() == domain_key)
        .collect();

    if capabilities.is_empty() {
        return None;
    }

    let tiles = capabilities
        .into_iter()
        .map(|el| {
            let maturity = el.fields.str_or(&config.maturity_field, "").to_string();
            let size = el.fields.str_or(&config.size_field, "");

            let realized_by = config
                .realization_field
                .as_deref()
                .map(|field| {
                    graph
                        .outgoing(&el.id)
                        .into_iter()
                        .filter(|edge| edge.field_key == field)
                        .filter_map(|edge| graph.element(&edge.target_id))
                        .map(|target| target.name().to_string())
                        .collect()
                })
                .unwrap_or_default();

            let span = config
                .size_scale
                .get(size)
                .copied()
                .unwrap_or(SizeSpec { cols: 1, rows: 1 });

            HeatmapTile {
                id: el.id.clone(),
                name: el.name().to_string(),
                color: config.maturity_scale.get(&maturity).cloned().unwrap_or_default(),
                maturity,
                lifecycle: el.fields.str_or(&config.lifecycle_field, "").to_string(),
                sourcing: el.fields.str_or(&config.sourcing_field, "").to_string(),
                cols: span.cols,
                rows: span.rows,
                realized_by,
            }
        })
        .collect();

    Some(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_disables_quietly() {
        let dir = tempdir().unwrap();
        assert!(HeatmapConfig::load(&dir.path().join("not-there.yaml")).is_none());
    }

    #[test]
    fn test_empty_scale_disables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("heatmap.yaml");
        fs::write(
            &path,
            r#"
capability_type: capability
maturity_field: maturity
lifecycle_field: lifecycle
sourcing_field: sourcing
size_field: size
maturity_scale: {}
size_scale:
  s: { cols: 1, rows: 1 }
"#,
        )
        .unwrap();
        assert!(HeatmapConfig::load(&path).is_none());
    }

    #[test]
    fn test_valid_config_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("heatmap.yaml");
        fs::write(
            &path,
            r#"
capability_type: capability
maturity_field: maturity
lifecycle_field: lifecycle
sourcing_field: sourcing
size_field: size
maturity_scale:
  Excellent: '#10b981'
size_scale:
  s: { cols: 1, rows: 1 }
  l: { cols: 2, rows: 2 }
"#,
        )
        .unwrap();
        let config = HeatmapConfig::load(&path).unwrap();
        assert_eq!(config.size_scale.get("l").unwrap().cols, 2);
        assert!(config.realization_field.is_none());
    }
}
