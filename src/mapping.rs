//! Registry mapping — the schema document that drives the loader
//!
//! A single YAML document declares every entity type the registry knows:
//! which folder its documents live in, which header fields it carries, and
//! how its relationship fields resolve to other documents. Presentational
//! metadata (layers, relationship verbs, site branding, domain palette) is
//! parsed and passed through untouched; the core never interprets it.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Site branding — opaque to the loader, consumed by renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteBranding {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_image: Option<String>,
}

impl Default for SiteBranding {
    fn default() -> Self {
        Self {
            name: "Architecture Catalog".to_string(),
            description: "Enterprise architecture registry".to_string(),
            logo_text: "A".to_string(),
            logo_image: None,
        }
    }
}

/// Presentational layer metadata, passed through to renderers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStyle {
    pub name: String,
    pub color: String,
    pub bg: String,
    #[serde(default)]
    pub icon: String,
}

/// Verb pair for a semantic relationship type ("serves" / "served by").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationLabels {
    pub outgoing: String,
    pub incoming: String,
    #[serde(default)]
    pub icon: String,
}

/// Declared kind of a header field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "string[]")]
    StringList,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "object[]")]
    ObjectList,
}

/// A declared header field on an entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub label: String,
}

/// How a raw reference string maps to a target document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveStrategy {
    /// Match the target's filename slug.
    Slug,
    /// Match the target's display name, case-insensitively.
    Name,
    /// Match the target's short code, case-insensitively.
    Abbreviation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// A declared relationship field on an entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Entity-type key of the expected target. A key not declared under
    /// `elements` is not a load error; references through the field simply
    /// lose the type-preference tie-break and resolve like any other.
    pub target: String,
    /// Semantic relationship type (composition, serving, realization, …).
    #[serde(rename = "type")]
    pub semantic: String,
    #[serde(default = "default_cardinality")]
    pub cardinality: Cardinality,
    pub resolve_by: ResolveStrategy,
    /// Field name on the target that points back, when the model declares one.
    #[serde(default)]
    pub inverse: Option<String>,
    #[serde(default)]
    pub required: bool,
}

fn default_cardinality() -> Cardinality {
    Cardinality::Many
}

/// One entity type: where its documents live and what they declare.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementType {
    pub label: String,
    pub layer: String,
    pub folder: String,
    /// Hierarchy rank used as the layout fallback for this type.
    #[serde(default = "default_rank")]
    pub graph_rank: i32,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_badge")]
    pub badge_category: String,
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,
    #[serde(default)]
    pub relationships: IndexMap<String, RelationSpec>,
}

fn default_rank() -> i32 {
    1
}

fn default_badge() -> String {
    "default".to_string()
}

/// Which verb of a relationship type to use when deriving a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDirection {
    Outgoing,
    Incoming,
}

/// The full registry mapping document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryMapping {
    #[serde(default)]
    pub version: String,
    /// Registry storage location, joined to the workspace root by the loader.
    #[serde(default)]
    pub registry_root: String,
    #[serde(default)]
    pub site: SiteBranding,
    #[serde(default)]
    pub layers: IndexMap<String, LayerStyle>,
    #[serde(default)]
    pub relationship_types: IndexMap<String, RelationLabels>,
    #[serde(default)]
    pub domain_color_palette: Vec<String>,
    /// Entity types in declaration order. Required: a mapping without any
    /// entity types cannot produce a registry.
    #[serde(default)]
    pub elements: IndexMap<String, ElementType>,
}

impl RegistryMapping {
    /// Parse a mapping from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mapping: Self = serde_yaml::from_str(text)?;
        if mapping.elements.is_empty() {
            return Err(AtlasError::MissingElements);
        }
        Ok(mapping)
    }

    /// Load and parse the mapping document from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AtlasError::MappingNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn element_type(&self, key: &str) -> Option<&ElementType> {
        self.elements.get(key)
    }

    /// Badge category for a type key, `"default"` for unmapped types.
    pub fn badge_category(&self, type_key: &str) -> &str {
        self.elements
            .get(type_key)
            .map(|t| t.badge_category.as_str())
            .unwrap_or("default")
    }

    /// Full type-key → badge-category lookup table.
    pub fn badge_map(&self) -> IndexMap<String, String> {
        self.elements
            .iter()
            .map(|(k, t)| (k.clone(), t.badge_category.clone()))
            .collect()
    }

    /// Human label for a graph edge: the relationship type's outgoing verb,
    /// or the field key with underscores spaced out.
    pub fn edge_label(&self, semantic: &str, field_key: &str) -> String {
        self.relationship_types
            .get(semantic)
            .map(|l| l.outgoing.clone())
            .unwrap_or_else(|| field_key.replace('_', " "))
    }

    /// Display label for a relationship field key, derived from whichever
    /// entity type declares it: `<verb> <target type label>`. Falls back to
    /// title-casing the key for undeclared fields.
    pub fn relationship_field_label(&self, field_key: &str, direction: LabelDirection) -> String {
        for type_def in self.elements.values() {
            if let Some(rel) = type_def.relationships.get(field_key) {
                let target_label = self
                    .elements
                    .get(&rel.target)
                    .map(|t| t.label.as_str())
                    .unwrap_or(rel.target.as_str());
                if let Some(verbs) = self.relationship_types.get(&rel.semantic) {
                    let verb = match direction {
                        LabelDirection::Outgoing => &verbs.outgoing,
                        LabelDirection::Incoming => &verbs.incoming,
                    };
                    return format!("{} {}", verb, target_label);
                }
                return target_label.to_string();
            }
        }
        title_case(field_key)
    }
}

pub(crate) fn title_case(key: &str) -> String {
    key.split('_')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let mut chars = p.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
