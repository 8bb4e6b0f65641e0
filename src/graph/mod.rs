//! The registry graph
//!
//! All loaded elements and resolved edges, plus the secondary indexes that
//! make traversal O(1). The graph is built once by [`loader::load_registry`]
//! and read-only afterwards: view-model builders and summaries only allocate
//! new request-scoped structures, which is what makes concurrent view
//! requests safe without locking.
//!
//! Elements live in an arena keyed by stable identifier; edges reference
//! identifiers, never elements. Cross-references may form cycles and the
//! identifier indirection keeps ownership flat.

pub mod health;
pub mod loader;
pub mod resolve;

use std::collections::{BTreeMap, HashMap};

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

use crate::mapping::RegistryMapping;

pub use health::ElementHealth;
pub use loader::{load_registry, load_with_mapping};
pub use resolve::{Candidate, ReferenceIndex};

/// Outcome of resolving one raw reference value.
///
/// An unresolved reference is data, not an error: the raw string is kept for
/// display and surfaces later as a broken-reference health flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResolvedRef {
    Resolved {
        raw: String,
        target_id: String,
        target_name: String,
    },
    Unresolved {
        raw: String,
    },
}

impl ResolvedRef {
    pub fn raw(&self) -> &str {
        match self {
            Self::Resolved { raw, .. } | Self::Unresolved { raw } => raw,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Resolved { target_id, .. } => Some(target_id),
            Self::Unresolved { .. } => None,
        }
    }
}

/// A resolved relationship field: every reference the field held, resolved
/// or not. Supports one-to-many fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRelationship {
    /// Header key the references came from.
    pub field_key: String,
    /// Semantic relationship type declared in the mapping.
    pub semantic: String,
    pub refs: Vec<ResolvedRef>,
}

/// An inbound reference, back-populated after the whole graph is assembled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundRef {
    pub source_id: String,
    pub source_name: String,
    pub semantic: String,
    pub field_key: String,
}

/// A fully loaded registry element — one document, parsed and resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryElement {
    /// Globally unique: `{type_key}--{slug}`. Immutable once assigned.
    pub id: String,
    pub type_key: String,
    pub type_label: String,
    pub layer: String,
    /// Hierarchy rank carried from the type declaration.
    pub graph_rank: i32,
    pub icon: String,
    pub badge_category: String,
    /// All header fields, declared or not. Undeclared fields pass through
    /// for display and are never used in resolution.
    pub fields: crate::fields::FieldBag,
    /// Markdown body below the header.
    pub body: String,
    /// Source path relative to the registry root.
    pub source_path: String,
    /// Outbound relationships, resolved.
    pub relationships: Vec<ResolvedRelationship>,
    /// Inbound references from other elements.
    pub inbound: Vec<InboundRef>,
    pub health: ElementHealth,
}

impl RegistryElement {
    /// Display name: the `name` header field, or the id as a last resort.
    pub fn name(&self) -> &str {
        self.fields.str_or("name", &self.id)
    }

    /// Normalized domain key this element belongs to.
    pub fn domain(&self) -> String {
        match self.fields.str("domain") {
            Some(raw) if !raw.trim().is_empty() => normalize_domain(raw),
            _ => "unknown".to_string(),
        }
    }
}

/// A directed edge derived from one resolved reference. Two elements may be
/// connected by several edges of different semantic types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEdge {
    pub source_id: String,
    pub target_id: String,
    pub semantic: String,
    pub field_key: String,
    pub label: String,
}

/// Pre-built lookup tables. Values are element ids or edge positions into
/// the graph's own collections — views, not owners.
#[derive(Debug, Clone, Default)]
pub struct GraphIndexes {
    pub by_type: HashMap<String, Vec<String>>,
    pub by_domain: BTreeMap<String, Vec<String>>,
    pub by_layer: HashMap<String, Vec<String>>,
    /// Lowercased display name → element id.
    pub by_name: HashMap<String, String>,
    /// Uppercased short code → element id.
    pub by_abbreviation: HashMap<String, String>,
    pub edges_by_source: HashMap<String, Vec<usize>>,
    pub edges_by_target: HashMap<String, Vec<usize>>,
}

/// Direct neighborhood of an element.
#[derive(Debug, Default)]
pub struct Neighbors<'a> {
    /// Elements with an edge INTO the anchor element.
    pub parents: Vec<&'a RegistryElement>,
    /// Elements the anchor element has an edge to.
    pub children: Vec<&'a RegistryElement>,
}

/// Fuzzy search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub type_key: String,
    pub score: i64,
}

/// The loaded registry graph. Owns every element and edge.
#[derive(Debug)]
pub struct RegistryGraph {
    pub(crate) elements: BTreeMap<String, RegistryElement>,
    pub(crate) edges: Vec<RegistryEdge>,
    pub(crate) indexes: GraphIndexes,
    pub(crate) mapping: RegistryMapping,
    pub(crate) bundle_hash: String,
}

impl RegistryGraph {
    /// Load a registry: mapping document plus one folder per entity type
    /// under the workspace root. See [`loader::load_registry`].
    pub fn load(
        mapping_path: &std::path::Path,
        workspace_root: &std::path::Path,
    ) -> crate::error::Result<Self> {
        loader::load_registry(mapping_path, workspace_root)
    }

    pub fn mapping(&self) -> &RegistryMapping {
        &self.mapping
    }

    /// Hash over every scanned document, for cache keys and reproducibility
    /// checks. Identical inputs always produce an identical hash.
    pub fn bundle_hash(&self) -> &str {
        &self.bundle_hash
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn element(&self, id: &str) -> Option<&RegistryElement> {
        self.elements.get(id)
    }

    pub fn all_elements(&self) -> impl Iterator<Item = &RegistryElement> {
        self.elements.values()
    }

    pub fn edges(&self) -> &[RegistryEdge] {
        &self.edges
    }

    pub fn elements_by_type(&self, type_key: &str) -> Vec<&RegistryElement> {
        self.collect_ids(self.indexes.by_type.get(type_key))
    }

    /// Elements in a domain. The key is normalized the same way the index
    /// was built, so callers can pass raw header values.
    pub fn elements_by_domain(&self, domain: &str) -> Vec<&RegistryElement> {
        self.collect_ids(self.indexes.by_domain.get(&normalize_domain(domain)))
    }

    pub fn elements_by_layer(&self, layer: &str) -> Vec<&RegistryElement> {
        self.collect_ids(self.indexes.by_layer.get(layer))
    }

    /// All known domain keys, sorted, without the `unknown` bucket.
    pub fn domains(&self) -> Vec<&str> {
        self.indexes
            .by_domain
            .keys()
            .map(String::as_str)
            .filter(|d| *d != "unknown")
            .collect()
    }

    /// Edges out of an element.
    pub fn outgoing(&self, id: &str) -> Vec<&RegistryEdge> {
        self.collect_edges(self.indexes.edges_by_source.get(id))
    }

    /// Edges into an element.
    pub fn incoming(&self, id: &str) -> Vec<&RegistryEdge> {
        self.collect_edges(self.indexes.edges_by_target.get(id))
    }

    /// True when the element is the source or target of at least one edge.
    pub fn is_connected(&self, id: &str) -> bool {
        self.indexes.edges_by_source.contains_key(id)
            || self.indexes.edges_by_target.contains_key(id)
    }

    /// Direct neighborhood: elements pointing in, elements pointed to.
    pub fn neighbors(&self, id: &str) -> Neighbors<'_> {
        let mut neighbors = Neighbors::default();
        for edge in self.incoming(id) {
            if let Some(el) = self.elements.get(&edge.source_id) {
                neighbors.parents.push(el);
            }
        }
        for edge in self.outgoing(id) {
            if let Some(el) = self.elements.get(&edge.target_id) {
                neighbors.children.push(el);
            }
        }
        neighbors
    }

    /// Elements with no edges at all.
    pub fn orphans(&self) -> Vec<&RegistryElement> {
        self.elements
            .values()
            .filter(|el| !el.health.is_connected)
            .collect()
    }

    /// Fuzzy search over display names and slugs.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let matcher = SkimMatcherV2::default();
        let mut hits: Vec<SearchHit> = Vec::new();

        for el in self.elements.values() {
            let score = matcher
                .fuzzy_match(el.name(), query)
                .or_else(|| matcher.fuzzy_match(&el.id, query));
            if let Some(score) = score {
                hits.push(SearchHit {
                    id: el.id.clone(),
                    name: el.name().to_string(),
                    type_key: el.type_key.clone(),
                    score,
                });
            }
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        hits
    }

    fn collect_ids(&self, ids: Option<&Vec<String>>) -> Vec<&RegistryElement> {
        ids.map(|ids| ids.iter().filter_map(|id| self.elements.get(id)).collect())
            .unwrap_or_default()
    }

    fn collect_edges(&self, positions: Option<&Vec<usize>>) -> Vec<&RegistryEdge> {
        positions
            .map(|ps| ps.iter().filter_map(|&p| self.edges.get(p)).collect())
            .unwrap_or_default()
    }
}

/// Normalize a raw domain value into a stable key: lowercase, `&` spelled
/// out, whitespace collapsed to hyphens.
pub fn normalize_domain(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace('&', "and")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
