//! Hierarchy ranks and relationship semantics
//!
//! Two lookup tables drive layout: the hierarchy table maps entity-type keys
//! to an integer rank (negative ranks sit left of the anchor, zero is the
//! anchor, positive ranks sit right), and the semantics table describes how
//! each relationship type behaves in a diagram. Both tables ship with
//! defaults covering the common enterprise-architecture vocabulary and
//! degrade gracefully: an unknown type key falls back to the element's own
//! declared rank, an unknown relationship type to plain forward semantics.

use std::collections::HashMap;

use serde::Serialize;

/// How a relationship's edge participates in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// Drawn source → target.
    Forward,
    /// The dependency points one way but layout must flow the other; the
    /// edge is reversed for layout and marked flipped.
    Backward,
    /// Shown, but ignored for rank computation.
    Bidirectional,
}

/// Arrow-head token passed through to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrowStyle {
    Filled,
    Open,
    Diamond,
    DiamondFilled,
}

/// Layout behavior of one semantic relationship type.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipSemantics {
    pub direction: EdgeDirection,
    pub label: String,
    /// Whether the edge should influence hierarchy ranking.
    pub layout_relevant: bool,
    pub inverse: Option<String>,
    pub arrow: ArrowStyle,
}

/// Semantic type → layout behavior.
#[derive(Debug, Clone)]
pub struct SemanticsTable {
    entries: HashMap<String, RelationshipSemantics>,
}

impl SemanticsTable {
    /// Look up a semantic type. Unknown types get forward, non-ranking
    /// semantics and a label derived from the key — never an error.
    pub fn get(&self, semantic: &str) -> RelationshipSemantics {
        let key = semantic.to_lowercase().replace(' ', "-");
        self.entries.get(&key).cloned().unwrap_or_else(|| {
            RelationshipSemantics {
                direction: EdgeDirection::Forward,
                label: semantic.replace('-', " "),
                layout_relevant: false,
                inverse: None,
                arrow: ArrowStyle::Open,
            }
        })
    }

    /// Add or replace an entry.
    pub fn set(&mut self, semantic: &str, semantics: RelationshipSemantics) {
        self.entries.insert(semantic.to_string(), semantics);
    }
}

impl Default for SemanticsTable {
    fn default() -> Self {
        let mut entries = HashMap::new();
        let mut add = |key: &str,
                       direction: EdgeDirection,
                       label: &str,
                       layout_relevant: bool,
                       inverse: Option<&str>,
                       arrow: ArrowStyle| {
            entries.insert(
                key.to_string(),
                RelationshipSemantics {
                    direction,
                    label: label.to_string(),
                    layout_relevant,
                    inverse: inverse.map(String::from),
                    arrow,
                },
            );
        };

        use ArrowStyle::*;
        use EdgeDirection::*;

        // Structural
        add("composition", Forward, "contains", true, None, DiamondFilled);
        add("aggregation", Forward, "aggregates", true, None, Diamond);

        // Dependency
        add("realization", Backward, "realizes", true, Some("realized-by"), Open);
        add("realizes", Backward, "realizes", true, Some("realized-by"), Open);
        add("realized-by", Forward, "realized by", true, Some("realization"), Open);

        // Access
        add("access", Forward, "accesses", false, None, Open);
        add("accesses", Forward, "accesses", false, None, Open);
        add("accessed-by", Backward, "accessed by", false, Some("accesses"), Open);

        // Serving
        add("serving", Forward, "serves", true, None, Open);
        add("served-by", Backward, "served by", true, Some("serving"), Open);

        // Assignment
        add("assignment", Forward, "assigned to", true, None, Filled);

        // Triggering
        add("triggers", Forward, "triggers", false, None, Filled);
        add("triggered-by", Backward, "triggered by", false, Some("triggers"), Filled);

        // Flow
        add("flow", Forward, "flows to", false, None, Filled);

        // Association
        add("association", Bidirectional, "associated with", false, None, Open);
        add("owns", Forward, "owns", true, None, Open);

        // Process
        add("automated-by", Forward, "automated by", true, None, Open);
        add("supported-by", Forward, "supported by", false, None, Open);

        // Events
        add("publishes", Forward, "publishes", false, None, Filled);
        add("consumes", Forward, "consumes", false, None, Filled);

        Self { entries }
    }
}

/// Entity-type key → hierarchy rank.
#[derive(Debug, Clone)]
pub struct HierarchyTable {
    ranks: HashMap<String, i32>,
}

impl HierarchyTable {
    /// Rank for a type key. Lookup normalizes synonyms (case, hyphens,
    /// spaces); falls back to the element-declared rank, then to 1.
    pub fn rank_of(&self, type_key: &str, declared: Option<i32>) -> i32 {
        let key = type_key.to_lowercase().replace(['-', ' '], "_");
        self.ranks
            .get(&key)
            .copied()
            .or(declared)
            .unwrap_or(1)
    }

    /// Add or replace a rank.
    pub fn set(&mut self, type_key: &str, rank: i32) {
        self.ranks.insert(type_key.to_string(), rank);
    }
}

impl Default for HierarchyTable {
    fn default() -> Self {
        let entries: &[(&str, i32)] = &[
            // Motivation (left of the anchor)
            ("stakeholder", -2),
            ("goal", -2),
            ("principle", -2),
            ("driver", -1),
            ("assessment", -1),
            ("requirement", -1),
            // Products & services
            ("product", -1),
            ("market_segment", -2),
            // Business
            ("business_actor", -1),
            ("business_role", -1),
            ("business_service", -1),
            // Anchor
            ("domain", 0),
            ("architecture_area", 0),
            // Application, logical
            ("component", 1),
            ("business_capability", 1),
            // Application, physical
            ("software_system", 2),
            ("api_contract", 2),
            // Application, implementation
            ("software_subsystem", 3),
            ("api_endpoint", 3),
            ("software_component", 4),
            ("software_code", 5),
            // Data
            ("data_concept", 1),
            ("data_aggregate", 2),
            ("data_entity", 3),
            ("domain_event", 3),
            // Infrastructure
            ("infrastructure_function", 4),
            ("infrastructure_api", 4),
            ("application_infrastructure", 5),
            ("cloud_service", 5),
            ("infra_node", 6),
            ("network_zone", 6),
            ("networking_equipment", 6),
            // Process
            ("value_stream", 0),
            ("end_to_end_process", 1),
            ("business_process_module", 2),
            ("process_task", 3),
            ("business_event", 3),
            ("business_information_object", 2),
        ];

        Self {
            ranks: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

/// A layout-ready edge direction: which endpoint is drawn first, and whether
/// that is the reverse of the semantic direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEdge {
    pub source: String,
    pub target: String,
    /// Draw direction was reversed relative to the semantic edge. Purely
    /// informational — the semantic source never changes.
    pub flipped: bool,
}

/// Normalize an edge so layout proceeds by non-decreasing rank.
///
/// Backward relationships flip first; any edge still pointing from a higher
/// rank to a lower one is flipped again, so the postcondition holds for
/// every edge regardless of how the relationship was declared.
pub fn normalize_edge(
    source_id: &str,
    source_rank: i32,
    target_id: &str,
    target_rank: i32,
    semantics: &RelationshipSemantics,
) -> NormalizedEdge {
    let (source, source_rank, target, target_rank, flipped) =
        if semantics.direction == EdgeDirection::Backward {
            (target_id, target_rank, source_id, source_rank, true)
        } else {
            (source_id, source_rank, target_id, target_rank, false)
        };

    if source_rank > target_rank {
        return NormalizedEdge {
            source: target.to_string(),
            target: source.to_string(),
            flipped: !flipped,
        };
    }

    NormalizedEdge {
        source: source.to_string(),
        target: target.to_string(),
        flipped,
    }
}
