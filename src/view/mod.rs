//! View models
//!
//! Turns a bounded slice of the registry graph — one domain, or one
//! element's direct neighborhood — into layout-ready nodes and edges.
//! Every builder allocates a fresh model per request and never touches the
//! graph; re-centering a focus view is just another invocation.

pub mod layout;
pub mod semantics;

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use crate::graph::{RegistryElement, RegistryGraph};
use crate::mapping::title_case;
use self::semantics::{normalize_edge, ArrowStyle, HierarchyTable, SemanticsTable};

/// Focus views place their three columns directly instead of running the
/// layered pass; these are the column and row gaps.
const FOCUS_COLUMN_GAP: f64 = 400.0;
const FOCUS_ROW_GAP: f64 = 140.0;

/// Placeholder node ids — never collide with element ids.
pub const PLACEHOLDER_LEFT: &str = "__placeholder-left__";
pub const PLACEHOLDER_RIGHT: &str = "__placeholder-right__";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One node of a view model. Style-neutral: icons, layers, and badge
/// categories pass through as tokens for the renderer to interpret.
#[derive(Debug, Clone, Serialize)]
pub struct ViewNode {
    pub id: String,
    pub label: String,
    pub type_key: String,
    pub type_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub rank: i32,
    /// Size hints for the layout pass; defaults apply when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub is_center: bool,
    pub is_placeholder: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// One edge of a view model, direction-normalized for left-to-right layout.
#[derive(Debug, Clone, Serialize)]
pub struct ViewEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub semantic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_key: Option<String>,
    pub label: String,
    /// Draw direction is reversed relative to the semantic edge.
    pub flipped: bool,
    pub arrow: ArrowStyle,
}

/// A layout-ready scope of the graph. Request-scoped and disposable.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewModel {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

impl ViewModel {
    pub fn node(&self, id: &str) -> Option<&ViewNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Builds view models over one graph with a fixed pair of lookup tables.
pub struct ViewBuilder<'g> {
    graph: &'g RegistryGraph,
    hierarchy: HierarchyTable,
    semantics: SemanticsTable,
}

impl<'g> ViewBuilder<'g> {
    pub fn new(graph: &'g RegistryGraph) -> Self {
        Self {
            graph,
            hierarchy: HierarchyTable::default(),
            semantics: SemanticsTable::default(),
        }
    }

    pub fn with_tables(
        graph: &'g RegistryGraph,
        hierarchy: HierarchyTable,
        semantics: SemanticsTable,
    ) -> Self {
        Self {
            graph,
            hierarchy,
            semantics,
        }
    }

    fn rank(&self, element: &RegistryElement) -> i32 {
        self.hierarchy
            .rank_of(&element.type_key, Some(element.graph_rank))
    }

    fn element_node(&self, element: &RegistryElement, is_center: bool) -> ViewNode {
        ViewNode {
            id: element.id.clone(),
            label: element.name().to_string(),
            type_key: element.type_key.clone(),
            type_label: element.type_label.clone(),
            layer: Some(element.layer.clone()),
            icon: (!element.icon.is_empty()).then(|| element.icon.clone()),
            rank: self.rank(element),
            width: None,
            height: None,
            is_center,
            is_placeholder: false,
            position: None,
        }
    }

    fn view_edge(
        &self,
        source: &RegistryElement,
        target: &RegistryElement,
        semantic: &str,
        field_key: Option<&str>,
    ) -> ViewEdge {
        let semantics = self.semantics.get(semantic);
        let normalized = normalize_edge(
            &source.id,
            self.rank(source),
            &target.id,
            self.rank(target),
            &semantics,
        );
        ViewEdge {
            id: format!("{}--{}--{}", source.id, semantic, target.id),
            source: normalized.source,
            target: normalized.target,
            semantic: semantic.to_string(),
            field_key: field_key.map(String::from),
            label: semantics.label,
            flipped: normalized.flipped,
            arrow: semantics.arrow,
        }
    }

    /// Domain map: every element of the domain, edges between them, and a
    /// rank-0 anchor node the rank-1 elements hang off when nothing else
    /// points at them.
    pub fn domain_view(&self, domain_id: &str) -> ViewModel {
        let elements = self.graph.elements_by_domain(domain_id);
        let in_scope: HashSet<&str> = elements.iter().map(|el| el.id.as_str()).collect();

        let anchor = elements.iter().find(|el| self.rank(el) == 0);
        let anchor_id = crate::graph::normalize_domain(domain_id);
        let anchor_label = anchor
            .map(|el| el.name().to_string())
            .unwrap_or_else(|| title_case(&anchor_id.replace('-', "_")));

        let mut nodes = vec![ViewNode {
            id: anchor_id.clone(),
            label: anchor_label,
            type_key: "domain".to_string(),
            type_label: "Domain".to_string(),
            layer: None,
            icon: None,
            rank: 0,
            width: None,
            height: None,
            is_center: false,
            is_placeholder: false,
            position: None,
        }];

        let mut edge_map: IndexMap<String, ViewEdge> = IndexMap::new();

        for element in &elements {
            nodes.push(self.element_node(element, false));

            for edge in self.graph.outgoing(&element.id) {
                if !in_scope.contains(edge.target_id.as_str()) {
                    continue;
                }
                let Some(target) = self.graph.element(&edge.target_id) else {
                    continue;
                };
                let view_edge =
                    self.view_edge(element, target, &edge.semantic, Some(&edge.field_key));
                edge_map.entry(view_edge.id.clone()).or_insert(view_edge);
            }
        }

        // Anchor containment: rank-1 elements nothing else points at are
        // attached to the anchor so every column stays reachable.
        let targets_with_incoming: HashSet<String> =
            edge_map.values().map(|e| e.target.clone()).collect();

        for element in &elements {
            if self.rank(element) != 1 || targets_with_incoming.contains(&element.id) {
                continue;
            }
            let is_data = element.type_key.contains("data");
            let semantic = if is_data { "owns" } else { "composition" };
            let semantics = self.semantics.get(semantic);
            let id = format!("{}--{}--{}", anchor_id, semantic, element.id);
            edge_map.entry(id.clone()).or_insert(ViewEdge {
                id,
                source: anchor_id.clone(),
                target: element.id.clone(),
                semantic: semantic.to_string(),
                field_key: None,
                label: semantics.label,
                flipped: false,
                arrow: semantics.arrow,
            });
        }

        ViewModel {
            nodes,
            edges: edge_map.into_values().collect(),
        }
    }

    /// Focus (ego) view: the center element, inbound sources on the left,
    /// outbound targets on the right, placeholders for empty sides. Nodes
    /// come back positioned; no further layout pass is needed.
    pub fn focus_view(&self, center_id: &str) -> ViewModel {
        let Some(center) = self.graph.element(center_id) else {
            return ViewModel::default();
        };

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut placed: HashSet<String> = HashSet::new();

        let mut center_node = self.element_node(center, true);
        center_node.position = Some(Position { x: 0.0, y: 0.0 });
        placed.insert(center_node.id.clone());
        nodes.push(center_node);

        let incoming = self.graph.incoming(center_id);
        let left: Vec<&RegistryElement> = incoming
            .iter()
            .filter_map(|e| self.graph.element(&e.source_id))
            .filter(|el| el.id != center_id)
            .collect();
        let outgoing = self.graph.outgoing(center_id);
        let right: Vec<&RegistryElement> = outgoing
            .iter()
            .filter_map(|e| self.graph.element(&e.target_id))
            .filter(|el| el.id != center_id)
            .collect();

        for (index, element) in left.iter().enumerate() {
            if !placed.insert(element.id.clone()) {
                continue;
            }
            let mut node = self.element_node(element, false);
            node.position = Some(Position {
                x: -FOCUS_COLUMN_GAP,
                y: row_offset(index, left.len()),
            });
            nodes.push(node);
        }

        for (index, element) in right.iter().enumerate() {
            if !placed.insert(element.id.clone()) {
                // Already placed on the left; the edge below still renders.
                continue;
            }
            let mut node = self.element_node(element, false);
            node.position = Some(Position {
                x: FOCUS_COLUMN_GAP,
                y: row_offset(index, right.len()),
            });
            nodes.push(node);
        }

        if left.is_empty() {
            nodes.push(placeholder_node(
                PLACEHOLDER_LEFT,
                "No incoming connections",
                self.rank(center) - 1,
                -FOCUS_COLUMN_GAP,
            ));
        }
        if right.is_empty() {
            nodes.push(placeholder_node(
                PLACEHOLDER_RIGHT,
                "No outgoing connections",
                self.rank(center) + 1,
                FOCUS_COLUMN_GAP,
            ));
        }

        for edge in incoming {
            if let Some(source) = self.graph.element(&edge.source_id) {
                edges.push(self.view_edge(source, center, &edge.semantic, Some(&edge.field_key)));
            }
        }
        for edge in outgoing {
            if let Some(target) = self.graph.element(&edge.target_id) {
                edges.push(self.view_edge(center, target, &edge.semantic, Some(&edge.field_key)));
            }
        }

        ViewModel { nodes, edges }
    }

    /// Element context view: the element plus every direct neighbor, with
    /// real edges only. Unpositioned; run the layout pass over it.
    pub fn element_view(&self, element_id: &str) -> ViewModel {
        let Some(center) = self.graph.element(element_id) else {
            return ViewModel::default();
        };

        let mut nodes = vec![self.element_node(center, true)];
        let mut added: HashSet<String> = HashSet::new();
        added.insert(center.id.clone());

        let mut edge_map: IndexMap<String, ViewEdge> = IndexMap::new();

        for edge in self.graph.outgoing(element_id) {
            let Some(target) = self.graph.element(&edge.target_id) else {
                continue;
            };
            if added.insert(target.id.clone()) {
                nodes.push(self.element_node(target, false));
            }
            let view_edge = self.view_edge(center, target, &edge.semantic, Some(&edge.field_key));
            edge_map.entry(view_edge.id.clone()).or_insert(view_edge);
        }

        for edge in self.graph.incoming(element_id) {
            let Some(source) = self.graph.element(&edge.source_id) else {
                continue;
            };
            if added.insert(source.id.clone()) {
                nodes.push(self.element_node(source, false));
            }
            let view_edge = self.view_edge(source, center, &edge.semantic, Some(&edge.field_key));
            edge_map.entry(view_edge.id.clone()).or_insert(view_edge);
        }

        ViewModel {
            nodes,
            edges: edge_map.into_values().collect(),
        }
    }
}

fn row_offset(index: usize, count: usize) -> f64 {
    (index as f64 - (count.saturating_sub(1)) as f64 / 2.0) * FOCUS_ROW_GAP
}

fn placeholder_node(id: &str, label: &str, rank: i32, x: f64) -> ViewNode {
    ViewNode {
        id: id.to_string(),
        label: label.to_string(),
        type_key: "placeholder".to_string(),
        type_label: "Placeholder".to_string(),
        layer: None,
        icon: None,
        rank,
        width: None,
        height: None,
        is_center: false,
        is_placeholder: true,
        position: Some(Position { x, y: 0.0 }),
    }
}
