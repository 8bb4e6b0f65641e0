//! Layered coordinate assignment
//!
//! The hierarchical position solver: nodes go into columns honoring the
//! normalized edge directions (longest path, with the node's rank as a
//! floor), rows are ordered by the mean position of predecessors to keep
//! crossings down, and coordinates flow left to right with configurable
//! spacing. Odd inputs never fail — a cyclic edge set falls back to pure
//! rank columns, and nodes without size hints use the defaults.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::view::{Position, ViewModel, ViewNode};

/// Spacing for the layered pass. Defaults match a 220×80 card grid.
#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    /// Horizontal gap between columns.
    pub rank_sep: f64,
    /// Vertical gap between nodes in a column.
    pub node_sep: f64,
    pub node_width: f64,
    pub node_height: f64,
    pub margin_x: f64,
    pub margin_y: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            rank_sep: 180.0,
            node_sep: 50.0,
            node_width: 220.0,
            node_height: 80.0,
            margin_x: 40.0,
            margin_y: 40.0,
        }
    }
}

/// Bounding box of a positioned view, for viewport fitting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Assign a position to every node of the model, in place.
pub fn apply_layout(model: &mut ViewModel, options: &LayoutOptions) {
    if model.nodes.is_empty() {
        return;
    }

    let index_of: HashMap<&str, usize> = model
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(model.nodes.len(), model.edges.len());
    let petgraph_index: Vec<NodeIndex> =
        (0..model.nodes.len()).map(|i| graph.add_node(i)).collect();

    for edge in &model.edges {
        let (Some(&source), Some(&target)) = (
            index_of.get(edge.source.as_str()),
            index_of.get(edge.target.as_str()),
        ) else {
            continue;
        };
        if source != target {
            graph.add_edge(petgraph_index[source], petgraph_index[target], ());
        }
    }

    let min_rank = model.nodes.iter().map(|n| n.rank).min().unwrap_or(0);
    let base_layer: Vec<i32> = model.nodes.iter().map(|n| n.rank - min_rank).collect();

    // Column per node: longest path over the edges, floored at the rank
    // column so disconnected nodes still land where their rank says.
    let mut layer = base_layer.clone();
    if let Ok(order) = toposort(&graph, None) {
        for node_idx in order {
            let i = graph[node_idx];
            let deepest_pred = graph
                .neighbors_directed(node_idx, Direction::Incoming)
                .map(|p| layer[graph[p]] + 1)
                .max();
            if let Some(deepest) = deepest_pred {
                layer[i] = layer[i].max(deepest);
            }
        }
    }

    // Group into columns, preserving node insertion order inside each.
    let mut columns: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for (i, &l) in layer.iter().enumerate() {
        columns.entry(l).or_default().push(i);
    }

    // Order each column by the mean row of its predecessors, one sweep.
    let mut row_of: HashMap<usize, usize> = HashMap::new();
    for column in columns.values_mut() {
        let mut keyed: Vec<(f64, usize, usize)> = column
            .iter()
            .enumerate()
            .map(|(insertion, &i)| {
                let rows: Vec<f64> = graph
                    .neighbors_directed(petgraph_index[i], Direction::Incoming)
                    .filter_map(|p| row_of.get(&graph[p]).map(|&r| r as f64))
                    .collect();
                let key = if rows.is_empty() {
                    insertion as f64
                } else {
                    rows.iter().sum::<f64>() / rows.len() as f64
                };
                (key, insertion, i)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        *column = keyed.iter().map(|&(_, _, i)| i).collect();
        for (row, &i) in column.iter().enumerate() {
            row_of.insert(i, row);
        }
    }

    // Coordinates: columns left to right, rows stacked and centered against
    // the tallest column.
    let column_height = |nodes: &[usize], model: &ViewModel| -> f64 {
        let total: f64 = nodes
            .iter()
            .map(|&i| model.nodes[i].height.unwrap_or(options.node_height))
            .sum();
        total + options.node_sep * nodes.len().saturating_sub(1) as f64
    };
    let max_height = columns
        .values()
        .map(|c| column_height(c, model))
        .fold(0.0, f64::max);

    for (column_index, nodes_in_column) in columns.values().enumerate() {
        let x = options.margin_x + column_index as f64 * (options.node_width + options.rank_sep);
        let mut y = options.margin_y + (max_height - column_height(nodes_in_column, model)) / 2.0;

        for &i in nodes_in_column {
            let node = &mut model.nodes[i];
            let width = node.width.unwrap_or(options.node_width);
            let height = node.height.unwrap_or(options.node_height);
            node.position = Some(Position {
                x: x + (options.node_width - width) / 2.0,
                y,
            });
            y += height + options.node_sep;
        }
    }
}

/// Bounding box over every positioned node.
pub fn graph_bounds(nodes: &[ViewNode], padding: f64) -> Bounds {
    let positioned: Vec<(&ViewNode, Position)> = nodes
        .iter()
        .filter_map(|n| n.position.map(|p| (n, p)))
        .collect();

    if positioned.is_empty() {
        return Bounds {
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
        };
    }

    let defaults = LayoutOptions::default();
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for (node, position) in positioned {
        let width = node.width.unwrap_or(defaults.node_width);
        let height = node.height.unwrap_or(defaults.node_height);
        min_x = min_x.min(position.x);
        min_y = min_y.min(position.y);
        max_x = max_x.max(position.x + width);
        max_y = max_y.max(position.y + height);
    }

    Bounds {
        x: min_x - padding,
        y: min_y - padding,
        width: max_x - min_x + padding * 2.0,
        height: max_y - min_y + padding * 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::semantics::ArrowStyle;
    use crate::view::{ViewEdge, ViewNode};

    fn node(id: &str, rank: i32) -> ViewNode {
        ViewNode {
            id: id.to_string(),
            label: id.to_string(),
            type_key: "component".to_string(),
            type_label: "Component".to_string(),
            layer: None,
            icon: None,
            rank,
            width: None,
            height: None,
            is_center: false,
            is_placeholder: false,
            position: None,
        }
    }

    fn edge(source: &str, target: &str) -> ViewEdge {
        ViewEdge {
            id: format!("{}--serving--{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            semantic: "serving".to_string(),
            field_key: None,
            label: "serves".to_string(),
            flipped: false,
            arrow: ArrowStyle::Open,
        }
    }

    #[test]
    fn test_edges_flow_left_to_right() {
        let mut model = ViewModel {
            nodes: vec![node("a", 0), node("b", 1), node("c", 2)],
            edges: vec![edge("a", "b"), edge("b", "c")],
        };
        apply_layout(&mut model, &LayoutOptions::default());

        let x = |id: &str| model.node(id).unwrap().position.unwrap().x;
        assert!(x("a") < x("b"));
        assert!(x("b") < x("c"));
    }

    #[test]
    fn test_chain_deeper_than_rank_still_monotone() {
        // Both b and c declare rank 1, but c hangs off b: the edge wins.
        let mut model = ViewModel {
            nodes: vec![node("a", 0), node("b", 1), node("c", 1)],
            edges: vec![edge("a", "b"), edge("b", "c")],
        };
        apply_layout(&mut model, &LayoutOptions::default());

        let x = |id: &str| model.node(id).unwrap().position.unwrap().x;
        assert!(x("b") < x("c"));
    }

    #[test]
    fn test_cycle_falls_back_to_rank_columns() {
        let mut model = ViewModel {
            nodes: vec![node("a", 1), node("b", 2)],
            edges: vec![edge("a", "b"), edge("b", "a")],
        };
        apply_layout(&mut model, &LayoutOptions::default());

        let x = |id: &str| model.node(id).unwrap().position.unwrap().x;
        assert!(x("a") < x("b"));
    }

    #[test]
    fn test_disconnected_node_positions_by_rank() {
        let mut model = ViewModel {
            nodes: vec![node("a", 0), node("b", 1), node("lonely", 2)],
            edges: vec![edge("a", "b")],
        };
        apply_layout(&mut model, &LayoutOptions::default());

        let x = |id: &str| model.node(id).unwrap().position.unwrap().x;
        assert!(x("lonely") > x("b"));
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let mut model = ViewModel {
            nodes: vec![node("a", 0), node("b", 1)],
            edges: vec![edge("a", "b")],
        };
        apply_layout(&mut model, &LayoutOptions::default());

        let bounds = graph_bounds(&model.nodes, 50.0);
        for n in &model.nodes {
            let p = n.position.unwrap();
            assert!(p.x >= bounds.x && p.x <= bounds.x + bounds.width);
            assert!(p.y >= bounds.y && p.y <= bounds.y + bounds.height);
        }
    }

    #[test]
    fn test_empty_model_is_a_no_op() {
        let mut model = ViewModel::default();
        apply_layout(&mut model, &LayoutOptions::default());
        assert!(model.nodes.is_empty());

        let bounds = graph_bounds(&model.nodes, 50.0);
        assert_eq!(bounds.width, 800.0);
    }
}
