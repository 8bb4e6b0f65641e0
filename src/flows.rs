//! Event-flow mapping — optional side mapping
//!
//! A small YAML document binds vocabulary-agnostic registry types to
//! event-flow roles: which entity type plays "service", which plays
//! "event", and which relationship fields carry publish/consume links.
//! Resolution reuses the graph's edge indexes; when an event connects to a
//! service through intermediate hops (event → API → subsystem) a bounded
//! breadth-first walk finds the nearest ancestors of the service type.
//!
//! The whole feature is optional: a missing or malformed mapping disables
//! it for the run and never affects the core load.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::graph::{RegistryElement, RegistryGraph};

/// Traversal stops after this many hops from the event.
const MAX_ANCESTOR_DEPTH: usize = 3;

/// Bindings from registry vocabulary to event-flow roles.
#[derive(Debug, Clone, Deserialize)]
pub struct EventFlowConfig {
    /// Entity type key playing the "service" role.
    pub service_type: String,
    /// Entity type key playing the "event" role.
    pub event_type: String,
    /// Relationship field on events pointing at publishers.
    pub publishes_field: String,
    /// Relationship field on events pointing at consumers.
    pub consumes_field: String,
    #[serde(default)]
    pub service_label: Option<String>,
    #[serde(default)]
    pub event_label: Option<String>,
}

impl EventFlowConfig {
    /// Load the mapping, or disable the feature: absent file is quiet,
    /// malformed content warns. Neither is an error.
    pub fn load(path: &Path) -> Option<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "event-flow mapping not present; feature disabled");
            return None;
        }
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read event-flow mapping; feature disabled");
                return None;
            }
        };
        match serde_yaml::from_str::<Self>(&raw) {
            Ok(config) => Some(config),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to parse event-flow mapping; feature disabled");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventNode {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: String,
    pub format: String,
    pub domain: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceNode {
    pub id: String,
    pub name: String,
    pub status: String,
    pub domain: String,
    /// The service lives outside the requested domain.
    pub cross_domain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Publishes,
    Consumes,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowEdge {
    pub service_id: String,
    pub event_id: String,
    pub kind: FlowKind,
}

/// Event flows of one domain, ready for a flow diagram.
#[derive(Debug, Clone, Serialize)]
pub struct EventFlow {
    pub events: Vec<EventNode>,
    pub services: Vec<ServiceNode>,
    pub edges: Vec<FlowEdge>,
    pub service_label: String,
    pub event_label: String,
}

/// Resolve the event flows of a domain. `None` when the domain has no
/// events of the configured type.
pub fn event_flows(
    graph: &RegistryGraph,
    config: &EventFlowConfig,
    domain_id: &str,
) -> Option<EventFlow> {
    let domain_key = crate::graph::normalize_domain(domain_id);
    let events: Vec<&RegistryElement> = graph
        .elements_by_type(&config.event_type)
        .into_iter()
        .filter(|el| el.domain() == domain_key)
        .collect();

    if events.is_empty() {
        return None;
    }

    let mut event_nodes = Vec::new();
    let mut services: HashMap<String, ServiceNode> = HashMap::new();
    let mut service_order: Vec<String> = Vec::new();
    let mut edges = Vec::new();

    for event in &events {
        event_nodes.push(EventNode {
            id: event.id.clone(),
            name: event.name().to_string(),
            description: event.fields.str_or("description", "").to_string(),
            status: event.fields.str_or("status", "active").to_string(),
            format: event.fields.str_or("event_format", "").to_string(),
            domain: domain_key.clone(),
        });

        for (field, kind) in [
            (config.publishes_field.as_str(), FlowKind::Publishes),
            (config.consumes_field.as_str(), FlowKind::Consumes),
        ] {
            collect_service_edges(
                graph,
                event,
                field,
                &config.service_type,
                kind,
                &domain_key,
                &mut services,
                &mut service_order,
                &mut edges,
            );
        }
    }

    let mapping = graph.mapping();
    let service_label = config
        .service_label
        .clone()
        .or_else(|| mapping.element_type(&config.service_type).map(|t| t.label.clone()))
        .unwrap_or_else(|| "Service".to_string());
    let event_label = config
        .event_label
        .clone()
        .or_else(|| mapping.element_type(&config.event_type).map(|t| t.label.clone()))
        .unwrap_or_else(|| "Event".to_string());

    Some(EventFlow {
        events: event_nodes,
        services: service_order
            .iter()
            .filter_map(|id| services.get(id).cloned())
            .collect(),
        edges,
        service_label,
        event_label,
    })
}

/// Follow one relationship field from an event to services, walking through
/// intermediate elements when the direct target is not the service type.
#[allow(clippy::too_many_arguments)]
fn collect_service_edges(
    graph: &RegistryGraph,
    event: &RegistryElement,
    field_key: &str,
    service_type: &str,
    kind: FlowKind,
    domain_key: &str,
    services: &mut HashMap<String, ServiceNode>,
    service_order: &mut Vec<String>,
    edges: &mut Vec<FlowEdge>,
) {
    for edge in graph.outgoing(&event.id) {
        if edge.field_key != field_key {
            continue;
        }
        let Some(target) = graph.element(&edge.target_id) else {
            continue;
        };

        if target.type_key == service_type {
            add_service(target, domain_key, services, service_order);
            edges.push(FlowEdge {
                service_id: target.id.clone(),
                event_id: event.id.clone(),
                kind,
            });
            continue;
        }

        for ancestor in ancestors_of_type(graph, &target.id, service_type) {
            add_service(ancestor, domain_key, services, service_order);
            edges.push(FlowEdge {
                service_id: ancestor.id.clone(),
                event_id: event.id.clone(),
                kind,
            });
        }
    }
}

fn add_service(
    element: &RegistryElement,
    domain_key: &str,
    services: &mut HashMap<String, ServiceNode>,
    service_order: &mut Vec<String>,
) {
    if services.contains_key(&element.id) {
        return;
    }
    let domain = element.domain();
    services.insert(
        element.id.clone(),
        ServiceNode {
            id: element.id.clone(),
            name: element.name().to_string(),
            status: element.fields.str_or("status", "active").to_string(),
            cross_domain: domain != domain_key,
            domain,
        },
    );
    service_order.push(element.id.clone());
}

/// Nearest elements of a type reachable by following outgoing edges,
/// breadth-first, bounded by [`MAX_ANCESTOR_DEPTH`]. Traversal stops at a
/// match — an ancestor's own ancestors are not collected.
fn ancestors_of_type<'g>(
    graph: &'g RegistryGraph,
    start_id: &str,
    target_type: &str,
) -> Vec<&'g RegistryElement> {
    let mut found = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((start_id.to_string(), 0));

    while let Some((current_id, depth)) = queue.pop_front() {
        if !visited.insert(current_id.clone()) {
            continue;
        }
        let Some(element) = graph.element(&current_id) else {
            continue;
        };

        if element.type_key == target_type && current_id != start_id {
            found.push(element);
            continue;
        }
        if depth >= MAX_ANCESTOR_DEPTH {
            continue;
        }

        for edge in graph.outgoing(&current_id) {
            if !visited.contains(&edge.target_id) {
                queue.push_back((edge.target_id.clone(), depth + 1));
            }
        }
    }

    found
}
