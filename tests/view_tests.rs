//! View-model, layout, and side-mapping integration tests

use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};

use arch_atlas::flows::{event_flows, EventFlowConfig, FlowKind};
use arch_atlas::heatmap::{heatmap_tiles, HeatmapConfig};
use arch_atlas::view::layout::{apply_layout, graph_bounds, LayoutOptions};
use arch_atlas::view::{ViewBuilder, ViewModel, PLACEHOLDER_LEFT, PLACEHOLDER_RIGHT};
use arch_atlas::{load_registry, RegistryGraph};

const MAPPING: &str = r##"
version: "1"
registry_root: registry
relationship_types:
  serving: { outgoing: serves, incoming: served by }
  composition: { outgoing: contains, incoming: part of }
  flow: { outgoing: flows to, incoming: receives }
domain_color_palette: ["#e11d48", "#2563eb"]
elements:
  domain:
    label: Domain
    layer: business
    folder: domains
    graph_rank: 0
    fields:
      name: { type: string, required: true, label: Name }
  capability:
    label: Business Capability
    layer: business
    folder: capabilities
    graph_rank: 1
    fields:
      name: { type: string, required: true, label: Name }
      maturity: { type: string, required: false, label: Maturity }
      lifecycle: { type: string, required: false, label: Lifecycle }
      sourcing: { type: string, required: false, label: Sourcing }
      size: { type: string, required: false, label: Size }
    relationships:
      supported_by: { target: system, type: serving, resolve_by: slug }
  system:
    label: Software System
    layer: applications
    folder: systems
    graph_rank: 2
    fields:
      name: { type: string, required: true, label: Name }
  api:
    label: API Contract
    layer: applications
    folder: apis
    graph_rank: 2
    fields:
      name: { type: string, required: true, label: Name }
    relationships:
      part_of: { target: system, type: composition, resolve_by: slug }
  domain_event:
    label: Domain Event
    layer: applications
    folder: events
    graph_rank: 3
    fields:
      name: { type: string, required: true, label: Name }
    relationships:
      published_by: { target: system, type: flow, resolve_by: slug }
      consumed_by: { target: system, type: flow, resolve_by: slug }
"##;

fn write(path: PathBuf, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(root.join("mapping.yaml"), MAPPING);

    write(
        root.join("registry/domains/core.md"),
        "---\nname: Core Platform\ndomain: Core Platform\n---\n",
    );
    write(
        root.join("registry/capabilities/billing.md"),
        "---\nname: Billing\ndomain: Core Platform\nsupported_by: crm-core\nmaturity: Excellent\nlifecycle: Active\nsourcing: Buy\nsize: l\n---\n",
    );
    write(
        root.join("registry/systems/crm-core.md"),
        "---\nname: CRM Core\ndomain: Core Platform\n---\n",
    );
    write(
        root.join("registry/apis/billing-api.md"),
        "---\nname: Billing API\ndomain: Core Platform\npart_of: crm-core\n---\n",
    );
    write(
        root.join("registry/events/invoice-created.md"),
        "---\nname: Invoice Created\ndomain: Core Platform\npublished_by: crm-core\nconsumed_by: billing-api\n---\n",
    );

    dir
}

fn load(dir: &TempDir) -> RegistryGraph {
    load_registry(&dir.path().join("mapping.yaml"), dir.path()).unwrap()
}

fn node_rank(view: &ViewModel, id: &str) -> i32 {
    view.node(id).unwrap().rank
}

// ── Domain view ──────────────────────────────────────────────

#[test]
fn test_domain_view_has_anchor_and_all_elements() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).domain_view("Core Platform");

    // Anchor plus the five elements of the domain.
    assert_eq!(view.nodes.len(), 6);
    let anchor = view.node("core-platform").unwrap();
    assert_eq!(anchor.rank, 0);
    assert_eq!(anchor.label, "Core Platform");
}

#[test]
fn test_domain_view_synthesizes_anchor_containment() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).domain_view("Core Platform");

    // Billing is the only rank-1 element and nothing else points at it.
    let synthesized = view
        .edges
        .iter()
        .find(|e| e.source == "core-platform")
        .unwrap();
    assert_eq!(synthesized.target, "capability--billing");
    assert_eq!(synthesized.semantic, "composition");
    assert_eq!(synthesized.label, "contains");
    assert!(!synthesized.flipped);
}

#[test]
fn test_domain_view_edges_never_decrease_in_rank() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).domain_view("Core Platform");

    for edge in &view.edges {
        assert!(
            node_rank(&view, &edge.source) <= node_rank(&view, &edge.target),
            "{} -> {}",
            edge.source,
            edge.target
        );
    }
}

#[test]
fn test_domain_view_flips_against_rank_edges() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).domain_view("Core Platform");

    // The event publishes to a system at a lower rank; the drawn edge runs
    // system → event and is marked flipped.
    let flipped = view
        .edges
        .iter()
        .find(|e| e.target == "domain_event--invoice-created" && e.source == "system--crm-core")
        .unwrap();
    assert!(flipped.flipped);
}

#[test]
fn test_domain_view_excludes_out_of_scope_edges() {
    let dir = fixture();
    // A second domain with an element that points into Core Platform.
    write(
        dir.path().join("registry/capabilities/reporting.md"),
        "---\nname: Reporting\ndomain: Analytics\nsupported_by: crm-core\n---\n",
    );
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).domain_view("Analytics");

    // crm-core is outside Analytics, so no edge lands on it.
    assert!(view.node("system--crm-core").is_none());
    assert!(view.edges.iter().all(|e| e.target != "system--crm-core"));
}

#[test]
fn test_layout_positions_follow_edges_left_to_right() {
    let dir = fixture();
    let graph = load(&dir);
    let mut view = ViewBuilder::new(&graph).domain_view("Core Platform");
    apply_layout(&mut view, &LayoutOptions::default());

    let x = |id: &str| view.node(id).unwrap().position.unwrap().x;
    for edge in &view.edges {
        assert!(
            x(&edge.source) < x(&edge.target),
            "{} -> {}",
            edge.source,
            edge.target
        );
    }

    let bounds = graph_bounds(&view.nodes, 50.0);
    assert!(bounds.width > 0.0);
    for node in &view.nodes {
        let p = node.position.unwrap();
        assert!(p.x >= bounds.x && p.y >= bounds.y);
    }
}

// ── Focus view ───────────────────────────────────────────────

#[test]
fn test_focus_view_splits_left_and_right() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).focus_view("system--crm-core");

    let center = view.node("system--crm-core").unwrap();
    assert!(center.is_center);
    assert_eq!(center.position.unwrap().x, 0.0);

    // Inbound sources sit left of the center.
    let billing = view.node("capability--billing").unwrap();
    assert!(billing.position.unwrap().x < 0.0);
    let api = view.node("api--billing-api").unwrap();
    assert!(api.position.unwrap().x < 0.0);
}

#[test]
fn test_focus_view_every_node_touches_center() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).focus_view("system--crm-core");

    for node in view.nodes.iter().filter(|n| !n.is_center && !n.is_placeholder) {
        let touches = view
            .edges
            .iter()
            .any(|e| e.source == node.id || e.target == node.id);
        assert!(touches, "{} has no edge to the center", node.id);
    }
}

#[test]
fn test_focus_view_with_no_outbound_edges_gets_one_placeholder() {
    let dir = fixture();
    let graph = load(&dir);
    // crm-core has inbound edges only.
    let view = ViewBuilder::new(&graph).focus_view("system--crm-core");

    let placeholders: Vec<_> = view.nodes.iter().filter(|n| n.is_placeholder).collect();
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].id, PLACEHOLDER_RIGHT);
    assert!(placeholders[0].position.unwrap().x > 0.0);

    // Placeholders never participate in edges.
    assert!(view
        .edges
        .iter()
        .all(|e| e.source != PLACEHOLDER_RIGHT && e.target != PLACEHOLDER_RIGHT));
}

#[test]
fn test_focus_view_isolated_element_gets_both_placeholders() {
    let dir = fixture();
    write(
        dir.path().join("registry/systems/island.md"),
        "---\nname: Island\ndomain: Core Platform\n---\n",
    );
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).focus_view("system--island");

    let ids: Vec<_> = view.nodes.iter().map(|n| n.id.as_str()).collect();
    assert!(ids.contains(&PLACEHOLDER_LEFT));
    assert!(ids.contains(&PLACEHOLDER_RIGHT));
    assert!(view.edges.is_empty());
}

#[test]
fn test_focus_recentering_is_pure() {
    let dir = fixture();
    let graph = load(&dir);
    let builder = ViewBuilder::new(&graph);

    let first = builder.focus_view("capability--billing");
    let recentered = builder.focus_view("system--crm-core");
    let again = builder.focus_view("capability--billing");

    // Recentering allocates a new model and leaves earlier ones untouched.
    assert_eq!(first.nodes.len(), again.nodes.len());
    assert_eq!(first.edges.len(), again.edges.len());
    assert!(recentered.node("system--crm-core").unwrap().is_center);
    assert!(!first.node("system--crm-core").unwrap().is_center);
}

#[test]
fn test_focus_view_unknown_center_is_empty() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).focus_view("system--ghost");
    assert!(view.nodes.is_empty());
    assert!(view.edges.is_empty());
}

// ── Element context view ─────────────────────────────────────

#[test]
fn test_element_view_has_real_edges_only() {
    let dir = fixture();
    let graph = load(&dir);
    let view = ViewBuilder::new(&graph).element_view("system--crm-core");

    assert!(view.nodes.iter().all(|n| !n.is_placeholder));
    assert!(view.nodes.iter().any(|n| n.id == "capability--billing"));
    assert!(view.nodes.iter().any(|n| n.id == "api--billing-api"));
    // Inbound from the event via published_by as well.
    assert!(view.nodes.iter().any(|n| n.id == "domain_event--invoice-created"));
}

// ── Event flows ──────────────────────────────────────────────

const EVENT_MAPPING: &str = r#"
service_type: system
event_type: domain_event
publishes_field: published_by
consumes_field: consumed_by
"#;

#[test]
fn test_event_flows_resolve_direct_and_via_hops() {
    let dir = fixture();
    let config_path = dir.path().join("event-mapping.yaml");
    fs::write(&config_path, EVENT_MAPPING).unwrap();

    let graph = load(&dir);
    let config = EventFlowConfig::load(&config_path).unwrap();
    let flow = event_flows(&graph, &config, "Core Platform").unwrap();

    assert_eq!(flow.events.len(), 1);
    assert_eq!(flow.events[0].name, "Invoice Created");
    assert_eq!(flow.service_label, "Software System");
    assert_eq!(flow.event_label, "Domain Event");

    // The publisher is a system directly; the consumer reference lands on
    // an API and walks up to its owning system.
    assert_eq!(flow.services.len(), 1);
    assert_eq!(flow.services[0].id, "system--crm-core");
    assert!(!flow.services[0].cross_domain);

    let kinds: Vec<FlowKind> = flow.edges.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&FlowKind::Publishes));
    assert!(kinds.contains(&FlowKind::Consumes));
}

#[test]
fn test_event_flows_none_for_domain_without_events() {
    let dir = fixture();
    let config_path = dir.path().join("event-mapping.yaml");
    fs::write(&config_path, EVENT_MAPPING).unwrap();

    let graph = load(&dir);
    let config = EventFlowConfig::load(&config_path).unwrap();
    assert!(event_flows(&graph, &config, "Analytics").is_none());
}

#[test]
fn test_event_mapping_absence_disables_feature() {
    let dir = fixture();
    assert!(EventFlowConfig::load(&dir.path().join("missing.yaml")).is_none());

    let malformed = dir.path().join("bad.yaml");
    fs::write(&malformed, "service_type: system\n").unwrap();
    assert!(EventFlowConfig::load(&malformed).is_none());

    // Either way the core load is untouched.
    let graph = load(&dir);
    assert_eq!(graph.element_count(), 5);
}

// ── Heatmap ──────────────────────────────────────────────────

const HEATMAP_MAPPING: &str = r##"
capability_type: capability
maturity_field: maturity
lifecycle_field: lifecycle
sourcing_field: sourcing
size_field: size
realization_field: supported_by
maturity_scale:
  Excellent: "#10b981"
  Developing: "#f59e0b"
size_scale:
  s: { cols: 1, rows: 1 }
  l: { cols: 2, rows: 2 }
"##;

#[test]
fn test_heatmap_tiles_project_capabilities() {
    let dir = fixture();
    let config_path = dir.path().join("heatmap-mapping.yaml");
    fs::write(&config_path, HEATMAP_MAPPING).unwrap();

    let graph = load(&dir);
    let config = HeatmapConfig::load(&config_path).unwrap();
    let tiles = heatmap_tiles(&graph, &config, "Core Platform").unwrap();

    assert_eq!(tiles.len(), 1);
    let billing = &tiles[0];
    assert_eq!(billing.id, "capability--billing");
    assert_eq!(billing.color, "#10b981");
    assert_eq!(billing.cols, 2);
    assert_eq!(billing.rows, 2);
    assert_eq!(billing.realized_by, vec!["CRM Core"]);
}

#[test]
fn test_heatmap_none_for_domain_without_capabilities() {
    let dir = fixture();
    let config_path = dir.path().join("heatmap-mapping.yaml");
    fs::write(&config_path, HEATMAP_MAPPING).unwrap();

    let graph = load(&dir);
    let config = HeatmapConfig::load(&config_path).unwrap();
    assert!(heatmap_tiles(&graph, &config, "Analytics").is_none());
}
