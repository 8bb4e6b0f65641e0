//! Registry loading
//!
//! One batch pass: parse the mapping, scan every type folder in declaration
//! order, build the reference indexes, resolve and assess each document,
//! materialize edges, build the secondary indexes, then back-populate
//! inbound references once every element exists. Returns an owned graph;
//! there is no shared or global load state.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::Result;
use crate::graph::{
    health, resolve, GraphIndexes, InboundRef, RegistryEdge, RegistryElement, RegistryGraph,
    ResolvedRef,
};
use crate::mapping::RegistryMapping;
use crate::scanner::{scan_type_folder, RawDocument};

/// Load a registry from its mapping document.
///
/// `workspace_root` is the base the mapping's `registry_root` is relative
/// to. Mapping problems are the only fatal outcome; document-level problems
/// degrade into health flags.
pub fn load_registry(mapping_path: &Path, workspace_root: &Path) -> Result<RegistryGraph> {
    let mapping = RegistryMapping::from_path(mapping_path)?;
    let registry_root = workspace_root.join(&mapping.registry_root);
    load_with_mapping(mapping, &registry_root)
}

/// Load a registry from an already-parsed mapping and an explicit root.
pub fn load_with_mapping(
    mapping: RegistryMapping,
    registry_root: &Path,
) -> Result<RegistryGraph> {
    // Scan every type folder, in mapping declaration order.
    let mut scanned: Vec<(String, Vec<RawDocument>)> = Vec::new();
    for (type_key, type_def) in &mapping.elements {
        let folder = registry_root.join(&type_def.folder);
        let documents = scan_type_folder(&folder, registry_root);
        debug!(type_key, count = documents.len(), "scanned type folder");
        scanned.push((type_key.clone(), documents));
    }

    let bundle_hash = bundle_hash(&scanned);

    // Resolution indexes span all documents of all types, so the result
    // does not depend on which type was scanned first.
    let reference_index = resolve::ReferenceIndex::build(&scanned);

    let mut elements: BTreeMap<String, RegistryElement> = BTreeMap::new();
    let mut edges: Vec<RegistryEdge> = Vec::new();
    let mut indexes = GraphIndexes::default();

    for (type_key, documents) in scanned {
        let Some(type_def) = mapping.elements.get(&type_key) else {
            continue;
        };

        for doc in documents {
            let relationships =
                resolve::resolve_relationships(&doc.header, type_def, &reference_index);
            let health = health::assess(&doc.header, type_def, &relationships);
            let id = format!("{}--{}", type_key, doc.slug);

            // One edge per resolved reference; unresolved refs never
            // produce edges.
            for rel in &relationships {
                for reference in &rel.refs {
                    if let ResolvedRef::Resolved { target_id, .. } = reference {
                        edges.push(RegistryEdge {
                            source_id: id.clone(),
                            target_id: target_id.clone(),
                            semantic: rel.semantic.clone(),
                            field_key: rel.field_key.clone(),
                            label: mapping.edge_label(&rel.semantic, &rel.field_key),
                        });
                    }
                }
            }

            let element = RegistryElement {
                id: id.clone(),
                type_key: type_key.clone(),
                type_label: type_def.label.clone(),
                layer: type_def.layer.clone(),
                graph_rank: type_def.graph_rank,
                icon: type_def.icon.clone(),
                badge_category: type_def.badge_category.clone(),
                fields: doc.header,
                body: doc.body,
                source_path: doc.relative_path,
                relationships,
                inbound: Vec::new(),
                health,
            };

            indexes
                .by_type
                .entry(type_key.clone())
                .or_default()
                .push(id.clone());
            indexes
                .by_domain
                .entry(element.domain())
                .or_default()
                .push(id.clone());
            indexes
                .by_layer
                .entry(element.layer.clone())
                .or_default()
                .push(id.clone());
            if let Some(name) = element.fields.str("name") {
                indexes
                    .by_name
                    .entry(name.to_lowercase())
                    .or_insert_with(|| id.clone());
            }
            if let Some(abbr) = element.fields.str("abbreviation") {
                indexes
                    .by_abbreviation
                    .entry(abbr.to_uppercase())
                    .or_insert_with(|| id.clone());
            }

            elements.insert(id, element);
        }
    }

    for (pos, edge) in edges.iter().enumerate() {
        indexes
            .edges_by_source
            .entry(edge.source_id.clone())
            .or_default()
            .push(pos);
        indexes
            .edges_by_target
            .entry(edge.target_id.clone())
            .or_default()
            .push(pos);
    }

    // Back-populate inbound references. This must run after every element
    // exists — inbound edges may originate from documents scanned later —
    // and it finalizes connectivity to mean "touched by any edge".
    let mut inbound_by_target: HashMap<String, Vec<InboundRef>> = HashMap::new();
    for edge in &edges {
        let source_name = elements
            .get(&edge.source_id)
            .map(|el| el.name().to_string())
            .unwrap_or_else(|| edge.source_id.clone());
        inbound_by_target
            .entry(edge.target_id.clone())
            .or_default()
            .push(InboundRef {
                source_id: edge.source_id.clone(),
                source_name,
                semantic: edge.semantic.clone(),
                field_key: edge.field_key.clone(),
            });
    }
    for (target_id, inbound) in inbound_by_target {
        if let Some(element) = elements.get_mut(&target_id) {
            element.health.is_connected = true;
            element.inbound = inbound;
        }
    }

    info!(
        elements = elements.len(),
        edges = edges.len(),
        "registry loaded"
    );

    Ok(RegistryGraph {
        elements,
        edges,
        indexes,
        mapping,
        bundle_hash,
    })
}

/// Fold every scanned document into a single digest. Scan output is
/// filename-sorted and types iterate in declaration order, so identical
/// inputs hash identically across runs and hosts.
fn bundle_hash(scanned: &[(String, Vec<RawDocument>)]) -> String {
    let mut hasher = Sha256::new();
    for (type_key, documents) in scanned {
        hasher.update(type_key.as_bytes());
        for doc in documents {
            hasher.update(doc.relative_path.as_bytes());
            hasher.update(serde_yaml::to_string(&doc.header).unwrap_or_default().as_bytes());
            hasher.update(doc.body.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MAPPING: &str = r#"
registry_root: registry
relationship_types:
  serving: { outgoing: serves, incoming: served by }
elements:
  capability:
    label: Business Capability
    layer: business
    folder: capabilities
    graph_rank: 1
    fields:
      name: { type: string, required: true, label: Name }
    relationships:
      supported_by: { target: system, type: serving, resolve_by: slug }
  system:
    label: Software System
    layer: applications
    folder: systems
    graph_rank: 2
"#;

    #[test]
    fn test_minimal_two_type_load() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("mapping.yaml"), MAPPING).unwrap();
        let caps = dir.path().join("registry/capabilities");
        let systems = dir.path().join("registry/systems");
        fs::create_dir_all(&caps).unwrap();
        fs::create_dir_all(&systems).unwrap();
        fs::write(
            caps.join("billing.md"),
            "---\nname: Billing\nsupported_by: crm-core\n---\n",
        )
        .unwrap();
        fs::write(systems.join("crm-core.md"), "---\nname: CRM Core\n---\n").unwrap();

        let graph = load_registry(&dir.path().join("mapping.yaml"), dir.path()).unwrap();

        assert_eq!(graph.element_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let edge = &graph.edges()[0];
        assert_eq!(edge.source_id, "capability--billing");
        assert_eq!(edge.target_id, "system--crm-core");
        assert_eq!(edge.label, "serves");

        // Both ends are connected, including the edge's target.
        assert!(graph.element("capability--billing").unwrap().health.is_connected);
        let target = graph.element("system--crm-core").unwrap();
        assert!(target.health.is_connected);
        assert_eq!(target.inbound.len(), 1);
        assert_eq!(target.inbound[0].source_name, "Billing");
    }
}
