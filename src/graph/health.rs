//! Per-element health assessment
//!
//! A pure function of the document, its type declaration, and its resolved
//! outbound relationships. Inbound edges do not exist yet when this runs;
//! whole-graph connectivity is finalized by the assembler once every element
//! has been materialized.

use serde::{Deserialize, Serialize};

use crate::fields::FieldBag;
use crate::graph::ResolvedRelationship;
use crate::mapping::ElementType;

/// Health indicators for one element. Degraded elements stay in the graph;
/// these flags are how consumers find out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementHealth {
    /// Every schema-required field is present and non-blank.
    pub has_required_fields: bool,
    pub missing_fields: Vec<String>,
    /// At least one edge touches this element. Seeded from outbound refs,
    /// finalized by the assembler when inbound references are known.
    pub is_connected: bool,
    pub has_broken_refs: bool,
    /// Raw values of references that failed to resolve.
    pub broken_refs: Vec<String>,
    /// The header carries a `type` field.
    pub has_declared_type: bool,
}

/// Assess a document. Computed once, after resolution; never raises.
pub fn assess(
    header: &FieldBag,
    type_def: &ElementType,
    relationships: &[ResolvedRelationship],
) -> ElementHealth {
    let missing_fields: Vec<String> = type_def
        .fields
        .iter()
        .filter(|(key, spec)| spec.required && header.is_blank(key))
        .map(|(key, _)| key.clone())
        .collect();

    let broken_refs: Vec<String> = relationships
        .iter()
        .flat_map(|rel| rel.refs.iter())
        .filter(|r| !r.is_resolved())
        .map(|r| r.raw().to_string())
        .collect();

    let has_resolved_ref = relationships
        .iter()
        .any(|rel| rel.refs.iter().any(|r| r.is_resolved()));

    ElementHealth {
        has_required_fields: missing_fields.is_empty(),
        missing_fields,
        is_connected: has_resolved_ref,
        has_broken_refs: !broken_refs.is_empty(),
        broken_refs,
        has_declared_type: header.has("type"),
    }
}
