//! Arch Atlas
//!
//! A schema-driven enterprise-architecture registry: one mapping document
//! declares entity types, their fields, and their typed relationships;
//! markdown documents with YAML front matter hold the catalog content.
//! The loader resolves every cross-document reference into an indexed,
//! read-only graph with per-element health, and the view layer turns
//! bounded scopes of that graph into layout-ready node/edge models.
//!
//! ## Features
//!
//! - **Schema-driven**: zero hard-coded entity types — the mapping document
//!   is the single source of truth
//! - **Graceful degradation**: broken references and missing fields become
//!   health flags, never load failures
//! - **Indexed graph**: O(1) lookup by id, type, domain, layer, and edge
//!   endpoint over an immutable, owned value
//! - **Layout-ready views**: hierarchy ranks, direction-normalized edges,
//!   and layered left-to-right coordinates for domain maps and focus views
//!
//! ## Pipeline
//!
//! ```text
//! registry-mapping.yaml ──► scan type folders ──► reference indexes
//!        │                                             │
//!        └──► resolve refs + assess health ──► RegistryGraph
//!                                                      │
//!                                   domain / focus / element views
//!                                                      │
//!                                          layered coordinates
//! ```

pub mod config;
pub mod error;
pub mod fields;
pub mod flows;
pub mod graph;
pub mod heatmap;
pub mod mapping;
pub mod scanner;
pub mod summary;
pub mod view;

pub use config::AtlasConfig;
pub use error::{AtlasError, Result};
pub use fields::FieldBag;
pub use graph::{
    load_registry, ElementHealth, RegistryEdge, RegistryElement, RegistryGraph, ResolvedRef,
};
pub use mapping::RegistryMapping;
pub use summary::{domain_summaries, DomainSummary, HealthSummary};
pub use view::{layout::apply_layout, layout::LayoutOptions, ViewBuilder, ViewModel};
