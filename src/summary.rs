//! Registry-wide summaries
//!
//! A health roll-up that is always producible after a load, and per-domain
//! summaries for overview pages. Both are derived read-only from the graph.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::graph::RegistryGraph;

/// Health counters for one entity type.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TypeHealth {
    pub total: usize,
    pub healthy: usize,
    pub connected: usize,
}

/// Whole-registry health roll-up.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthSummary {
    pub total: usize,
    /// Required fields present and a declared type.
    pub healthy: usize,
    pub connected: usize,
    pub orphans: usize,
    /// Elements with at least one broken reference.
    pub broken_refs: usize,
    pub missing_type: usize,
    pub by_type: BTreeMap<String, TypeHealth>,
}

impl HealthSummary {
    pub fn compute(graph: &RegistryGraph) -> Self {
        let mut summary = Self::default();

        for el in graph.all_elements() {
            summary.total += 1;
            let type_stats = summary.by_type.entry(el.type_key.clone()).or_default();
            type_stats.total += 1;

            let healthy = el.health.has_required_fields && el.health.has_declared_type;
            if healthy {
                summary.healthy += 1;
                type_stats.healthy += 1;
            }
            if el.health.is_connected {
                summary.connected += 1;
                type_stats.connected += 1;
            } else {
                summary.orphans += 1;
            }
            if el.health.has_broken_refs {
                summary.broken_refs += 1;
            }
            if !el.health.has_declared_type {
                summary.missing_type += 1;
            }
        }

        summary
    }
}

/// Coarse data-quality grade for a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Maturity {
    Excellent,
    Good,
    Developing,
    Initial,
}

impl Maturity {
    /// Grade from the share of healthy + connected elements.
    fn from_ratio(ratio: f64) -> Self {
        if ratio > 0.8 {
            Self::Excellent
        } else if ratio > 0.6 {
            Self::Good
        } else if ratio > 0.3 {
            Self::Developing
        } else {
            Self::Initial
        }
    }
}

impl std::fmt::Display for Maturity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Developing => "Developing",
            Self::Initial => "Initial",
        };
        write!(f, "{}", label)
    }
}

/// Overview card for one domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Palette color, assigned round-robin in stable domain order.
    pub color: String,
    pub maturity: Maturity,
    /// Element counts keyed by type label.
    pub counts: IndexMap<String, usize>,
    pub total_elements: usize,
}

/// Summaries for every domain, sorted by element count descending.
///
/// The domain's display name and description come from its anchor element
/// (the one whose type sits at rank 0) when one exists.
pub fn domain_summaries(graph: &RegistryGraph) -> Vec<DomainSummary> {
    let palette = if graph.mapping().domain_color_palette.is_empty() {
        vec!["#6b7280".to_string()]
    } else {
        graph.mapping().domain_color_palette.clone()
    };

    let mut summaries = Vec::new();

    for (color_idx, domain_id) in graph.domains().into_iter().enumerate() {
        let elements = graph.elements_by_domain(domain_id);

        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for el in &elements {
            *counts.entry(el.type_label.clone()).or_default() += 1;
        }

        let anchor = elements.iter().find(|el| el.graph_rank == 0);
        let name = anchor
            .map(|el| el.name().to_string())
            .unwrap_or_else(|| domain_id.to_string());
        let description = anchor
            .and_then(|el| el.fields.str("description"))
            .unwrap_or_default()
            .to_string();

        let healthy = elements
            .iter()
            .filter(|el| el.health.has_required_fields && el.health.has_declared_type)
            .count();
        let connected = elements.iter().filter(|el| el.health.is_connected).count();
        let ratio = if elements.is_empty() {
            0.0
        } else {
            (healthy + connected) as f64 / (elements.len() * 2) as f64
        };

        summaries.push(DomainSummary {
            id: domain_id.to_string(),
            name,
            description,
            color: palette[color_idx % palette.len()].clone(),
            maturity: Maturity::from_ratio(ratio),
            total_elements: elements.len(),
            counts,
        });
    }

    summaries.sort_by(|a, b| b.total_elements.cmp(&a.total_elements));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maturity_thresholds() {
        assert_eq!(Maturity::from_ratio(1.0), Maturity::Excellent);
        assert_eq!(Maturity::from_ratio(0.7), Maturity::Good);
        assert_eq!(Maturity::from_ratio(0.5), Maturity::Developing);
        assert_eq!(Maturity::from_ratio(0.1), Maturity::Initial);
    }
}
