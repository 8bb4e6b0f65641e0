//! Reference resolution
//!
//! Three lookup tables are built over every scanned document before any
//! reference is resolved, so resolution never depends on scan order. A raw
//! value may legitimately match several documents (a capability and a
//! process sharing a display name, say) — every candidate is kept, and the
//! relationship's declared target type breaks the tie.

use std::collections::HashMap;

use crate::fields::FieldBag;
use crate::graph::{ResolvedRef, ResolvedRelationship};
use crate::mapping::{ElementType, ResolveStrategy};
use crate::scanner::RawDocument;

/// One document as seen by the reference index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub type_key: String,
    pub slug: String,
    pub name: Option<String>,
}

impl Candidate {
    /// The element id this candidate resolves to.
    pub fn element_id(&self) -> String {
        format!("{}--{}", self.type_key, self.slug)
    }
}

/// Lookup tables over all scanned documents, across all types.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_slug: HashMap<String, Vec<Candidate>>,
    by_name: HashMap<String, Vec<Candidate>>,
    by_abbreviation: HashMap<String, Vec<Candidate>>,
}

impl ReferenceIndex {
    /// Index every document of every type.
    ///
    /// Candidate lists are sorted by (type key, slug) so that the
    /// no-preferred-type tie-break is stable no matter how the filesystem
    /// enumerated the documents.
    pub fn build(scanned: &[(String, Vec<RawDocument>)]) -> Self {
        let mut index = Self::default();

        for (type_key, documents) in scanned {
            for doc in documents {
                let candidate = Candidate {
                    type_key: type_key.clone(),
                    slug: doc.slug.clone(),
                    name: doc.header.str("name").map(String::from),
                };

                index
                    .by_slug
                    .entry(doc.slug.clone())
                    .or_default()
                    .push(candidate.clone());

                if let Some(name) = doc.header.str("name") {
                    index
                        .by_name
                        .entry(name.to_lowercase())
                        .or_default()
                        .push(candidate.clone());
                }

                if let Some(abbr) = doc.header.str("abbreviation") {
                    index
                        .by_abbreviation
                        .entry(abbr.to_uppercase())
                        .or_default()
                        .push(candidate);
                }
            }
        }

        for list in index
            .by_slug
            .values_mut()
            .chain(index.by_name.values_mut())
            .chain(index.by_abbreviation.values_mut())
        {
            list.sort_by(|a, b| (&a.type_key, &a.slug).cmp(&(&b.type_key, &b.slug)));
        }

        index
    }

    /// Candidates matching a raw value under a resolution strategy.
    pub fn lookup(&self, strategy: ResolveStrategy, raw: &str) -> &[Candidate] {
        let found = match strategy {
            ResolveStrategy::Slug => self.by_slug.get(raw),
            ResolveStrategy::Name => self.by_name.get(&raw.to_lowercase()),
            ResolveStrategy::Abbreviation => self.by_abbreviation.get(&raw.to_uppercase()),
        };
        found.map(Vec::as_slice).unwrap_or_default()
    }

    /// Resolve one raw value. Candidates of the declared target type win;
    /// otherwise the first (sorted) candidate does. No match degrades to
    /// [`ResolvedRef::Unresolved`] with the raw value kept verbatim.
    pub fn resolve(
        &self,
        raw: &str,
        strategy: ResolveStrategy,
        target_type: &str,
    ) -> ResolvedRef {
        let candidates = self.lookup(strategy, raw);

        let chosen = candidates
            .iter()
            .find(|c| c.type_key == target_type)
            .or_else(|| candidates.first());

        match chosen {
            Some(candidate) => ResolvedRef::Resolved {
                raw: raw.to_string(),
                target_id: candidate.element_id(),
                target_name: candidate
                    .name
                    .clone()
                    .unwrap_or_else(|| candidate.slug.clone()),
            },
            None => ResolvedRef::Unresolved {
                raw: raw.to_string(),
            },
        }
    }
}

/// Resolve every relationship field declared on a document's type.
///
/// A field that is absent or blank contributes nothing; a scalar value is
/// treated as a one-element list. Placeholder entries are dropped before
/// resolution, so they neither resolve nor count as broken.
pub fn resolve_relationships(
    header: &FieldBag,
    type_def: &ElementType,
    index: &ReferenceIndex,
) -> Vec<ResolvedRelationship> {
    let mut resolved = Vec::new();

    for (field_key, rel) in &type_def.relationships {
        let raw_values = header.str_list(field_key);
        if raw_values.is_empty() {
            continue;
        }

        let refs = raw_values
            .iter()
            .map(|raw| index.resolve(raw, rel.resolve_by, &rel.target))
            .collect();

        resolved.push(ResolvedRelationship {
            field_key: field_key.clone(),
            semantic: rel.semantic.clone(),
            refs,
        });
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::parse_front_matter;

    fn doc(slug: &str, header_yaml: &str) -> RawDocument {
        let content = format!("---\n{}\n---\n", header_yaml);
        let (header, body) = parse_front_matter(&content).unwrap();
        RawDocument {
            slug: slug.to_string(),
            path: std::path::PathBuf::from(format!("{}.md", slug)),
            relative_path: format!("{}.md", slug),
            header,
            body,
        }
    }

    fn sample_index() -> ReferenceIndex {
        ReferenceIndex::build(&[
            (
                "system".to_string(),
                vec![doc("crm-core", "name: CRM Core\nabbreviation: crm")],
            ),
            (
                "capability".to_string(),
                vec![doc("crm-core", "name: CRM Core")],
            ),
        ])
    }

    #[test]
    fn test_declared_target_type_wins() {
        let index = sample_index();
        let resolved = index.resolve("crm-core", ResolveStrategy::Slug, "system");
        assert_eq!(resolved.target_id(), Some("system--crm-core"));

        let resolved = index.resolve("crm-core", ResolveStrategy::Slug, "capability");
        assert_eq!(resolved.target_id(), Some("capability--crm-core"));
    }

    #[test]
    fn test_no_type_match_takes_first_sorted_candidate() {
        let index = sample_index();
        // Neither candidate is a "process"; "capability" sorts before "system".
        let resolved = index.resolve("crm-core", ResolveStrategy::Slug, "process");
        assert_eq!(resolved.target_id(), Some("capability--crm-core"));
    }

    #[test]
    fn test_name_and_abbreviation_are_case_insensitive() {
        let index = sample_index();
        let by_name = index.resolve("crm core", ResolveStrategy::Name, "system");
        assert_eq!(by_name.target_id(), Some("system--crm-core"));

        let by_abbr = index.resolve("CRM", ResolveStrategy::Abbreviation, "system");
        assert_eq!(by_abbr.target_id(), Some("system--crm-core"));
    }

    #[test]
    fn test_unresolved_keeps_raw_value() {
        let index = sample_index();
        let miss = index.resolve("nonexistent-system", ResolveStrategy::Slug, "system");
        assert_eq!(
            miss,
            ResolvedRef::Unresolved {
                raw: "nonexistent-system".to_string()
            }
        );
    }

    #[test]
    fn test_blank_and_scalar_normalization() {
        let index = sample_index();
        let type_def: ElementType = serde_yaml::from_str(
            r#"
label: Capability
layer: business
folder: capabilities
relationships:
  supported_by: { target: system, type: serving, resolve_by: slug }
  owned_by: { target: actor, type: assignment, resolve_by: slug }
"#,
        )
        .unwrap();

        let d = doc("billing", "name: Billing\nsupported_by: crm-core\nowned_by: ~");
        let rels = resolve_relationships(&d.header, &type_def, &index);

        // owned_by is blank and contributes nothing at all
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].field_key, "supported_by");
        assert_eq!(rels[0].refs.len(), 1);
        assert!(rels[0].refs[0].is_resolved());
    }
}
