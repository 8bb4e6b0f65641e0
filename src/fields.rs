//! Typed access to untyped document headers
//!
//! Document headers are free-form YAML maps. `FieldBag` is the single place
//! where schema-driven code reads them: every accessor returns an explicit
//! absent/blank result instead of asserting a type, so callers never touch
//! raw YAML values directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Values that stand for "intentionally empty" in a header field.
///
/// YAML already parses a bare `~` as null; the quoted string form shows up in
/// hand-edited files and is treated the same way.
const PLACEHOLDER: &str = "~";

/// The parsed header fields of one document, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldBag(BTreeMap<String, Value>);

impl FieldBag {
    /// Build a bag from a parsed YAML mapping. Non-string keys are dropped.
    pub fn from_mapping(mapping: serde_yaml::Mapping) -> Self {
        let inner = mapping
            .into_iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v)))
            .collect();
        Self(inner)
    }

    /// Raw value access, for passthrough display of undeclared fields.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a field, if present and actually a string.
    pub fn str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// String value with a fallback.
    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.str(key).unwrap_or(default)
    }

    /// Field value normalized to a list of non-blank strings.
    ///
    /// A scalar becomes a one-element list; a sequence keeps its string
    /// entries; blanks and placeholders are dropped.
    pub fn str_list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Sequence(seq)) => seq
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !is_blank_str(s))
                .map(String::from)
                .collect(),
            Some(Value::String(s)) if !is_blank_str(s) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Numeric value of a field, accepting integers and floats.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    /// Boolean value of a field.
    pub fn bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// True when the field is absent, null, a placeholder, or an empty
    /// string — the conditions a required-field check treats as missing.
    pub fn is_blank(&self, key: &str) -> bool {
        match self.0.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => is_blank_str(s),
            Some(Value::Sequence(seq)) => seq.is_empty(),
            _ => false,
        }
    }

    /// True when the field carries a usable value.
    pub fn has(&self, key: &str) -> bool {
        !self.is_blank(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_blank_str(s: &str) -> bool {
    s.trim().is_empty() || s == PLACEHOLDER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(yaml: &str) -> FieldBag {
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).unwrap();
        FieldBag::from_mapping(mapping)
    }

    #[test]
    fn test_scalar_and_list_access() {
        let b = bag("name: Billing\ndepends_on:\n  - crm-core\n  - '~'\n  - erp");
        assert_eq!(b.str("name"), Some("Billing"));
        assert_eq!(b.str_list("depends_on"), vec!["crm-core", "erp"]);
        assert_eq!(b.str_list("name"), vec!["Billing"]);
        assert!(b.str_list("missing").is_empty());
    }

    #[test]
    fn test_blank_detection() {
        let b = bag("a: ~\nb: ''\nc: '~'\nd: value\ne: []");
        assert!(b.is_blank("a"));
        assert!(b.is_blank("b"));
        assert!(b.is_blank("c"));
        assert!(b.is_blank("e"));
        assert!(b.is_blank("not_there"));
        assert!(b.has("d"));
    }

    #[test]
    fn test_typed_mismatch_returns_none() {
        let b = bag("count: 3\nflag: true");
        assert_eq!(b.str("count"), None);
        assert_eq!(b.number("count"), Some(3.0));
        assert_eq!(b.bool("flag"), Some(true));
        assert_eq!(b.bool("count"), None);
    }
}
