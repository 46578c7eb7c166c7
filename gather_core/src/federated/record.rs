//! Mergeable records and key collation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// A keyed search result that can absorb another result with the same key.
///
/// Two records describe the same logical entity iff their keys are byte-equal.
/// `merge_with` must never change the receiver's key.
pub trait Record: Send + 'static {
    /// Merge key used both for ordering and for identity.
    fn key(&self) -> &str;

    /// Fold `other` into `self`. Called only when both keys are equal.
    fn merge_with(&mut self, other: Self);
}

/// Total ordering applied to merge keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collation {
    /// Byte-wise comparison (default)
    #[default]
    Lexicographic,
    /// Lowercased comparison; ties broken byte-wise so distinct keys never compare equal
    CaseInsensitive,
}

impl Collation {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            Collation::Lexicographic => a.cmp(b),
            Collation::CaseInsensitive => a
                .chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
                .then_with(|| a.cmp(b)),
        }
    }
}

/// The record type produced by the built-in providers.
///
/// Payload fields are opaque to the aggregator. On merge the receiver keeps its
/// own scalar values, so the earlier-registered provider wins conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    /// Merge key (e.g. an HGVS id or option label)
    pub key: String,

    /// Providers that contributed to this record, in merge order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Provider-specific payload
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
}

impl UnifiedRecord {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            sources: Vec::new(),
            fields: Map::new(),
        }
    }

    /// Builder method to tag the contributing provider.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        let source = source.into();
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
        self
    }

    /// Builder method to set a payload field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Build a record from a JSON object, taking the key from `key_field`.
    ///
    /// Returns `None` when the item is not an object or the key is missing.
    pub fn from_json(item: &Value, key_field: &str, source: &str) -> Option<Self> {
        let object = item.as_object()?;
        let key = match object.get(key_field)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let mut fields = object.clone();
        fields.remove(key_field);

        Some(Self {
            key,
            sources: vec![source.to_string()],
            fields,
        })
    }
}

impl Record for UnifiedRecord {
    fn key(&self) -> &str {
        &self.key
    }

    fn merge_with(&mut self, other: Self) {
        for source in other.sources {
            if !self.sources.contains(&source) {
                self.sources.push(source);
            }
        }
        merge_maps(&mut self.fields, other.fields);
    }
}

fn merge_maps(into: &mut Map<String, Value>, from: Map<String, Value>) {
    for (name, incoming) in from {
        match into.get_mut(&name) {
            None => {
                into.insert(name, incoming);
            }
            Some(existing) => merge_values(existing, incoming),
        }
    }
}

fn merge_values(existing: &mut Value, incoming: Value) {
    if existing.is_null() {
        *existing = incoming;
        return;
    }

    match (existing, incoming) {
        (Value::Object(a), Value::Object(b)) => merge_maps(a, b),
        (Value::Array(a), Value::Array(b)) => {
            for item in b {
                if !a.contains(&item) {
                    a.push(item);
                }
            }
        }
        // First writer wins for scalars
        _ => {}
    }
}
