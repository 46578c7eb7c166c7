//! In-memory provider backed by a fixed catalog of records.
//!
//! Catalogs can be declared inline in the config file or loaded from a YAML
//! or JSON file. Useful for curated local data and for tests.

use crate::error::ConnectorError;
use crate::federated::{Context, Provider, UnifiedRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// One catalog record plus the contexts it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub record: UnifiedRecord,

    /// Context ids this record is visible under; empty means every context
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contexts: Vec<String>,
}

impl CatalogEntry {
    pub fn new(record: UnifiedRecord) -> Self {
        Self {
            record,
            contexts: Vec::new(),
        }
    }

    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.contexts.push(context.into());
        self
    }

    fn visible_under(&self, context: &Context) -> bool {
        self.contexts.is_empty() || self.contexts.iter().any(|c| c == &context.id)
    }

    fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        if self.record.key.to_lowercase().contains(needle) {
            return true;
        }
        self.record
            .fields
            .values()
            .filter_map(|v| v.as_str())
            .any(|s| s.to_lowercase().contains(needle))
    }
}

/// On-disk catalog format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub records: Vec<CatalogEntry>,

    /// Identifiers considered valid in addition to the record keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub valid_ids: Vec<String>,
}

impl Catalog {
    /// Load a catalog, choosing JSON or YAML by file extension.
    pub fn load(path: &Path) -> Result<Self, ConnectorError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }
}

/// Provider answering from a fixed [`Catalog`].
///
/// A search term matches a record when it is a case-insensitive substring of
/// the key or of any string field. The empty term matches everything.
pub struct StaticProvider {
    name: String,
    description: String,
    entries: Vec<CatalogEntry>,
    valid_ids: BTreeSet<String>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: "Static record catalog".to_string(),
            entries: Vec::new(),
            valid_ids: BTreeSet::new(),
        }
    }

    pub fn from_catalog(name: impl Into<String>, catalog: Catalog) -> Self {
        let mut provider = Self::new(name);
        for entry in catalog.records {
            provider = provider.with_entry(entry);
        }
        provider.valid_ids.extend(catalog.valid_ids);
        provider
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a record visible under every context.
    pub fn with_record(self, record: UnifiedRecord) -> Self {
        self.with_entry(CatalogEntry::new(record))
    }

    pub fn with_entry(mut self, mut entry: CatalogEntry) -> Self {
        entry.record = entry.record.with_source(self.name.clone());
        self.valid_ids.insert(entry.record.key.clone());
        self.entries.push(entry);
        self
    }

    pub fn with_valid_id(mut self, id: impl Into<String>) -> Self {
        self.valid_ids.insert(id.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Provider for StaticProvider {
    type Record = UnifiedRecord;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn provide_records(
        &self,
        term: &str,
        context: &Context,
    ) -> Result<Vec<UnifiedRecord>, ConnectorError> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.visible_under(context) && entry.matches(&needle))
            .map(|entry| entry.record.clone())
            .collect())
    }

    async fn validate_identifier(&self, id: &str) -> Result<bool, ConnectorError> {
        Ok(self.valid_ids.contains(id.trim()))
    }
}
