//! Result types returned by the aggregator.

use super::provider::Context;
use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A provider left out of a result under the partial failure policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedProvider {
    /// Provider name
    pub provider: String,

    /// Machine-readable error code
    pub code: String,

    /// Error message
    pub error: String,

    /// Whether this was a timeout
    #[serde(default)]
    pub is_timeout: bool,
}

impl From<&ProviderError> for SkippedProvider {
    fn from(err: &ProviderError) -> Self {
        Self {
            provider: err.provider.clone(),
            code: err.error.code_str().to_string(),
            error: err.error.to_string(),
            is_timeout: err.error.is_timeout(),
        }
    }
}

/// Merged, deduplicated output of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedResults<R> {
    /// The search term
    pub term: String,

    /// Context the search ran under (`None` means nothing was searched)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Context>,

    /// Records sorted by key, one per distinct key
    pub records: Vec<R>,

    /// Records received from providers before dedup
    pub received: usize,

    /// Providers that answered, in registration order
    pub completed: Vec<String>,

    /// Providers that failed and were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedProvider>,

    /// Whether results are partial (some providers were skipped)
    #[serde(default)]
    pub partial: bool,

    /// Total time taken (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    pub completed_at: DateTime<Utc>,
}

impl<R> MergedResults<R> {
    /// An empty result for `term`.
    pub fn empty(term: impl Into<String>, context: Option<Context>) -> Self {
        Self {
            term: term.into(),
            context,
            records: Vec::new(),
            received: 0,
            completed: Vec::new(),
            skipped: Vec::new(),
            partial: false,
            duration_ms: None,
            completed_at: Utc::now(),
        }
    }

    /// Record a failed provider and mark the result partial.
    pub fn add_skipped(&mut self, err: &ProviderError) {
        self.skipped.push(SkippedProvider::from(err));
        self.partial = true;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of incoming records absorbed by dedup.
    pub fn duplicates_merged(&self) -> usize {
        self.received.saturating_sub(self.records.len())
    }
}

/// Outcome of an identifier check across all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub id: String,

    /// True iff at least one provider confirmed the identifier
    pub valid: bool,

    /// First provider observed to confirm the identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,

    /// Providers that failed before an answer was known
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedProvider>,
}
