//! Provider capability and search context.

use super::record::{Record, UnifiedRecord};
use crate::error::ConnectorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-chosen filter that disambiguates a search (e.g. a selected gene).
///
/// Opaque to the aggregator; providers decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Context {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Context {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", self.id, label),
            None => f.write_str(&self.id),
        }
    }
}

impl From<&str> for Context {
    fn from(id: &str) -> Self {
        Context::new(id)
    }
}

impl From<String> for Context {
    fn from(id: String) -> Self {
        Context::new(id)
    }
}

/// A data source that can answer searches and identifier checks.
///
/// Providers are shared across concurrent calls, so any connection state they
/// hold must be internally synchronized.
#[async_trait]
pub trait Provider: Send + Sync {
    type Record: Record;

    /// Stable name used in errors, logs and record provenance.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Records matching `term` within `context`.
    ///
    /// The list should be free of duplicate keys, but the aggregator dedups
    /// globally either way.
    async fn provide_records(
        &self,
        term: &str,
        context: &Context,
    ) -> Result<Vec<Self::Record>, ConnectorError>;

    /// Whether this provider recognizes `id` as valid.
    async fn validate_identifier(&self, id: &str) -> Result<bool, ConnectorError>;
}

/// Provider trait object over the built-in record type.
pub type DynProvider = dyn Provider<Record = UnifiedRecord>;

/// Caller-owned holder for the currently selected context.
///
/// Keeps context out of the aggregator so concurrent searches with different
/// contexts never race on shared state.
#[derive(Debug, Clone, Default)]
pub struct SearchSession {
    context: Option<Context>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current context.
    pub fn set_context(&mut self, context: impl Into<Context>) {
        let context = context.into();
        tracing::debug!(context = %context, "context chosen");
        self.context = Some(context);
    }

    pub fn clear_context(&mut self) {
        self.context = None;
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }
}
