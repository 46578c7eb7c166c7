//! JSON-over-HTTP provider.
//!
//! Expects two endpoints relative to a base URL:
//! - `GET {base}/{search_path}?q=<term>&context=<context id>` returning a JSON
//!   array of objects, or an object wrapping one (`results`, `records`, `hits`, ...)
//! - `GET {base}/{validate_path}?id=<id>` returning `{"valid": bool}` or a bare bool.
//!   A 404 counts as "not valid".

use crate::error::ConnectorError;
use crate::federated::{Context, Provider, UnifiedRecord};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

const USER_AGENT: &str = concat!("gather/", env!("CARGO_PKG_VERSION"));

/// Field names tried, in order, when a search response wraps its array.
const RESULT_ARRAY_FIELDS: &[&str] = &["results", "records", "hits", "items", "data"];

/// Connection settings for an [`HttpProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpProviderConfig {
    pub base_url: Url,

    #[serde(default = "default_search_path")]
    pub search_path: String,

    #[serde(default = "default_validate_path")]
    pub validate_path: String,

    /// Field holding each record's merge key
    #[serde(default = "default_key_field")]
    pub key_field: String,

    /// Sent as `x-api-key` when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_search_path() -> String {
    "search".to_string()
}

fn default_validate_path() -> String {
    "validate".to_string()
}

fn default_key_field() -> String {
    "key".to_string()
}

impl HttpProviderConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            search_path: default_search_path(),
            validate_path: default_validate_path(),
            key_field: default_key_field(),
            api_key: None,
        }
    }
}

pub struct HttpProvider {
    name: String,
    description: String,
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpProvider {
    pub fn new(name: impl Into<String>, config: HttpProviderConfig) -> Result<Self, ConnectorError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectorError::Other(e.to_string()))?;

        let name = name.into();
        Ok(Self {
            description: format!("HTTP provider at {}", config.base_url),
            name,
            client,
            config,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, ConnectorError> {
        let mut base = self.config.base_url.clone();
        // Url::join drops the last segment unless the base ends with '/'
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path.trim_start_matches('/'))
            .map_err(|e| ConnectorError::InvalidInput(format!("bad endpoint '{}': {}", path, e)))
    }

    async fn get_json(&self, url: Url) -> Result<Option<Value>, ConnectorError> {
        let mut request = self.client.get(url);

        if let Some(api_key) = &self.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.map_err(ConnectorError::HttpRequest)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ConnectorError::Upstream { status, message });
        }

        let body = response.text().await.map_err(ConnectorError::HttpRequest)?;
        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// Find the record array in a search response.
fn find_results_array(raw: &Value) -> Option<&Vec<Value>> {
    if let Some(arr) = raw.as_array() {
        return Some(arr);
    }
    RESULT_ARRAY_FIELDS
        .iter()
        .find_map(|field| raw.get(*field).and_then(|v| v.as_array()))
}

fn parse_validity(raw: &Value) -> Option<bool> {
    raw.as_bool()
        .or_else(|| raw.get("valid").and_then(|v| v.as_bool()))
}

#[async_trait]
impl Provider for HttpProvider {
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
        let mut url = self.endpoint(&self.config.search_path)?;
        url.query_pairs_mut()
            .append_pair("q", term)
            .append_pair("context", &context.id);

        let Some(raw) = self.get_json(url).await? else {
            return Ok(Vec::new());
        };

        let items = find_results_array(&raw).ok_or_else(|| {
            ConnectorError::Other("search response contains no result array".to_string())
        })?;

        let records: Vec<UnifiedRecord> = items
            .iter()
            .filter_map(|item| UnifiedRecord::from_json(item, &self.config.key_field, &self.name))
            .collect();

        if records.len() < items.len() {
            tracing::debug!(
                provider = %self.name,
                dropped = items.len() - records.len(),
                key_field = %self.config.key_field,
                "dropped items without a usable key"
            );
        }

        Ok(records)
    }

    async fn validate_identifier(&self, id: &str) -> Result<bool, ConnectorError> {
        let mut url = self.endpoint(&self.config.validate_path)?;
        url.query_pairs_mut().append_pair("id", id);

        match self.get_json(url).await? {
            None => Ok(false),
            Some(raw) => parse_validity(&raw).ok_or_else(|| {
                ConnectorError::Other("validation response has no 'valid' flag".to_string())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_results_array() {
        let direct = json!([{"key": "a"}, {"key": "b"}]);
        assert_eq!(find_results_array(&direct).map(Vec::len), Some(2));

        let wrapped = json!({"hits": [{"key": "a"}]});
        assert_eq!(find_results_array(&wrapped).map(Vec::len), Some(1));

        assert!(find_results_array(&json!({"count": 0})).is_none());
    }

    #[test]
    fn test_parse_validity() {
        assert_eq!(parse_validity(&json!(true)), Some(true));
        assert_eq!(parse_validity(&json!({"valid": false})), Some(false));
        assert_eq!(parse_validity(&json!({"ok": true})), None);
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let config = HttpProviderConfig::new(Url::parse("https://example.org/api/v1").unwrap());
        let provider = HttpProvider::new("remote", config).unwrap();
        assert_eq!(
            provider.endpoint("search").unwrap().as_str(),
            "https://example.org/api/v1/search"
        );
        assert_eq!(
            provider.endpoint("/validate").unwrap().as_str(),
            "https://example.org/api/v1/validate"
        );
    }
}
