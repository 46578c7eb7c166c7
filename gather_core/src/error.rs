// src/error.rs
use std::fmt;

/// Failure raised inside a single provider call.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Serde YAML error: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),

    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Other error: {0}")]
    Other(String),
}

impl ConnectorError {
    pub fn code_str(&self) -> &'static str {
        match self {
            ConnectorError::InvalidInput(_) => "invalid_input",
            ConnectorError::Timeout(_) => "timeout",
            ConnectorError::HttpRequest(_) => "upstream_error",
            ConnectorError::Upstream { .. } => "upstream_error",
            ConnectorError::SerdeJson(_) | ConnectorError::SerdeYaml(_) => "parse_error",
            ConnectorError::Io(_) => "io_error",
            ConnectorError::Other(_) => "internal_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectorError::Timeout(_))
    }
}

/// A [`ConnectorError`] tagged with the provider that raised it.
#[derive(Debug, thiserror::Error)]
#[error("provider '{provider}' failed: {error}")]
pub struct ProviderError {
    pub provider: String,
    #[source]
    pub error: ConnectorError,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, error: ConnectorError) -> Self {
        Self {
            provider: provider.into(),
            error,
        }
    }
}

/// Error returned by the aggregator when a whole operation cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    #[error("{}", ProviderList(.0))]
    Providers(Vec<ProviderError>),

    #[error("aggregation timed out after {after_ms}ms")]
    TimedOut { after_ms: u64 },

    #[error("aggregation cancelled")]
    Cancelled,
}

impl AggregationError {
    /// Names of the providers responsible for the failure, in registration order.
    pub fn failed_providers(&self) -> Vec<&str> {
        match self {
            AggregationError::Providers(errors) => {
                errors.iter().map(|e| e.provider.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}

struct ProviderList<'a>(&'a [ProviderError]);

impl fmt::Display for ProviderList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} provider(s) failed: ", self.0.len())?;
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
