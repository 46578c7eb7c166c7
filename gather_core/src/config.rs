//! Aggregator configuration and its on-disk store.
//!
//! A config file lists providers in registration order plus the aggregation
//! settings. YAML is the default format; a `.toml` extension selects TOML.

use crate::error::ConfigError;
use crate::federated::{Aggregator, AggregatorSettings, DynProvider, UnifiedRecord};
use crate::providers::{
    Catalog, CatalogEntry, HttpProvider, HttpProviderConfig, StaticProvider,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// How a configured provider gets its data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderKind {
    /// Fixed catalog, inline and/or loaded from `catalog`
    Static {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        catalog: Option<PathBuf>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        records: Vec<CatalogEntry>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        valid_ids: Vec<String>,
    },
    /// JSON over HTTP
    Http(HttpProviderConfig),
}

/// One provider entry in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Disabled providers are kept in the file but not registered
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(flatten)]
    pub kind: ProviderKind,
}

fn default_enabled() -> bool {
    true
}

impl ProviderSpec {
    /// Instantiate the provider. Relative catalog paths resolve against `base_dir`.
    pub fn build(&self, base_dir: Option<&Path>) -> Result<Arc<DynProvider>, ConfigError> {
        match &self.kind {
            ProviderKind::Static {
                catalog,
                records,
                valid_ids,
            } => {
                let mut merged = match catalog {
                    Some(path) => {
                        let path = resolve(base_dir, path);
                        Catalog::load(&path).map_err(|e| {
                            ConfigError::Invalid(format!(
                                "provider '{}': cannot load catalog {}: {}",
                                self.name,
                                path.display(),
                                e
                            ))
                        })?
                    }
                    None => Catalog::default(),
                };
                merged.records.extend(records.iter().cloned());
                merged.valid_ids.extend(valid_ids.iter().cloned());

                let mut provider = StaticProvider::from_catalog(self.name.clone(), merged);
                if let Some(description) = &self.description {
                    provider = provider.with_description(description.clone());
                }
                Ok(Arc::new(provider))
            }
            ProviderKind::Http(config) => {
                let mut provider = HttpProvider::new(self.name.clone(), config.clone())
                    .map_err(|e| ConfigError::Invalid(format!("provider '{}': {}", self.name, e)))?;
                if let Some(description) = &self.description {
                    provider = provider.with_description(description.clone());
                }
                Ok(Arc::new(provider))
            }
        }
    }
}

fn resolve(base_dir: Option<&Path>, path: &Path) -> PathBuf {
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

/// Full aggregator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(flatten)]
    pub settings: AggregatorSettings,

    /// Providers in registration order
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
}

impl AggregatorConfig {
    /// Check provider names are present and unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for spec in &self.providers {
            if spec.name.trim().is_empty() {
                return Err(ConfigError::Invalid("provider with empty name".to_string()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate provider name '{}'",
                    spec.name
                )));
            }
            if let ProviderKind::Http(http) = &spec.kind {
                if !matches!(http.base_url.scheme(), "http" | "https") {
                    return Err(ConfigError::Invalid(format!(
                        "provider '{}': base_url must be http or https",
                        spec.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Enabled providers, in registration order.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.iter().filter(|p| p.enabled)
    }

    /// Build an aggregator from the enabled providers.
    pub fn build_aggregator(
        &self,
        base_dir: Option<&Path>,
    ) -> Result<Aggregator<UnifiedRecord>, ConfigError> {
        self.validate()?;

        let mut builder = Aggregator::builder().settings(self.settings.clone());
        for spec in self.enabled_providers() {
            tracing::debug!(provider = %spec.name, "registering provider");
            builder = builder.shared_provider(spec.build(base_dir)?);
        }
        Ok(builder.build())
    }

    /// A small starter config with one inline catalog.
    pub fn sample() -> Self {
        let records = vec![
            CatalogEntry::new(
                UnifiedRecord::new("NM_007294.3:c.68_69del")
                    .with_field("gene", "BRCA1")
                    .with_field("assembly", "hg19"),
            )
            .in_context("BRCA1"),
            CatalogEntry::new(
                UnifiedRecord::new("NM_000546.6:c.215C>G")
                    .with_field("gene", "TP53")
                    .with_field("assembly", "hg38"),
            )
            .in_context("TP53"),
        ];

        Self {
            settings: AggregatorSettings::default(),
            providers: vec![ProviderSpec {
                name: "local".to_string(),
                description: Some("Curated local variants".to_string()),
                enabled: true,
                kind: ProviderKind::Static {
                    catalog: None,
                    records,
                    valid_ids: Vec::new(),
                },
            }],
        }
    }
}

// ============================================================================
// ConfigStore
// ============================================================================

/// Location of the config file.
///
/// Defaults to `~/.config/gather/config.yaml`.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Create a config store at the default location.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        let path = base.join("gather").join("config.yaml");
        Self { path }
    }

    /// Create a config store at a custom path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory relative catalog paths resolve against.
    pub fn base_dir(&self) -> Option<&Path> {
        self.path.parent()
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_toml(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"))
    }

    /// Load the config; a missing file yields the default (no providers).
    pub fn load(&self) -> Result<AggregatorConfig, ConfigError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file; using defaults");
                return Ok(AggregatorConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: AggregatorConfig = if self.is_toml() {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Write the config, creating parent directories as needed.
    pub fn save(&self, config: &AggregatorConfig) -> Result<(), ConfigError> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = if self.is_toml() {
            toml::to_string_pretty(config)?
        } else {
            serde_yaml::to_string(config)?
        };

        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Load and build in one step.
    pub fn load_aggregator(&self) -> Result<Aggregator<UnifiedRecord>, ConfigError> {
        self.load()?.build_aggregator(self.base_dir())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
