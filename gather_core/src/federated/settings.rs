//! Aggregation settings.
//!
//! Everything has a sensible default; a config file only needs to name what
//! it changes.

use super::record::Collation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Default Values
// ============================================================================

/// Default per-provider timeout in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10000;

/// Default timeout for a whole operation in milliseconds
pub const DEFAULT_GLOBAL_TIMEOUT_MS: u64 = 30000;

/// What a provider failure does to the whole operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Any provider failure fails the operation (default)
    #[default]
    AllOrNothing,
    /// Failing providers are skipped and reported alongside the results
    Partial,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all_or_nothing" | "all-or-nothing" | "strict" => Ok(FailurePolicy::AllOrNothing),
            "partial" => Ok(FailurePolicy::Partial),
            other => Err(format!("unknown failure policy '{}'", other)),
        }
    }
}

/// Tunables applied to every search and validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorSettings {
    /// Per-provider timeout; `None` lets a hung provider hang the operation
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: Option<u64>,

    /// Timeout for the whole fan-out/fan-in
    #[serde(default = "default_global_timeout_ms")]
    pub global_timeout_ms: Option<u64>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub collation: Collation,
}

fn default_provider_timeout_ms() -> Option<u64> {
    Some(DEFAULT_PROVIDER_TIMEOUT_MS)
}

fn default_global_timeout_ms() -> Option<u64> {
    Some(DEFAULT_GLOBAL_TIMEOUT_MS)
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            provider_timeout_ms: Some(DEFAULT_PROVIDER_TIMEOUT_MS),
            global_timeout_ms: Some(DEFAULT_GLOBAL_TIMEOUT_MS),
            failure_policy: FailurePolicy::AllOrNothing,
            collation: Collation::Lexicographic,
        }
    }
}

impl AggregatorSettings {
    /// Settings with no timeouts at all.
    pub fn unbounded() -> Self {
        Self {
            provider_timeout_ms: None,
            global_timeout_ms: None,
            ..Self::default()
        }
    }

    pub fn provider_timeout(&self) -> Option<Duration> {
        self.provider_timeout_ms.map(Duration::from_millis)
    }

    pub fn global_timeout(&self) -> Option<Duration> {
        self.global_timeout_ms.map(Duration::from_millis)
    }
}
