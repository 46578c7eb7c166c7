// src/lib.rs
//! Concurrent fan-out search over independent providers.
//!
//! Results from every provider are merged into a single sequence sorted by
//! key, with same-key records folded together via [`federated::Record::merge_with`].
//! Identifier checks are OR-reduced across providers.

pub mod config;
pub mod error;
pub mod federated;
pub mod providers;

pub use config::{AggregatorConfig, ConfigStore, ProviderKind, ProviderSpec};
pub use error::{AggregationError, ConfigError, ConnectorError, ProviderError};
pub use federated::{
    Aggregator, AggregatorBuilder, AggregatorSettings, Collation, Context, DynProvider,
    FailurePolicy, MergedResults, Provider, Record, SearchSession, UnifiedRecord,
    ValidationOutcome,
};
