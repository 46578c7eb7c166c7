//! Federated search across multiple providers.
//!
//! This module provides:
//! - `Record` / `UnifiedRecord`: keyed, mergeable search results
//! - `SortedMerge`: the sorted-merge-with-dedup step
//! - `Provider`: the capability every data source implements
//! - `Aggregator`: concurrent fan-out, fan-in, merge and OR-validation
//!
//! # Example
//!
//! ```ignore
//! use gather_core::federated::{Aggregator, SearchSession};
//!
//! let aggregator = Aggregator::builder().provider(clinvar).provider(dbsnp).build();
//! let mut session = SearchSession::new();
//! session.set_context("BRCA1");
//! let results = aggregator.search("c.68_69del", session.context()).await?;
//! ```

mod aggregator;
mod merge;
mod provider;
mod record;
mod settings;
mod types;

pub use aggregator::{Aggregator, AggregatorBuilder};
pub use merge::{merge_sorted, SortedMerge};
pub use provider::{Context, DynProvider, Provider, SearchSession};
pub use record::{Collation, Record, UnifiedRecord};
pub use settings::{
    AggregatorSettings, FailurePolicy, DEFAULT_GLOBAL_TIMEOUT_MS, DEFAULT_PROVIDER_TIMEOUT_MS,
};
pub use types::{MergedResults, SkippedProvider, ValidationOutcome};
