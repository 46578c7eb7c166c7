//! Aggregation engine.
//!
//! Fans a query out to every registered provider, waits for all of them, and
//! folds the per-provider lists into one sorted, deduplicated sequence.

use super::merge::SortedMerge;
use super::provider::{Context, Provider};
use super::record::Record;
use super::settings::{AggregatorSettings, FailurePolicy};
use super::types::{MergedResults, SkippedProvider, ValidationOutcome};
use crate::error::{AggregationError, ConnectorError, ProviderError};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

type SharedProvider<R> = Arc<dyn Provider<Record = R>>;

/// Engine for executing searches and identifier checks across providers.
///
/// The provider list is fixed at construction. Results depend only on the
/// registration order and on each provider's own ordering.
pub struct Aggregator<R: Record> {
    providers: Vec<SharedProvider<R>>,
    settings: AggregatorSettings,
}

impl<R: Record> Aggregator<R> {
    pub fn builder() -> AggregatorBuilder<R> {
        AggregatorBuilder::new()
    }

    /// Create an aggregator over `providers`, in registration order.
    pub fn new(providers: Vec<SharedProvider<R>>, settings: AggregatorSettings) -> Self {
        Self {
            providers,
            settings,
        }
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Registered provider names, in registration order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn providers(&self) -> &[SharedProvider<R>] {
        &self.providers
    }

    /// Search every provider for `term` within `context`.
    ///
    /// Without a context nothing is searched and an empty result is returned.
    pub async fn search(
        &self,
        term: &str,
        context: Option<&Context>,
    ) -> Result<MergedResults<R>, AggregationError> {
        self.search_with_cancel(term, context, &CancellationToken::new())
            .await
    }

    /// Like [`Aggregator::search`], abandoning every pending provider call
    /// when `cancel` fires.
    pub async fn search_with_cancel(
        &self,
        term: &str,
        context: Option<&Context>,
        cancel: &CancellationToken,
    ) -> Result<MergedResults<R>, AggregationError> {
        let start = Instant::now();

        let Some(context) = context else {
            tracing::debug!(term, "search requested with no context chosen");
            return Ok(MergedResults::empty(term, None));
        };

        let span = tracing::info_span!(
            "fan_out",
            op = "search",
            term,
            context = %context,
            providers = self.providers.len()
        );
        let outcomes = self
            .bounded(self.fan_out_search(term, context), cancel)
            .instrument(span)
            .await?;

        let mut result = MergedResults::empty(term, Some(context.clone()));
        let mut lists = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for (name, outcome) in outcomes {
            match outcome {
                Ok(records) => {
                    result.received += records.len();
                    result.completed.push(name);
                    lists.push(records);
                }
                Err(error) => {
                    tracing::warn!(provider = %name, error = %error, "provider search failed");
                    failures.push(ProviderError::new(name, error));
                }
            }
        }

        if !failures.is_empty() {
            match self.settings.failure_policy {
                FailurePolicy::AllOrNothing => return Err(AggregationError::Providers(failures)),
                FailurePolicy::Partial => {
                    for failure in &failures {
                        result.add_skipped(failure);
                    }
                }
            }
        }

        let merge_span =
            tracing::debug_span!("merge", lists = lists.len(), received = result.received);
        result.records = merge_span.in_scope(|| {
            let mut merge = SortedMerge::new(self.settings.collation);
            for list in lists {
                merge.extend(list);
            }
            tracing::debug!(
                entries = merge.len(),
                merged = merge.merged_count(),
                "merge complete"
            );
            merge.into_vec()
        });

        result.duration_ms = Some(start.elapsed().as_millis() as u64);
        Ok(result)
    }

    /// True iff at least one provider recognizes `id`.
    pub async fn validate_identifier(&self, id: &str) -> Result<bool, AggregationError> {
        self.validate_identifier_detailed(id)
            .await
            .map(|outcome| outcome.valid)
    }

    /// Identifier check with provenance and skipped-provider detail.
    pub async fn validate_identifier_detailed(
        &self,
        id: &str,
    ) -> Result<ValidationOutcome, AggregationError> {
        self.validate_identifier_with_cancel(id, &CancellationToken::new())
            .await
    }

    /// Like [`Aggregator::validate_identifier_detailed`], abandoning every
    /// pending provider call when `cancel` fires.
    pub async fn validate_identifier_with_cancel(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationOutcome, AggregationError> {
        let span = tracing::info_span!(
            "validate",
            id,
            providers = self.providers.len()
        );
        self.bounded(self.fan_out_validate(id), cancel)
            .instrument(span)
            .await?
    }

    /// Dispatch `provide_records` to every provider and wait for all of them.
    ///
    /// Outcomes come back in registration order regardless of settle order.
    async fn fan_out_search(
        &self,
        term: &str,
        context: &Context,
    ) -> Vec<(String, Result<Vec<R>, ConnectorError>)> {
        let per_call = self.settings.provider_timeout();

        let calls = self.providers.iter().map(|provider| {
            let name = provider.name().to_string();
            let span = tracing::debug_span!("provider_call", provider = %name, op = "search");
            let call = with_timeout(per_call, provider.provide_records(term, context));

            async move {
                let start = Instant::now();
                let outcome = call.await;
                tracing::debug!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    ok = outcome.is_ok(),
                    "provider settled"
                );
                (name, outcome)
            }
            .instrument(span)
        });

        futures::future::join_all(calls).await
    }

    /// OR-reduce `validate_identifier` over every provider.
    ///
    /// Returns as soon as any provider confirms; the remaining calls are
    /// dropped.
    async fn fan_out_validate(&self, id: &str) -> Result<ValidationOutcome, AggregationError> {
        let per_call = self.settings.provider_timeout();

        let mut pending: FuturesUnordered<_> = self
            .providers
            .iter()
            .enumerate()
            .map(|(idx, provider)| {
                let name = provider.name().to_string();
                let span =
                    tracing::debug_span!("provider_call", provider = %name, op = "validate");
                let call = with_timeout(per_call, provider.validate_identifier(id));
                async move { (idx, name, call.await) }.instrument(span)
            })
            .collect();

        let mut failures: Vec<(usize, ProviderError)> = Vec::new();

        while let Some((idx, name, outcome)) = pending.next().await {
            match outcome {
                Ok(true) => {
                    tracing::debug!(provider = %name, id, "identifier confirmed");
                    return Ok(ValidationOutcome {
                        id: id.to_string(),
                        valid: true,
                        confirmed_by: Some(name),
                        skipped: skipped_in_order(failures),
                    });
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(provider = %name, error = %error, "provider validation failed");
                    failures.push((idx, ProviderError::new(name, error)));
                }
            }
        }

        if !failures.is_empty() && self.settings.failure_policy == FailurePolicy::AllOrNothing {
            failures.sort_by_key(|(idx, _)| *idx);
            return Err(AggregationError::Providers(
                failures.into_iter().map(|(_, e)| e).collect(),
            ));
        }

        tracing::debug!(id, "identifier not recognized by any provider");
        Ok(ValidationOutcome {
            id: id.to_string(),
            valid: false,
            confirmed_by: None,
            skipped: skipped_in_order(failures),
        })
    }

    /// Apply the global timeout and cancellation to a fan-out.
    ///
    /// Dropping `fut` drops every provider call still in flight.
    async fn bounded<F, T>(&self, fut: F, cancel: &CancellationToken) -> Result<T, AggregationError>
    where
        F: Future<Output = T>,
    {
        let limit = self.settings.global_timeout();
        let guarded = async {
            match limit {
                Some(limit) => timeout(limit, fut)
                    .await
                    .map_err(|_| AggregationError::TimedOut {
                        after_ms: limit.as_millis() as u64,
                    }),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("aggregation cancelled; abandoning pending providers");
                Err(AggregationError::Cancelled)
            }
            result = guarded => {
                if let Err(AggregationError::TimedOut { after_ms }) = &result {
                    tracing::warn!(after_ms = *after_ms, "aggregation timed out");
                }
                result
            }
        }
    }
}

async fn with_timeout<T, F>(limit: Option<Duration>, call: F) -> Result<T, ConnectorError>
where
    F: Future<Output = Result<T, ConnectorError>>,
{
    match limit {
        Some(limit) => match timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ConnectorError::Timeout(limit.as_millis() as u64)),
        },
        None => call.await,
    }
}

fn skipped_in_order(mut failures: Vec<(usize, ProviderError)>) -> Vec<SkippedProvider> {
    failures.sort_by_key(|(idx, _)| *idx);
    failures
        .iter()
        .map(|(_, err)| SkippedProvider::from(err))
        .collect()
}

/// Registers providers and settings before building an [`Aggregator`].
pub struct AggregatorBuilder<R: Record> {
    providers: Vec<SharedProvider<R>>,
    settings: AggregatorSettings,
}

impl<R: Record> AggregatorBuilder<R> {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            settings: AggregatorSettings::default(),
        }
    }

    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: Provider<Record = R> + 'static,
    {
        self.providers.push(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: SharedProvider<R>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn settings(mut self, settings: AggregatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.settings.failure_policy = policy;
        self
    }

    pub fn provider_timeout(mut self, limit: Option<Duration>) -> Self {
        self.settings.provider_timeout_ms = limit.map(|d| d.as_millis() as u64);
        self
    }

    pub fn global_timeout(mut self, limit: Option<Duration>) -> Self {
        self.settings.global_timeout_ms = limit.map(|d| d.as_millis() as u64);
        self
    }

    pub fn build(self) -> Aggregator<R> {
        Aggregator::new(self.providers, self.settings)
    }
}

impl<R: Record> Default for AggregatorBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}
