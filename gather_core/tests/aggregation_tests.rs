use async_trait::async_trait;
use gather_core::federated::{
    Aggregator, AggregatorSettings, Collation, Context, FailurePolicy, Provider, SearchSession,
    UnifiedRecord,
};
use gather_core::{AggregationError, ConnectorError};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Test provider with a fixed answer, an optional delay and call accounting.
struct Scripted {
    name: String,
    records: Vec<UnifiedRecord>,
    delay: Duration,
    fail_search: bool,
    validity: Option<bool>,
    calls: Arc<AtomicUsize>,
    abandoned: Arc<AtomicBool>,
}

impl Scripted {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: Vec::new(),
            delay: Duration::ZERO,
            fail_search: false,
            validity: Some(false),
            calls: Arc::new(AtomicUsize::new(0)),
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    fn records(mut self, keys: &[&str]) -> Self {
        self.records = keys
            .iter()
            .map(|k| {
                UnifiedRecord::new(*k)
                    .with_source(self.name.clone())
                    .with_field("origin", self.name.clone())
            })
            .collect();
        self
    }

    fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    fn failing(mut self) -> Self {
        self.fail_search = true;
        self.validity = None;
        self
    }

    fn valid(mut self, valid: bool) -> Self {
        self.validity = Some(valid);
        self
    }

    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn abandoned(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abandoned)
    }

    async fn settle(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Flags the call as abandoned if the future is dropped mid-sleep
        let guard = DropFlag(Arc::clone(&self.abandoned));
        tokio::time::sleep(self.delay).await;
        std::mem::forget(guard);
    }
}

struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Provider for Scripted {
    type Record = UnifiedRecord;

    fn name(&self) -> &str {
        &self.name
    }

    async fn provide_records(
        &self,
        _term: &str,
        _context: &Context,
    ) -> Result<Vec<UnifiedRecord>, ConnectorError> {
        self.settle().await;
        if self.fail_search {
            return Err(ConnectorError::Other(format!("{} is down", self.name)));
        }
        Ok(self.records.clone())
    }

    async fn validate_identifier(&self, _id: &str) -> Result<bool, ConnectorError> {
        self.settle().await;
        self.validity
            .ok_or_else(|| ConnectorError::Other(format!("{} is down", self.name)))
    }
}

fn keys(records: &[UnifiedRecord]) -> Vec<&str> {
    records.iter().map(|r| r.key.as_str()).collect()
}

fn gene_x() -> Context {
    Context::new("GENE_X")
}

#[tokio::test]
async fn test_search_without_context_contacts_nobody() {
    let p1 = Scripted::new("p1").records(&["rs1"]);
    let calls = p1.calls();
    let aggregator = Aggregator::builder().provider(p1).build();

    let session = SearchSession::new();
    let results = aggregator.search("anything", session.context()).await.unwrap();

    assert!(results.is_empty());
    assert!(results.context.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_merge_order_ignores_settle_order() {
    for (slow, fast) in [(50, 0), (0, 50)] {
        let aggregator = Aggregator::builder()
            .provider(Scripted::new("p1").records(&["A", "C"]).delay_ms(slow))
            .provider(Scripted::new("p2").records(&["B", "C"]).delay_ms(fast))
            .build();

        let results = aggregator.search("q", Some(&gene_x())).await.unwrap();

        assert_eq!(keys(&results.records), vec!["A", "B", "C"]);
        let c = &results.records[2];
        assert_eq!(c.sources, vec!["p1", "p2"]);
        // p1 registered first, so its scalar wins
        assert_eq!(c.field("origin"), Some(&json!("p1")));
        assert_eq!(results.completed, vec!["p1", "p2"]);
        assert_eq!(results.received, 4);
        assert_eq!(results.duplicates_merged(), 1);
    }
}

#[tokio::test]
async fn test_gene_context_scenario() {
    let aggregator = Aggregator::builder()
        .provider(Scripted::new("P1").records(&["rs1"]))
        .provider(Scripted::new("P2").records(&["rs1", "rs2"]))
        .build();

    let mut session = SearchSession::new();
    session.set_context("GENE_X");
    let results = aggregator.search("hg19", session.context()).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(keys(&results.records), vec!["rs1", "rs2"]);
    assert_eq!(results.records[0].sources, vec!["P1", "P2"]);
    assert_eq!(results.records[1].sources, vec!["P2"]);
    assert_eq!(results.context, Some(gene_x()));
    assert!(!results.partial);
}

#[tokio::test]
async fn test_output_sorted_and_unique() {
    let aggregator = Aggregator::builder()
        .provider(Scripted::new("a").records(&["m", "z", "b", "m"]))
        .provider(Scripted::new("b").records(&["y", "a", "z"]))
        .provider(Scripted::new("c").records(&["", "b", "k"]))
        .build();

    let first = aggregator.search("q", Some(&gene_x())).await.unwrap();
    let second = aggregator.search("q", Some(&gene_x())).await.unwrap();

    assert!(first.records.windows(2).all(|w| w[0].key < w[1].key));
    assert_eq!(keys(&first.records), vec!["", "a", "b", "k", "m", "y", "z"]);
    assert_eq!(first.records, second.records);
}

#[tokio::test]
async fn test_case_insensitive_collation() {
    let settings = AggregatorSettings {
        collation: Collation::CaseInsensitive,
        ..AggregatorSettings::default()
    };
    let aggregator = Aggregator::builder()
        .settings(settings)
        .provider(Scripted::new("a").records(&["beta", "Alpha"]))
        .provider(Scripted::new("b").records(&["alpha", "Beta"]))
        .build();

    let results = aggregator.search("q", Some(&gene_x())).await.unwrap();
    assert_eq!(keys(&results.records), vec!["Alpha", "alpha", "Beta", "beta"]);
}

#[tokio::test]
async fn test_zero_providers() {
    let aggregator: Aggregator<UnifiedRecord> = Aggregator::builder().build();

    let results = aggregator.search("q", Some(&gene_x())).await.unwrap();
    assert!(results.is_empty());
    assert!(!aggregator.validate_identifier("rs1").await.unwrap());
}

#[tokio::test]
async fn test_search_failure_fails_whole_operation() {
    let aggregator = Aggregator::builder()
        .provider(Scripted::new("ok").records(&["rs1"]))
        .provider(Scripted::new("broken").failing())
        .provider(Scripted::new("also-broken").failing())
        .build();

    let err = aggregator.search("q", Some(&gene_x())).await.unwrap_err();
    match &err {
        AggregationError::Providers(failures) => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].provider, "broken");
        }
        other => panic!("expected provider failure, got {:?}", other),
    }
    assert_eq!(err.failed_providers(), vec!["broken", "also-broken"]);
}

#[tokio::test]
async fn test_partial_policy_reports_skipped_providers() {
    let aggregator = Aggregator::builder()
        .failure_policy(FailurePolicy::Partial)
        .provider(Scripted::new("ok").records(&["rs2", "rs1"]))
        .provider(Scripted::new("broken").failing())
        .build();

    let results = aggregator.search("q", Some(&gene_x())).await.unwrap();
    assert_eq!(keys(&results.records), vec!["rs1", "rs2"]);
    assert!(results.partial);
    assert_eq!(results.completed, vec!["ok"]);
    assert_eq!(results.skipped.len(), 1);
    assert_eq!(results.skipped[0].provider, "broken");
    assert_eq!(results.skipped[0].code, "internal_error");
}

#[tokio::test(start_paused = true)]
async fn test_provider_timeout_is_reported() {
    let aggregator = Aggregator::builder()
        .failure_policy(FailurePolicy::Partial)
        .provider_timeout(Some(Duration::from_millis(100)))
        .global_timeout(None)
        .provider(Scripted::new("fast").records(&["rs1"]))
        .provider(Scripted::new("slow").records(&["rs0"]).delay_ms(5_000))
        .build();

    let results = aggregator.search("q", Some(&gene_x())).await.unwrap();
    assert_eq!(keys(&results.records), vec!["rs1"]);
    assert!(results.skipped[0].is_timeout);
    assert_eq!(results.skipped[0].provider, "slow");
}

#[tokio::test]
async fn test_validation_is_or_of_providers() {
    let mixed = Aggregator::builder()
        .provider(Scripted::new("a").valid(false))
        .provider(Scripted::new("b").valid(true))
        .provider(Scripted::new("c").valid(false))
        .build();
    let outcome = mixed.validate_identifier_detailed("rs1").await.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.confirmed_by.as_deref(), Some("b"));

    let none = Aggregator::builder()
        .provider(Scripted::new("a").valid(false))
        .provider(Scripted::new("b").valid(false))
        .build();
    assert!(!none.validate_identifier("rs1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_validation_true_wins_over_failures_and_stragglers() {
    let straggler = Scripted::new("straggler").valid(false).delay_ms(60_000);
    let abandoned = straggler.abandoned();

    let aggregator = Aggregator::builder()
        .global_timeout(None)
        .provider_timeout(None)
        .provider(Scripted::new("broken").failing())
        .provider(straggler)
        .provider(Scripted::new("confirms").valid(true).delay_ms(10))
        .build();

    let outcome = aggregator.validate_identifier_detailed("rs1").await.unwrap();
    assert!(outcome.valid);
    assert_eq!(outcome.confirmed_by.as_deref(), Some("confirms"));
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].provider, "broken");
    assert!(abandoned.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_validation_failure_without_confirmation() {
    let strict = Aggregator::builder()
        .provider(Scripted::new("no").valid(false))
        .provider(Scripted::new("broken").failing())
        .build();
    let err = strict.validate_identifier("rs1").await.unwrap_err();
    assert_eq!(err.failed_providers(), vec!["broken"]);

    let lenient = Aggregator::builder()
        .failure_policy(FailurePolicy::Partial)
        .provider(Scripted::new("no").valid(false))
        .provider(Scripted::new("broken").failing())
        .build();
    let outcome = lenient.validate_identifier_detailed("rs1").await.unwrap();
    assert!(!outcome.valid);
    assert_eq!(outcome.skipped[0].provider, "broken");
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_abandons_pending_calls() {
    let hung = Scripted::new("hung").records(&["rs1"]).delay_ms(3_600_000);
    let abandoned = hung.abandoned();
    let aggregator = Aggregator::builder()
        .global_timeout(None)
        .provider_timeout(None)
        .provider(Scripted::new("quick").records(&["rs2"]))
        .provider(hung)
        .build();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = aggregator
        .search_with_cancel("q", Some(&gene_x()), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, AggregationError::Cancelled));
    assert!(abandoned.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_global_timeout() {
    let aggregator = Aggregator::builder()
        .provider_timeout(None)
        .global_timeout(Some(Duration::from_millis(500)))
        .provider(Scripted::new("slow").records(&["rs1"]).delay_ms(10_000))
        .build();

    let err = aggregator.search("q", Some(&gene_x())).await.unwrap_err();
    assert!(matches!(err, AggregationError::TimedOut { after_ms: 500 }));

    let err = aggregator.validate_identifier("rs1").await.unwrap_err();
    assert!(matches!(err, AggregationError::TimedOut { .. }));
}

#[tokio::test]
async fn test_concurrent_searches_with_different_contexts() {
    let aggregator = Arc::new(
        Aggregator::builder()
            .provider(Scripted::new("p").records(&["rs1"]))
            .build(),
    );

    let a = {
        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move {
            aggregator
                .search("q", Some(&Context::new("BRCA1")))
                .await
                .map(|r| r.context)
        })
    };
    let b = {
        let aggregator = Arc::clone(&aggregator);
        tokio::spawn(async move {
            aggregator
                .search("q", Some(&Context::new("TP53")))
                .await
                .map(|r| r.context)
        })
    };

    assert_eq!(a.await.unwrap().unwrap(), Some(Context::new("BRCA1")));
    assert_eq!(b.await.unwrap().unwrap(), Some(Context::new("TP53")));
}
