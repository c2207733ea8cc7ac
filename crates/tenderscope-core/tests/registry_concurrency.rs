//! Concurrency tests for the tender registry.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use tenderscope_core::{
    Category, Criterion, EngineConfig, FlagStatus, MatrixState, MemoryTenderSource,
    PriceObservation, RawCriterionValue, Role, Submission, TenderData, TenderRegistry,
    TenderSession, Vendor,
};

fn tender(id: &str) -> TenderData {
    TenderData {
        tender_id: id.to_string(),
        vendors: vec![Vendor::new("v1", "Acme"), Vendor::new("v2", "Globex")],
        criteria: vec![
            Criterion::new("iso", "ISO 9001", Category::Technical, 50.0),
            Criterion::new("staff", "Consultants", Category::Technical, 50.0),
        ],
        submissions: vec![
            Submission::new("v1")
                .with_value("ISO 9001", RawCriterionValue::text("Yes"))
                .with_value("Consultants", RawCriterionValue::Number(40.0)),
            Submission::new("v2")
                .with_value("ISO 9001", RawCriterionValue::text("No"))
                .with_value("Consultants", RawCriterionValue::Number(10.0)),
        ],
        observations: [100.0, 110.0, 120.0, 130.0, 140.0, 150.0, 400.0]
            .into_iter()
            .enumerate()
            .map(|(i, p)| PriceObservation::new("cement", format!("V{i}"), p))
            .collect(),
    }
}

fn source() -> Arc<MemoryTenderSource> {
    let source = MemoryTenderSource::new().with_latency(Duration::from_millis(5));
    source.insert(tender("T-A"));
    source.insert(tender("T-B"));
    Arc::new(source)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_double_lock_yields_exactly_one_success() {
    let source = source();
    let registry = Arc::new(TenderRegistry::new(EngineConfig::default()));
    registry.get_or_load("T-A", source.as_ref()).await.unwrap();

    let tasks = (0..2).map(|_| {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .with_session("T-A", |s| {
                    s.lock(Role::Chair).map(|snap| snap.digest.clone())
                })
                .await
                .unwrap()
        })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);

    let handle = registry.get("T-A").await.unwrap();
    let session = handle.read().await;
    assert_eq!(session.lifecycle_state(), MatrixState::Locked);
    assert_eq!(session.history().iter().filter(|h| h.to.is_some()).count(), 1);
}

#[tokio::test]
async fn concurrent_loads_hit_the_source_once() {
    let source = source();
    let registry = TenderRegistry::new(EngineConfig::default());

    let handles = join_all((0..8).map(|_| registry.get_or_load("T-A", source.as_ref()))).await;
    let handles: Vec<_> = handles.into_iter().map(|h| h.unwrap()).collect();

    // One load: criteria, vendors and submissions.
    assert_eq!(source.calls(), 3);
    assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
}

#[tokio::test]
async fn tenders_are_isolated() {
    let source = source();
    let registry = TenderRegistry::new(EngineConfig::default());
    registry.get_or_load("T-A", source.as_ref()).await.unwrap();
    registry.get_or_load("T-B", source.as_ref()).await.unwrap();

    registry
        .with_session("T-A", |s| s.lock(Role::Chair).map(|_| ()))
        .await
        .unwrap()
        .unwrap();

    let b = registry
        .with_session("T-B", |s| s.lifecycle_state())
        .await
        .unwrap();
    assert_eq!(b, MatrixState::Editable);
    assert_eq!(registry.tender_ids().await, vec!["T-A", "T-B"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_load_does_not_block_other_tenders() {
    let registry = Arc::new(TenderRegistry::new(EngineConfig::default()));
    let ready = tender("T-B");
    registry
        .insert(TenderSession::new(
            "T-B",
            ready.criteria,
            ready.vendors,
            EngineConfig::default(),
        ))
        .await;

    let slow = MemoryTenderSource::new().with_latency(Duration::from_secs(2));
    slow.insert(tender("T-A"));
    let slow = Arc::new(slow);
    let loading = {
        let registry = Arc::clone(&registry);
        let slow = Arc::clone(&slow);
        tokio::spawn(async move { registry.get_or_load("T-A", slow.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let b = tokio::time::timeout(Duration::from_millis(500), registry.get("T-B"))
        .await
        .expect("lookup of a registered tender stalled behind another load")
        .unwrap();
    assert_eq!(b.read().await.lifecycle_state(), MatrixState::Editable);

    let ids = tokio::time::timeout(Duration::from_millis(500), registry.tender_ids())
        .await
        .unwrap();
    assert_eq!(ids, vec!["T-B"]);
    assert!(!loading.is_finished());
    loading.abort();
}

#[tokio::test]
async fn begin_benchmarking_pulls_observations_from_source() {
    let source = source();
    let registry = TenderRegistry::new(EngineConfig::default());
    registry.get_or_load("T-A", source.as_ref()).await.unwrap();
    registry
        .with_session("T-A", |s| s.lock(Role::Chair).map(|_| ()))
        .await
        .unwrap()
        .unwrap();

    let report = registry
        .begin_benchmarking("T-A", source.as_ref())
        .await
        .unwrap();
    assert_eq!(report.summaries["cement"].count, 7);
    assert_eq!(report.count_with_status(FlagStatus::Pending), 1);
    assert!(report.record("cement:V6#0").unwrap().is_outlier);
}

#[tokio::test]
async fn begin_benchmarking_on_editable_matrix_is_rejected() {
    let source = source();
    let registry = TenderRegistry::new(EngineConfig::default());
    registry.get_or_load("T-B", source.as_ref()).await.unwrap();

    let err = registry
        .begin_benchmarking("T-B", source.as_ref())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("enter benchmarking"));
}
