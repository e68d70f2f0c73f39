//! End-to-end scenario tests against `store::memory::InMemoryStore`,
//! mirroring `spec.md` §8's S1-S6 scenarios one test per scenario.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use common::{CollectionId, DocumentId, IndexType, Runtime, SummaryId, TokioRuntime};
use model::{
    Collection, CollectionStatus, CollectionSummary, CollectionSummaryStatus, Document, DocumentIndex,
    DocumentIndexStatus, DocumentStatus,
};
use reconcile::{CollectionGcReconciler, DocumentIndexReconciler, IndexCallbacks, SummaryCallbacks, SummaryReconciler};
use scheduler::{DispatchError, IndexTaskCallbacks, SummaryTaskCallbacks, TargetVersions, TaskScheduler};
use store::{memory::InMemoryStore, StateStore};

#[derive(Debug, Clone, PartialEq)]
enum Dispatched {
    Create(DocumentId, TargetVersions),
    Update(DocumentId, TargetVersions),
    Delete(DocumentId, Vec<IndexType>),
    Summary(SummaryId, CollectionId, i64),
    Cleanup(CollectionId),
}

#[derive(Default)]
struct RecordingScheduler {
    calls: Mutex<Vec<Dispatched>>,
}

impl RecordingScheduler {
    fn calls(&self) -> Vec<Dispatched> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskScheduler for RecordingScheduler {
    async fn schedule_create_index(&self, document_id: DocumentId, target_versions: TargetVersions) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Create(document_id, target_versions));
        Ok(())
    }

    async fn schedule_update_index(&self, document_id: DocumentId, target_versions: TargetVersions) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Update(document_id, target_versions));
        Ok(())
    }

    async fn schedule_delete_index(&self, document_id: DocumentId, index_types: Vec<IndexType>) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Delete(document_id, index_types));
        Ok(())
    }

    async fn schedule_summary_generation(&self, summary_id: SummaryId, collection_id: CollectionId, target_version: i64) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Summary(summary_id, collection_id, target_version));
        Ok(())
    }

    async fn schedule_collection_cleanup(&self, collection_id: CollectionId) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Cleanup(collection_id));
        Ok(())
    }
}

fn doc_id(s: &str) -> DocumentId {
    DocumentId::from(s)
}

fn all_index_types() -> BTreeSet<IndexType> {
    IndexType::ALL.into_iter().collect()
}

/// A scheduler whose `schedule_create_index` always fails, used to exercise
/// the claim-reverts-on-dispatch-failure path (`spec.md` §4.3 step d).
#[derive(Default)]
struct FailingCreateScheduler {
    calls: Mutex<Vec<Dispatched>>,
}

#[async_trait]
impl TaskScheduler for FailingCreateScheduler {
    async fn schedule_create_index(&self, _document_id: DocumentId, _target_versions: TargetVersions) -> Result<(), DispatchError> {
        Err(DispatchError(anyhow::anyhow!("scheduler unavailable")))
    }

    async fn schedule_update_index(&self, document_id: DocumentId, target_versions: TargetVersions) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Update(document_id, target_versions));
        Ok(())
    }

    async fn schedule_delete_index(&self, document_id: DocumentId, index_types: Vec<IndexType>) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Delete(document_id, index_types));
        Ok(())
    }

    async fn schedule_summary_generation(&self, summary_id: SummaryId, collection_id: CollectionId, target_version: i64) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Summary(summary_id, collection_id, target_version));
        Ok(())
    }

    async fn schedule_collection_cleanup(&self, collection_id: CollectionId) -> Result<(), DispatchError> {
        self.calls.lock().unwrap().push(Dispatched::Cleanup(collection_id));
        Ok(())
    }
}

#[tokio::test]
async fn s1_create() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;

    let d1 = doc_id("d1");
    store.insert_document_index(DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now()));

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    let calls = scheduler.calls();
    assert_eq!(calls.len(), 1);
    match &calls[0] {
        Dispatched::Create(doc, versions) => {
            assert_eq!(doc, &d1);
            assert_eq!(versions.get(&IndexType::Vector), Some(&1));
        },
        other => panic!("expected a create dispatch, got {other:?}"),
    }

    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Creating);
    assert_eq!(row.observed_version, 0);

    let callbacks = IndexCallbacks::new(runtime, store.clone(), all_index_types());
    callbacks.on_index_created(d1.clone(), IndexType::Vector, 1, Some("v:abc".to_string())).await;

    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Active);
    assert_eq!(row.observed_version, 1);
    assert_eq!(row.index_data, Some("v:abc".to_string()));
}

#[tokio::test]
async fn s2_update_then_stale_callback_is_a_no_op() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    // Terminal state from S1: ACTIVE, v=1, obs=1.
    let mut row = DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now());
    row.status = DocumentIndexStatus::Active;
    row.observed_version = 1;
    store.insert_document_index(row);

    // User bumps to v=2, PENDING.
    let mut row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    row.version = 2;
    row.status = DocumentIndexStatus::Pending;
    store.insert_document_index(row);

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    let calls = scheduler.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(&calls[0], Dispatched::Update(doc, versions) if doc == &d1 && versions.get(&IndexType::Vector) == Some(&2)));

    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Creating);
    assert_eq!(row.observed_version, 1);

    // A late callback for the superseded v=1 task arrives.
    let callbacks = IndexCallbacks::new(runtime, store.clone(), all_index_types());
    callbacks.on_index_created(d1.clone(), IndexType::Vector, 1, Some("stale".to_string())).await;

    let row_after = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row_after, row, "stale callback must not mutate the row");
}

#[tokio::test]
async fn s3_delete() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    let mut row = DocumentIndex::new_pending(d1.clone(), IndexType::Graph, runtime.now());
    row.status = DocumentIndexStatus::Active;
    row.version = 5;
    row.observed_version = 5;
    store.insert_document_index(row);

    let mut row = store.get_document_index(&d1, IndexType::Graph).unwrap();
    row.status = DocumentIndexStatus::Deleting;
    store.insert_document_index(row);

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    assert!(matches!(&scheduler.calls()[..], [Dispatched::Delete(doc, types)] if doc == &d1 && types == &vec![IndexType::Graph]));
    let row = store.get_document_index(&d1, IndexType::Graph).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::DeletionInProgress);

    let callbacks = IndexCallbacks::new(runtime, store.clone(), all_index_types());
    callbacks.on_index_deleted(d1.clone(), IndexType::Graph).await;

    assert!(!store.row_exists(&d1, IndexType::Graph));
}

#[tokio::test]
async fn s4_batched_dispatch() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    store.insert_document_index(DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now()));
    store.insert_document_index(DocumentIndex::new_pending(d1.clone(), IndexType::FullText, runtime.now()));

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    let calls = scheduler.calls();
    assert_eq!(calls.len(), 1, "both rows must be batched into a single CREATE dispatch");
    match &calls[0] {
        Dispatched::Create(doc, versions) => {
            assert_eq!(doc, &d1);
            assert_eq!(versions.len(), 2);
            assert_eq!(versions.get(&IndexType::Vector), Some(&1));
            assert_eq!(versions.get(&IndexType::FullText), Some(&1));
        },
        other => panic!("expected a create dispatch, got {other:?}"),
    }
}

#[tokio::test]
async fn s5_failure_then_recovery_clears_error_message() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    let mut row = DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now());
    row.status = DocumentIndexStatus::Creating;
    store.insert_document_index(row);

    let callbacks = IndexCallbacks::new(runtime, store.clone(), all_index_types());
    callbacks.on_index_failed(d1.clone(), IndexType::Vector, "oom".to_string()).await;

    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("oom"));

    // User bumps to v=2, PENDING, retrying.
    let mut row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    row.version = 2;
    row.status = DocumentIndexStatus::Pending;
    store.insert_document_index(row);

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    assert!(matches!(&scheduler.calls()[..], [Dispatched::Update(doc, versions)] if doc == &d1 && versions.get(&IndexType::Vector) == Some(&2)));

    callbacks.on_index_created(d1.clone(), IndexType::Vector, 2, None).await;
    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Active);
    assert_eq!(row.error_message, None);
}

#[tokio::test]
async fn s6_summary_completes_even_when_collection_description_update_loses_its_race_guard() {
    let store = Arc::new(InMemoryStore::new());
    let runtime = TokioRuntime;
    let collection_id = CollectionId::from("c1");
    let summary_id = SummaryId::from("s1");

    store.insert_collection(Collection {
        id: collection_id.clone(),
        status: CollectionStatus::Active,
        config: r#"{"enable_summary": true}"#.to_string(),
        description: None,
        gmt_updated: runtime.now(),
        // A concurrent delete (or any other concurrent write) after the
        // callback has already read this collection loses the race for
        // the description update, exactly as `gmt_updated` mismatch would.
        gmt_deleted: Some(runtime.now()),
    });

    let mut summary = CollectionSummary::new_pending(summary_id.clone(), collection_id.clone(), runtime.now());
    summary.status = CollectionSummaryStatus::Generating;
    store.insert_summary(summary);

    let callbacks = SummaryCallbacks::new(runtime, store.clone());
    callbacks.on_summary_generated(summary_id.clone(), "a great summary".to_string(), 1).await;

    let summary = store.get_summary(&summary_id).await.unwrap().unwrap();
    assert_eq!(summary.status, CollectionSummaryStatus::Complete);
    assert_eq!(summary.observed_version, 1);
    assert_eq!(summary.summary.as_deref(), Some("a great summary"));

    let collection = store.get_collection(&collection_id).await.unwrap().unwrap();
    assert_eq!(collection.description, None, "description must not change when the race guard rejects the write");
}

#[tokio::test]
async fn summary_reconciler_claims_and_dispatches() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let collection_id = CollectionId::from("c1");
    let summary_id = SummaryId::from("s1");

    store.insert_summary(CollectionSummary::new_pending(summary_id.clone(), collection_id.clone(), runtime.now()));

    let reconciler = SummaryReconciler::new(runtime, store.clone(), scheduler.clone());
    reconciler.tick().await.unwrap();

    assert!(matches!(&scheduler.calls()[..], [Dispatched::Summary(s, c, v)] if s == &summary_id && c == &collection_id && *v == 1));

    let summary = store.get_summary(&summary_id).await.unwrap().unwrap();
    assert_eq!(summary.status, CollectionSummaryStatus::Generating);
}

#[tokio::test]
async fn collection_gc_sweeps_active_collections() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(RecordingScheduler::default());
    let runtime = TokioRuntime;
    let active = CollectionId::from("active");
    let deleted = CollectionId::from("deleted");

    store.insert_collection(Collection {
        id: active.clone(),
        status: CollectionStatus::Active,
        config: "{}".to_string(),
        description: None,
        gmt_updated: runtime.now(),
        gmt_deleted: None,
    });
    store.insert_collection(Collection {
        id: deleted.clone(),
        status: CollectionStatus::Deleted,
        config: "{}".to_string(),
        description: None,
        gmt_updated: runtime.now(),
        gmt_deleted: Some(runtime.now()),
    });

    let reconciler = CollectionGcReconciler::new(store.clone(), scheduler.clone());
    let dispatched = reconciler.tick().await.unwrap();

    assert_eq!(dispatched, 1);
    assert_eq!(scheduler.calls(), vec![Dispatched::Cleanup(active)]);
}

#[tokio::test]
async fn aggregator_overrides_document_status_after_callback() {
    let store = Arc::new(InMemoryStore::new());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    store.insert_document(Document { id: d1.clone(), status: DocumentStatus::Pending });

    let mut row = DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now());
    row.status = DocumentIndexStatus::Creating;
    store.insert_document_index(row);

    let callbacks = IndexCallbacks::new(runtime, store.clone(), all_index_types());
    callbacks.on_index_created(d1.clone(), IndexType::Vector, 1, Some("v:abc".to_string())).await;

    let document = store.get_document(&d1).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Complete);
}

#[tokio::test]
async fn aggregator_ignores_rows_for_disabled_index_types() {
    // A VISION row stuck in FAILED must not drag the document's overall
    // status down once the operator has disabled VISION (spec.md §6): the
    // aggregator should only see the still-enabled VECTOR row.
    let store = Arc::new(InMemoryStore::new());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    store.insert_document(Document { id: d1.clone(), status: DocumentStatus::Pending });

    let mut vision_row = DocumentIndex::new_pending(d1.clone(), IndexType::Vision, runtime.now());
    vision_row.status = DocumentIndexStatus::Failed;
    store.insert_document_index(vision_row);

    let mut vector_row = DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now());
    vector_row.status = DocumentIndexStatus::Creating;
    store.insert_document_index(vector_row);

    let enabled: BTreeSet<IndexType> = [IndexType::Vector].into_iter().collect();
    let callbacks = IndexCallbacks::new(runtime, store.clone(), enabled);
    callbacks.on_index_created(d1.clone(), IndexType::Vector, 1, Some("v:abc".to_string())).await;

    let document = store.get_document(&d1).await.unwrap().unwrap();
    assert_eq!(document.status, DocumentStatus::Complete, "the disabled VISION row must not surface as FAILED");
}

#[tokio::test]
async fn dispatch_failure_reverts_claimed_rows_back_to_pending() {
    let store = Arc::new(InMemoryStore::new());
    let scheduler = Arc::new(FailingCreateScheduler::default());
    let runtime = TokioRuntime;
    let d1 = doc_id("d1");

    store.insert_document_index(DocumentIndex::new_pending(d1.clone(), IndexType::Vector, runtime.now()));

    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), scheduler.clone());
    let err = reconciler.tick().await;
    // A dispatch failure is a per-document error within the tick (the tick
    // loop itself never fails), surfaced to the caller of `tick()` only
    // through `TickReport.failed_docs`.
    let report = err.unwrap();
    assert_eq!(report.failed_docs, 1);
    assert_eq!(report.successful_docs, 0);

    // The row must be back in PENDING, not stranded in CREATING, so the
    // next tick re-discovers and re-dispatches it.
    let row = store.get_document_index(&d1, IndexType::Vector).unwrap();
    assert_eq!(row.status, DocumentIndexStatus::Pending);
    assert_eq!(row.version, 1);
    assert_eq!(row.observed_version, 0);

    // A second tick against a scheduler that succeeds picks the row right up.
    let working_scheduler = Arc::new(RecordingScheduler::default());
    let reconciler = DocumentIndexReconciler::new(runtime, store.clone(), working_scheduler.clone());
    let report = reconciler.tick().await.unwrap();
    assert_eq!(report.successful_docs, 1);
    assert!(matches!(&working_scheduler.calls()[..], [Dispatched::Create(doc, versions)] if doc == &d1 && versions.get(&IndexType::Vector) == Some(&1)));
}
