use async_trait::async_trait;
use common::{DocumentId, IndexType, SummaryId};

/// C4, narrowed to the three signatures `spec.md` §4.4 names. Implemented
/// by `reconcile::index_callbacks::Callbacks` against a `StateStore`; kept
/// in this crate (rather than depending on `reconcile` here) so a
/// `TaskScheduler` implementation never needs to know how callbacks are
/// fulfilled, only that they exist.
#[async_trait]
pub trait IndexTaskCallbacks: Send + Sync {
    async fn on_index_created(
        &self,
        document_id: DocumentId,
        index_type: IndexType,
        target_version: i64,
        index_data: Option<String>,
    );

    async fn on_index_failed(&self, document_id: DocumentId, index_type: IndexType, error_message: String);

    async fn on_index_deleted(&self, document_id: DocumentId, index_type: IndexType);
}

/// C6, narrowed to `spec.md` §4.6.
#[async_trait]
pub trait SummaryTaskCallbacks: Send + Sync {
    async fn on_summary_generated(&self, summary_id: SummaryId, summary_content: String, target_version: i64);

    async fn on_summary_failed(&self, summary_id: SummaryId, error_message: String, target_version: i64);
}
