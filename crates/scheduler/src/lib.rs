//! The task scheduler interface: dispatch methods for each index/summary
//! action, leaving the actual index builders (vector embedding, chunking,
//! graph extraction, summarisation) as external collaborators. This crate
//! only specifies the boundary: typed dispatch in, eventual callbacks out.
//!
//! Typed, per-index-type dispatch with a context payload, fire-and-forget
//! with out-of-band completion — the reconciliation core stays
//! transactional and synchronous-feeling; this crate is where the
//! asynchrony lives.

pub mod callbacks;
pub mod channel;

use std::collections::BTreeMap;

use async_trait::async_trait;
use common::{CollectionId, DocumentId, IndexType, SummaryId};

pub use callbacks::{IndexTaskCallbacks, SummaryTaskCallbacks};

/// The version being materialised for one index type in a create/update
/// dispatch. Replaces the original's stringly-typed `{type}_version`
/// context dict (`spec.md` Design Notes §9).
pub type TargetVersions = BTreeMap<IndexType, i64>;

#[derive(Debug, thiserror::Error)]
#[error("failed to dispatch task: {0}")]
pub struct DispatchError(#[source] pub anyhow::Error);

/// C2. One call per action per document per tick, batched across index
/// types by the caller (`reconcile::document_index_reconciler`).
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn schedule_create_index(
        &self,
        document_id: DocumentId,
        target_versions: TargetVersions,
    ) -> Result<(), DispatchError>;

    async fn schedule_update_index(
        &self,
        document_id: DocumentId,
        target_versions: TargetVersions,
    ) -> Result<(), DispatchError>;

    async fn schedule_delete_index(
        &self,
        document_id: DocumentId,
        index_types: Vec<IndexType>,
    ) -> Result<(), DispatchError>;

    async fn schedule_summary_generation(
        &self,
        summary_id: SummaryId,
        collection_id: CollectionId,
        target_version: i64,
    ) -> Result<(), DispatchError>;

    /// C7: idempotent, no claiming, no callback.
    async fn schedule_collection_cleanup(&self, collection_id: CollectionId) -> Result<(), DispatchError>;
}
