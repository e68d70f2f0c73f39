//! An in-process [`TaskScheduler`] that hands dispatched work to an
//! `mpsc` channel instead of a remote queue. `spec.md` §5 treats the
//! scheduler as "async fire-and-forget with eventual callbacks" — this is
//! the simplest implementation of that contract, and the one
//! `reconcile`'s scenario tests and the `controller` binary's demo worker
//! both drive.

use std::sync::Arc;

use async_trait::async_trait;
use common::{CollectionId, DocumentId, IndexType, SummaryId};
use tokio::sync::mpsc;

use crate::{callbacks::IndexTaskCallbacks, DispatchError, SummaryTaskCallbacks, TargetVersions, TaskScheduler};

/// One dispatched unit of work. A real worker pool would deserialize this
/// off a queue; here it's just an enum variant.
#[derive(Debug, Clone)]
pub enum ScheduledTask {
    CreateIndex {
        document_id: DocumentId,
        target_versions: TargetVersions,
    },
    UpdateIndex {
        document_id: DocumentId,
        target_versions: TargetVersions,
    },
    DeleteIndex {
        document_id: DocumentId,
        index_types: Vec<IndexType>,
    },
    GenerateSummary {
        summary_id: SummaryId,
        collection_id: CollectionId,
        target_version: i64,
    },
    CleanupCollection {
        collection_id: CollectionId,
    },
}

#[derive(Clone)]
pub struct ChannelScheduler {
    tx: mpsc::UnboundedSender<ScheduledTask>,
}

impl ChannelScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ScheduledTask>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl TaskScheduler for ChannelScheduler {
    async fn schedule_create_index(
        &self,
        document_id: DocumentId,
        target_versions: TargetVersions,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduledTask::CreateIndex { document_id, target_versions })
            .map_err(|e| DispatchError(anyhow::anyhow!(e.to_string())))
    }

    async fn schedule_update_index(
        &self,
        document_id: DocumentId,
        target_versions: TargetVersions,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduledTask::UpdateIndex { document_id, target_versions })
            .map_err(|e| DispatchError(anyhow::anyhow!(e.to_string())))
    }

    async fn schedule_delete_index(
        &self,
        document_id: DocumentId,
        index_types: Vec<IndexType>,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduledTask::DeleteIndex { document_id, index_types })
            .map_err(|e| DispatchError(anyhow::anyhow!(e.to_string())))
    }

    async fn schedule_summary_generation(
        &self,
        summary_id: SummaryId,
        collection_id: CollectionId,
        target_version: i64,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduledTask::GenerateSummary { summary_id, collection_id, target_version })
            .map_err(|e| DispatchError(anyhow::anyhow!(e.to_string())))
    }

    async fn schedule_collection_cleanup(&self, collection_id: CollectionId) -> Result<(), DispatchError> {
        self.tx
            .send(ScheduledTask::CleanupCollection { collection_id })
            .map_err(|e| DispatchError(anyhow::anyhow!(e.to_string())))
    }
}

/// Drains dispatched tasks and immediately calls back with success,
/// stamping `index_data`/`summary` from `builder`. Stands in for the
/// concrete index builders `spec.md` §1 puts out of scope: good enough to
/// exercise the controller end to end, not a real embedding/graph/search
/// pipeline.
pub async fn run_always_succeeds_worker(
    mut rx: mpsc::UnboundedReceiver<ScheduledTask>,
    index_callbacks: Arc<dyn IndexTaskCallbacks>,
    summary_callbacks: Arc<dyn SummaryTaskCallbacks>,
) {
    while let Some(task) = rx.recv().await {
        match task {
            ScheduledTask::CreateIndex { document_id, target_versions } | ScheduledTask::UpdateIndex { document_id, target_versions } => {
                for (index_type, target_version) in target_versions {
                    let index_data = Some(format!("{index_type}:v{target_version}"));
                    index_callbacks
                        .on_index_created(document_id.clone(), index_type, target_version, index_data)
                        .await;
                }
            },
            ScheduledTask::DeleteIndex { document_id, index_types } => {
                for index_type in index_types {
                    index_callbacks.on_index_deleted(document_id.clone(), index_type).await;
                }
            },
            ScheduledTask::GenerateSummary { summary_id, collection_id, target_version } => {
                let content = format!("summary of {collection_id} at v{target_version}");
                summary_callbacks.on_summary_generated(summary_id, content, target_version).await;
            },
            ScheduledTask::CleanupCollection { collection_id } => {
                tracing::debug!(%collection_id, "cleaned up expired documents (no-op demo worker)");
            },
        }
    }
}
