//! C4: the three index task completion callbacks. Grounded on
//! `IndexTaskCallbacks` in `aperag/tasks/reconciler.py`
//! (`on_index_created` / `on_index_failed` / `on_index_deleted`, and
//! `_update_document_status` for the C8 call-before-commit).

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use common::{DocumentId, IndexType, Runtime};
use scheduler::IndexTaskCallbacks as IndexTaskCallbacksTrait;
use store::{StateStore, StoreError};

use crate::aggregator;

fn report_store_error(e: &StoreError) {
    if e.metadata().is_transient() {
        tracing::warn!(error = %e, "transient store error");
    } else {
        tracing::error!(error = %e, "unexpected store error");
    }
}

pub struct IndexCallbacks<RT, S> {
    runtime: RT,
    store: Arc<S>,
    enabled_index_types: BTreeSet<IndexType>,
}

impl<RT, S> IndexCallbacks<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    /// `enabled_index_types` is the operator-level set from `spec.md` §6
    /// configuration; it gates which rows the C8 aggregator folds into a
    /// document's overall status.
    pub fn new(runtime: RT, store: Arc<S>, enabled_index_types: BTreeSet<IndexType>) -> Self {
        Self { runtime, store, enabled_index_types }
    }

    /// Re-derives and writes the document's overall status, skipping
    /// documents the aggregator doesn't own (`DocumentStatus::is_aggregator_exempt`).
    /// Failures here are logged, not propagated — a stale aggregator write
    /// must never turn a successful index callback into an error return
    /// (`spec.md` §4.4/§4.8).
    async fn refresh_document_status(&self, document_id: &DocumentId) {
        let document = match self.store.get_document(document_id).await {
            Ok(Some(d)) => d,
            Ok(None) => return,
            Err(e) => {
                report_store_error(&e);
                return;
            },
        };
        if document.status.is_aggregator_exempt() {
            return;
        }

        let rows = match self.store.get_document_index_rows(document_id).await {
            Ok(rows) => rows,
            Err(e) => {
                report_store_error(&e);
                return;
            },
        };

        let statuses = aggregator::enabled_statuses(&rows, &self.enabled_index_types);
        let overall = aggregator::aggregate(&statuses);

        if let Err(e) = self.store.set_document_status(document_id, overall).await {
            report_store_error(&e);
        }
    }
}

#[async_trait]
impl<RT, S> IndexTaskCallbacksTrait for IndexCallbacks<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    async fn on_index_created(
        &self,
        document_id: DocumentId,
        index_type: IndexType,
        target_version: i64,
        index_data: Option<String>,
    ) {
        let now = self.runtime.now();
        let result = self
            .store
            .complete_index_creation(&document_id, index_type, target_version, index_data, now)
            .await;
        match result {
            Ok(rows) if rows.claimed() => {
                metrics::log_callback_applied("on_index_created");
                self.refresh_document_status(&document_id).await;
                tracing::info!(%document_id, ?index_type, target_version, "index creation completed");
            },
            Ok(_) => {
                metrics::log_callback_miss("on_index_created");
                tracing::warn!(%document_id, ?index_type, target_version, "index creation callback ignored, not in expected state");
            },
            Err(e) => report_store_error(&e),
        }
    }

    async fn on_index_failed(&self, document_id: DocumentId, index_type: IndexType, error_message: String) {
        let now = self.runtime.now();
        let result = self.store.fail_index(&document_id, index_type, &error_message, now).await;
        match result {
            Ok(rows) if rows.claimed() => {
                metrics::log_callback_applied("on_index_failed");
                self.refresh_document_status(&document_id).await;
                tracing::error!(%document_id, ?index_type, %error_message, "index operation failed");
            },
            Ok(_) => {
                metrics::log_callback_miss("on_index_failed");
                tracing::warn!(%document_id, ?index_type, "index failure callback ignored, not in expected state");
            },
            Err(e) => report_store_error(&e),
        }
    }

    async fn on_index_deleted(&self, document_id: DocumentId, index_type: IndexType) {
        let result = self.store.delete_index(&document_id, index_type).await;
        match result {
            Ok(rows) if rows.claimed() => {
                metrics::log_callback_applied("on_index_deleted");
                self.refresh_document_status(&document_id).await;
                tracing::info!(%document_id, ?index_type, "index deleted");
            },
            Ok(_) => {
                metrics::log_callback_miss("on_index_deleted");
                tracing::warn!(%document_id, ?index_type, "index deletion callback ignored, not in expected state");
            },
            Err(e) => report_store_error(&e),
        }
    }
}
