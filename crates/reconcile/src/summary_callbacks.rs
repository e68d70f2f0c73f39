//! C6: the two collection-summary task completion callbacks. Grounded on
//! `CollectionSummaryCallbacks` in `aperag/tasks/reconciler.py`
//! (`on_summary_generated`, with its collection-description race-condition
//! guard, and `on_summary_failed`).

use std::sync::Arc;

use async_trait::async_trait;
use common::Runtime;
use model::parse_collection_config;
use scheduler::SummaryTaskCallbacks as SummaryTaskCallbacksTrait;
use store::{StateStore, StoreError};

fn report_store_error(e: &StoreError) {
    if e.metadata().is_transient() {
        tracing::warn!(error = %e, "transient store error");
    } else {
        tracing::error!(error = %e, "unexpected store error");
    }
}

pub struct SummaryCallbacks<RT, S> {
    runtime: RT,
    store: Arc<S>,
}

impl<RT, S> SummaryCallbacks<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    pub fn new(runtime: RT, store: Arc<S>) -> Self {
        Self { runtime, store }
    }

    /// `spec.md` §7: a malformed collection config is treated as
    /// `enable_summary = false` plus a logged error; the summary row
    /// still reaches COMPLETE either way.
    async fn is_summary_enabled(&self, config_blob: &str) -> bool {
        match parse_collection_config(config_blob) {
            Ok(cfg) => cfg.enable_summary,
            Err(e) => {
                tracing::error!(error = %e, "failed to parse collection config during summary completion");
                false
            },
        }
    }
}

#[async_trait]
impl<RT, S> SummaryTaskCallbacksTrait for SummaryCallbacks<RT, S>
where
    RT: Runtime,
    S: StateStore,
{
    async fn on_summary_generated(&self, summary_id: common::SummaryId, summary_content: String, target_version: i64) {
        let now = self.runtime.now();

        let Ok(Some(summary)) = self.store.get_summary(&summary_id).await.inspect_err(report_store_error) else {
            metrics::log_callback_miss("on_summary_generated");
            tracing::warn!(%summary_id, target_version, "summary completion callback ignored, summary not found");
            return;
        };

        let Ok(Some(collection)) = self.store.get_collection(&summary.collection_id).await.inspect_err(report_store_error) else {
            tracing::error!(collection_id = %summary.collection_id, "collection not found during summary completion");
            return;
        };

        let summary_enabled = self.is_summary_enabled(&collection.config).await;
        let collection_gmt_updated = collection.gmt_updated;

        let rows_affected = match self
            .store
            .complete_summary(&summary_id, target_version, &summary_content, now)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                report_store_error(&e);
                return;
            },
        };
        if !rows_affected.claimed() {
            metrics::log_callback_miss("on_summary_generated");
            tracing::warn!(%summary_id, target_version, "summary completion callback ignored, not in expected state");
            return;
        }
        metrics::log_callback_applied("on_summary_generated");

        if summary_enabled && !summary_content.is_empty() {
            match self
                .store
                .set_collection_description(&summary.collection_id, &summary_content, collection_gmt_updated, now)
                .await
            {
                Ok(r) if r.claimed() => {
                    tracing::info!(collection_id = %summary.collection_id, "updated collection description with generated summary");
                },
                Ok(_) => {
                    tracing::warn!(
                        collection_id = %summary.collection_id,
                        "failed to update collection description, collection was modified concurrently"
                    );
                },
                Err(e) => report_store_error(&e),
            }
        }

        tracing::info!(%summary_id, target_version, "collection summary generation completed");
    }

    async fn on_summary_failed(&self, summary_id: common::SummaryId, error_message: String, target_version: i64) {
        let now = self.runtime.now();
        match self.store.fail_summary(&summary_id, target_version, &error_message, now).await {
            Ok(r) if r.claimed() => {
                metrics::log_callback_applied("on_summary_failed");
                tracing::error!(%summary_id, target_version, %error_message, "collection summary generation failed");
            },
            Ok(_) => {
                metrics::log_callback_miss("on_summary_failed");
                tracing::warn!(%summary_id, target_version, "summary failure callback ignored, not in expected state");
            },
            Err(e) => report_store_error(&e),
        }
    }
}
